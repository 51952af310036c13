//! Blocking JSON-RPC transport for the Transmission daemon

use std::cell::RefCell;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use super::{RpcClient, RpcError, SessionSettings, Torrent};
use crate::config::RpcSettings;

const SESSION_HEADER: &str = "X-Transmission-Session-Id";

#[derive(Debug, Deserialize)]
struct Reply<T> {
    result: String,
    arguments: Option<T>,
}

#[derive(Debug, Deserialize)]
struct TorrentList {
    #[serde(default)]
    torrents: Vec<Torrent>,
}

/// Client for one daemon endpoint
///
/// The CSRF session id handed out by the daemon is remembered for the life
/// of the client.
pub struct TransmissionClient {
    http: Client,
    url: String,
    auth: Option<(String, Option<String>)>,
    session_id: RefCell<Option<String>>,
}

impl TransmissionClient {
    /// Build a client for the endpoint described by `settings`
    ///
    /// No request is made until the first call.
    ///
    /// # Errors
    ///
    /// Returns `RpcError::Transport` if the HTTP client cannot be built.
    pub fn new(settings: &RpcSettings) -> Result<Self, RpcError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(concat!("trpc/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            url: settings.url(),
            auth: settings
                .user
                .clone()
                .map(|user| (user, settings.password.clone())),
            session_id: RefCell::new(None),
        })
    }

    /// Endpoint this client talks to
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn call<T: DeserializeOwned>(&self, method: &str, arguments: Value) -> Result<T, RpcError> {
        self.send(method, arguments)?
            .ok_or_else(|| RpcError::Daemon(format!("{method} reply carried no arguments")))
    }

    /// Run an action whose reply carries nothing of interest
    fn act(&self, method: &str, arguments: Value) -> Result<(), RpcError> {
        debug!(method, %arguments, "action");
        self.send::<Value>(method, arguments).map(|_| ())
    }

    fn send<T: DeserializeOwned>(&self, method: &str, arguments: Value) -> Result<Option<T>, RpcError> {
        let body = json!({ "method": method, "arguments": arguments });

        // A stale or missing session id costs exactly one 409 round trip.
        for _ in 0..2 {
            let mut request = self.http.post(&self.url).json(&body);
            if let Some(id) = self.session_id.borrow().clone() {
                request = request.header(SESSION_HEADER, id);
            }
            if let Some((user, password)) = &self.auth {
                request = request.basic_auth(user, password.as_deref());
            }

            let response = request.send()?;
            match response.status() {
                StatusCode::CONFLICT => {
                    let id = response
                        .headers()
                        .get(SESSION_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    debug!(method, "daemon issued a new session id");
                    *self.session_id.borrow_mut() = id;
                    continue;
                }
                StatusCode::UNAUTHORIZED => return Err(RpcError::Unauthorized),
                status if !status.is_success() => return Err(RpcError::Status(status.as_u16())),
                _ => {}
            }

            let text = response.text()?;
            let reply: Reply<T> = serde_json::from_str(&text)?;
            if reply.result != "success" {
                return Err(RpcError::Daemon(reply.result));
            }
            return Ok(reply.arguments);
        }

        Err(RpcError::SessionHandshake)
    }
}

impl RpcClient for TransmissionClient {
    fn torrent_get(&self, fields: &[&str], ids: Option<&[i64]>) -> Result<Vec<Torrent>, RpcError> {
        let mut arguments = json!({ "fields": fields });
        if let Some(ids) = ids {
            arguments["ids"] = json!(ids);
        }
        debug!(?fields, ?ids, "torrent-get");
        let list: TorrentList = self.call("torrent-get", arguments)?;
        Ok(list.torrents)
    }

    fn session_get(&self) -> Result<SessionSettings, RpcError> {
        debug!("session-get");
        self.call("session-get", json!({}))
    }

    fn torrent_start(&self, ids: &[i64], now: bool) -> Result<(), RpcError> {
        let method = if now { "torrent-start-now" } else { "torrent-start" };
        self.act(method, json!({ "ids": ids }))
    }

    fn torrent_stop(&self, ids: &[i64]) -> Result<(), RpcError> {
        self.act("torrent-stop", json!({ "ids": ids }))
    }

    fn torrent_verify(&self, ids: &[i64]) -> Result<(), RpcError> {
        self.act("torrent-verify", json!({ "ids": ids }))
    }

    fn torrent_remove(&self, ids: &[i64], delete_local_data: bool) -> Result<(), RpcError> {
        self.act(
            "torrent-remove",
            json!({ "ids": ids, "delete-local-data": delete_local_data }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_url_from_settings() {
        let settings = RpcSettings {
            host: "nas.local".to_string(),
            port: 9092,
            ..RpcSettings::default()
        };
        let client = TransmissionClient::new(&settings).unwrap();
        assert_eq!(client.url(), "http://nas.local:9092/transmission/rpc");
    }

    #[test]
    fn test_reply_decoding() {
        let text = r#"{"result": "success", "arguments": {"torrents": [{"id": 3, "name": "x"}]}}"#;
        let reply: Reply<TorrentList> = serde_json::from_str(text).unwrap();
        assert_eq!(reply.result, "success");
        assert_eq!(reply.arguments.unwrap().torrents[0].id, 3);

        let failed: Reply<TorrentList> =
            serde_json::from_str(r#"{"result": "invalid argument"}"#).unwrap();
        assert!(failed.arguments.is_none());

        let action: Reply<Value> = serde_json::from_str(r#"{"result": "success", "arguments": {}}"#).unwrap();
        assert_eq!(action.arguments, Some(json!({})));
    }
}

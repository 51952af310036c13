//! In-process daemon stand-in
//!
//! Serves a fixed roster and records every call, so callers can check how
//! many round trips a lookup cost and which torrents an action touched.
//! Actions are recorded only; the roster never changes.

use std::cell::{Cell, RefCell};

use super::{RpcClient, RpcError, SessionSettings, Torrent};

/// A recorded call against a [`MemoryClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcCall {
    TorrentGet {
        fields: Vec<String>,
        ids: Option<Vec<i64>>,
    },
    SessionGet,
    Start {
        ids: Vec<i64>,
        now: bool,
    },
    Stop {
        ids: Vec<i64>,
    },
    Verify {
        ids: Vec<i64>,
    },
    Remove {
        ids: Vec<i64>,
        delete_local_data: bool,
    },
}

impl RpcCall {
    /// True for calls that change daemon state
    #[must_use]
    pub const fn is_action(&self) -> bool {
        !matches!(self, Self::TorrentGet { .. } | Self::SessionGet)
    }
}

/// Fixed roster served from memory
#[derive(Debug, Default)]
pub struct MemoryClient {
    torrents: Vec<Torrent>,
    session: SessionSettings,
    calls: RefCell<Vec<RpcCall>>,
    offline: Cell<bool>,
}

impl MemoryClient {
    /// Create a client serving `torrents` in the given order
    #[must_use]
    pub fn new(torrents: Vec<Torrent>) -> Self {
        Self {
            torrents,
            ..Self::default()
        }
    }

    /// Serve `dir` as the daemon's enabled incomplete directory
    #[must_use]
    pub fn with_incomplete_dir(mut self, dir: impl Into<String>) -> Self {
        self.session = SessionSettings {
            incomplete_dir_enabled: true,
            incomplete_dir: dir.into(),
        };
        self
    }

    /// Make every subsequent call fail with `RpcError::Unavailable`
    pub fn go_offline(&self) {
        self.offline.set(true);
    }

    /// Every call made so far, oldest first
    #[must_use]
    pub fn calls(&self) -> Vec<RpcCall> {
        self.calls.borrow().clone()
    }

    /// Number of `torrent-get` calls made so far
    #[must_use]
    pub fn torrent_gets(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| matches!(call, RpcCall::TorrentGet { .. }))
            .count()
    }

    /// Start, stop, verify and remove calls made so far, oldest first
    #[must_use]
    pub fn actions(&self) -> Vec<RpcCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.is_action())
            .cloned()
            .collect()
    }

    fn record(&self, call: RpcCall) -> Result<(), RpcError> {
        self.calls.borrow_mut().push(call);
        self.check_online()
    }

    fn check_online(&self) -> Result<(), RpcError> {
        if self.offline.get() {
            return Err(RpcError::Unavailable("memory client is offline".to_string()));
        }
        Ok(())
    }
}

impl RpcClient for MemoryClient {
    fn torrent_get(&self, fields: &[&str], ids: Option<&[i64]>) -> Result<Vec<Torrent>, RpcError> {
        self.calls.borrow_mut().push(RpcCall::TorrentGet {
            fields: fields.iter().map(ToString::to_string).collect(),
            ids: ids.map(<[i64]>::to_vec),
        });
        self.check_online()?;

        Ok(self
            .torrents
            .iter()
            .filter(|t| ids.is_none_or(|ids| ids.contains(&t.id)))
            .cloned()
            .collect())
    }

    fn session_get(&self) -> Result<SessionSettings, RpcError> {
        self.record(RpcCall::SessionGet)?;
        Ok(self.session.clone())
    }

    fn torrent_start(&self, ids: &[i64], now: bool) -> Result<(), RpcError> {
        self.record(RpcCall::Start {
            ids: ids.to_vec(),
            now,
        })
    }

    fn torrent_stop(&self, ids: &[i64]) -> Result<(), RpcError> {
        self.record(RpcCall::Stop { ids: ids.to_vec() })
    }

    fn torrent_verify(&self, ids: &[i64]) -> Result<(), RpcError> {
        self.record(RpcCall::Verify { ids: ids.to_vec() })
    }

    fn torrent_remove(&self, ids: &[i64], delete_local_data: bool) -> Result<(), RpcError> {
        self.record(RpcCall::Remove {
            ids: ids.to_vec(),
            delete_local_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn torrent(id: i64) -> Torrent {
        Torrent {
            id,
            name: format!("t{id}"),
            ..Torrent::default()
        }
    }

    #[test]
    fn test_fetch_all_and_by_id() {
        let client = MemoryClient::new(vec![torrent(1), torrent(2), torrent(3)]);

        assert_eq!(client.torrent_get(&["id"], None).unwrap().len(), 3);

        let picked = client.torrent_get(&["id"], Some(&[3, 1])).unwrap();
        let ids: Vec<i64> = picked.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(client.torrent_gets(), 2);
    }

    #[test]
    fn test_calls_are_recorded() {
        let client = MemoryClient::new(vec![]).with_incomplete_dir("/part");
        let session = client.session_get().unwrap();
        assert_eq!(session.incomplete_dir(), Some("/part"));
        client.torrent_get(&["id", "name"], Some(&[9])).unwrap();

        assert_eq!(
            client.calls(),
            vec![
                RpcCall::SessionGet,
                RpcCall::TorrentGet {
                    fields: vec!["id".to_string(), "name".to_string()],
                    ids: Some(vec![9]),
                },
            ]
        );
    }

    #[test]
    fn test_offline_client_fails() {
        let client = MemoryClient::new(vec![torrent(1)]);
        client.go_offline();
        assert!(matches!(
            client.torrent_get(&["id"], None),
            Err(RpcError::Unavailable(_))
        ));
        assert!(client.session_get().is_err());
        assert!(client.torrent_stop(&[1]).is_err());
    }

    #[test]
    fn test_actions_are_recorded_apart_from_fetches() {
        let client = MemoryClient::new(vec![torrent(1), torrent(2)]);
        client.torrent_get(&["id"], None).unwrap();
        client.torrent_start(&[1], true).unwrap();
        client.torrent_remove(&[2], false).unwrap();

        assert_eq!(client.calls().len(), 3);
        assert_eq!(
            client.actions(),
            vec![
                RpcCall::Start { ids: vec![1], now: true },
                RpcCall::Remove {
                    ids: vec![2],
                    delete_local_data: false,
                },
            ]
        );
        assert_eq!(client.torrent_get(&["id"], None).unwrap().len(), 2);
    }
}

//! Errors raised while talking to the daemon
//!
//! All of these are fatal for the pipeline: they point at connectivity or
//! daemon problems, never at user input.

use thiserror::Error;

/// Daemon and transport errors
#[derive(Debug, Error)]
pub enum RpcError {
    /// The HTTP request could not be sent or its body could not be read
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not the JSON we expected
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The daemon rejected our credentials
    #[error("authentication failed (HTTP 401)")]
    Unauthorized,

    /// The daemon kept refusing the session id it handed out
    #[error("daemon did not accept session id after handshake")]
    SessionHandshake,

    /// Any other non-success HTTP status
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// The daemon answered, but with a failure result string
    #[error("daemon returned '{0}'")]
    Daemon(String),

    /// The client is not able to serve requests at all
    #[error("daemon unavailable: {0}")]
    Unavailable(String),
}

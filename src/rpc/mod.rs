//! Daemon access
//!
//! The selection pipeline only ever reads from the daemon: a `torrent-get`
//! with a field list and an optional id list, and a `session-get` for the
//! incomplete-directory settings. The acting commands add start, stop,
//! verify and remove calls for the torrents it selected. [`RpcClient`] is
//! that seam. Two implementations ship with the crate:
//!
//! - [`TransmissionClient`]: blocking JSON-RPC over HTTP
//! - [`MemoryClient`]: a fixed in-process roster that records every call

pub mod error;
pub mod memory;
pub mod transmission;
pub mod types;

pub use error::RpcError;
pub use memory::{MemoryClient, RpcCall};
pub use transmission::TransmissionClient;
pub use types::{SessionSettings, Torrent, TorrentFile, TorrentStatus, Tracker};

/// A download daemon
///
/// Every call blocks until the daemon answers. Implementations never retry
/// on their own beyond protocol handshakes.
pub trait RpcClient {
    /// Fetch snapshots for the given ids, or for every torrent when `ids` is
    /// `None`
    ///
    /// Only the listed `fields` are guaranteed to be populated; the rest keep
    /// their defaults.
    ///
    /// # Errors
    ///
    /// Returns `RpcError` if the daemon cannot be reached or rejects the call.
    fn torrent_get(&self, fields: &[&str], ids: Option<&[i64]>) -> Result<Vec<Torrent>, RpcError>;

    /// Fetch the session settings relevant to path resolution
    ///
    /// # Errors
    ///
    /// Returns `RpcError` if the daemon cannot be reached or rejects the call.
    fn session_get(&self) -> Result<SessionSettings, RpcError>;

    /// Start torrents; `now` skips the daemon's download queue
    ///
    /// # Errors
    ///
    /// Returns `RpcError` if the daemon cannot be reached or rejects the call.
    fn torrent_start(&self, ids: &[i64], now: bool) -> Result<(), RpcError>;

    /// Stop torrents
    ///
    /// # Errors
    ///
    /// Returns `RpcError` if the daemon cannot be reached or rejects the call.
    fn torrent_stop(&self, ids: &[i64]) -> Result<(), RpcError>;

    /// Queue torrents for a hash check
    ///
    /// # Errors
    ///
    /// Returns `RpcError` if the daemon cannot be reached or rejects the call.
    fn torrent_verify(&self, ids: &[i64]) -> Result<(), RpcError>;

    /// Remove torrents, and with `delete_local_data` their downloaded data
    ///
    /// # Errors
    ///
    /// Returns `RpcError` if the daemon cannot be reached or rejects the call.
    fn torrent_remove(&self, ids: &[i64], delete_local_data: bool) -> Result<(), RpcError>;
}

impl<T: RpcClient + ?Sized> RpcClient for &T {
    fn torrent_get(&self, fields: &[&str], ids: Option<&[i64]>) -> Result<Vec<Torrent>, RpcError> {
        (**self).torrent_get(fields, ids)
    }

    fn session_get(&self) -> Result<SessionSettings, RpcError> {
        (**self).session_get()
    }

    fn torrent_start(&self, ids: &[i64], now: bool) -> Result<(), RpcError> {
        (**self).torrent_start(ids, now)
    }

    fn torrent_stop(&self, ids: &[i64]) -> Result<(), RpcError> {
        (**self).torrent_stop(ids)
    }

    fn torrent_verify(&self, ids: &[i64]) -> Result<(), RpcError> {
        (**self).torrent_verify(ids)
    }

    fn torrent_remove(&self, ids: &[i64], delete_local_data: bool) -> Result<(), RpcError> {
        (**self).torrent_remove(ids, delete_local_data)
    }
}

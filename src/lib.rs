//! trpc - torrent selection for a remote Transmission daemon
//!
//! This library resolves command-line arguments (numeric torrent ids or
//! filesystem paths) into a set of torrents, evaluates boolean filter
//! expressions over derived torrent attributes, and hands each match to a
//! caller-supplied callback, optionally accumulating a running total.

use thiserror::Error;

pub mod cli;
pub mod commands;
pub mod config;
pub mod expr;
pub mod filter;
pub mod finder;
pub mod logging;
pub mod output;
pub mod paths;
pub mod resolve;
pub mod rpc;
pub mod select;
pub mod torrent;

/// Error enum, contains all failure states of the program
#[derive(Debug, Error)]
pub enum TrpcError {
    /// The daemon or its transport failed
    #[error("RPC error: {0}")]
    Rpc(#[from] rpc::RpcError),
    /// A filter expression failed to parse or evaluate
    #[error("{0}")]
    Filter(#[from] filter::FilterError),
    /// Represents a configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
    /// Represents an I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Arguments were given but none of them named a torrent
    #[error("No torrent matched the given argument(s): {}", .0.join(", "))]
    Unresolved(Vec<String>),
    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

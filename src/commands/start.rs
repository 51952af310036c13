//! Start command - resume stopped torrents

use std::io::Write;

use crate::{
    TrpcError,
    cli::FilterArgs,
    config::TrpcConfig,
    output,
    resolve::UnmatchedPolicy,
    rpc::{RpcClient, TorrentStatus},
    select::{Request, process_torrents},
    torrent::Deriver,
};

type Result<T> = std::result::Result<T, TrpcError>;

/// Execute the start command
///
/// Only stopped torrents are started. With `now` they bypass the daemon's
/// download queue. With `dry_run` nothing is sent, but the report is
/// printed all the same.
///
/// # Errors
///
/// Returns `TrpcError` if the filter is invalid, the daemon fails, no
/// argument resolves, or writing fails.
#[allow(clippy::too_many_arguments)]
pub fn execute<C: RpcClient, W: Write>(
    client: &C,
    config: &TrpcConfig,
    torrents: &[String],
    filter: &FilterArgs,
    now: bool,
    dry_run: bool,
    out: &mut W,
) -> Result<()> {
    let deriver = Deriver::new(&config.trackernames, config.zero_size());
    let request = Request::new(torrents.to_vec())
        .filter(filter.into())
        .policy(UnmatchedPolicy::Abort);

    process_torrents(client, &request, &deriver, |torrent, _| {
        if !matches!(torrent.state(), TorrentStatus::Stopped) {
            return Ok(());
        }
        if !dry_run {
            client.torrent_start(&[torrent.id], now)?;
        }
        writeln!(out, "{}", output::status_line("Started torrent", torrent, dry_run))?;
        Ok(())
    })?;
    Ok(())
}

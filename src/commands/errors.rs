//! Errors command - torrents the daemon reports a problem for

use std::io::Write;

use crate::{
    TrpcError,
    cli::FilterArgs,
    config::TrpcConfig,
    output,
    resolve::UnmatchedPolicy,
    rpc::RpcClient,
    select::{Request, process_torrents},
    torrent::Deriver,
};

type Result<T> = std::result::Result<T, TrpcError>;

/// Execute the errors command
///
/// Path arguments that match nothing are ignored; if none resolve, every
/// torrent is checked.
///
/// # Errors
///
/// Returns `TrpcError` if the filter is invalid, the daemon fails or writing
/// fails.
pub fn execute<C: RpcClient, W: Write>(
    client: &C,
    config: &TrpcConfig,
    torrents: &[String],
    filter: &FilterArgs,
    out: &mut W,
) -> Result<()> {
    let deriver = Deriver::new(&config.trackernames, config.zero_size());
    let request = Request::new(torrents.to_vec())
        .filter(filter.into())
        .fields(&["errorString"])
        .policy(UnmatchedPolicy::Ignore);

    process_torrents(client, &request, &deriver, |torrent, _| {
        if torrent.error != 0 {
            writeln!(out, "{}", output::error_line(torrent))?;
        }
        Ok(())
    })?;
    Ok(())
}

//! Verify command - hash check torrents

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

/// Execute the verify command
///
/// Without torrent arguments every torrent would be checked, so that
/// requires `force_all`.
///
/// # Errors
///
/// Returns `TrpcError::InvalidInput` when no torrents are named and
/// `force_all` is not set, and `TrpcError` if the filter is invalid, the
/// daemon fails, no argument resolves, or writing fails.
#[allow(clippy::too_many_arguments)]
pub fn execute<C: RpcClient, W: Write>(
    client: &C,
    config: &TrpcConfig,
    torrents: &[String],
    filter: &FilterArgs,
    force_all: bool,
    dry_run: bool,
    out: &mut W,
) -> Result<()> {
    if torrents.is_empty() && !force_all {
        return Err(TrpcError::InvalidInput(
            "Use --force-all if you really want to verify all torrents!".to_string(),
        ));
    }

    let deriver = Deriver::new(&config.trackernames, config.zero_size());
    let request = Request::new(torrents.to_vec())
        .filter(filter.into())
        .policy(UnmatchedPolicy::Abort);

    process_torrents(client, &request, &deriver, |torrent, _| {
        if !dry_run {
            client.torrent_verify(&[torrent.id])?;
        }
        writeln!(out, "{}", output::status_line("Verifying torrent", torrent, dry_run))?;
        Ok(())
    })?;
    Ok(())
}

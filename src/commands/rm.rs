//! Rm command - remove torrents from the daemon

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

/// Options for the rm command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveOptions {
    /// Allow removing every torrent when none are named
    pub force_all: bool,
    /// Delete the downloaded data as well
    pub nuke: bool,
    /// Report what would be removed without removing it
    pub dry_run: bool,
}

/// Execute the rm command
///
/// # Errors
///
/// Returns `TrpcError::InvalidInput` when no torrents are named and
/// `force_all` is not set, and `TrpcError` if the filter is invalid, the
/// daemon fails, no argument resolves, or writing fails.
pub fn execute<C: RpcClient, W: Write>(
    client: &C,
    config: &TrpcConfig,
    torrents: &[String],
    filter: &FilterArgs,
    options: RemoveOptions,
    out: &mut W,
) -> Result<()> {
    if torrents.is_empty() && !options.force_all {
        return Err(TrpcError::InvalidInput(
            "Use --force-all if you really want to delete all torrents!".to_string(),
        ));
    }

    let deriver = Deriver::new(&config.trackernames, config.zero_size());
    let request = Request::new(torrents.to_vec())
        .filter(filter.into())
        .policy(UnmatchedPolicy::Abort);

    process_torrents(client, &request, &deriver, |torrent, _| {
        if !options.dry_run {
            client.torrent_remove(&[torrent.id], options.nuke)?;
        }
        writeln!(
            out,
            "{}",
            output::status_line("Removed torrent", torrent, options.dry_run)
        )?;
        Ok(())
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::{MemoryClient, RpcCall, Torrent};

    fn client() -> MemoryClient {
        MemoryClient::new(vec![
            Torrent {
                id: 4,
                name: "old".to_string(),
                ..Torrent::default()
            },
            Torrent {
                id: 5,
                name: "new".to_string(),
                ..Torrent::default()
            },
        ])
    }

    fn run(client: &MemoryClient, torrents: &[&str], options: RemoveOptions) -> Result<String> {
        let torrents: Vec<String> = torrents.iter().map(ToString::to_string).collect();
        let mut out = Vec::new();
        execute(client, &TrpcConfig::default(), &torrents, &FilterArgs::default(), options, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_rm_all_needs_force() {
        let client = client();
        assert!(matches!(
            run(&client, &[], RemoveOptions::default()),
            Err(TrpcError::InvalidInput(_))
        ));
        assert!(client.calls().is_empty());
    }

    #[test]
    fn test_rm_with_nuke() {
        let client = client();
        let options = RemoveOptions {
            nuke: true,
            ..RemoveOptions::default()
        };
        assert_eq!(run(&client, &["4"], options).unwrap(), "Removed torrent 4: old\n");
        assert_eq!(
            client.actions(),
            vec![RpcCall::Remove {
                ids: vec![4],
                delete_local_data: true,
            }]
        );
    }

    #[test]
    fn test_rm_dry_run_forced() {
        let client = client();
        let options = RemoveOptions {
            force_all: true,
            dry_run: true,
            ..RemoveOptions::default()
        };
        assert_eq!(
            run(&client, &[], options).unwrap(),
            "[dry run] Removed torrent 4: old\n[dry run] Removed torrent 5: new\n"
        );
        assert!(client.actions().is_empty());
    }

    #[test]
    fn test_rm_unmatched_path_removes_nothing() {
        let client = client();
        let result = run(&client, &["/no/such/torrent/anywhere"], RemoveOptions::default());
        assert!(matches!(result, Err(TrpcError::Unresolved(_))));
        assert!(client.actions().is_empty());
    }
}

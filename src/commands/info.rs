//! Info command - detailed view of selected torrents

use std::io::Write;

use crate::{
    TrpcError,
    cli::FilterArgs,
    commands::OutputStyle,
    config::TrpcConfig,
    output,
    resolve::UnmatchedPolicy,
    rpc::RpcClient,
    select::{Request, process_torrents},
    torrent::Deriver,
};

type Result<T> = std::result::Result<T, TrpcError>;

/// Execute the info command
///
/// # Errors
///
/// Returns `TrpcError` if the filter is invalid, the daemon fails, no
/// argument resolves, or writing fails.
pub fn execute<C: RpcClient, W: Write>(
    client: &C,
    config: &TrpcConfig,
    torrents: &[String],
    filter: &FilterArgs,
    style: OutputStyle,
    out: &mut W,
) -> Result<()> {
    let deriver = Deriver::new(&config.trackernames, config.zero_size());
    let request = Request::new(torrents.to_vec())
        .filter(filter.into())
        .fields(&["hashString", "downloadDir", "errorString"])
        .policy(UnmatchedPolicy::Abort);

    let mut first = true;
    process_torrents(client, &request, &deriver, |torrent, record| {
        if !first && !style.quiet {
            writeln!(out)?;
        }
        first = false;
        for line in output::info_lines(torrent, record) {
            writeln!(out, "{line}")?;
        }
        Ok(())
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::{MemoryClient, Torrent};

    #[test]
    fn test_info_for_selected_torrent() {
        let client = MemoryClient::new(vec![
            Torrent {
                id: 4,
                name: "debian.iso".to_string(),
                hash_string: "abc123".to_string(),
                download_dir: "/srv/dl".to_string(),
                status: 6,
                ..Torrent::default()
            },
            Torrent {
                id: 5,
                name: "other".to_string(),
                ..Torrent::default()
            },
        ]);
        let mut out = Vec::new();
        execute(
            &client,
            &TrpcConfig::default(),
            &["4".to_string()],
            &FilterArgs::default(),
            OutputStyle::default(),
            &mut out,
        )
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Id:           4\nName:         debian.iso\nHash:         abc123\n"));
        assert!(text.contains("Status:       Seeding\n"));
        assert!(text.contains("Location:     /srv/dl\n"));
        assert!(!text.contains("other"));
    }
}

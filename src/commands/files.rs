//! Files command - per-file progress of selected torrents

use std::io::Write;

use colored::Colorize;

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

/// Execute the files command
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
        .fields(&["files", "priorities", "wanted"])
        .policy(UnmatchedPolicy::Abort);

    let mut first = true;
    process_torrents(client, &request, &deriver, |torrent, _| {
        if !first && !style.quiet {
            writeln!(out)?;
        }
        first = false;

        if !style.quiet {
            let title = output::files_title(torrent);
            if style.color {
                writeln!(out, "{}", title.bold())?;
            } else {
                writeln!(out, "{title}")?;
            }
        }
        for line in output::file_lines(torrent) {
            writeln!(out, "{line}")?;
        }
        Ok(())
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::{MemoryClient, Torrent, TorrentFile};

    fn torrent(id: i64, name: &str, file: &str) -> Torrent {
        Torrent {
            id,
            name: name.to_string(),
            files: vec![TorrentFile {
                name: file.to_string(),
                length: 1024,
                bytes_completed: 1024,
            }],
            priorities: vec![0],
            wanted: vec![true],
            ..Torrent::default()
        }
    }

    #[test]
    fn test_files_tables_separated_by_blank_line() {
        let client = MemoryClient::new(vec![torrent(1, "Show", "Show/a.mkv"), torrent(2, "b.iso", "b.iso")]);
        let mut out = Vec::new();
        execute(
            &client,
            &TrpcConfig::default(),
            &[],
            &FilterArgs::default(),
            OutputStyle::default(),
            &mut out,
        )
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Show (1 files)",
                "   0 100.0% normal  yes      1.0 KiB  a.mkv",
                "",
                "b.iso (1 files)",
                "   0 100.0% normal  yes      1.0 KiB  b.iso",
            ]
        );
    }

    #[test]
    fn test_files_quiet_prints_only_rows() {
        let client = MemoryClient::new(vec![torrent(1, "Show", "Show/a.mkv"), torrent(2, "b.iso", "b.iso")]);
        let mut out = Vec::new();
        let style = OutputStyle {
            quiet: true,
            color: false,
        };
        execute(&client, &TrpcConfig::default(), &[], &FilterArgs::default(), style, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 2);
    }
}

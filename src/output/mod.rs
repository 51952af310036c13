//! Output formatting for CLI display
//!
//! Every function here returns plain text; colouring is applied separately
//! so the layout can be tested without terminal escapes.

use byte_unit::{Byte, UnitType};
use chrono::DateTime;
use colored::Colorize;

use crate::finder::{FileIndex, Location};
use crate::rpc::Torrent;
use crate::torrent::{self, Derived};

/// Human readable byte count with binary units
#[must_use]
pub fn human_size(bytes: i64) -> String {
    let bytes = u64::try_from(bytes).unwrap_or(0);
    let adjusted = Byte::from_u64(bytes).get_appropriate_unit(UnitType::Binary);
    format!("{adjusted:.1}")
}

/// Unix timestamp as UTC text, or `-` when unset
#[must_use]
pub fn timestamp(secs: i64) -> String {
    if secs <= 0 {
        return "-".to_string();
    }
    DateTime::from_timestamp(secs, 0)
        .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Column titles matching [`list_line`]
#[must_use]
pub fn list_header() -> String {
    format!(
        "{:>4}   {:>7}  {:>12} {:<8} {:>8} {:>8} {:>6} {:<6}  {:<4}  {}",
        "ID", "Done", "Size", "ETA", "Up", "Down", "Ratio", "Prio", "Trk", "Name"
    )
}

/// One line of `list` output; the total line has no id
#[must_use]
pub fn list_line(record: &Derived) -> String {
    let id = record.id.map(|id| id.to_string()).unwrap_or_default();
    format!(
        "{id:>4} {} {:>6.1}%  {:>12} {:<8} {:>8} {:>8} {:>6.1} {:<6}  {:<4}  {}",
        record.error_marker,
        record.percent,
        human_size(record.size),
        record.eta,
        record.up,
        record.down,
        record.ratio,
        record.priority,
        record.tracker,
        record.name,
    )
}

/// Colour a formatted list line: totals bold, errored torrents red
#[must_use]
pub fn colorize_list_line(line: &str, record: &Derived) -> String {
    if record.id.is_none() {
        line.bold().to_string()
    } else if record.error_marker == "*" {
        line.red().to_string()
    } else if record.is_complete() {
        line.green().to_string()
    } else {
        line.to_string()
    }
}

/// Answer for one `which` query
#[must_use]
pub fn which_line(path: &str, location: &Location) -> String {
    let what = match location.index {
        FileIndex::File(n) => format!("file {n}"),
        FileIndex::WholeTorrent | FileIndex::Unresolved => "directory".to_string(),
    };
    format!(
        "{path} belongs to torrent {}: {} ({what})",
        location.torrent_id, location.torrent_name
    )
}

/// Diagnostic for a path no torrent claims
#[must_use]
pub fn not_found(path: &str) -> String {
    format!("Couldn't find a torrent for {path}")
}

/// One line of `errors` output
#[must_use]
pub fn error_line(torrent: &Torrent) -> String {
    format!("{:>4}  {}: {}", torrent.id, torrent.name, torrent.error_string)
}

/// Report of an action taken, or with `dry_run` skipped, on one torrent
#[must_use]
pub fn status_line(message: &str, torrent: &Torrent, dry_run: bool) -> String {
    let prefix = if dry_run { "[dry run] " } else { "" };
    format!("{prefix}{message} {}: {}", torrent.id, torrent.name)
}

/// Title line above a torrent's file table
#[must_use]
pub fn files_title(torrent: &Torrent) -> String {
    format!("{} ({} files)", torrent.name, torrent.files.len())
}

/// File table of one torrent
///
/// Names are shown relative to the torrent's own directory.
#[must_use]
pub fn file_lines(torrent: &Torrent) -> Vec<String> {
    let prefix = format!("{}/", torrent.name);
    torrent
        .files
        .iter()
        .enumerate()
        .map(|(i, file)| {
            let percent = torrent::file_progress(torrent, i).unwrap_or(0.0) * 100.0;
            let wanted = if torrent::wanted(torrent, i) { "yes" } else { "no" };
            let name = file.name.strip_prefix(&prefix).unwrap_or(&file.name);
            format!(
                "{i:>4} {percent:>5.1}% {:<7} {wanted:<3} {:>12}  {name}",
                torrent::file_priority(torrent, i),
                human_size(file.length),
            )
        })
        .collect()
}

/// `info` block for one torrent
#[must_use]
pub fn info_lines(torrent: &Torrent, record: &Derived) -> Vec<String> {
    let mut lines = vec![
        format!("Id:           {}", torrent.id),
        format!("Name:         {}", torrent.name),
        format!("Hash:         {}", torrent.hash_string),
        format!("Status:       {}", record.status),
        format!("Location:     {}", torrent.download_dir),
        format!(
            "Progress:     {:.1}% of {} ({} left)",
            record.percent,
            human_size(record.size),
            human_size(record.left_until_done)
        ),
        format!("ETA:          {}", record.eta),
        format!("Uploaded:     {} (ratio {:.2})", human_size(record.uploaded), record.ratio),
        format!("Priority:     {}", record.priority),
        format!("Added:        {}", timestamp(torrent.added_date)),
        format!("Completed:    {}", timestamp(torrent.done_date)),
    ];
    if torrent.error != 0 {
        lines.push(format!("Error:        {}", torrent.error_string));
    }
    lines.push(format!("Tracker:      {}", record.tracker));
    lines.extend(torrent.trackers.iter().map(|t| format!("  {}", t.announce)));
    lines
}

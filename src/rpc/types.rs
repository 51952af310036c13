//! Snapshot types returned by the daemon
//!
//! Field names follow the Transmission RPC spelling (camelCase for torrent
//! fields, kebab-case for session fields). Every field has a default because
//! the daemon only returns the fields that were asked for.

use serde::{Deserialize, Deserializer, Serialize};

/// Raw field values for one torrent as of one fetch
///
/// A snapshot is never mutated after it is fetched; a new fetch produces a
/// new value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Torrent {
    pub id: i64,
    pub name: String,
    pub download_dir: String,
    pub hash_string: String,
    pub size_when_done: i64,
    pub left_until_done: i64,
    pub rate_upload: i64,
    pub rate_download: i64,
    pub uploaded_ever: i64,
    pub recheck_progress: f64,
    pub bandwidth_priority: i64,
    pub status: i64,
    pub error: i64,
    pub error_string: String,
    pub eta: i64,
    pub added_date: i64,
    pub done_date: i64,
    pub trackers: Vec<Tracker>,
    pub files: Vec<TorrentFile>,
    pub priorities: Vec<i64>,
    #[serde(deserialize_with = "flags")]
    pub wanted: Vec<bool>,
}

impl Torrent {
    /// Decoded status code
    #[must_use]
    pub const fn state(&self) -> TorrentStatus {
        TorrentStatus::from_code(self.status)
    }
}

/// One tracker entry of a torrent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tracker {
    pub announce: String,
}

impl Tracker {
    #[must_use]
    pub fn new(announce: impl Into<String>) -> Self {
        Self {
            announce: announce.into(),
        }
    }
}

/// One file of a torrent, named relative to the download directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TorrentFile {
    pub name: String,
    pub length: i64,
    pub bytes_completed: i64,
}

/// Session settings consulted by path resolution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SessionSettings {
    pub incomplete_dir_enabled: bool,
    pub incomplete_dir: String,
}

impl SessionSettings {
    /// The incomplete directory, if the feature is enabled
    #[must_use]
    pub fn incomplete_dir(&self) -> Option<&str> {
        (self.incomplete_dir_enabled && !self.incomplete_dir.is_empty())
            .then_some(self.incomplete_dir.as_str())
    }
}

/// Torrent activity state as reported by the daemon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TorrentStatus {
    Stopped,
    CheckWait,
    Check,
    DownloadWait,
    Download,
    SeedWait,
    Seed,
    Isolated,
    Unknown(i64),
}

impl TorrentStatus {
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Stopped,
            1 => Self::CheckWait,
            2 => Self::Check,
            3 => Self::DownloadWait,
            4 => Self::Download,
            5 => Self::SeedWait,
            6 => Self::Seed,
            7 => Self::Isolated,
            other => Self::Unknown(other),
        }
    }

    /// Human readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Stopped => "Stopped",
            Self::CheckWait => "To Hash",
            Self::Check => "Hashing",
            Self::DownloadWait | Self::SeedWait => "Queued",
            Self::Download => "Downloading",
            Self::Seed => "Seeding",
            Self::Isolated => "No peers",
            Self::Unknown(_) => "Unknown",
        }
    }

    /// True while data is actually moving; other states replace the rate
    /// columns in listings
    #[must_use]
    pub const fn is_transferring(self) -> bool {
        matches!(self, Self::Download | Self::Seed)
    }
}

/// Older daemons send `wanted` as 0/1 integers, newer ones as booleans
fn flags<'de, D>(deserializer: D) -> Result<Vec<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    let raw = Vec::<Flag>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|flag| match flag {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_partial_torrent() {
        let json = r#"{"id": 7, "name": "debian.iso", "downloadDir": "/srv/dl"}"#;
        let torrent: Torrent = serde_json::from_str(json).unwrap();
        assert_eq!(torrent.id, 7);
        assert_eq!(torrent.name, "debian.iso");
        assert_eq!(torrent.download_dir, "/srv/dl");
        assert_eq!(torrent.size_when_done, 0);
        assert!(torrent.trackers.is_empty());
    }

    #[test]
    fn test_deserialize_wanted_as_integers_or_bools() {
        let ints: Torrent = serde_json::from_str(r#"{"wanted": [1, 0, 1]}"#).unwrap();
        assert_eq!(ints.wanted, vec![true, false, true]);

        let bools: Torrent = serde_json::from_str(r#"{"wanted": [false, true]}"#).unwrap();
        assert_eq!(bools.wanted, vec![false, true]);
    }

    #[test]
    fn test_deserialize_files_and_trackers() {
        let json = r#"{
            "files": [{"name": "d/a.mkv", "length": 10, "bytesCompleted": 5}],
            "trackers": [{"announce": "udp://tracker.example.org:6969", "tier": 0}]
        }"#;
        let torrent: Torrent = serde_json::from_str(json).unwrap();
        assert_eq!(torrent.files[0].bytes_completed, 5);
        assert_eq!(torrent.trackers[0].announce, "udp://tracker.example.org:6969");
    }

    #[test]
    fn test_session_incomplete_dir() {
        let json = r#"{"incomplete-dir-enabled": true, "incomplete-dir": "/srv/part", "version": "4.0"}"#;
        let session: SessionSettings = serde_json::from_str(json).unwrap();
        assert_eq!(session.incomplete_dir(), Some("/srv/part"));

        let disabled = SessionSettings {
            incomplete_dir_enabled: false,
            incomplete_dir: "/srv/part".to_string(),
        };
        assert_eq!(disabled.incomplete_dir(), None);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(TorrentStatus::from_code(0).label(), "Stopped");
        assert_eq!(TorrentStatus::from_code(3).label(), "Queued");
        assert_eq!(TorrentStatus::from_code(5).label(), "Queued");
        assert_eq!(TorrentStatus::from_code(7).label(), "No peers");
        assert_eq!(TorrentStatus::from_code(42), TorrentStatus::Unknown(42));
        assert!(TorrentStatus::Seed.is_transferring());
        assert!(!TorrentStatus::Stopped.is_transferring());
    }
}

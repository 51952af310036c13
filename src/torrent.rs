//! Derived torrent attributes
//!
//! Everything a listing or a filter wants to know about a torrent that the
//! daemon does not report directly: percent done, ETA text, ratio, priority
//! text, short tracker name and age. [`Deriver`] turns one snapshot into a
//! [`Derived`] record; [`Total`] sums records and recomputes the ratios from
//! the sums.

use chrono::Utc;
use reqwest::Url;

use crate::config::TrackerNames;
use crate::rpc::{Torrent, Tracker, TorrentStatus};

/// Bytes per KiB, the unit of the rate columns
pub const KIB: f64 = 1024.0;

const SHORT_NAME_LEN: usize = 3;

/// ETA buckets, largest first: (seconds per unit, unit name)
const ETA_UNITS: [(i64, &str); 6] = [
    (31_557_600, "years"),
    (2_629_800, "months"),
    (604_800, "weeks"),
    (86_400, "days"),
    (3_600, "hours"),
    (60, "mins"),
];

const PRIORITY_NAMES: [&str; 3] = ["low", "normal", "high"];

/// How to report progress for a torrent whose size is zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroSize {
    /// Treat it as complete (100%)
    #[default]
    Complete,
    /// Divide anyway, yielding NaN or an infinity
    Raw,
}

/// Bytes already downloaded
#[must_use]
pub const fn have(size_when_done: i64, left_until_done: i64) -> i64 {
    size_when_done - left_until_done
}

/// Percent done
///
/// A running hash check overrides normal progress.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn progress(size_when_done: i64, left_until_done: i64, recheck: f64, zero: ZeroSize) -> f64 {
    if recheck != 0.0 {
        return 100.0 * recheck;
    }
    if size_when_done == 0 && zero == ZeroSize::Complete {
        return 100.0;
    }
    100.0 * have(size_when_done, left_until_done) as f64 / size_when_done as f64
}

/// Upload ratio, without a guard against a zero size
///
/// ```
/// use trpc::torrent::ratio;
///
/// assert_eq!(ratio(4096, 8192), 0.5);
/// assert!(ratio(0, 0).is_nan());
/// assert_eq!(ratio(512, 0), f64::INFINITY);
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn ratio(uploaded: i64, size_when_done: i64) -> f64 {
    uploaded as f64 / size_when_done as f64
}

/// Bucket a number of seconds into the largest unit it exceeds three times
#[must_use]
pub fn format_eta(secs: i64) -> String {
    ETA_UNITS
        .iter()
        .find(|(amount, _)| secs > amount * 3)
        .map_or_else(
            || format!("{secs} secs"),
            |(amount, name)| format!("{} {name}", secs / amount),
        )
}

/// ETA column text
///
/// The daemon reports an ETA it cannot estimate as -1.
#[must_use]
pub fn eta_text(left_until_done: i64, eta: i64) -> String {
    if left_until_done == 0 {
        "Done".to_string()
    } else if eta == -1 {
        "Unknown".to_string()
    } else {
        format_eta(eta)
    }
}

/// Bandwidth priority as text
#[must_use]
pub fn priority_text(priority: i64) -> &'static str {
    priority
        .checked_add(1)
        .and_then(|i| usize::try_from(i).ok())
        .and_then(|i| PRIORITY_NAMES.get(i))
        .copied()
        .unwrap_or("unknown")
}

/// Hostnames of all trackers whose announce URL parses
#[must_use]
pub fn tracker_hosts(trackers: &[Tracker]) -> Vec<String> {
    trackers
        .iter()
        .filter_map(|t| Url::parse(&t.announce).ok())
        .filter_map(|url| url.host_str().map(str::to_string))
        .collect()
}

/// Short display name for a torrent's trackers
///
/// Trackers are tried in announce order against `names`. Without a
/// configured match the first tracker's hostname is cut to three characters.
#[must_use]
pub fn tracker_short_name(trackers: &[Tracker], names: &TrackerNames) -> String {
    if let Some(short) = trackers.iter().find_map(|t| names.lookup(&t.announce)) {
        return short.to_string();
    }

    trackers
        .first()
        .and_then(|t| Url::parse(&t.announce).ok())
        .and_then(|url| url.host_str().map(str::to_string))
        .filter(|host| host.len() >= SHORT_NAME_LEN)
        .map_or_else(|| "UNK".to_string(), |host| host.chars().take(SHORT_NAME_LEN).collect())
}

/// Seconds since the torrent was added or finished, whichever is later
#[must_use]
pub fn age(added_date: i64, done_date: i64, now: i64) -> i64 {
    now - added_date.max(done_date)
}

/// Fraction of file `index` downloaded; an empty file counts as done
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn file_progress(torrent: &Torrent, index: usize) -> Option<f64> {
    torrent.files.get(index).map(|file| {
        if file.length == 0 {
            1.0
        } else {
            file.bytes_completed as f64 / file.length as f64
        }
    })
}

/// Priority text of file `index`
#[must_use]
pub fn file_priority(torrent: &Torrent, index: usize) -> &'static str {
    torrent
        .priorities
        .get(index)
        .map_or("unknown", |&p| priority_text(p))
}

/// Whether file `index` is selected for download
#[must_use]
pub fn wanted(torrent: &Torrent, index: usize) -> bool {
    torrent.wanted.get(index).copied().unwrap_or(true)
}

/// Rate column text: KiB/s while transferring, the status label otherwise
#[allow(clippy::cast_precision_loss)]
fn rate_text(rate: i64, status: Option<TorrentStatus>) -> String {
    match status {
        Some(status) if !status.is_transferring() => status.label().to_string(),
        _ => format!("{:7.1}", rate as f64 / KIB),
    }
}

/// Display and filter fields for one torrent
///
/// The raw numeric fields are kept so records can be summed into a
/// [`Total`] and sorted.
#[derive(Debug, Clone, PartialEq)]
pub struct Derived {
    /// `None` for a total line
    pub id: Option<i64>,
    pub name: String,
    /// `"*"` when the daemon reports an error
    pub error_marker: &'static str,
    pub percent: f64,
    pub eta: String,
    pub ratio: f64,
    pub priority: &'static str,
    pub tracker: String,
    pub status: &'static str,
    pub up: String,
    pub down: String,
    pub age: i64,
    pub size: i64,
    pub left_until_done: i64,
    pub rate_upload: i64,
    pub rate_download: i64,
    pub uploaded: i64,
}

impl Derived {
    #[must_use]
    pub const fn have(&self) -> i64 {
        have(self.size, self.left_until_done)
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.left_until_done == 0
    }
}

/// Builds [`Derived`] records
///
/// Holds the tracker table and the clock explicitly so derivation is
/// repeatable in tests.
#[derive(Debug, Clone)]
pub struct Deriver<'a> {
    names: &'a TrackerNames,
    zero: ZeroSize,
    now: i64,
}

impl<'a> Deriver<'a> {
    /// Deriver using the current wall clock
    #[must_use]
    pub fn new(names: &'a TrackerNames, zero: ZeroSize) -> Self {
        Self::at(names, zero, Utc::now().timestamp())
    }

    /// Deriver with a fixed `now` in Unix seconds
    #[must_use]
    pub const fn at(names: &'a TrackerNames, zero: ZeroSize, now: i64) -> Self {
        Self { names, zero, now }
    }

    #[must_use]
    pub const fn zero_size(&self) -> ZeroSize {
        self.zero
    }

    #[must_use]
    pub const fn names(&self) -> &TrackerNames {
        self.names
    }

    /// The clock derivations are computed against, in Unix seconds
    #[must_use]
    pub const fn now(&self) -> i64 {
        self.now
    }

    #[must_use]
    pub fn derive(&self, torrent: &Torrent) -> Derived {
        let state = torrent.state();
        Derived {
            id: Some(torrent.id),
            name: torrent.name.clone(),
            error_marker: if torrent.error == 0 { " " } else { "*" },
            percent: progress(
                torrent.size_when_done,
                torrent.left_until_done,
                torrent.recheck_progress,
                self.zero,
            ),
            eta: eta_text(torrent.left_until_done, torrent.eta),
            ratio: ratio(torrent.uploaded_ever, torrent.size_when_done),
            priority: priority_text(torrent.bandwidth_priority),
            tracker: tracker_short_name(&torrent.trackers, self.names),
            status: state.label(),
            up: rate_text(torrent.rate_upload, Some(state)),
            down: rate_text(torrent.rate_download, Some(state)),
            age: age(torrent.added_date, torrent.done_date, self.now),
            size: torrent.size_when_done,
            left_until_done: torrent.left_until_done,
            rate_upload: torrent.rate_upload,
            rate_download: torrent.rate_download,
            uploaded: torrent.uploaded_ever,
        }
    }
}

/// Running sum over matched records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Total {
    count: usize,
    size: i64,
    left_until_done: i64,
    rate_upload: i64,
    rate_download: i64,
    uploaded: i64,
}

impl Total {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, record: &Derived) {
        self.count += 1;
        self.size += record.size;
        self.left_until_done += record.left_until_done;
        self.rate_upload += record.rate_upload;
        self.rate_download += record.rate_download;
        self.uploaded += record.uploaded;
    }

    /// Number of merged records
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Record for the total line, recomputed from the sums
    ///
    /// The ETA is only filled in when something is both left and arriving.
    #[must_use]
    pub fn finalize(&self, zero: ZeroSize) -> Derived {
        let eta = if self.left_until_done != 0 && self.rate_download != 0 {
            format_eta(self.left_until_done / self.rate_download)
        } else {
            String::new()
        };

        Derived {
            id: None,
            name: String::new(),
            error_marker: " ",
            percent: progress(self.size, self.left_until_done, 0.0, zero),
            eta,
            ratio: ratio(self.uploaded, self.size),
            priority: "",
            tracker: String::new(),
            status: "",
            up: rate_text(self.rate_upload, None),
            down: rate_text(self.rate_download, None),
            age: 0,
            size: self.size,
            left_until_done: self.left_until_done,
            rate_upload: self.rate_upload,
            rate_download: self.rate_download,
            uploaded: self.uploaded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::TorrentFile;

    fn names() -> TrackerNames {
        TrackerNames::from_pairs([("foo-tracker", "foo")])
    }

    #[test]
    fn test_eta_buckets() {
        let cases = [
            (1, "1 secs"),
            (179, "179 secs"),
            (180, "180 secs"),
            (240, "4 mins"),
            (10_000, "166 mins"),
            (20_000, "5 hours"),
            (100_000, "27 hours"),
            (1_000_000, "11 days"),
            (10_000_000, "3 months"),
            (100_000_000, "3 years"),
        ];
        for (eta, expected) in cases {
            assert_eq!(eta_text(1, eta), expected, "eta {eta}");
        }
    }

    #[test]
    fn test_eta_done_and_unknown() {
        assert_eq!(eta_text(0, 500), "Done");
        assert_eq!(eta_text(0, -1), "Done");
        assert_eq!(eta_text(1, -1), "Unknown");
        assert_eq!(eta_text(1, -2), "-2 secs");
    }

    #[test]
    fn test_priority_text() {
        assert_eq!(priority_text(-1), "low");
        assert_eq!(priority_text(0), "normal");
        assert_eq!(priority_text(1), "high");
        assert_eq!(priority_text(5), "unknown");
        assert_eq!(priority_text(-3), "unknown");
        assert_eq!(priority_text(i64::MAX), "unknown");
        assert_eq!(priority_text(i64::MIN), "unknown");
    }

    #[test]
    fn test_ratio_is_unguarded() {
        assert_eq!(ratio(0, 8192), 0.0);
        assert_eq!(ratio(4096, 8192), 0.5);
        assert_eq!(ratio(512, 0), f64::INFINITY);
        assert!(ratio(0, 0).is_nan());
    }

    #[test]
    fn test_progress() {
        assert_eq!(progress(8192, 2048, 0.0, ZeroSize::Complete), 75.0);
        assert_eq!(progress(8192, 2048, 0.5, ZeroSize::Complete), 50.0);
        assert_eq!(progress(0, 0, 0.0, ZeroSize::Complete), 100.0);
        assert!(progress(0, 0, 0.0, ZeroSize::Raw).is_nan());
    }

    #[test]
    fn test_tracker_short_name() {
        let table = names();
        assert_eq!(tracker_short_name(&[], &table), "UNK");
        assert_eq!(
            tracker_short_name(&[Tracker::new("")], &table),
            "UNK"
        );
        assert_eq!(
            tracker_short_name(&[Tracker::new("http://foo-tracker")], &table),
            "foo"
        );
        assert_eq!(
            tracker_short_name(&[Tracker::new("udp://tracker.example.org:6969/announce")], &table),
            "tra"
        );
        assert_eq!(tracker_short_name(&[Tracker::new("http://ab/")], &table), "UNK");
    }

    #[test]
    fn test_tracker_short_name_scans_all_trackers() {
        let trackers = [
            Tracker::new("http://unknown.example/announce"),
            Tracker::new("http://foo-tracker/announce"),
        ];
        assert_eq!(tracker_short_name(&trackers, &names()), "foo");
    }

    #[test]
    fn test_age_uses_latest_timestamp() {
        assert_eq!(age(100, 0, 1_000), 900);
        assert_eq!(age(100, 400, 1_000), 600);
    }

    #[test]
    fn test_file_attributes() {
        let torrent = Torrent {
            files: vec![
                TorrentFile {
                    name: "a".to_string(),
                    length: 200,
                    bytes_completed: 50,
                },
                TorrentFile {
                    name: "b".to_string(),
                    length: 0,
                    bytes_completed: 0,
                },
            ],
            priorities: vec![1, -1],
            wanted: vec![true, false],
            ..Torrent::default()
        };
        assert_eq!(file_progress(&torrent, 0), Some(0.25));
        assert_eq!(file_progress(&torrent, 1), Some(1.0));
        assert_eq!(file_progress(&torrent, 2), None);
        assert_eq!(file_priority(&torrent, 0), "high");
        assert_eq!(file_priority(&torrent, 1), "low");
        assert!(!wanted(&torrent, 1));
    }

    #[test]
    fn test_derive_fields() {
        let table = names();
        let torrent = Torrent {
            id: 4,
            name: "debian.iso".to_string(),
            size_when_done: 8192,
            left_until_done: 2048,
            uploaded_ever: 4096,
            rate_download: 2048,
            status: 4,
            eta: 240,
            error: 3,
            bandwidth_priority: 1,
            added_date: 1_000,
            trackers: vec![Tracker::new("http://foo-tracker/announce")],
            ..Torrent::default()
        };
        let record = Deriver::at(&table, ZeroSize::Complete, 1_500).derive(&torrent);

        assert_eq!(record.id, Some(4));
        assert_eq!(record.error_marker, "*");
        assert_eq!(record.percent, 75.0);
        assert_eq!(record.eta, "4 mins");
        assert_eq!(record.ratio, 0.5);
        assert_eq!(record.priority, "high");
        assert_eq!(record.tracker, "foo");
        assert_eq!(record.status, "Downloading");
        assert_eq!(record.down, "    2.0");
        assert_eq!(record.age, 500);
        assert_eq!(record.have(), 6144);
    }

    #[test]
    fn test_stopped_torrent_shows_status_in_rate_columns() {
        let table = TrackerNames::default();
        let torrent = Torrent {
            status: 0,
            ..Torrent::default()
        };
        let record = Deriver::at(&table, ZeroSize::Complete, 0).derive(&torrent);
        assert_eq!(record.up, "Stopped");
        assert_eq!(record.down, "Stopped");
    }

    #[test]
    fn test_total_recomputes_from_sums() {
        let table = TrackerNames::default();
        let deriver = Deriver::at(&table, ZeroSize::Complete, 0);
        let a = deriver.derive(&Torrent {
            size_when_done: 1000,
            left_until_done: 0,
            uploaded_ever: 3000,
            rate_upload: 10,
            status: 6,
            ..Torrent::default()
        });
        let b = deriver.derive(&Torrent {
            size_when_done: 3000,
            left_until_done: 3000,
            rate_download: 100,
            rate_upload: 5,
            status: 4,
            ..Torrent::default()
        });

        let mut total = Total::new();
        total.merge(&a);
        total.merge(&b);
        let line = total.finalize(ZeroSize::Complete);

        assert_eq!(total.count(), 2);
        assert_eq!(line.id, None);
        assert_eq!(line.size, 4000);
        assert_eq!(line.rate_upload, 15);
        assert_eq!(line.rate_download, 100);
        assert_eq!(line.uploaded, 3000);
        assert_eq!(line.percent, 25.0);
        assert_eq!(line.ratio, 0.75);
        assert_eq!(line.eta, "30 secs");
        assert_eq!(line.error_marker, " ");
    }

    #[test]
    fn test_total_without_download_has_no_eta() {
        let table = TrackerNames::default();
        let record = Deriver::at(&table, ZeroSize::Complete, 0).derive(&Torrent {
            size_when_done: 10,
            left_until_done: 10,
            ..Torrent::default()
        });
        let mut total = Total::new();
        total.merge(&record);
        assert_eq!(total.finalize(ZeroSize::Complete).eta, "");
    }
}

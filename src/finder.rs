//! Reverse index from filesystem paths to torrents
//!
//! The index is filled lazily. The first lookup fetches a roster of every
//! torrent's top-level path; a lookup that lands inside a torrent fetches
//! that torrent's file list, once. Nothing is ever evicted, and nothing
//! survives the process.
//!
//! Overlapping download directories can make a path fall under several
//! torrents. Entries are consulted in insertion order and the first torrent
//! that claims the path wins.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::paths::{canonicalize, is_directory, join_canonical};
use crate::rpc::{RpcClient, RpcError};

const ROSTER_FIELDS: [&str; 3] = ["id", "downloadDir", "name"];
const FILE_FIELDS: [&str; 4] = ["id", "downloadDir", "name", "files"];

/// Where inside a torrent a path points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileIndex {
    /// Known to belong to the torrent, file list not consulted yet
    Unresolved,
    /// The torrent's directory (or a directory inside it)
    WholeTorrent,
    /// Position in the torrent's file list
    File(usize),
}

impl FileIndex {
    #[must_use]
    pub const fn is_resolved(self) -> bool {
        !matches!(self, Self::Unresolved)
    }
}

/// Result of a successful lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub torrent_id: i64,
    pub torrent_name: String,
    pub index: FileIndex,
}

#[derive(Debug, Clone)]
struct Entry {
    path: PathBuf,
    torrent_id: i64,
    index: FileIndex,
}

/// Path to torrent resolver backed by an [`RpcClient`]
pub struct Finder<C: RpcClient> {
    client: C,
    incomplete_dir: Option<PathBuf>,
    entries: Vec<Entry>,
    positions: HashMap<PathBuf, usize>,
    names: HashMap<i64, String>,
    roster_loaded: bool,
    files_loaded: HashSet<i64>,
}

impl<C: RpcClient> Finder<C> {
    /// Create a finder, fetching the daemon's incomplete directory setting
    ///
    /// # Errors
    ///
    /// Returns `RpcError` if the session settings cannot be fetched.
    pub fn new(client: C) -> Result<Self, RpcError> {
        let session = client.session_get()?;
        let incomplete_dir = session.incomplete_dir().map(canonicalize);
        debug!(incomplete_dir = ?incomplete_dir, "finder created");

        Ok(Self {
            client,
            incomplete_dir,
            entries: Vec::new(),
            positions: HashMap::new(),
            names: HashMap::new(),
            roster_loaded: false,
            files_loaded: HashSet::new(),
        })
    }

    /// Number of cached paths
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the torrent, and for files the file index, that `path` belongs to
    ///
    /// Returns `Ok(None)` when no torrent claims the path.
    ///
    /// # Errors
    ///
    /// Returns `RpcError` if the roster or a file list cannot be fetched.
    pub fn find(&mut self, path: impl AsRef<Path>) -> Result<Option<Location>, RpcError> {
        let target = canonicalize(path);

        if let Some(location) = self.cached(&target) {
            trace!(path = %target.display(), "finder cache hit");
            return Ok(Some(location));
        }

        if !self.roster_loaded {
            self.load_roster()?;
        }

        let claims: Vec<(i64, bool)> = self
            .entries
            .iter()
            .filter(|entry| target.starts_with(&entry.path))
            .map(|entry| (entry.torrent_id, entry.path == target))
            .collect();

        for (torrent_id, exact) in claims {
            if is_directory(&target) {
                debug!(path = %target.display(), torrent_id, "directory inside torrent");
                return Ok(Some(self.location(torrent_id, FileIndex::WholeTorrent)));
            }

            if !self.files_loaded.contains(&torrent_id) {
                self.load_files(torrent_id)?;
            }
            if let Some(location) = self.cached(&target) {
                return Ok(Some(location));
            }
            if exact {
                return Ok(Some(self.location(torrent_id, FileIndex::WholeTorrent)));
            }
        }

        debug!(path = %target.display(), "no torrent claims path");
        Ok(None)
    }

    fn cached(&self, target: &Path) -> Option<Location> {
        let entry = &self.entries[*self.positions.get(target)?];
        entry
            .index
            .is_resolved()
            .then(|| self.location(entry.torrent_id, entry.index))
    }

    fn location(&self, torrent_id: i64, index: FileIndex) -> Location {
        Location {
            torrent_id,
            torrent_name: self.names.get(&torrent_id).cloned().unwrap_or_default(),
            index,
        }
    }

    /// Add `path`, or upgrade an unresolved entry already there
    fn insert(&mut self, path: PathBuf, torrent_id: i64, index: FileIndex) {
        if let Some(&pos) = self.positions.get(&path) {
            let entry = &mut self.entries[pos];
            if !entry.index.is_resolved() && entry.torrent_id == torrent_id {
                entry.index = index;
            }
            return;
        }
        self.positions.insert(path.clone(), self.entries.len());
        self.entries.push(Entry {
            path,
            torrent_id,
            index,
        });
    }

    fn roots(&self, download_dir: &str, relative: &str) -> Vec<PathBuf> {
        let mut roots = vec![join_canonical(download_dir, relative)];
        if let Some(incomplete) = &self.incomplete_dir {
            roots.push(join_canonical(incomplete, relative));
        }
        roots
    }

    fn load_roster(&mut self) -> Result<(), RpcError> {
        let torrents = self.client.torrent_get(&ROSTER_FIELDS, None)?;
        debug!(count = torrents.len(), "loaded torrent roster");

        for torrent in torrents {
            for root in self.roots(&torrent.download_dir, &torrent.name) {
                self.insert(root, torrent.id, FileIndex::Unresolved);
            }
            self.names.insert(torrent.id, torrent.name);
        }
        self.roster_loaded = true;
        Ok(())
    }

    fn load_files(&mut self, torrent_id: i64) -> Result<(), RpcError> {
        let torrents = self.client.torrent_get(&FILE_FIELDS, Some(&[torrent_id]))?;
        self.files_loaded.insert(torrent_id);

        for torrent in torrents {
            debug!(torrent_id, files = torrent.files.len(), "loaded file list");
            for (i, file) in torrent.files.iter().enumerate() {
                for path in self.roots(&torrent.download_dir, &file.name) {
                    self.insert(path, torrent.id, FileIndex::File(i));
                }
            }
        }
        Ok(())
    }
}

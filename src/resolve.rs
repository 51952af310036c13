//! Positional argument resolution
//!
//! Each argument is either a torrent id or a path. Ids are taken as they
//! are; paths are looked up against the daemon. Looking up paths costs at
//! least one roster fetch, so it is skipped entirely when every argument is
//! numeric.

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::debug;

use crate::finder::Finder;
use crate::paths::{canonicalize, join_canonical};
use crate::rpc::{RpcClient, RpcError};

/// How path arguments are matched to torrents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathLookup {
    /// Through a [`Finder`], which also resolves files inside torrents
    #[default]
    Finder,
    /// Against each torrent's top-level path only
    Roster,
}

/// What a command does when some path argument matched nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmatchedPolicy {
    /// Fail if arguments were given but no torrent was selected
    Abort,
    /// Carry on; with nothing selected, act on every torrent
    Ignore,
}

/// Outcome of resolving a list of arguments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Selected ids, first occurrence order, without repeats
    pub ids: Vec<i64>,
    /// Path arguments no torrent claimed, as given
    pub unmatched: Vec<String>,
}

/// Split arguments into numeric ids and everything else
#[must_use]
pub fn partition(args: &[String]) -> (Vec<i64>, Vec<String>) {
    let mut ids = Vec::new();
    let mut paths = Vec::new();
    for arg in args {
        match arg.parse::<i64>() {
            Ok(id) => ids.push(id),
            Err(_) => paths.push(arg.clone()),
        }
    }
    (ids, paths)
}

/// Resolve `args` into torrent ids
///
/// Every unmatched path gets one line on stderr; whether that is fatal is
/// up to the caller.
///
/// # Errors
///
/// Returns `RpcError` if a daemon lookup fails.
pub fn resolve_args<C: RpcClient>(
    client: &C,
    args: &[String],
    lookup: PathLookup,
) -> Result<Resolution, RpcError> {
    let (mut ids, paths) = partition(args);
    let mut unmatched = Vec::new();

    if !paths.is_empty() {
        let found = match lookup {
            PathLookup::Finder => by_finder(client, &paths)?,
            PathLookup::Roster => by_roster(client, &paths)?,
        };
        for (arg, id) in paths.into_iter().zip(found) {
            match id {
                Some(id) => ids.push(id),
                None => {
                    eprintln!("Did not find any torrent ID for {arg}");
                    unmatched.push(arg);
                }
            }
        }
    }

    let mut seen = HashSet::new();
    ids.retain(|id| seen.insert(*id));
    debug!(?ids, unmatched = unmatched.len(), "resolved arguments");

    Ok(Resolution { ids, unmatched })
}

fn by_finder<C: RpcClient>(client: &C, paths: &[String]) -> Result<Vec<Option<i64>>, RpcError> {
    let mut finder = Finder::new(client)?;
    paths
        .iter()
        .map(|path| -> Result<Option<i64>, RpcError> {
            Ok(finder.find(path)?.map(|location| location.torrent_id))
        })
        .collect()
}

fn by_roster<C: RpcClient>(client: &C, paths: &[String]) -> Result<Vec<Option<i64>>, RpcError> {
    let session = client.session_get()?;
    let incomplete = session.incomplete_dir().map(canonicalize);
    let roster = client.torrent_get(&["id", "downloadDir", "name"], None)?;

    let roots: Vec<(PathBuf, i64)> = roster
        .iter()
        .flat_map(|torrent| {
            let mut roots = vec![(join_canonical(&torrent.download_dir, &torrent.name), torrent.id)];
            if let Some(dir) = &incomplete {
                roots.push((join_canonical(dir, &torrent.name), torrent.id));
            }
            roots
        })
        .collect();

    Ok(paths
        .iter()
        .map(|path| {
            let target = canonicalize(path);
            roots
                .iter()
                .find(|(root, _)| target.starts_with(root))
                .map(|&(_, id)| id)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::{MemoryClient, Torrent};
    use std::fs;
    use tempfile::TempDir;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_partition() {
        let (ids, paths) = partition(&args(&["3", "./x", "-1", "12a", "007"]));
        assert_eq!(ids, vec![3, -1, 7]);
        assert_eq!(paths, vec!["./x".to_string(), "12a".to_string()]);
    }

    #[test]
    fn test_numeric_args_make_no_rpc_calls() {
        let client = MemoryClient::new(vec![]);
        let resolution = resolve_args(&client, &args(&["4", "2", "4"]), PathLookup::Finder).unwrap();
        assert_eq!(resolution.ids, vec![4, 2]);
        assert!(resolution.unmatched.is_empty());
        assert!(client.calls().is_empty());
    }

    fn fixture() -> (TempDir, MemoryClient) {
        let temp = TempDir::new().unwrap();
        let dl = temp.path().join("dl");
        fs::create_dir_all(dl.join("Show")).unwrap();
        let dir = dl.to_string_lossy().to_string();
        let client = MemoryClient::new(vec![
            Torrent {
                id: 1,
                name: "Show".to_string(),
                download_dir: dir.clone(),
                ..Torrent::default()
            },
            Torrent {
                id: 2,
                name: "Other".to_string(),
                download_dir: dir,
                ..Torrent::default()
            },
        ]);
        (temp, client)
    }

    #[test]
    fn test_paths_union_with_ids() {
        let (temp, client) = fixture();
        let show = temp.path().join("dl/Show").to_string_lossy().to_string();
        let missing = temp.path().join("nowhere").to_string_lossy().to_string();

        for lookup in [PathLookup::Finder, PathLookup::Roster] {
            let resolution =
                resolve_args(&client, &[show.clone(), "2".to_string(), "1".to_string(), missing.clone()], lookup)
                    .unwrap();
            assert_eq!(resolution.ids, vec![2, 1], "{lookup:?}");
            assert_eq!(resolution.unmatched, vec![missing.clone()], "{lookup:?}");
        }
    }

    #[test]
    fn test_roster_lookup_matches_below_torrent_root() {
        let (temp, client) = fixture();
        let inside = temp.path().join("dl/Show/sub/file.txt").to_string_lossy().to_string();
        let resolution = resolve_args(&client, &[inside], PathLookup::Roster).unwrap();
        assert_eq!(resolution.ids, vec![1]);
    }

    #[test]
    fn test_rpc_errors_propagate() {
        let (_temp, client) = fixture();
        client.go_offline();
        assert!(resolve_args(&client, &args(&["./x"]), PathLookup::Roster).is_err());
        assert!(resolve_args(&client, &args(&["1"]), PathLookup::Roster).is_ok());
    }
}

//! Path canonicalization
//!
//! Turns user-supplied strings into absolute, symlink-resolved paths. Nothing
//! in here fails: when the filesystem refuses to resolve a path the result
//! degrades to the absolute form, and then to the literal input.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::trace;

/// Make `input` absolute and resolve symlinks wherever possible
///
/// Resolution degrades instead of failing:
/// 1. `fs::canonicalize` on the absolute path
/// 2. the deepest existing ancestor, canonicalized, with the missing tail
///    appended as-is
/// 3. the lexically normalized absolute path
/// 4. the literal input, when even the current directory is unavailable
///
/// Canonicalizing an already canonical path returns it unchanged.
///
/// # Examples
/// ```
/// use trpc::paths::canonicalize;
///
/// let once = canonicalize("some/../relative/path");
/// assert!(once.is_absolute());
/// assert_eq!(canonicalize(&once), once);
/// ```
#[must_use]
pub fn canonicalize(input: impl AsRef<Path>) -> PathBuf {
    let input = input.as_ref();

    let absolute = match std::path::absolute(input) {
        Ok(path) => normalize(&path),
        Err(e) => {
            trace!(path = %input.display(), error = %e, "cannot make path absolute");
            return input.to_path_buf();
        }
    };

    match fs::canonicalize(&absolute) {
        Ok(real) => real,
        Err(e) => {
            trace!(path = %absolute.display(), error = %e, "cannot resolve symlinks");
            resolve_existing_prefix(&absolute).unwrap_or(absolute)
        }
    }
}

/// Canonicalize the longest prefix of `absolute` that exists on disk
fn resolve_existing_prefix(absolute: &Path) -> Option<PathBuf> {
    let mut tail = Vec::new();
    let mut current = absolute;
    loop {
        if let Ok(mut real) = fs::canonicalize(current) {
            for part in tail.iter().rev() {
                real.push(part);
            }
            return Some(real);
        }
        tail.push(current.file_name()?);
        current = current.parent()?;
    }
}

/// Canonical path of `name` inside `dir`
#[must_use]
pub fn join_canonical(dir: impl AsRef<Path>, name: impl AsRef<Path>) -> PathBuf {
    canonicalize(dir.as_ref().join(name))
}

/// Returns true if path is a directory, false if not (or on error)
#[must_use]
pub fn is_directory(path: impl AsRef<Path>) -> bool {
    fs::metadata(path).is_ok_and(|m| m.is_dir())
}

/// Drop `.` components and fold `..` into their parent, without touching the
/// filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

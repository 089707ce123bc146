//! Path validation
//!
//! Resolves untrusted client paths into host paths proven to lie inside the
//! tenant root, accounting for symlinks and entries that do not exist yet.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::ResolveError;

/// A host path inside the tenant root.
///
/// Only [`resolve`] and [`resolve_entry`] construct one, so holding a `ResolvedPath` is proof that
/// the containment check ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    path: PathBuf,
    is_root: bool,
}

impl ResolvedPath {
    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// Returns whether this is the tenant root itself.
    pub fn is_root(&self) -> bool {
        self.is_root
    }
}

impl AsRef<Path> for ResolvedPath {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// Resolve `raw_path`, interpreted relative to the tenant's virtual root.
///
/// Existing paths are resolved through every symlink and must land inside the
/// root. Paths that do not exist yet are accepted as the lexically normalized
/// candidate once the nearest existing ancestor is shown to be inside the root.
pub fn resolve(root: &Path, raw_path: &str) -> Result<ResolvedPath, ResolveError> {
    let root = fs::canonicalize(root).map_err(ResolveError::RootUnavailable)?;
    let candidate = join_normalized(&root, raw_path);
    resolve_candidate(&root, candidate)
}

/// Resolve `raw_path` without following its final component.
///
/// The parent directory goes through [`resolve`]; the last component is
/// joined as-is, so a symlink (dangling or not) names the link itself.
pub fn resolve_entry(root: &Path, raw_path: &str) -> Result<ResolvedPath, ResolveError> {
    let root = fs::canonicalize(root).map_err(ResolveError::RootUnavailable)?;
    let candidate = join_normalized(&root, raw_path);

    if candidate == root {
        return contained(&root, candidate);
    }
    if !candidate.starts_with(&root) {
        return Err(ResolveError::Escape { path: candidate });
    }

    let (parent, name) = match (candidate.parent(), candidate.file_name()) {
        (Some(parent), Some(name)) => (parent.to_path_buf(), name.to_os_string()),
        _ => return Err(ResolveError::Escape { path: candidate }),
    };
    let parent = resolve_candidate(&root, parent)?;

    Ok(ResolvedPath {
        path: parent.path.join(name),
        is_root: false,
    })
}

fn resolve_candidate(root: &Path, candidate: PathBuf) -> Result<ResolvedPath, ResolveError> {
    match fs::canonicalize(&candidate) {
        Ok(target) => contained(root, target),
        Err(e) if e.kind() == io::ErrorKind::NotFound => resolve_missing(root, candidate),
        Err(source) => Err(ResolveError::Io {
            path: candidate,
            source,
        }),
    }
}

/// Join a client path onto the root, collapsing `.`, `..` and redundant
/// separators. `..` may climb above the root; callers check containment.
pub fn join_normalized(root: &Path, raw_path: &str) -> PathBuf {
    let mut joined = root.to_path_buf();

    for component in Path::new(raw_path).components() {
        match component {
            Component::Normal(part) => joined.push(part),
            Component::ParentDir => {
                joined.pop();
            }
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }

    joined
}

fn contained(root: &Path, target: PathBuf) -> Result<ResolvedPath, ResolveError> {
    // Path::starts_with compares whole components, so /data/t1-evil is not under /data/t1.
    if !target.starts_with(root) {
        return Err(ResolveError::Escape { path: target });
    }

    let is_root = target == root;
    Ok(ResolvedPath {
        path: target,
        is_root,
    })
}

/// Walk upward from the candidate until an existing entry is found.
///
/// Every level is bounds-checked before it is touched. The first existing
/// entry decides: it must resolve inside the root, and a dangling symlink
/// cannot be proven to, so it counts as an escape.
fn resolve_missing(root: &Path, candidate: PathBuf) -> Result<ResolvedPath, ResolveError> {
    let mut level: &Path = &candidate;

    loop {
        if !level.starts_with(root) {
            return Err(ResolveError::Escape { path: candidate });
        }

        match fs::symlink_metadata(level) {
            Ok(_) => {
                return match fs::canonicalize(level) {
                    Ok(existing) if existing.starts_with(root) => contained(root, candidate),
                    Ok(existing) => Err(ResolveError::Escape { path: existing }),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        Err(ResolveError::Escape {
                            path: level.to_path_buf(),
                        })
                    }
                    Err(source) => Err(ResolveError::Io {
                        path: level.to_path_buf(),
                        source,
                    }),
                };
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(ResolveError::Io {
                    path: level.to_path_buf(),
                    source,
                });
            }
        }

        level = match level.parent() {
            Some(parent) => parent,
            None => return Err(ResolveError::Escape { path: candidate }),
        };
    }
}

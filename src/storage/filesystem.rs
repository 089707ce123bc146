//! File system operations
//!
//! Host calls shared by several gateway operations.

use log::warn;
use std::fs::{self, DirBuilder};
use std::io::Result;
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::Path;

use crate::session::SessionContext;

/// Mode for directories created or chmod-ed through the gateway
pub const DIRECTORY_MODE: u32 = 0o755;

/// Mode applied by setstat when the client sends no permission bits
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Create a directory and every missing parent
pub fn create_directory(path: &Path) -> Result<()> {
    DirBuilder::new()
        .recursive(true)
        .mode(DIRECTORY_MODE)
        .create(path)
}

/// Apply permission bits to an entry
pub fn set_mode(path: &Path, mode: u32) -> Result<()> {
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

/// Hand an entry over to the configured unprivileged owner.
///
/// Symlinks are not followed: the link itself changes owner. The primary
/// operation has already succeeded when this runs, so failure is only logged.
pub fn fix_ownership(session: &SessionContext, path: &Path) {
    let owner = session.owner();
    if let Err(e) = std::os::unix::fs::lchown(path, Some(owner.uid), Some(owner.gid)) {
        warn!(
            "[{}] error chowning {} to {}:{}: {}",
            session.identity(),
            path.display(),
            owner.uid,
            owner.gid,
            e
        );
    }
}

//! Storage result types
//!
//! Entry descriptors returned by list and stat operations.

use std::fs::Metadata;
use std::os::unix::fs::PermissionsExt;
use std::time::UNIX_EPOCH;

/// One directory entry as reported to the protocol engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub name: String,
    pub size: u64,
    /// Raw mode bits, file type included
    pub mode: u32,
    /// Modification time in seconds since the epoch
    pub modified: u64,
    pub is_dir: bool,
}

impl EntryInfo {
    pub fn from_metadata(name: impl Into<String>, metadata: &Metadata) -> Self {
        let modified = metadata
            .modified()
            .ok()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map(|dur| dur.as_secs())
            .unwrap_or(0);

        Self {
            name: name.into(),
            size: metadata.len(),
            mode: metadata.permissions().mode(),
            modified,
            is_dir: metadata.is_dir(),
        }
    }

    /// Permission bits without the file type
    pub fn perm(&self) -> u32 {
        self.mode & 0o7777
    }
}

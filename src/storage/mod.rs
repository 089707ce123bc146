//! File system storage management
//!
//! Handles tenant path resolution, entry descriptors and the host calls the
//! gateway shares between operations.

pub mod filesystem;
pub mod results;
pub mod validation;

pub use results::EntryInfo;
pub use validation::{ResolvedPath, resolve, resolve_entry};

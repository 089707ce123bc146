//! Lock registry
//!
//! Hands out one session lock per tenant root, so every gateway serving the
//! same tenant serializes its mutations against the others.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex, Weak};
use tokio::sync::Mutex;

/// Registry of tenant locks, shared by every gateway the server creates.
///
/// Entries are weak: a lock lives as long as some gateway holds it.
#[derive(Debug, Clone, Default)]
pub struct LockRegistry {
    locks: Arc<StdMutex<HashMap<PathBuf, Weak<Mutex<()>>>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lock for `root`, creating it when no live gateway holds one.
    pub fn lock_for(&self, root: &Path) -> Arc<Mutex<()>> {
        // The map stays consistent even if a holder panicked.
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.retain(|_, lock| lock.strong_count() > 0);

        if let Some(lock) = locks.get(root).and_then(Weak::upgrade) {
            return lock;
        }
        let lock = Arc::new(Mutex::new(()));
        locks.insert(root.to_path_buf(), Arc::downgrade(&lock));
        lock
    }

    /// Number of tenants with a live lock.
    pub fn len(&self) -> usize {
        let locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.values().filter(|lock| lock.strong_count() > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

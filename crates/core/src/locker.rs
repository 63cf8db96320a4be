//! Keyed, non-blocking resource locks with progress status
//!
//! A [`ResourceLocker`] is a table from resource key (usually the canonical
//! path of a repository directory) to a human-readable status such as
//! `"cloning"` or the latest line of `git clone --progress` output. A key's
//! presence in the table is the only signal that the resource is locked.
//!
//! Acquisition never waits. A caller that loses the race gets `None` and is
//! expected to report the current owner's [`status`](ResourceLocker::status)
//! instead of queueing.
//!
//! ```
//! use std::path::PathBuf;
//!
//! use repocoord_core::ResourceLocker;
//!
//! let locker = ResourceLocker::new();
//! let dir = PathBuf::from("/data/repos/github.com/org/repo");
//!
//! let lock = locker.try_acquire(dir.clone(), "starting clone").unwrap();
//! assert!(locker.try_acquire(dir.clone(), "starting clone").is_none());
//!
//! lock.set_status("Receiving objects:  42% (420/1000)");
//! assert_eq!(locker.status(&dir).as_deref(), Some("Receiving objects:  42% (420/1000)"));
//!
//! lock.release();
//! assert_eq!(locker.status(&dir), None);
//! ```
//!
//! The locker performs no path normalization. Callers must canonicalize keys
//! so that two spellings of the same directory compare equal.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

type LockTable<K> = Arc<RwLock<HashMap<K, String>>>;

/// Table of held resource locks.
///
/// Cloning the locker is cheap and every clone shares the same table.
pub struct ResourceLocker<K = PathBuf>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    table: LockTable<K>,
}

impl<K> ResourceLocker<K>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    /// Create an empty locker.
    #[must_use]
    pub fn new() -> Self {
        Self { table: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Try to lock `key`, recording `status` as its initial status.
    ///
    /// Returns `None` without blocking if the key is already locked.
    pub fn try_acquire<S: Into<String>>(&self, key: K, status: S) -> Option<ResourceLock<K>> {
        let status = status.into();
        let mut table = self.table.write();

        match table.entry(key) {
            Entry::Occupied(held) => {
                debug!(key = ?held.key(), current = %held.get(), "resource_locker.contended");
                None
            }
            Entry::Vacant(slot) => {
                let key = slot.key().clone();
                debug!(key = ?key, status = %status, "resource_locker.acquired");
                slot.insert(status);
                Some(ResourceLock {
                    table: Arc::clone(&self.table),
                    key,
                    done: AtomicBool::new(false),
                })
            }
        }
    }

    /// Status of `key`, or `None` when it is not locked.
    pub fn status(&self, key: &K) -> Option<String> {
        self.table.read().get(key).cloned()
    }

    /// Whether `key` is currently locked.
    pub fn is_locked(&self, key: &K) -> bool {
        self.table.read().contains_key(key)
    }

    /// Snapshot of every held lock and its status.
    pub fn all_statuses(&self) -> HashMap<K, String> {
        self.table.read().clone()
    }

    /// Number of held locks.
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    /// Whether no locks are held.
    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }
}

impl<K> Default for ResourceLocker<K>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Clone for ResourceLocker<K>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    fn clone(&self) -> Self {
        Self { table: Arc::clone(&self.table) }
    }
}

impl<K> fmt::Debug for ResourceLocker<K>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceLocker").field("held", &self.len()).finish()
    }
}

/// Ownership of one locked key.
///
/// There is at most one unreleased handle per key. Releasing is idempotent and
/// also happens on drop. Once released, the handle can no longer touch the
/// table, so a late [`set_status`](Self::set_status) cannot overwrite the
/// status of whoever acquired the key next.
///
/// Wrap the handle in an `Arc` to let a progress reader update the status
/// while the owning task keeps the right to release it.
pub struct ResourceLock<K = PathBuf>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    table: LockTable<K>,
    key: K,
    // Only read or written while holding the table's write lock.
    done: AtomicBool,
}

impl<K> ResourceLock<K>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    /// Replace the status shown for this key. No-op after release.
    pub fn set_status<S: Into<String>>(&self, status: S) {
        let status = status.into();
        let mut table = self.table.write();
        if self.done.load(Ordering::Relaxed) {
            return;
        }
        if let Some(current) = table.get_mut(&self.key) {
            *current = status;
        }
    }

    /// Unlock the key. Calling it again does nothing.
    pub fn release(&self) {
        let mut table = self.table.write();
        if self.done.load(Ordering::Relaxed) {
            return;
        }
        table.remove(&self.key);
        self.done.store(true, Ordering::Relaxed);
        debug!(key = ?self.key, "resource_locker.released");
    }

    /// Key this handle locks.
    pub const fn key(&self) -> &K {
        &self.key
    }

    /// Whether [`release`](Self::release) has already run.
    pub fn is_released(&self) -> bool {
        let _table = self.table.read();
        self.done.load(Ordering::Relaxed)
    }
}

impl<K> Drop for ResourceLock<K>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    fn drop(&mut self) {
        self.release();
    }
}

impl<K> fmt::Debug for ResourceLock<K>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceLock")
            .field("key", &self.key)
            .field("released", &self.done.load(Ordering::Relaxed))
            .finish()
    }
}

//! A lock-guarded set with snapshot-drain consumption.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A set of pending requests behind its own mutex.
///
/// The lock is only ever held for in-memory set operations. Consumers follow
/// the snapshot-drain pattern:
/// 1. [`PendingSet::snapshot`] copies the contents and releases the lock
/// 2. the copy is processed with no lock held
/// 3. [`PendingSet::retire`] removes only the fully processed entries
///
/// Anything inserted during step 2 is not part of the copy, so step 3 cannot
/// remove it.
#[derive(Debug)]
pub struct PendingSet<T> {
    items: Mutex<HashSet<T>>,
}

impl<T: Eq + Hash + Clone> PendingSet<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(HashSet::new()),
        }
    }

    // A panic while holding the guard cannot leave a HashSet half-updated in
    // a way that matters here, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, HashSet<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `false` when the item was already pending.
    pub fn insert(&self, item: T) -> bool {
        self.lock().insert(item)
    }

    pub fn extend(&self, items: impl IntoIterator<Item = T>) {
        self.lock().extend(items);
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.lock().iter().cloned().collect()
    }

    pub fn retire<'a>(&self, done: impl IntoIterator<Item = &'a T>)
    where
        T: 'a,
    {
        let mut items = self.lock();
        for item in done {
            items.remove(item);
        }
    }

    pub fn contains(&self, item: &T) -> bool {
        self.lock().contains(item)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<T: Eq + Hash + Clone> Default for PendingSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

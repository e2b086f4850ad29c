use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use super::{CacheEntry, CacheKey};

/// In-process cache tier.
///
/// Entries are only read through `get`, which hides expired ones without
/// removing them; `insert`, `remove` and `clear` are the only writers.
/// A poisoned lock reads as empty and drops writes.
pub struct MemoryTier {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl MemoryTier {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Live value for `key` at `now`.
    pub fn get(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<String> {
        let entries = self.entries.lock().ok()?;
        entries
            .get(key)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.value.clone())
    }

    pub fn insert(&self, key: CacheKey, entry: CacheEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key, entry);
        }
    }

    pub fn remove(&self, key: &CacheKey) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    /// Physically stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryTier {
    fn default() -> Self {
        Self::new()
    }
}

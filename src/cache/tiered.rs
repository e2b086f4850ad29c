use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::{CacheEntry, CacheKey, ClearReport, DiskTier, MemoryTier};
use crate::clock::{add_saturating, Clock};

// ═══════════════════════════════════════════════════════════
// Settings & stats
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub memory_enabled: bool,
    /// `None` disables the disk tier.
    pub disk_dir: Option<PathBuf>,
    pub default_ttl: Duration,
}

/// Counters since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub memory_hits: u64,
    pub disk_hits: u64,
    pub misses: u64,
    pub writes: u64,
}

#[derive(Default)]
struct Counters {
    memory_hits: AtomicU64,
    disk_hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
}

// ═══════════════════════════════════════════════════════════
// TieredCache
// ═══════════════════════════════════════════════════════════

/// Memory tier in front of an optional disk tier.
///
/// The public API is infallible: disk and serialization failures are logged
/// and behave as a miss (`get`) or a no-op (`set`, `remove`, `clear`).
pub struct TieredCache {
    memory: Option<MemoryTier>,
    disk: Option<DiskTier>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
    counters: Counters,
}

impl TieredCache {
    pub fn new(settings: CacheSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            memory: settings.memory_enabled.then(MemoryTier::new),
            disk: settings.disk_dir.map(DiskTier::new),
            clock,
            default_ttl: settings.default_ttl,
            counters: Counters::default(),
        }
    }

    /// Memory tier only.
    pub fn in_memory(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            CacheSettings {
                memory_enabled: true,
                disk_dir: None,
                default_ttl,
            },
            clock,
        )
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn has_disk_tier(&self) -> bool {
        self.disk.is_some()
    }

    /// Look up the value stored for `material`.
    ///
    /// Memory first; on a memory miss the disk record is read, and a live one
    /// is promoted into memory. An expired disk record is deleted.
    pub fn get<K: Serialize + ?Sized>(&self, material: &K) -> Option<String> {
        let key = self.key_for(material)?;
        let now = self.clock.now();

        if let Some(memory) = &self.memory {
            if let Some(value) = memory.get(&key, now) {
                self.counters.memory_hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %key.short(), tier = "memory", "Cache hit");
                return Some(value);
            }
        }

        if let Some(disk) = &self.disk {
            match disk.read(&key) {
                Ok(Some(entry)) if !entry.is_expired(now) => {
                    self.counters.disk_hits.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(key = %key.short(), tier = "disk", "Cache hit");
                    let value = entry.value.clone();
                    if let Some(memory) = &self.memory {
                        memory.insert(key, entry);
                    }
                    return Some(value);
                }
                Ok(Some(_)) => {
                    tracing::debug!(key = %key.short(), "Expired disk cache record");
                    if let Err(e) = disk.remove(&key) {
                        tracing::warn!(key = %key.short(), error = %e, "Failed to delete expired cache record");
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(key = %key.short(), error = %e, "Unreadable disk cache record, treating as miss");
                }
            }
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store `value` for `material`, expiring after `ttl` (or the default TTL).
    pub fn set<K: Serialize + ?Sized>(&self, material: &K, value: &str, ttl: Option<Duration>) {
        let Some(key) = self.key_for(material) else {
            return;
        };
        let ttl = ttl.unwrap_or(self.default_ttl);
        let entry = CacheEntry {
            value: value.to_string(),
            expiry: add_saturating(self.clock.now(), ttl),
        };

        if let Some(disk) = &self.disk {
            if let Err(e) = disk.write(&key, &entry) {
                tracing::warn!(key = %key.short(), error = %e, "Disk cache write failed");
            }
        }
        if let Some(memory) = &self.memory {
            memory.insert(key, entry);
        }
        self.counters.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn remove<K: Serialize + ?Sized>(&self, material: &K) {
        let Some(key) = self.key_for(material) else {
            return;
        };
        if let Some(memory) = &self.memory {
            memory.remove(&key);
        }
        if let Some(disk) = &self.disk {
            if let Err(e) = disk.remove(&key) {
                tracing::warn!(key = %key.short(), error = %e, "Disk cache remove failed");
            }
        }
    }

    /// Empty both tiers. Returns what happened on disk.
    pub fn clear(&self) -> ClearReport {
        if let Some(memory) = &self.memory {
            memory.clear();
        }
        let Some(disk) = &self.disk else {
            return ClearReport::default();
        };
        match disk.clear() {
            Ok(report) => {
                tracing::info!(
                    removed = report.removed,
                    failed = report.failed,
                    "Disk cache cleared"
                );
                report
            }
            Err(e) => {
                tracing::warn!(dir = %disk.dir().display(), error = %e, "Disk cache clear failed");
                ClearReport::default()
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            memory_hits: self.counters.memory_hits.load(Ordering::Relaxed),
            disk_hits: self.counters.disk_hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            writes: self.counters.writes.load(Ordering::Relaxed),
        }
    }

    fn key_for<K: Serialize + ?Sized>(&self, material: &K) -> Option<CacheKey> {
        match CacheKey::derive(material) {
            Ok(key) => Some(key),
            Err(e) => {
                tracing::warn!(error = %e, "Cache key derivation failed");
                None
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const TTL: Duration = Duration::from_secs(60);

    fn disk_cache(dir: &std::path::Path, clock: Arc<ManualClock>) -> TieredCache {
        TieredCache::new(
            CacheSettings {
                memory_enabled: true,
                disk_dir: Some(dir.to_path_buf()),
                default_ttl: TTL,
            },
            clock,
        )
    }

    #[test]
    fn set_then_get_returns_value() {
        let clock = Arc::new(ManualClock::fixed());
        let cache = TieredCache::in_memory(TTL, clock);
        cache.set("prompt", "answer", None);
        assert_eq!(cache.get("prompt").as_deref(), Some("answer"));
    }

    #[test]
    fn repeated_gets_are_idempotent() {
        let clock = Arc::new(ManualClock::fixed());
        let cache = TieredCache::in_memory(TTL, clock.clone());
        cache.set("prompt", "answer", None);
        clock.advance(Duration::from_secs(10));
        let first = cache.get("prompt");
        let second = cache.get("prompt");
        assert_eq!(first, second);
        assert_eq!(cache.stats().memory_hits, 2);
    }

    #[test]
    fn entry_absent_once_ttl_elapsed() {
        let clock = Arc::new(ManualClock::fixed());
        let cache = TieredCache::in_memory(TTL, clock.clone());
        cache.set("prompt", "answer", None);

        clock.advance(TTL - Duration::from_millis(1));
        assert!(cache.get("prompt").is_some());
        clock.advance(Duration::from_millis(1));
        assert!(cache.get("prompt").is_none());
    }

    #[test]
    fn explicit_ttl_overrides_default() {
        let clock = Arc::new(ManualClock::fixed());
        let cache = TieredCache::in_memory(TTL, clock.clone());
        cache.set("prompt", "answer", Some(Duration::from_secs(1)));
        clock.advance(Duration::from_secs(1));
        assert!(cache.get("prompt").is_none());
    }

    #[test]
    fn disk_tier_survives_new_instance_and_promotes() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::fixed());

        disk_cache(dir.path(), clock.clone()).set("prompt", "persisted", None);

        let restarted = disk_cache(dir.path(), clock.clone());
        assert_eq!(restarted.get("prompt").as_deref(), Some("persisted"));
        assert_eq!(restarted.stats().disk_hits, 1);

        // Second read is served from memory after promotion.
        assert_eq!(restarted.get("prompt").as_deref(), Some("persisted"));
        assert_eq!(restarted.stats().memory_hits, 1);
    }

    #[test]
    fn expired_disk_record_is_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::fixed());
        disk_cache(dir.path(), clock.clone()).set("prompt", "old", None);

        clock.advance(TTL);
        let restarted = disk_cache(dir.path(), clock);
        assert!(restarted.get("prompt").is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn malformed_disk_record_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::fixed());
        let key = CacheKey::derive("prompt").unwrap();
        std::fs::write(dir.path().join(key.as_str()), b"garbage").unwrap();

        let cache = disk_cache(dir.path(), clock);
        assert!(cache.get("prompt").is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn unwritable_disk_does_not_fail_set() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file-not-dir");
        std::fs::write(&blocker, b"x").unwrap();

        let clock = Arc::new(ManualClock::fixed());
        let cache = disk_cache(&blocker, clock);
        cache.set("prompt", "still cached in memory", None);
        assert_eq!(cache.get("prompt").as_deref(), Some("still cached in memory"));
    }

    #[test]
    fn remove_clears_both_tiers() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::fixed());
        let cache = disk_cache(dir.path(), clock.clone());
        cache.set("prompt", "v", None);

        cache.remove("prompt");
        assert!(cache.get("prompt").is_none());
        assert!(disk_cache(dir.path(), clock).get("prompt").is_none());
    }

    #[test]
    fn clear_empties_both_tiers() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::fixed());
        let cache = disk_cache(dir.path(), clock);
        cache.set("a", "1", None);
        cache.set("b", "2", None);

        let report = cache.clear();
        assert_eq!(report.removed, 2);
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_none());
    }

    #[test]
    fn disk_only_cache_works_without_memory() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::fixed());
        let cache = TieredCache::new(
            CacheSettings {
                memory_enabled: false,
                disk_dir: Some(dir.path().to_path_buf()),
                default_ttl: TTL,
            },
            clock,
        );
        cache.set("prompt", "v", None);
        assert_eq!(cache.get("prompt").as_deref(), Some("v"));
        assert_eq!(cache.stats().disk_hits, 1);
    }
}

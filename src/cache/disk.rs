use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::{CacheEntry, CacheError, CacheKey};

/// Suffix of in-flight write files; swept by `clear`.
const TEMP_SUFFIX: &str = ".tmp";

/// Durable cache tier: one JSON `{value, expiry}` file per key, named by the
/// key itself, inside a single directory.
///
/// All methods return `CacheError`; the tiered cache decides what to log and
/// turns every failure into a miss or a no-op.
#[derive(Debug, Clone)]
pub struct DiskTier {
    dir: PathBuf,
}

/// Outcome of clearing the cache directory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClearReport {
    pub removed: usize,
    pub failed: usize,
}

impl DiskTier {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.as_str())
    }

    /// Read and parse the record for `key`. A missing file is `Ok(None)`.
    pub fn read(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let path = self.path_for(key);
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let entry: CacheEntry = serde_json::from_slice(&data)?;
        Ok(Some(entry))
    }

    /// Write the record through a temporary file and rename it into place,
    /// so a reader sees either the old record or the new one.
    pub fn write(&self, key: &CacheKey, entry: &CacheEntry) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.dir)?;
        let data = serde_json::to_vec(entry)?;

        let temp = self
            .dir
            .join(format!("{}.{}{}", key.as_str(), Uuid::new_v4().simple(), TEMP_SUFFIX));
        std::fs::write(&temp, data)?;
        if let Err(e) = std::fs::rename(&temp, self.path_for(key)) {
            let _ = std::fs::remove_file(&temp);
            return Err(e.into());
        }
        Ok(())
    }

    /// Delete the record for `key`. Deleting a missing record succeeds.
    pub fn remove(&self, key: &CacheKey) -> Result<(), CacheError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete every file in the cache directory. A file that cannot be
    /// deleted is counted and skipped.
    pub fn clear(&self) -> Result<ClearReport, CacheError> {
        let mut report = ClearReport::default();
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(report),
            Err(e) => return Err(e.into()),
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            match std::fs::remove_file(&path) {
                Ok(()) => report.removed += 1,
                Err(e) => {
                    tracing::warn!(
                        file = %path.display(),
                        error = %e,
                        "Failed to delete cache file"
                    );
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

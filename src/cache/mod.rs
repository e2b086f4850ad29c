//! Two-tier response cache: in-process memory in front of an optional
//! directory of JSON records.
//!
//! Key properties:
//! - Keys are SHA-256 digests of the request, stable across restarts
//! - Expiry is lazy: an expired entry reads as absent and is only
//!   physically removed when its slot is next touched
//! - Every I/O failure is logged and swallowed; callers only ever see
//!   a hit or a miss
//! - No per-key coalescing: two concurrent misses on the same key both
//!   go on to do the expensive work

pub mod disk;
pub mod key;
pub mod memory;
pub mod tiered;

pub use disk::*;
pub use key::*;
pub use memory::*;
pub use tiered::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Internal cache failures. Never leave the `TieredCache` boundary.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache record serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A cached value and the instant it stops being valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: String,
    pub expiry: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry
    }
}

//! Record cache keyed by canonical ingredient name.
//!
//! Only [`Resolver::lookup_batch_cached`](crate::Resolver::lookup_batch_cached)
//! reads or writes it; a plain batch never reuses results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::record::ResolutionRecord;

/// Minimal cache contract for resolved records.
pub trait RecordCache: Send + Sync {
    /// Cached record for a canonical key, if any.
    fn get(&self, canonical: &str) -> Option<ResolutionRecord>;

    /// Store a record under its canonical name.
    fn put(&self, record: &ResolutionRecord) -> std::io::Result<()>;
}

/// What is written to disk for each record.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedRecord {
    record: ResolutionRecord,
    cached_at: DateTime<Utc>,
}

/// One JSON file per canonical key, named by a hash of the key.
pub struct DiskRecordCache {
    cache_dir: PathBuf,
}

/// Cache statistics.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub cached_records: usize,
}

impl DiskRecordCache {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    fn cache_key(canonical: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let result = hasher.finalize();

        // First 16 bytes (32 hex chars) keep filenames short
        hex::encode(&result[..16])
    }

    fn record_path(&self, canonical: &str) -> PathBuf {
        self.cache_dir
            .join(format!("{}.json", Self::cache_key(canonical)))
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();

        if let Ok(entries) = fs::read_dir(&self.cache_dir) {
            stats.cached_records = entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
                .count();
        }

        stats
    }

    /// Clear all cached records.
    pub fn clear(&self) -> std::io::Result<()> {
        if self.cache_dir.exists() {
            fs::remove_dir_all(&self.cache_dir)?;
        }
        Ok(())
    }
}

impl RecordCache for DiskRecordCache {
    fn get(&self, canonical: &str) -> Option<ResolutionRecord> {
        if canonical.is_empty() {
            return None;
        }
        let content = fs::read_to_string(self.record_path(canonical)).ok()?;
        match serde_json::from_str::<CachedRecord>(&content) {
            Ok(cached) if cached.record.canonical_name != canonical => {
                tracing::warn!(
                    key = canonical,
                    stored = %cached.record.canonical_name,
                    "cache entry belongs to another key"
                );
                None
            }
            Ok(cached) => {
                tracing::debug!(key = canonical, cached_at = %cached.cached_at, "record cache hit");
                Some(cached.record)
            }
            Err(e) => {
                tracing::warn!(key = canonical, error = %e, "ignoring unreadable cache entry");
                None
            }
        }
    }

    fn put(&self, record: &ResolutionRecord) -> std::io::Result<()> {
        if record.canonical_name.is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.cache_dir)?;

        let cached = CachedRecord {
            record: record.clone(),
            cached_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&cached).map_err(std::io::Error::other)?;
        fs::write(self.record_path(&record.canonical_name), json)
    }
}

/// In-process cache, mostly for tests and short-lived services.
#[derive(Default)]
pub struct MemoryRecordCache {
    records: RwLock<HashMap<String, ResolutionRecord>>,
}

impl MemoryRecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordCache for MemoryRecordCache {
    fn get(&self, canonical: &str) -> Option<ResolutionRecord> {
        self.records.read().unwrap_or_else(|e| e.into_inner()).get(canonical).cloned()
    }

    fn put(&self, record: &ResolutionRecord) -> std::io::Result<()> {
        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(record.canonical_name.clone(), record.clone());
        Ok(())
    }
}

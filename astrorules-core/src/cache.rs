use crate::types::*;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Version constants for cache invalidation
pub mod versions {
    pub const ASTRORULES_VERSION: &str = env!("CARGO_PKG_VERSION");
    /// Bump when normalization, patterns or scoring change output
    pub const EXTRACTION_VERSION: &str = "1.0.0";
}

/// Cache key for one extraction run (text + config + source → report)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ExtractionCacheKey {
    pub text_hash: String,
    pub config_hash: String,
    pub source_hash: String,
    pub crate_version: String,
    pub extraction_version: String,
}

impl ExtractionCacheKey {
    pub fn new(text_hash: String, config_hash: String, source_hash: String) -> Self {
        Self {
            text_hash,
            config_hash,
            source_hash,
            crate_version: versions::ASTRORULES_VERSION.to_string(),
            extraction_version: versions::EXTRACTION_VERSION.to_string(),
        }
    }

    /// Computes the key for a document, its config and its source
    pub fn for_document<C: Serialize>(text: &str, config: &C, source: &SourceInfo) -> Result<Self> {
        Ok(Self::new(
            calculate_text_hash(text),
            calculate_config_hash(config)?,
            calculate_config_hash(source)?,
        ))
    }

    /// Compute cache key hash for storage
    pub fn to_cache_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.text_hash);
        hasher.update(&self.config_hash);
        hasher.update(&self.source_hash);
        hasher.update(&self.crate_version);
        hasher.update(&self.extraction_version);
        format!("{:x}", hasher.finalize())
    }
}

/// Cached report with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionCacheValue {
    pub report: ExtractionReport,
    pub created_at: DateTime<Utc>,
    pub processing_time_ms: u64,
    pub cache_version: String,
}

impl ExtractionCacheValue {
    pub fn new(report: ExtractionReport, processing_time_ms: u64) -> Self {
        Self {
            report,
            created_at: Utc::now(),
            processing_time_ms,
            cache_version: versions::ASTRORULES_VERSION.to_string(),
        }
    }
}

pub trait ExtractionCache {
    fn get(&self, key: &ExtractionCacheKey) -> Result<Option<ExtractionCacheValue>>;
    fn store(&self, key: &ExtractionCacheKey, value: &ExtractionCacheValue) -> Result<()>;
}

/// JSON files under `<cache_dir>/extraction/`, one per key hash
pub struct FileCache {
    cache_dir: String,
}

impl FileCache {
    pub fn new(cache_dir: &str) -> Result<Self> {
        fs::create_dir_all(format!("{cache_dir}/extraction"))
            .map_err(|e| anyhow!("Failed to create cache directory {}: {}", cache_dir, e))?;

        Ok(Self {
            cache_dir: cache_dir.to_string(),
        })
    }

    fn entry_path(&self, key: &ExtractionCacheKey) -> String {
        format!("{}/extraction/{}.json", self.cache_dir, key.to_cache_hash())
    }
}

impl ExtractionCache for FileCache {
    fn get(&self, key: &ExtractionCacheKey) -> Result<Option<ExtractionCacheValue>> {
        let path = self.entry_path(key);
        if !Path::new(&path).exists() {
            return Ok(None);
        }

        let json_str = fs::read_to_string(&path)
            .map_err(|e| anyhow!("Failed to read cache entry {}: {}", path, e))?;
        let value: ExtractionCacheValue = match serde_json::from_str(&json_str) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Ignoring unreadable cache entry {}: {}", path, e);
                return Ok(None);
            }
        };
        if value.cache_version != versions::ASTRORULES_VERSION {
            tracing::debug!("Ignoring cache entry from version {}", value.cache_version);
            return Ok(None);
        }
        Ok(Some(value))
    }

    fn store(&self, key: &ExtractionCacheKey, value: &ExtractionCacheValue) -> Result<()> {
        let json_str = serde_json::to_string_pretty(value)
            .map_err(|e| anyhow!("Failed to serialize extraction cache value: {}", e))?;
        let path = self.entry_path(key);
        fs::write(&path, json_str)
            .map_err(|e| anyhow!("Failed to write cache entry {}: {}", path, e))?;
        Ok(())
    }
}

/// Cache that never hits
pub struct NoOpCache;

impl Default for NoOpCache {
    fn default() -> Self {
        Self::new()
    }
}

impl NoOpCache {
    pub fn new() -> Self {
        Self
    }
}

impl ExtractionCache for NoOpCache {
    fn get(&self, _key: &ExtractionCacheKey) -> Result<Option<ExtractionCacheValue>> {
        Ok(None)
    }

    fn store(&self, _key: &ExtractionCacheKey, _value: &ExtractionCacheValue) -> Result<()> {
        Ok(())
    }
}

/// Hash of any serializable configuration, via its JSON form
pub fn calculate_config_hash<T: Serialize>(config: &T) -> Result<String> {
    let config_json = serde_json::to_string(config)
        .map_err(|e| anyhow!("Failed to serialize config for hashing: {}", e))?;

    let mut hasher = Sha256::new();
    hasher.update(config_json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

pub fn calculate_text_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfig;

    fn report() -> ExtractionReport {
        ExtractionReport {
            source: SourceInfo::new("Saravali", AuthorityLevel::Classical),
            total_sentences: 3,
            astrological_sentences: 1,
            rules: Vec::new(),
            processing_time_ms: 7,
        }
    }

    #[test]
    fn key_changes_with_config() {
        let source = SourceInfo::new("Saravali", AuthorityLevel::Classical);
        let config = ExtractionConfig::default();
        let mut changed = ExtractionConfig::default();
        changed.relaxed_fallback.enabled = false;

        let a = ExtractionCacheKey::for_document("text", &config, &source).unwrap();
        let b = ExtractionCacheKey::for_document("text", &config, &source).unwrap();
        let c = ExtractionCacheKey::for_document("text", &changed, &source).unwrap();

        assert_eq!(a.to_cache_hash(), b.to_cache_hash());
        assert_ne!(a.to_cache_hash(), c.to_cache_hash());
    }

    #[test]
    fn key_changes_with_source() {
        let config = ExtractionConfig::default();
        let a = ExtractionCacheKey::for_document(
            "text",
            &config,
            &SourceInfo::new("Saravali", AuthorityLevel::Classical),
        )
        .unwrap();
        let b = ExtractionCacheKey::for_document(
            "text",
            &config,
            &SourceInfo::new("Phaladeepika", AuthorityLevel::Classical),
        )
        .unwrap();
        assert_ne!(a.to_cache_hash(), b.to_cache_hash());
    }

    #[test]
    fn file_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().to_str().unwrap()).unwrap();
        let key = ExtractionCacheKey::new("t".into(), "c".into(), "s".into());

        assert!(cache.get(&key).unwrap().is_none());
        cache.store(&key, &ExtractionCacheValue::new(report(), 7)).unwrap();

        let hit = cache.get(&key).unwrap().unwrap();
        assert_eq!(hit.report, report());
        assert_eq!(hit.processing_time_ms, 7);
    }

    #[test]
    fn corrupt_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().to_str().unwrap()).unwrap();
        let key = ExtractionCacheKey::new("t".into(), "c".into(), "s".into());

        std::fs::write(cache.entry_path(&key), "{\"report\": {\"source\"").unwrap();
        assert!(cache.get(&key).unwrap().is_none());

        // A fresh store replaces the broken entry
        cache.store(&key, &ExtractionCacheValue::new(report(), 3)).unwrap();
        assert_eq!(cache.get(&key).unwrap().unwrap().processing_time_ms, 3);
    }

    #[test]
    fn noop_cache_never_hits() {
        let cache = NoOpCache::new();
        let key = ExtractionCacheKey::new("t".into(), "c".into(), "s".into());
        cache.store(&key, &ExtractionCacheValue::new(report(), 1)).unwrap();
        assert!(cache.get(&key).unwrap().is_none());
    }

    #[test]
    fn text_hash_is_stable_hex() {
        let hash = calculate_text_hash("Mars in the 7th house");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, calculate_text_hash("Mars in the 7th house"));
    }
}

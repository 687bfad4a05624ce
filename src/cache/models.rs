//! Cache configuration, entry and statistics models.

// Author: kelexine (https://github.com/kelexine)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;

/// Configuration for the generic response cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Default time-to-live of an entry, in seconds.
    #[serde(default = "default_response_ttl")]
    pub ttl_seconds: u64,
    /// Maximum number of live entries.
    #[serde(default = "default_response_max_size")]
    pub max_size: usize,
}

impl Default for CacheConfig {
    /// Provides default values for cache configuration.
    ///
    /// - `ttl_seconds`: 3600 (1 hour)
    /// - `max_size`: 500
    fn default() -> Self {
        Self {
            ttl_seconds: default_response_ttl(),
            max_size: default_response_max_size(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// Rounding granularities used to bucket nutrition values before hashing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketConfig {
    #[serde(default = "default_calorie_bucket")]
    pub calories: f64,
    #[serde(default = "default_sodium_bucket")]
    pub sodium: f64,
    #[serde(default = "default_small_bucket")]
    pub sugar: f64,
    #[serde(default = "default_small_bucket")]
    pub fat: f64,
    #[serde(default = "default_small_bucket")]
    pub protein: f64,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            calories: default_calorie_bucket(),
            sodium: default_sodium_bucket(),
            sugar: default_small_bucket(),
            fat: default_small_bucket(),
            protein: default_small_bucket(),
        }
    }
}

/// Configuration for the similarity-based LLM response cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmCacheConfig {
    /// Maximum number of cached analyses (health and meal combined).
    #[serde(default = "default_llm_max_entries")]
    pub max_entries: usize,
    /// Time-to-live of a cached analysis, in seconds.
    #[serde(default = "default_llm_ttl")]
    pub ttl_seconds: u64,
    /// Minimum similarity score in `[0, 1]` that counts as a hit.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    /// Nutrition bucket sizes for the storage hash.
    #[serde(default)]
    pub buckets: BucketConfig,
}

impl Default for LlmCacheConfig {
    /// - `max_entries`: 1000
    /// - `ttl_seconds`: 86400 (1 day)
    /// - `similarity_threshold`: 0.85
    fn default() -> Self {
        Self {
            max_entries: default_llm_max_entries(),
            ttl_seconds: default_llm_ttl(),
            similarity_threshold: default_similarity_threshold(),
            buckets: BucketConfig::default(),
        }
    }
}

impl LlmCacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// A single generic cache entry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: Value,
    pub created_at: Instant,
    pub expires_at: Instant,
    pub hit_count: u64,
}

impl CacheEntry {
    pub fn new(value: Value, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            created_at: now,
            expires_at: now + ttl,
            hit_count: 0,
        }
    }

    /// An entry stays readable up to and including its expiry instant.
    pub fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

/// Statistics for the generic cache.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    /// Number of successful cache hits.
    pub hits: u64,
    /// Number of cache misses, including expired reads.
    pub misses: u64,
    /// Hits as a percentage of lookups, 2 decimals.
    pub hit_rate: f64,
    /// Size as a percentage of capacity, 2 decimals.
    pub utilization_percent: f64,
}

/// Statistics for the LLM response cache.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmCacheStats {
    pub size: usize,
    pub max_entries: usize,
    pub hits: u64,
    pub misses: u64,
    /// Hits served by fuzzy matching of health analyses.
    pub similarity_matches: u64,
    pub hit_rate: f64,
    pub utilization_percent: f64,
}

/// Rough memory footprint of the LLM response cache.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMemoryUsage {
    pub estimated_bytes: usize,
    pub estimated_mb: f64,
    pub per_entry_mb: f64,
}

/// `part / whole` as a percentage rounded to 2 decimals; 0 when `whole` is 0.
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        return 0.0;
    }
    round_to(part / whole * 100.0, 2)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn default_response_ttl() -> u64 {
    3600
}

fn default_response_max_size() -> usize {
    500
}

fn default_llm_max_entries() -> usize {
    1000
}

fn default_llm_ttl() -> u64 {
    86_400
}

fn default_similarity_threshold() -> f64 {
    0.85
}

fn default_calorie_bucket() -> f64 {
    10.0
}

fn default_sodium_bucket() -> f64 {
    50.0
}

fn default_small_bucket() -> f64 {
    5.0
}

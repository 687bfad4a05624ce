// LLM response cache - reuses health analyses for nutritionally similar products
// Author: kelexine (https://github.com/kelexine)

use crate::cache::models::{percentage, round_to, CacheMemoryUsage, LlmCacheConfig, LlmCacheStats};
use crate::cache::similarity::{calculate_similarity, generate_hash};
use crate::metrics;
use crate::models::{Extraction, HealthReport, MealAnalysis};
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use std::num::NonZeroUsize;
use tokio::time::Instant;
use tracing::{debug, info};

/// Result payload held by a cache record.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CachedAnalysis {
    #[serde(rename_all = "camelCase")]
    Health {
        extraction: Extraction,
        health_report: HealthReport,
    },
    #[serde(rename_all = "camelCase")]
    Meal { meal_result: MealAnalysis },
}

/// A cached analysis with its lifetime bookkeeping.
#[derive(Debug, Clone)]
pub struct LlmCacheRecord {
    pub analysis: CachedAnalysis,
    pub created_at: Instant,
    pub expires_at: Instant,
    pub hit_count: u64,
}

/// Cache for expensive LLM analysis results.
///
/// Health analyses are stored under a bucketed content hash, but lookups
/// scan every live record and reuse the most similar one when its score
/// reaches the threshold. Meal analyses use exact image-hash keys only.
/// Both kinds share one capacity and evict oldest-inserted first.
pub struct LlmResponseCache {
    config: LlmCacheConfig,
    inner: Mutex<LlmCacheInner>,
}

struct LlmCacheInner {
    records: LruCache<String, LlmCacheRecord>,
    hits: u64,
    misses: u64,
    similarity_matches: u64,
}

impl LlmCacheInner {
    fn remove_expired(&mut self, now: Instant) {
        let expired: Vec<String> = self
            .records
            .iter()
            .filter(|(_, record)| now > record.expires_at)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.records.pop(key);
        }
        if !expired.is_empty() {
            debug!("Swept {} expired LLM cache records", expired.len());
        }
    }

    fn hit_rate(&self) -> f64 {
        percentage(self.hits as f64, (self.hits + self.misses) as f64)
    }
}

impl LlmResponseCache {
    pub fn new(config: LlmCacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            config,
            inner: Mutex::new(LlmCacheInner {
                records: LruCache::new(capacity),
                hits: 0,
                misses: 0,
                similarity_matches: 0,
            }),
        }
    }

    pub fn config(&self) -> &LlmCacheConfig {
        &self.config
    }

    /// Storage hash of an extraction under this cache's bucket sizes.
    pub fn generate_hash(&self, extraction: &Extraction) -> String {
        generate_hash(extraction, &self.config.buckets)
    }

    /// Look up a health analysis using the configured similarity threshold.
    pub fn get_health_analysis(&self, extraction: &Extraction) -> Option<HealthReport> {
        self.get_health_analysis_with_threshold(extraction, self.config.similarity_threshold)
    }

    /// Look up the most similar cached health analysis.
    ///
    /// Expired records are swept first. Only a best match scoring at least
    /// `threshold` is returned; anything else counts as a miss.
    pub fn get_health_analysis_with_threshold(&self, extraction: &Extraction, threshold: f64) -> Option<HealthReport> {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        inner.remove_expired(now);

        let mut best: Option<(String, f64)> = None;
        let mut best_similarity = 0.0;

        // Oldest first, so ties keep the earliest record
        for (key, record) in inner.records.iter().rev() {
            let CachedAnalysis::Health { extraction: cached, .. } = &record.analysis else {
                continue;
            };
            let similarity = calculate_similarity(extraction, cached);
            if similarity > best_similarity {
                best_similarity = similarity;
                best = Some((key.clone(), similarity));
            }
        }

        if let Some((key, similarity)) = best.filter(|(_, s)| *s >= threshold) {
            let report = inner.records.peek_mut(&key).and_then(|record| {
                record.hit_count += 1;
                match &record.analysis {
                    CachedAnalysis::Health { health_report, .. } => Some(health_report.clone()),
                    CachedAnalysis::Meal { .. } => None,
                }
            });

            if let Some(report) = report {
                inner.hits += 1;
                inner.similarity_matches += 1;
                debug!(
                    "LLM cache hit: similarity {:.1}% (threshold {:.1}%, hit rate {:.1}%)",
                    similarity * 100.0,
                    threshold * 100.0,
                    inner.hit_rate()
                );
                metrics::record_cache_operation("llm", "hit");
                return Some(report);
            }
        }

        inner.misses += 1;
        debug!("LLM cache miss (best similarity {:.1}%)", best_similarity * 100.0);
        metrics::record_cache_operation("llm", "miss");
        None
    }

    /// Store a fresh health analysis.
    pub fn set_health_analysis(&self, extraction: &Extraction, health_report: &HealthReport) {
        let key = self.generate_hash(extraction);
        self.insert(
            key,
            CachedAnalysis::Health {
                extraction: extraction.clone(),
                health_report: health_report.clone(),
            },
        );
    }

    /// Store a meal analysis under its exact image hash.
    pub fn set_meal_analysis(&self, image_hash: &str, meal_result: &MealAnalysis) {
        self.insert(
            meal_key(image_hash),
            CachedAnalysis::Meal {
                meal_result: meal_result.clone(),
            },
        );
    }

    /// Retrieve a meal analysis by exact image hash.
    pub fn get_meal_analysis(&self, image_hash: &str) -> Option<MealAnalysis> {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        inner.remove_expired(now);

        let key = meal_key(image_hash);
        let cached = inner.records.peek_mut(&key).and_then(|record| {
            record.hit_count += 1;
            match &record.analysis {
                CachedAnalysis::Meal { meal_result } => Some(meal_result.clone()),
                CachedAnalysis::Health { .. } => None,
            }
        });

        match cached {
            Some(result) => {
                inner.hits += 1;
                debug!("Meal cache hit: {}", key);
                metrics::record_cache_operation("llm", "hit");
                Some(result)
            }
            None => {
                inner.misses += 1;
                metrics::record_cache_operation("llm", "miss");
                None
            }
        }
    }

    fn insert(&self, key: String, analysis: CachedAnalysis) {
        let now = Instant::now();
        let record = LlmCacheRecord {
            analysis,
            created_at: now,
            expires_at: now + self.config.ttl(),
            hit_count: 0,
        };

        let mut inner = self.inner.lock();
        if let Some((old_key, _)) = inner.records.push(key.clone(), record) {
            if old_key != key {
                debug!("LLM cache evicted oldest record {}", old_key);
                metrics::record_cache_operation("llm", "eviction");
            }
        }
        debug!("LLM result cached: {} (size {})", key, inner.records.len());
    }

    /// Get cache statistics
    pub fn get_stats(&self) -> LlmCacheStats {
        let inner = self.inner.lock();
        let size = inner.records.len();
        LlmCacheStats {
            size,
            max_entries: self.config.max_entries,
            hits: inner.hits,
            misses: inner.misses,
            similarity_matches: inner.similarity_matches,
            hit_rate: inner.hit_rate(),
            utilization_percent: percentage(size as f64, self.config.max_entries as f64),
        }
    }

    /// Estimate memory held by cached payloads from their serialized size.
    pub fn memory_usage(&self) -> CacheMemoryUsage {
        let inner = self.inner.lock();
        let estimated_bytes: usize = inner
            .records
            .iter()
            .map(|(_, record)| serde_json::to_vec(&record.analysis).map(|v| v.len()).unwrap_or(0))
            .sum();

        let mb = estimated_bytes as f64 / (1024.0 * 1024.0);
        let per_entry_mb = if inner.records.is_empty() {
            0.0
        } else {
            mb / inner.records.len() as f64
        };

        CacheMemoryUsage {
            estimated_bytes,
            estimated_mb: round_to(mb, 2),
            per_entry_mb: round_to(per_entry_mb, 3),
        }
    }

    /// Clear entire cache and reset statistics
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.records.clear();
        inner.hits = 0;
        inner.misses = 0;
        inner.similarity_matches = 0;
        info!("LLM response cache cleared");
    }

    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn meal_key(image_hash: &str) -> String {
    format!("meal:{}", image_hash)
}

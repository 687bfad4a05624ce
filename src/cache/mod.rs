// Cache management module
// Author: kelexine (https://github.com/kelexine)

pub mod llm;
pub mod manager;
pub mod models;
pub mod similarity;

pub use llm::{CachedAnalysis, LlmCacheRecord, LlmResponseCache};
pub use manager::CacheManager;
pub use models::{
    percentage, round_to, BucketConfig, CacheConfig, CacheEntry, CacheMemoryUsage, CacheStats, LlmCacheConfig,
    LlmCacheStats,
};
pub use similarity::{calculate_similarity, generate_hash, NutritionProfile};

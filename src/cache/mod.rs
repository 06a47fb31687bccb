//! Cache
//!
//! Este módulo contiene el cache de respuestas del proxy.

pub mod cache_config;
pub mod redis_client;
pub mod response_cache;

pub use cache_config::{CacheConfig, CachedResponse};
pub use response_cache::{MemoryCache, ResponseCache};

/// Operaciones de cache
#[async_trait::async_trait]
pub trait CacheOperations {
    async fn get(&self, key: &str) -> Option<CachedResponse>;
    async fn set(&self, key: &str, value: &CachedResponse);
    async fn invalidate_namespace(&self, namespace: &str);
}

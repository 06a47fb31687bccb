//! Cache de respuestas GET del proxy
//!
//! Las respuestas se agrupan por namespace para poder invalidar todo un
//! recurso (`work`, `vehicles`, ...) después de una mutación.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::cache_config::{namespace_prefix, namespaces_afectados, CacheConfig, CachedResponse};
use super::redis_client::RedisClient;
use super::CacheOperations;

#[derive(Debug, Clone)]
struct Entrada {
    response: CachedResponse,
    created_at: Instant,
}

/// Cache en memoria con TTL
#[derive(Clone)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, Entrada>>>,
    ttl: Duration,
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait::async_trait]
impl CacheOperations for MemoryCache {
    async fn get(&self, key: &str) -> Option<CachedResponse> {
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entrada) if entrada.created_at.elapsed() < self.ttl => {
                debug!("📥 Cache HIT para clave: {}", key);
                Some(entrada.response.clone())
            }
            Some(_) => {
                entries.remove(key);
                debug!("⌛ Cache expirado para clave: {}", key);
                None
            }
            None => None,
        }
    }

    async fn set(&self, key: &str, value: &CachedResponse) {
        let mut entries = self.entries.write().await;
        let ttl = self.ttl;
        entries.retain(|_, e| e.created_at.elapsed() < ttl);
        entries.insert(
            key.to_string(),
            Entrada {
                response: value.clone(),
                created_at: Instant::now(),
            },
        );
    }

    async fn invalidate_namespace(&self, namespace: &str) {
        let prefix = namespace_prefix(namespace);
        let mut entries = self.entries.write().await;
        let antes = entries.len();
        entries.retain(|key, _| !key.starts_with(&prefix));
        debug!(
            "🗑️ Namespace {} invalidado (eliminados: {})",
            namespace,
            antes - entries.len()
        );
    }
}

/// Cache usado por el gateway
#[derive(Clone)]
pub enum ResponseCache {
    Memory(MemoryCache),
    Redis(RedisClient),
    Disabled,
}

impl ResponseCache {
    /// Redis si hay URL y responde; si no, memoria
    pub async fn from_config(config: CacheConfig) -> Self {
        if config.default_ttl == 0 {
            info!("🚫 Cache de respuestas desactivado");
            return ResponseCache::Disabled;
        }

        if let Some(url) = config.redis_url.clone() {
            match RedisClient::new(&url, config.clone()).await {
                Ok(client) => return ResponseCache::Redis(client),
                Err(e) => warn!("⚠️ Redis no disponible ({}), usando cache en memoria", e),
            }
        }

        ResponseCache::Memory(MemoryCache::new(Duration::from_secs(config.default_ttl)))
    }

    /// Nombre del backend de cache y si está operativo
    pub async fn estado(&self) -> (&'static str, bool) {
        match self {
            ResponseCache::Memory(_) => ("memory", true),
            ResponseCache::Redis(client) => ("redis", client.is_connected().await),
            ResponseCache::Disabled => ("disabled", true),
        }
    }

    pub async fn get(&self, key: &str) -> Option<CachedResponse> {
        match self {
            ResponseCache::Memory(cache) => cache.get(key).await,
            ResponseCache::Redis(cache) => cache.get(key).await,
            ResponseCache::Disabled => None,
        }
    }

    pub async fn set(&self, key: &str, value: &CachedResponse) {
        match self {
            ResponseCache::Memory(cache) => cache.set(key, value).await,
            ResponseCache::Redis(cache) => cache.set(key, value).await,
            ResponseCache::Disabled => {}
        }
    }

    pub async fn invalidate_namespace(&self, namespace: &str) {
        match self {
            ResponseCache::Memory(cache) => cache.invalidate_namespace(namespace).await,
            ResponseCache::Redis(cache) => cache.invalidate_namespace(namespace).await,
            ResponseCache::Disabled => {}
        }
    }

    /// Invalidar el namespace mutado y los que dependen de él
    pub async fn invalidate_related(&self, namespace: &str) {
        for afectado in namespaces_afectados(namespace) {
            self.invalidate_namespace(afectado).await;
        }
    }
}

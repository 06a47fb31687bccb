use anyhow::Result;
use redis::{aio::ConnectionManager, AsyncCommands, RedisResult};
use tracing::{debug, error, info, warn};

use super::cache_config::{namespace_prefix, CacheConfig, CachedResponse};
use super::CacheOperations;

/// Cliente Redis con connection manager y operaciones async
#[derive(Clone)]
pub struct RedisClient {
    manager: ConnectionManager,
    config: CacheConfig,
}

impl RedisClient {
    /// Crear nuevo cliente Redis
    pub async fn new(redis_url: &str, config: CacheConfig) -> Result<Self> {
        info!("🔗 Conectando a Redis: {}", redis_url);

        let client = redis::Client::open(redis_url)?;
        let manager = ConnectionManager::new(client).await?;

        // Test de conexión usando un comando simple
        let mut conn = manager.clone();
        let _: () = redis::cmd("PING").query_async(&mut conn).await?;

        info!("✅ Redis conectado exitosamente");

        Ok(Self { manager, config })
    }

    /// Verificar si Redis está conectado
    pub async fn is_connected(&self) -> bool {
        let mut conn = self.manager.clone();
        match redis::cmd("PING").query_async::<_, String>(&mut conn).await {
            Ok(response) => response == "PONG",
            Err(_) => false,
        }
    }
}

#[async_trait::async_trait]
impl CacheOperations for RedisClient {
    async fn get(&self, key: &str) -> Option<CachedResponse> {
        let mut conn = self.manager.clone();

        match conn.get::<_, Option<String>>(key).await {
            Ok(Some(value)) => {
                debug!("📥 Cache HIT para clave: {}", key);
                serde_json::from_str(&value).ok()
            }
            Ok(None) => {
                debug!("❌ Cache MISS para clave: {}", key);
                None
            }
            Err(e) => {
                warn!("⚠️ Error leyendo cache para clave {}: {}", key, e);
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &CachedResponse) {
        let serialized = match serde_json::to_string(value) {
            Ok(s) => s,
            Err(e) => {
                error!("❌ No se pudo serializar la respuesta para {}: {}", key, e);
                return;
            }
        };

        let mut conn = self.manager.clone();
        let result: RedisResult<()> = conn.set_ex(key, serialized, self.config.default_ttl).await;

        match result {
            Ok(()) => debug!("💾 Cache SET para clave: {} (TTL: {}s)", key, self.config.default_ttl),
            Err(e) => error!("❌ Error guardando en cache para clave {}: {}", key, e),
        }
    }

    async fn invalidate_namespace(&self, namespace: &str) {
        let pattern = format!("{}*", namespace_prefix(namespace));
        let mut conn = self.manager.clone();

        let keys: Vec<String> = match conn.scan_match::<_, String>(&pattern).await {
            Ok(mut iter) => {
                let mut keys = Vec::new();
                while let Some(key) = iter.next_item().await {
                    keys.push(key);
                }
                keys
            }
            Err(e) => {
                warn!("⚠️ Error listando claves {}: {}", pattern, e);
                return;
            }
        };

        if keys.is_empty() {
            return;
        }

        let result: RedisResult<i64> = conn.del(&keys).await;
        match result {
            Ok(count) => debug!("🗑️ Namespace {} invalidado (eliminados: {})", namespace, count),
            // No fallar si no se puede eliminar
            Err(e) => warn!("⚠️ Error invalidando namespace {}: {}", namespace, e),
        }
    }
}

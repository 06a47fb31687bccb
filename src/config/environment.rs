//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno. Todas las variables
//! tienen un valor por defecto; un número mal escrito es un error.

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::cache::CacheConfig;

pub const DEFAULT_API_BASE: &str = "http://api:8000/api/v1";
pub const DEFAULT_SESSION_COOKIE: &str = "pgf_access";
/// 25 MiB: fotos y PDF de evidencias
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} debe ser un número válido (valor: '{value}')")]
    InvalidNumber { var: String, value: String },

    #[error("{var} debe ser mayor que cero")]
    MustBePositive { var: String },
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    /// Origen del backend REST
    pub api_base: String,
    /// Cookie HTTP-only con el token de sesión
    pub session_cookie: String,
    /// Si está presente se verifica la firma del token de sesión
    pub jwt_secret: Option<String>,
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    pub cache_ttl_secs: u64,
    pub redis_url: Option<String>,
    pub dashboard_poll_secs: u64,
    /// Tamaño máximo del cuerpo en subidas y en el proxy
    pub max_upload_bytes: usize,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            host: "0.0.0.0".to_string(),
            port: 3000,
            api_base: DEFAULT_API_BASE.to_string(),
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
            jwt_secret: None,
            cors_origins: Vec::new(),
            request_timeout_secs: 30,
            cache_ttl_secs: 30,
            redis_url: None,
            dashboard_poll_secs: 30,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

fn numero<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
            var: var.to_string(),
            value,
        }),
    }
}

fn positivo<T: std::str::FromStr + Default + PartialEq>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    default: T,
) -> Result<T, ConfigError> {
    let valor = numero(lookup, var, default)?;
    if valor == T::default() {
        return Err(ConfigError::MustBePositive { var: var.to_string() });
    }
    Ok(valor)
}

impl EnvironmentConfig {
    /// Leer la configuración del proceso
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Leer la configuración desde una fuente arbitraria
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let texto = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        Ok(Self {
            environment: texto("ENVIRONMENT").unwrap_or(defaults.environment),
            host: texto("HOST").unwrap_or(defaults.host),
            port: numero(&lookup, "PORT", defaults.port)?,
            api_base: texto("API_BASE")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
            session_cookie: texto("SESSION_COOKIE").unwrap_or(defaults.session_cookie),
            jwt_secret: texto("JWT_SECRET"),
            cors_origins: texto("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            request_timeout_secs: numero(&lookup, "REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)?,
            cache_ttl_secs: numero(&lookup, "CACHE_TTL_SECS", defaults.cache_ttl_secs)?,
            redis_url: texto("REDIS_URL"),
            dashboard_poll_secs: positivo(&lookup, "DASHBOARD_POLL_SECS", defaults.dashboard_poll_secs)?,
            max_upload_bytes: positivo(&lookup, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Obtener la dirección de escucha
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn dashboard_poll_interval(&self) -> Duration {
        Duration::from_secs(self.dashboard_poll_secs)
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            redis_url: self.redis_url.clone(),
            default_ttl: self.cache_ttl_secs,
        }
    }
}

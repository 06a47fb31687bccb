//! Configuración de cache
//!
//! Este módulo contiene la configuración para el cache de respuestas.

use serde::{Deserialize, Serialize};

/// Prefijo común de todas las claves
pub const KEY_PREFIX: &str = "pgf";

/// Configuración del cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Sin URL se usa el cache en memoria
    pub redis_url: Option<String>,
    pub default_ttl: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            default_ttl: 30,
        }
    }
}

/// Respuesta GET almacenada en cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

/// Namespace de una ruta del backend: su primer segmento
/// (`work/ordenes/5/` -> `work`)
pub fn namespace_de(path: &str) -> &str {
    path.trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default()
}

/// Namespaces que nunca se guardan: los reportes se recalculan en cada consulta
pub const NAMESPACES_SIN_CACHE: &[&str] = &["reports"];

/// `false` para rutas cuyas respuestas no deben guardarse
pub fn es_cacheable(path: &str) -> bool {
    !NAMESPACES_SIN_CACHE.contains(&namespace_de(path))
}

/// Namespaces a invalidar tras una mutación en `namespace`
///
/// Una OT mueve stock de inventario; el ingreso de un vehículo abre OTs.
pub fn namespaces_afectados(namespace: &str) -> Vec<&str> {
    let relacionados: &[&str] = match namespace {
        "work" => &["inventory", "vehicles", "reports"],
        "vehicles" => &["work", "reports"],
        "inventory" => &["work", "reports"],
        _ => &["reports"],
    };

    std::iter::once(namespace)
        .chain(relacionados.iter().copied().filter(|n| *n != namespace))
        .collect()
}

/// Prefijo de todas las claves de un namespace
pub fn namespace_prefix(namespace: &str) -> String {
    format!("{}:{}:", KEY_PREFIX, namespace)
}

/// Clave de cache: la respuesta depende de la ruta, la query y la sesión
pub fn cache_key(path: &str, query: Option<&str>, token: Option<&str>) -> String {
    let material = format!("{}?{}#{}", path, query.unwrap_or_default(), token.unwrap_or_default());
    format!(
        "{}{:x}",
        namespace_prefix(namespace_de(path)),
        md5::compute(material.as_bytes())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_de() {
        assert_eq!(namespace_de("work/ordenes/5/"), "work");
        assert_eq!(namespace_de("/vehicles/"), "vehicles");
    }

    #[test]
    fn test_namespaces_afectados() {
        assert_eq!(namespaces_afectados("work"), vec!["work", "inventory", "vehicles", "reports"]);
        assert_eq!(namespaces_afectados("vehicles"), vec!["vehicles", "work", "reports"]);
        assert_eq!(namespaces_afectados("users"), vec!["users", "reports"]);
    }

    #[test]
    fn test_reportes_no_se_cachean() {
        assert!(!es_cacheable("reports/dashboard/"));
        assert!(es_cacheable("work/ordenes/"));
    }

    #[test]
    fn test_cache_key_depende_de_sesion() {
        let a = cache_key("work/ordenes/", None, Some("token-a"));
        let b = cache_key("work/ordenes/", None, Some("token-b"));
        assert_ne!(a, b);
        assert!(a.starts_with("pgf:work:"));
    }
}

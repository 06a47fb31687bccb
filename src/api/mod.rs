//! API endpoints
//!
//! Este módulo contiene los endpoints del gateway, montados bajo `/api`.

pub mod dashboard;
pub mod evidencias;
pub mod forms;
pub mod proxy;
pub mod validation;

use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// Crear el router principal de la API
///
/// `max_upload_bytes` limita el cuerpo en el proxy y en la subida de evidencias.
pub fn create_api_router(max_upload_bytes: usize) -> axum::Router<AppState> {
    axum::Router::new()
        .merge(proxy::create_proxy_router(max_upload_bytes))
        .merge(validation::create_validation_router())
        .merge(forms::create_forms_router())
        .merge(evidencias::create_evidencias_router(max_upload_bytes))
        .merge(dashboard::create_dashboard_router())
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let (cache, cache_ok) = state.cache.estado().await;
    Json(json!({
        "status": if cache_ok { "healthy" } else { "degraded" },
        "service": "pgf-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "api_base": state.config.api_base,
        "cache": cache,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

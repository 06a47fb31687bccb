//! PGF Gateway
//!
//! Capa intermedia entre la UI del taller y el backend REST de la flota:
//! valida y normaliza los formularios de órdenes de trabajo y vehículos,
//! reconcilia los envíos con las respuestas del backend y actúa como
//! proxy autenticado con cache de respuestas.

pub mod api;
pub mod cache;
pub mod clients;
pub mod config;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

use axum::{routing::get, Router};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::middleware::cors::cors_layer;
use crate::state::AppState;

/// Router completo de la aplicación
pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(api::health_check))
        .nest("/api", api::create_api_router(state.config.max_upload_bytes))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

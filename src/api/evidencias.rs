//! Subida de evidencias
//!
//! El cuerpo de la solicitud es el archivo tal cual; el nombre viaja en
//! la query (`?ot=<id>&nombre=<archivo>`).

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::{header, HeaderMap},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::watch;

use crate::{
    clients::backend_client::{EvidenciaArchivo, UploadProgress},
    middleware::session::Session,
    state::AppState,
    utils::errors::{bad_request_error, AppError, AppResult},
};

#[derive(Debug, Deserialize)]
pub struct SubirEvidenciaQuery {
    pub ot: String,
    #[serde(default)]
    pub nombre: Option<String>,
}

pub fn create_evidencias_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/evidencias/subir", post(subir_evidencia))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// POST /api/evidencias/subir?ot=<id>
pub async fn subir_evidencia(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<SubirEvidenciaQuery>,
    headers: HeaderMap,
    datos: Bytes,
) -> AppResult<Json<Value>> {
    if !session.is_authenticated() {
        return Err(AppError::Unauthorized("Sesión no encontrada".to_string()));
    }
    if query.ot.trim().is_empty() {
        return Err(bad_request_error("Debe indicar la orden de trabajo (ot)"));
    }
    if datos.is_empty() {
        return Err(bad_request_error("El archivo está vacío"));
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let archivo = EvidenciaArchivo {
        nombre: query.nombre.clone().unwrap_or_else(|| "evidencia".to_string()),
        content_type,
        datos,
    };

    let (sender, mut receiver) = watch::channel(UploadProgress::default());
    let ot = query.ot.clone();
    let monitor = tokio::spawn(async move {
        let mut ultimo = 0u8;
        while receiver.changed().await.is_ok() {
            let porcentaje = receiver.borrow().porcentaje();
            // Un log cada 25%
            if porcentaje / 25 > ultimo / 25 {
                log::info!("📤 Evidencia OT {}: {}%", ot, porcentaje);
            }
            ultimo = porcentaje;
        }
    });

    let sender = Arc::new(sender);
    let resultado = state
        .backend_for(&session)
        .upload_evidence(&query.ot, archivo, sender.clone())
        .await;
    let progreso = *sender.borrow();
    monitor.abort();

    let evidencia = resultado?;
    state.cache.invalidate_related("work").await;
    log::info!("✅ Evidencia subida para OT {}", query.ot);

    Ok(Json(json!({
        "evidencia": evidencia,
        "progreso": {
            "enviados": progreso.enviados,
            "total": progreso.total,
            "porcentaje": progreso.porcentaje(),
        }
    })))
}

//! Dashboard en vivo
//!
//! `GET /api/dashboard/stream` abre un stream SSE que emite el estado
//! del dashboard cada `DASHBOARD_POLL_SECS`. El sondeo se detiene cuando
//! el cliente se desconecta.

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures::{stream, Stream};
use serde::Deserialize;

use crate::{
    middleware::session::Session,
    services::dashboard_poller::spawn_dashboard_poller,
    state::AppState,
    utils::errors::{bad_request_error, AppError, AppResult},
};

pub const DEFAULT_DASHBOARD_PATH: &str = "reports/dashboard/";

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub path: Option<String>,
}

pub fn create_dashboard_router() -> Router<AppState> {
    Router::new().route("/dashboard/stream", get(dashboard_stream))
}

/// GET /api/dashboard/stream
pub async fn dashboard_stream(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    if !session.is_authenticated() {
        return Err(AppError::Unauthorized("Sesión no encontrada".to_string()));
    }

    let path = query
        .path
        .unwrap_or_else(|| DEFAULT_DASHBOARD_PATH.to_string())
        .trim_start_matches('/')
        .to_string();
    if path.contains("..") || path.contains("://") {
        return Err(bad_request_error("Ruta de dashboard inválida"));
    }

    log::info!("📊 Dashboard en vivo para {}", path);
    let handle = spawn_dashboard_poller(
        Arc::new(state.backend_for(&session)),
        path,
        state.config.dashboard_poll_interval(),
    );
    let receiver = handle.subscribe();

    // El handle vive dentro del stream: al cerrarse la conexión se aborta el sondeo
    let eventos = stream::unfold((handle, receiver), |(handle, mut receiver)| async move {
        receiver.changed().await.ok()?;
        let snapshot = receiver.borrow_and_update().clone();
        let evento = Event::default()
            .event("dashboard")
            .json_data(&snapshot)
            .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()));
        Some((Ok(evento), (handle, receiver)))
    });

    Ok(Sse::new(eventos).keep_alive(KeepAlive::default()))
}

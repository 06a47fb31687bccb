//! Envío de formularios
//!
//! Cada endpoint recorre el ciclo completo del formulario (carga,
//! edición, validación, envío) y devuelve el resultado junto con las
//! notificaciones generadas para la UI.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{post, put},
    Json, Router,
};
use serde::Serialize;

use crate::{
    middleware::session::Session,
    models::{
        vehicle::VehicleFormInput,
        work_order::{OrdenAccion, WorkOrderEdit},
    },
    services::{
        form_reconciler::{ejecutar_accion_orden, FormMode, Navigation, SubmitOutcome, VehicleForm, WorkOrderForm},
        notifications::{Notification, NotificationCenter},
    },
    state::AppState,
    utils::errors::{AppError, AppResult},
};

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum FormResultado {
    Envio(SubmitOutcome),
    CargaFallida { resultado: &'static str, navigation: Navigation },
}

#[derive(Debug, Serialize)]
pub struct FormResponse {
    #[serde(flatten)]
    pub resultado: FormResultado,
    pub notifications: Vec<Notification>,
}

pub fn create_forms_router() -> Router<AppState> {
    Router::new()
        .route("/forms/ordenes", post(crear_orden))
        .route("/forms/ordenes/:id", put(editar_orden))
        .route("/forms/ordenes/:id/acciones/:accion", post(accion_orden))
        .route("/forms/vehiculos", post(crear_vehiculo))
}

/// Status HTTP del resultado
pub fn status_de(outcome: &SubmitOutcome) -> StatusCode {
    match outcome {
        SubmitOutcome::Guardado { .. } => StatusCode::OK,
        SubmitOutcome::Invalido { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        SubmitOutcome::Rechazado { status: Some(s), .. } => {
            StatusCode::from_u16(*s).unwrap_or(StatusCode::BAD_GATEWAY)
        }
        SubmitOutcome::Rechazado { status: None, .. } => StatusCode::BAD_GATEWAY,
        SubmitOutcome::SinPermiso { .. } => StatusCode::FORBIDDEN,
        SubmitOutcome::NoDisponible { .. } => StatusCode::CONFLICT,
    }
}

fn responder(status: StatusCode, resultado: FormResultado, centro: &NotificationCenter) -> Response {
    let body = FormResponse {
        resultado,
        notifications: centro.drain(),
    };
    (status, Json(body)).into_response()
}

fn exigir_sesion(session: &Session) -> AppResult<()> {
    if session.is_authenticated() {
        Ok(())
    } else {
        Err(AppError::Unauthorized("Sesión no encontrada".to_string()))
    }
}

async fn enviar_orden(state: AppState, session: Session, mode: FormMode, edit: WorkOrderEdit) -> AppResult<Response> {
    exigir_sesion(&session)?;
    let centro = Arc::new(NotificationCenter::new());
    let mut form = WorkOrderForm::new(
        Arc::new(state.backend_for(&session)),
        centro.clone(),
        state.cache.clone(),
        session.rol,
        mode,
    );

    if let Err(navigation) = form.load().await {
        let resultado = FormResultado::CargaFallida {
            resultado: "carga_fallida",
            navigation,
        };
        return Ok(responder(StatusCode::BAD_GATEWAY, resultado, &centro));
    }

    form.merge_input(edit);
    let outcome = form.submit().await;
    Ok(responder(status_de(&outcome), FormResultado::Envio(outcome), &centro))
}

/// POST /api/forms/ordenes
pub async fn crear_orden(
    State(state): State<AppState>,
    session: Session,
    Json(edit): Json<WorkOrderEdit>,
) -> AppResult<Response> {
    log::info!("📝 Creando orden de trabajo");
    enviar_orden(state, session, FormMode::Crear, edit).await
}

/// PUT /api/forms/ordenes/:id
pub async fn editar_orden(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Json(edit): Json<WorkOrderEdit>,
) -> AppResult<Response> {
    log::info!("✏️ Editando orden de trabajo {}", id);
    enviar_orden(state, session, FormMode::Editar(id), edit).await
}

/// POST /api/forms/ordenes/:id/acciones/:accion
pub async fn accion_orden(
    State(state): State<AppState>,
    session: Session,
    Path((id, accion)): Path<(String, String)>,
) -> AppResult<Response> {
    exigir_sesion(&session)?;
    let accion = OrdenAccion::desde_segmento(&accion)
        .ok_or_else(|| AppError::NotFound(format!("Acción desconocida: {}", accion)))?;

    log::info!("⚙️ Acción {} sobre OT {}", accion.segmento(), id);
    let centro = NotificationCenter::new();
    let api = state.backend_for(&session);
    let outcome = ejecutar_accion_orden(&api, &centro, &state.cache, session.rol, &id, accion).await;
    Ok(responder(status_de(&outcome), FormResultado::Envio(outcome), &centro))
}

/// POST /api/forms/vehiculos
pub async fn crear_vehiculo(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<VehicleFormInput>,
) -> AppResult<Response> {
    exigir_sesion(&session)?;
    log::info!("🚗 Registrando vehículo");

    let centro = Arc::new(NotificationCenter::new());
    let mut form = VehicleForm::new(
        Arc::new(state.backend_for(&session)),
        centro.clone(),
        state.cache.clone(),
        session.rol,
    );
    let outcome = form.submit(&input).await;
    Ok(responder(status_de(&outcome), FormResultado::Envio(outcome), &centro))
}

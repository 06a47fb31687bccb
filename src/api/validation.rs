//! Validación sin envío
//!
//! Devuelve el mismo `ValidationResult` que se usa antes de enviar, para
//! marcar errores mientras el usuario completa el formulario.

use axum::{extract::Json, routing::post, Router};

use crate::{
    models::{validation::ValidationResult, vehicle::VehicleFormInput, work_order::WorkOrderFormInput},
    services::{validate_vehicle, validate_work_order},
    state::AppState,
};

pub fn create_validation_router() -> Router<AppState> {
    Router::new()
        .route("/validate/orden", post(validar_orden))
        .route("/validate/vehiculo", post(validar_vehiculo))
}

/// POST /api/validate/orden
pub async fn validar_orden(Json(input): Json<Option<WorkOrderFormInput>>) -> Json<ValidationResult> {
    let result = validate_work_order(input.as_ref());
    log::debug!("🔎 Validación de OT: {} error(es)", result.errors.len());
    Json(result)
}

/// POST /api/validate/vehiculo
pub async fn validar_vehiculo(Json(input): Json<Option<VehicleFormInput>>) -> Json<ValidationResult> {
    Json(validate_vehicle(input.as_ref()))
}

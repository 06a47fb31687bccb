//! Validación del formulario de vehículo

use crate::models::validation::{FieldErrors, ValidationResult};
use crate::models::vehicle::VehicleFormInput;
use crate::utils::validation::{validate_max_length, validate_patente, validate_required, validate_year};

pub const MSG_SIN_DATOS: &str = "No hay datos del vehículo";
pub const MODELO_MAX_LEN: usize = 100;

pub fn validate_vehicle(input: Option<&VehicleFormInput>) -> ValidationResult {
    let Some(input) = input else {
        return ValidationResult::general(MSG_SIN_DATOS);
    };

    let mut errors = FieldErrors::new();

    let patente = input.patente.as_deref();
    if let Some(msg) = validate_required(patente, "La patente")
        .or_else(|| validate_patente(patente.unwrap_or_default()))
    {
        errors.insert("patente".to_string(), msg);
    }

    if let Some(msg) = validate_required(input.marca.as_deref(), "La marca") {
        errors.insert("marca".to_string(), msg);
    }

    let modelo = input.modelo.as_deref();
    if let Some(msg) = validate_required(modelo, "El modelo")
        .or_else(|| validate_max_length(modelo.unwrap_or_default().trim(), MODELO_MAX_LEN, "El modelo"))
    {
        errors.insert("modelo".to_string(), msg);
    }

    let anio = input.anio.as_ref().filter(|a| !a.esta_vacia());
    match anio {
        None => {
            errors.insert("anio".to_string(), "El año es requerido".to_string());
        }
        Some(anio) => {
            if let Some(msg) = validate_year(anio) {
                errors.insert("anio".to_string(), msg);
            }
        }
    }

    ValidationResult::from_errors(errors)
}

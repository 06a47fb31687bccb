//! Interpretación de respuestas de error del backend
//!
//! El backend responde `{detail}`, `{errors: {...}}`, errores por campo al
//! estilo DRF, texto plano o nada. Todo termina en un `detail` legible y
//! un mapa de errores con las mismas rutas que la validación local.

use serde_json::{Map, Value};

use crate::models::validation::FieldErrors;

const CLAVES_NO_CAMPO: [&str; 5] = ["detail", "message", "error", "code", "errors"];
const MAX_DETALLE: usize = 500;

/// Error del backend ya interpretado
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendErrorInfo {
    pub status: u16,
    pub detail: String,
    pub errors: FieldErrors,
}

/// Mensaje genérico según el status HTTP
pub fn mensaje_por_status(status: u16) -> String {
    match status {
        400 => "Solicitud inválida".to_string(),
        401 => "Sesión expirada, vuelva a iniciar sesión".to_string(),
        403 => "No tiene permisos para realizar esta acción".to_string(),
        404 => "Recurso no encontrado".to_string(),
        409 => "Conflicto con el estado actual del recurso".to_string(),
        s if s >= 500 => format!("Error del servidor ({})", s),
        s => format!("Error {}", s),
    }
}

/// Nombre de campo del backend a ruta del formulario
fn ruta_formulario(campo: &str) -> &str {
    match campo {
        "items_data" => "items",
        otro => otro,
    }
}

fn unir_ruta(prefijo: &str, campo: &str) -> String {
    if prefijo.is_empty() {
        campo.to_string()
    } else {
        format!("{}.{}", prefijo, campo)
    }
}

fn mensajes(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(valores) => {
            let textos: Vec<&str> = valores.iter().filter_map(Value::as_str).collect();
            (!textos.is_empty()).then(|| textos.join(" "))
        }
        _ => None,
    }
}

fn recolectar(prefijo: &str, value: &Value, errors: &mut FieldErrors) {
    match value {
        Value::Object(campos) => {
            for (campo, valor) in campos {
                recolectar(&unir_ruta(prefijo, ruta_formulario(campo)), valor, errors);
            }
        }
        Value::Array(valores) if valores.iter().any(Value::is_object) => {
            for (index, valor) in valores.iter().enumerate() {
                recolectar(&unir_ruta(prefijo, &index.to_string()), valor, errors);
            }
        }
        otro => {
            if let Some(msg) = mensajes(otro) {
                if !prefijo.is_empty() {
                    errors.insert(prefijo.to_string(), msg);
                }
            }
        }
    }
}

fn desde_objeto(status: u16, objeto: &Map<String, Value>) -> BackendErrorInfo {
    let mut errors = FieldErrors::new();

    match objeto.get("errors") {
        Some(Value::Object(_)) => recolectar("", &objeto["errors"], &mut errors),
        _ => {
            for (campo, valor) in objeto {
                if CLAVES_NO_CAMPO.contains(&campo.as_str()) || campo == "non_field_errors" {
                    continue;
                }
                recolectar(ruta_formulario(campo), valor, &mut errors);
            }
        }
    }

    let detail = ["detail", "message", "error", "non_field_errors"]
        .iter()
        .find_map(|clave| objeto.get(*clave).and_then(mensajes))
        .unwrap_or_else(|| {
            if errors.is_empty() {
                mensaje_por_status(status)
            } else {
                "Revise los campos marcados".to_string()
            }
        });

    BackendErrorInfo {
        status,
        detail,
        errors,
    }
}

/// Interpretar el cuerpo de una respuesta de error
pub fn parse_backend_error(status: u16, body: &str) -> BackendErrorInfo {
    let body = body.trim();
    if body.is_empty() {
        return BackendErrorInfo {
            status,
            detail: mensaje_por_status(status),
            errors: FieldErrors::new(),
        };
    }

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(objeto)) => desde_objeto(status, &objeto),
        Ok(otro) => BackendErrorInfo {
            status,
            detail: mensajes(&otro).unwrap_or_else(|| mensaje_por_status(status)),
            errors: FieldErrors::new(),
        },
        Err(_) => BackendErrorInfo {
            status,
            detail: body.chars().take(MAX_DETALLE).collect(),
            errors: FieldErrors::new(),
        },
    }
}

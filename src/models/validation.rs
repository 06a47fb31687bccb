//! Resultado de validación compartido por formularios y backend

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Clave usada cuando el objeto completo es inválido
pub const GENERAL: &str = "_general";

/// Ruta de campo -> mensaje. Los ítems usan `items.<indice>.<campo>`.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: FieldErrors,
}

impl ValidationResult {
    pub fn from_errors(errors: FieldErrors) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// Error estructural: solo se informa la clave `_general`
    pub fn general(message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(GENERAL.to_string(), message.to_string());
        Self::from_errors(errors)
    }
}

/// Ruta de error para un campo de ítem
pub fn item_path(index: usize, field: &str) -> String {
    format!("items.{}.{}", index, field)
}

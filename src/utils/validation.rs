//! Validadores de campo
//!
//! Cada validador recibe un valor (y parámetros opcionales) y devuelve
//! `None` si el valor es válido o `Some(mensaje)` con el error listo
//! para mostrar junto al campo.

use chrono::Datelike;

use super::normalization::{es_formato_patente, limpiar_patente};

/// Año mínimo aceptado para un vehículo
pub const ANIO_MINIMO: i32 = 1900;

/// Longitud mínima de contraseña
pub const PASSWORD_MIN_LEN: usize = 8;

pub const MSG_PASSWORD_LARGO: &str = "al menos 8 caracteres";
pub const MSG_PASSWORD_MAYUSCULA: &str = "una letra mayúscula";
pub const MSG_PASSWORD_MINUSCULA: &str = "una letra minúscula";
pub const MSG_PASSWORD_NUMERO: &str = "un número";
pub const MSG_PASSWORD_ESPECIAL: &str = "un carácter especial";

pub const MSG_PATENTE_INVALIDA: &str = "Formato de patente inválido (ej: AB1234 o ABCD12)";

/// Validar que un campo tenga contenido
pub fn validate_required(value: Option<&str>, label: &str) -> Option<String> {
    match value {
        Some(v) if !v.trim().is_empty() => None,
        _ => Some(format!("{} es requerido", label)),
    }
}

/// Validar formato de email
///
/// Un valor vacío se considera válido: la obligatoriedad la revisa
/// `validate_required`.
pub fn validate_email(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let Some((local, dominio)) = value.rsplit_once('@') else {
        return Some("El correo debe contener @".to_string());
    };

    if dominio.is_empty() {
        return Some("El correo debe incluir un dominio".to_string());
    }

    if local.is_empty() || !dominio.contains('.') || !validator::validate_email(value) {
        return Some("Ingrese un correo electrónico válido".to_string());
    }

    None
}

/// Validar fortaleza de contraseña
///
/// Acumula todas las reglas incumplidas en un solo mensaje.
pub fn validate_password(value: &str) -> Option<String> {
    if value.is_empty() {
        return None;
    }

    let mut faltantes = Vec::new();

    if value.chars().count() < PASSWORD_MIN_LEN {
        faltantes.push(MSG_PASSWORD_LARGO);
    }
    if !value.chars().any(|c| c.is_uppercase()) {
        faltantes.push(MSG_PASSWORD_MAYUSCULA);
    }
    if !value.chars().any(|c| c.is_lowercase()) {
        faltantes.push(MSG_PASSWORD_MINUSCULA);
    }
    if !value.chars().any(|c| c.is_ascii_digit()) {
        faltantes.push(MSG_PASSWORD_NUMERO);
    }
    if !value.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace()) {
        faltantes.push(MSG_PASSWORD_ESPECIAL);
    }

    if faltantes.is_empty() {
        None
    } else {
        Some(format!("La contraseña debe tener: {}", faltantes.join(", ")))
    }
}

/// Validar que un valor sea numérico y esté dentro del rango indicado
pub fn validate_number(
    value: &str,
    label: &str,
    min: Option<f64>,
    max: Option<f64>,
) -> Option<String> {
    let numero = match value.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => return Some(format!("{} debe ser un número", label)),
    };

    if let Some(min) = min {
        if numero < min {
            return Some(format!("{} debe ser mayor o igual a {}", label, min));
        }
    }

    if let Some(max) = max {
        if numero > max {
            return Some(format!("{} debe ser menor o igual a {}", label, max));
        }
    }

    None
}

/// Validar longitud mínima (en caracteres)
pub fn validate_min_length(value: &str, min: usize, label: &str) -> Option<String> {
    if value.is_empty() {
        return None;
    }
    if value.chars().count() < min {
        return Some(format!("{} debe tener al menos {} caracteres", label, min));
    }
    None
}

/// Validar longitud máxima (en caracteres)
pub fn validate_max_length(value: &str, max: usize, label: &str) -> Option<String> {
    if value.is_empty() {
        return None;
    }
    if value.chars().count() > max {
        return Some(format!("{} no puede exceder {} caracteres", label, max));
    }
    None
}

/// Validar año de un vehículo contra el año calendario actual
pub fn validate_year<V: std::fmt::Display>(value: V) -> Option<String> {
    validate_year_at(value, chrono::Local::now().year())
}

/// Validar año con un año actual explícito
pub fn validate_year_at<V: std::fmt::Display>(value: V, anio_actual: i32) -> Option<String> {
    let texto = value.to_string();
    let anio = match texto.trim().parse::<i32>() {
        Ok(a) => a,
        Err(_) => return Some("El año debe ser un número".to_string()),
    };

    if anio < ANIO_MINIMO {
        return Some(format!("El año debe ser mayor o igual a {}", ANIO_MINIMO));
    }

    let maximo = anio_actual + 1;
    if anio > maximo {
        return Some(format!("El año no puede ser mayor a {}", maximo));
    }

    None
}

/// Validar formato de patente chilena (AB1234 o ABCD12)
pub fn validate_patente(value: &str) -> Option<String> {
    if value.is_empty() {
        return None;
    }
    if es_formato_patente(&limpiar_patente(value)) {
        None
    } else {
        Some(MSG_PATENTE_INVALIDA.to_string())
    }
}

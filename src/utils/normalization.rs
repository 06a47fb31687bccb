//! Normalización de entradas de formulario
//!
//! Transformaciones puras aplicadas mientras el usuario escribe y justo
//! antes de enviar los datos al backend.

use std::str::FromStr;

use lazy_static::lazy_static;
use num_traits::FromPrimitive;
use regex::Regex;
use rust_decimal::Decimal;

lazy_static! {
    /// Formato antiguo: dos letras y cuatro dígitos
    static ref PATENTE_ANTIGUA: Regex = Regex::new(r"^[A-Z]{2}[0-9]{4}$").unwrap();
    /// Formato nuevo: cuatro letras y dos dígitos
    static ref PATENTE_NUEVA: Regex = Regex::new(r"^[A-Z]{4}[0-9]{2}$").unwrap();
}

/// Mayúsculas y sin separadores (espacios, guiones, guiones bajos)
pub fn limpiar_patente(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .flat_map(char::to_uppercase)
        .collect()
}

/// Limpieza mientras se escribe: mayúsculas y sin espacios
pub fn limpiar_patente_en_vivo(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// La patente ya limpia coincide con alguno de los formatos chilenos
pub fn es_formato_patente(limpia: &str) -> bool {
    PATENTE_ANTIGUA.is_match(limpia) || PATENTE_NUEVA.is_match(limpia)
}

/// Patente canónica, o `None` si no corresponde a un formato válido
pub fn normalizar_patente(value: &str) -> Option<String> {
    let limpia = limpiar_patente(value);
    es_formato_patente(&limpia).then_some(limpia)
}

/// Interpretar un decimal escrito por el usuario (acepta coma decimal)
pub fn parse_decimal_input(value: &str) -> Option<Decimal> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    Decimal::from_str(&value.replace(',', ".")).ok()
}

/// Convertir un número JSON a decimal
pub fn decimal_desde_f64(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_f64(value)
}

/// Los decimales viajan al backend siempre como string
pub fn decimal_para_transporte(value: Decimal) -> String {
    value.to_string()
}

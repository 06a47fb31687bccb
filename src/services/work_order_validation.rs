//! Validación de formularios de Orden de Trabajo
//!
//! Compone los validadores de campo en un `ValidationResult` con todas
//! las fallas del formulario.

use num_traits::Zero;

use crate::models::validation::{item_path, FieldErrors, ValidationResult};
use crate::models::work_order::{EntradaNumerica, ItemInput, TipoItem, WorkOrderFormInput};
use crate::utils::validation::validate_required;

pub const MSG_SIN_DATOS: &str = "No hay datos de la orden de trabajo";
pub const MSG_VEHICULO: &str = "Debe seleccionar un vehículo";
pub const MSG_RESPONSABLE: &str = "Debe seleccionar un responsable";
pub const MSG_SIN_ITEMS: &str = "Debe agregar al menos un ítem";
pub const MSG_REPUESTO_O_DESCRIPCION: &str = "Seleccione un repuesto o ingrese una descripción";
pub const MSG_DESCRIPCION: &str = "La descripción es requerida";
pub const MSG_CANTIDAD: &str = "La cantidad debe ser mayor a 0";
pub const MSG_CANTIDAD_NUMERO: &str = "La cantidad debe ser un número";
pub const MSG_COSTO_NUMERO: &str = "El costo unitario debe ser un número";
pub const MSG_COSTO_NEGATIVO: &str = "El costo unitario no puede ser negativo";

/// Identificador seleccionado (no vacío y distinto del centinela "0")
fn id_seleccionado(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some(v) if !v.is_empty() && v != "0")
}

/// Validar una OT completa
pub fn validate_work_order(input: Option<&WorkOrderFormInput>) -> ValidationResult {
    let input = match input {
        Some(input) if !input.esta_vacio() => input,
        _ => return ValidationResult::general(MSG_SIN_DATOS),
    };

    let mut errors = FieldErrors::new();

    if !id_seleccionado(input.vehiculo.as_deref()) {
        errors.insert("vehiculo".to_string(), MSG_VEHICULO.to_string());
    }

    if let Some(msg) = validate_required(input.motivo.as_deref(), "El motivo") {
        errors.insert("motivo".to_string(), msg);
    }

    if !id_seleccionado(input.responsable.as_deref()) {
        errors.insert("responsable".to_string(), MSG_RESPONSABLE.to_string());
    }

    if input.items.is_empty() {
        errors.insert("items".to_string(), MSG_SIN_ITEMS.to_string());
    }

    for (index, item) in input.items.iter().enumerate() {
        validate_item(index, item, &mut errors);
    }

    ValidationResult::from_errors(errors)
}

/// Reglas de un ítem según su tipo
fn validate_item(index: usize, item: &ItemInput, errors: &mut FieldErrors) {
    match item.tipo {
        TipoItem::Repuesto => {
            if item.esta_vacio() {
                errors.insert(
                    item_path(index, "descripcion"),
                    MSG_REPUESTO_O_DESCRIPCION.to_string(),
                );
            }
        }
        TipoItem::Servicio => {
            if item.descripcion_texto().is_empty() {
                errors.insert(item_path(index, "descripcion"), MSG_DESCRIPCION.to_string());
            }
        }
    }

    match item.cantidad.as_ref().filter(|c| !c.esta_vacia()) {
        None => {
            errors.insert(item_path(index, "cantidad"), MSG_CANTIDAD.to_string());
        }
        Some(cantidad) => match cantidad.como_decimal() {
            None => {
                errors.insert(item_path(index, "cantidad"), MSG_CANTIDAD_NUMERO.to_string());
            }
            Some(c) if c <= Zero::zero() => {
                errors.insert(item_path(index, "cantidad"), MSG_CANTIDAD.to_string());
            }
            Some(_) => {}
        },
    }

    // Costo vacío equivale a 0
    if let Some(costo) = item.costo_unitario.as_ref().filter(|c| !c.esta_vacia()) {
        validate_costo(index, costo, errors);
    }
}

fn validate_costo(index: usize, costo: &EntradaNumerica, errors: &mut FieldErrors) {
    match costo.como_decimal() {
        None => {
            errors.insert(item_path(index, "costo_unitario"), MSG_COSTO_NUMERO.to_string());
        }
        Some(c) if c.is_sign_negative() && !c.is_zero() => {
            errors.insert(
                item_path(index, "costo_unitario"),
                MSG_COSTO_NEGATIVO.to_string(),
            );
        }
        Some(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::validation::GENERAL;
    use serde_json::json;

    fn orden(value: serde_json::Value) -> WorkOrderFormInput {
        serde_json::from_value(value).unwrap()
    }

    fn orden_valida() -> serde_json::Value {
        json!({
            "vehiculo": "1",
            "responsable": "1",
            "motivo": "Mantención 10.000 km",
            "items": [{"tipo": "SERVICIO", "descripcion": "Cambio aceite", "cantidad": 1, "costo_unitario": 10}]
        })
    }

    #[test]
    fn test_orden_valida() {
        let result = validate_work_order(Some(&orden(orden_valida())));
        assert!(result.is_valid, "{:?}", result.errors);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_vehiculo_centinela_cero() {
        let mut value = orden_valida();
        value["vehiculo"] = json!("0");
        let result = validate_work_order(Some(&orden(value)));
        assert!(!result.is_valid);
        assert_eq!(result.errors.get("vehiculo").map(String::as_str), Some(MSG_VEHICULO));
    }

    #[test]
    fn test_vacio_solo_general() {
        let result = validate_work_order(None);
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors.contains_key(GENERAL));

        let result = validate_work_order(Some(&WorkOrderFormInput::default()));
        assert_eq!(result.errors.keys().collect::<Vec<_>>(), vec![GENERAL]);
    }

    #[test]
    fn test_repuesto_sin_descripcion_ni_repuesto() {
        let mut value = orden_valida();
        value["items"] = json!([{"tipo": "REPUESTO", "descripcion": "", "repuesto": null, "cantidad": 2, "costo_unitario": 0}]);
        let result = validate_work_order(Some(&orden(value.clone())));
        assert!(!result.is_valid);
        assert!(result.errors.contains_key("items.0.descripcion"));

        value["items"][0]["repuesto"] = json!("8d0e-uuid");
        let result = validate_work_order(Some(&orden(value)));
        assert!(result.is_valid, "{:?}", result.errors);
    }

    #[test]
    fn test_costo_con_coma_decimal() {
        let mut value = orden_valida();
        value["items"][0]["costo_unitario"] = json!("100,50");
        let result = validate_work_order(Some(&orden(value)));
        assert!(result.is_valid, "{:?}", result.errors);
    }

    #[test]
    fn test_cantidad_y_costo_invalidos() {
        let mut value = orden_valida();
        value["items"] = json!([
            {"tipo": "SERVICIO", "descripcion": "Alineación", "cantidad": 0, "costo_unitario": "-5"},
            {"tipo": "SERVICIO", "descripcion": "Balanceo", "cantidad": "dos", "costo_unitario": "abc"}
        ]);
        let result = validate_work_order(Some(&orden(value)));
        assert_eq!(result.errors["items.0.cantidad"], MSG_CANTIDAD);
        assert_eq!(result.errors["items.0.costo_unitario"], MSG_COSTO_NEGATIVO);
        assert_eq!(result.errors["items.1.cantidad"], MSG_CANTIDAD_NUMERO);
        assert_eq!(result.errors["items.1.costo_unitario"], MSG_COSTO_NUMERO);
    }

    #[test]
    fn test_sin_items_y_campos_faltantes() {
        let result = validate_work_order(Some(&orden(json!({"vehiculo": "3", "motivo": "  "}))));
        assert_eq!(result.errors["items"], MSG_SIN_ITEMS);
        assert_eq!(result.errors["motivo"], "El motivo es requerido");
        assert_eq!(result.errors["responsable"], MSG_RESPONSABLE);
        assert!(!result.errors.contains_key(GENERAL));
    }
}

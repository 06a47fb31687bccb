//! Construcción de payloads para el backend
//!
//! Parte de un formulario ya validado: descarta filas vacías, convierte
//! números escritos con coma y serializa los decimales como string.

use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use validator::{Validate, ValidationErrors};

use crate::models::validation::FieldErrors;
use crate::models::vehicle::{VehicleFormInput, VehiclePayload};
use crate::models::work_order::{ItemInput, ItemPayload, WorkOrderFormInput, WorkOrderPayload};
use crate::utils::normalization::{decimal_para_transporte, normalizar_patente};
use crate::utils::validation::MSG_PATENTE_INVALIDA;

fn texto(value: &Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or_default().to_string()
}

fn item_payload(item: &ItemInput) -> ItemPayload {
    let cantidad = item
        .cantidad
        .as_ref()
        .and_then(|c| c.como_decimal())
        .and_then(|c| c.to_f64())
        .unwrap_or_default();

    let costo = item
        .costo_unitario
        .as_ref()
        .and_then(|c| c.como_decimal())
        .unwrap_or(Decimal::ZERO);

    ItemPayload {
        tipo: item.tipo,
        descripcion: item.descripcion_texto().to_string(),
        cantidad,
        costo_unitario: decimal_para_transporte(costo),
        repuesto: item.repuesto_id().map(str::to_string),
    }
}

/// Payload de OT a partir del formulario
pub fn build_work_order_payload(input: &WorkOrderFormInput) -> Result<WorkOrderPayload, FieldErrors> {
    let payload = WorkOrderPayload {
        vehiculo: texto(&input.vehiculo),
        tipo: input.tipo,
        prioridad: input.prioridad,
        motivo: texto(&input.motivo),
        responsable: texto(&input.responsable),
        items_data: input
            .items
            .iter()
            .filter(|item| !item.esta_vacio())
            .map(item_payload)
            .collect(),
    };

    payload.validate().map_err(|e| field_errors_from(&e))?;
    Ok(payload)
}

/// Payload de vehículo con la patente normalizada
pub fn build_vehicle_payload(input: &VehicleFormInput) -> Result<VehiclePayload, FieldErrors> {
    let mut errors = FieldErrors::new();

    let patente = input.patente.as_deref().and_then(normalizar_patente);
    if patente.is_none() {
        errors.insert("patente".to_string(), MSG_PATENTE_INVALIDA.to_string());
    }

    let anio = input
        .anio
        .as_ref()
        .and_then(|a| a.to_string().trim().parse::<i32>().ok());
    if anio.is_none() {
        errors.insert("anio".to_string(), "El año debe ser un número".to_string());
    }

    match (patente, anio) {
        (Some(patente), Some(anio)) => Ok(VehiclePayload {
            patente,
            marca: texto(&input.marca),
            modelo: texto(&input.modelo),
            anio,
        }),
        _ => Err(errors),
    }
}

/// Errores de `validator` con las rutas del formulario
pub fn field_errors_from(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(campo, fallas)| {
            let ruta = if campo == "items_data" { "items" } else { campo };
            let mensaje = fallas
                .first()
                .and_then(|f| f.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| format!("{} es requerido", ruta));
            (ruta.to_string(), mensaje)
        })
        .collect()
}

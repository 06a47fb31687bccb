//! Modelo de Orden de Trabajo (OT)
//!
//! Contiene el formulario tal como llega desde la UI, la OT leída desde
//! el backend y el payload que se envía al guardar.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::id_flexible;
use crate::utils::normalization::{decimal_desde_f64, parse_decimal_input};

/// Tipo de OT
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipoOrden {
    #[default]
    Mantencion,
    Reparacion,
    Otro,
}

/// Prioridad de la OT
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Prioridad {
    Alta,
    #[default]
    Media,
    Baja,
}

/// Tipo de ítem de la OT
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipoItem {
    #[default]
    Repuesto,
    Servicio,
}

/// Número escrito por el usuario: viene como número JSON o como texto,
/// y el texto puede usar coma decimal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntradaNumerica {
    Numero(f64),
    Texto(String),
}

impl EntradaNumerica {
    pub fn como_decimal(&self) -> Option<Decimal> {
        match self {
            EntradaNumerica::Numero(n) => decimal_desde_f64(*n),
            EntradaNumerica::Texto(t) => parse_decimal_input(t),
        }
    }

    pub fn esta_vacia(&self) -> bool {
        matches!(self, EntradaNumerica::Texto(t) if t.trim().is_empty())
    }
}

impl fmt::Display for EntradaNumerica {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntradaNumerica::Numero(n) => write!(f, "{}", n),
            EntradaNumerica::Texto(t) => f.write_str(t),
        }
    }
}

/// Fila de ítem del formulario
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemInput {
    #[serde(default)]
    pub tipo: TipoItem,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub cantidad: Option<EntradaNumerica>,
    #[serde(default)]
    pub costo_unitario: Option<EntradaNumerica>,
    #[serde(default, deserialize_with = "id_flexible::deserialize")]
    pub repuesto: Option<String>,
}

impl ItemInput {
    pub fn descripcion_texto(&self) -> &str {
        self.descripcion.as_deref().map(str::trim).unwrap_or("")
    }

    pub fn repuesto_id(&self) -> Option<&str> {
        self.repuesto
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }

    /// Fila sin descripción ni repuesto: se descarta al armar el payload
    pub fn esta_vacio(&self) -> bool {
        self.descripcion_texto().is_empty() && self.repuesto_id().is_none()
    }
}

/// Formulario de OT tal como lo completa el usuario
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkOrderFormInput {
    #[serde(default, deserialize_with = "id_flexible::deserialize")]
    pub vehiculo: Option<String>,
    #[serde(default)]
    pub tipo: TipoOrden,
    #[serde(default)]
    pub prioridad: Prioridad,
    #[serde(default)]
    pub motivo: Option<String>,
    #[serde(default, deserialize_with = "id_flexible::deserialize")]
    pub responsable: Option<String>,
    #[serde(default)]
    pub items: Vec<ItemInput>,
}

fn en_blanco(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

impl WorkOrderFormInput {
    /// Ningún campo con contenido
    pub fn esta_vacio(&self) -> bool {
        en_blanco(&self.vehiculo)
            && en_blanco(&self.motivo)
            && en_blanco(&self.responsable)
            && self.items.is_empty()
    }

    pub fn sin_responsable(&self) -> bool {
        en_blanco(&self.responsable)
    }
}

/// Cambios parciales sobre una OT existente: los campos ausentes
/// conservan el valor cargado.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkOrderEdit {
    #[serde(default, deserialize_with = "id_flexible::deserialize")]
    pub vehiculo: Option<String>,
    #[serde(default)]
    pub tipo: Option<TipoOrden>,
    #[serde(default)]
    pub prioridad: Option<Prioridad>,
    #[serde(default)]
    pub motivo: Option<String>,
    #[serde(default, deserialize_with = "id_flexible::deserialize")]
    pub responsable: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<ItemInput>>,
}

impl From<WorkOrderFormInput> for WorkOrderEdit {
    fn from(input: WorkOrderFormInput) -> Self {
        Self {
            vehiculo: input.vehiculo,
            tipo: Some(input.tipo),
            prioridad: Some(input.prioridad),
            motivo: input.motivo,
            responsable: input.responsable,
            items: Some(input.items),
        }
    }
}

/// OT tal como la devuelve `work/ordenes/{id}/`
#[derive(Debug, Clone, Deserialize)]
pub struct OrdenTrabajo {
    #[serde(deserialize_with = "id_flexible::deserialize_required")]
    pub id: String,
    #[serde(default, deserialize_with = "id_flexible::deserialize")]
    pub vehiculo: Option<String>,
    #[serde(default)]
    pub tipo: Option<TipoOrden>,
    #[serde(default)]
    pub prioridad: Option<Prioridad>,
    #[serde(default)]
    pub motivo: Option<String>,
    #[serde(default, deserialize_with = "id_flexible::deserialize")]
    pub responsable: Option<String>,
    #[serde(default)]
    pub estado: Option<String>,
    #[serde(default)]
    pub items: Vec<ItemInput>,
}

impl From<OrdenTrabajo> for WorkOrderFormInput {
    fn from(orden: OrdenTrabajo) -> Self {
        Self {
            vehiculo: orden.vehiculo,
            tipo: orden.tipo.unwrap_or_default(),
            prioridad: orden.prioridad.unwrap_or_default(),
            motivo: orden.motivo,
            responsable: orden.responsable,
            items: orden.items,
        }
    }
}

/// Acciones de estado sobre una OT
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrdenAccion {
    Cerrar,
    EnEjecucion,
    EnPausa,
    AprobarAsignacion,
}

impl OrdenAccion {
    pub fn segmento(&self) -> &'static str {
        match self {
            OrdenAccion::Cerrar => "cerrar",
            OrdenAccion::EnEjecucion => "en-ejecucion",
            OrdenAccion::EnPausa => "en-pausa",
            OrdenAccion::AprobarAsignacion => "aprobar-asignacion",
        }
    }

    pub fn desde_segmento(segmento: &str) -> Option<Self> {
        match segmento {
            "cerrar" => Some(OrdenAccion::Cerrar),
            "en-ejecucion" => Some(OrdenAccion::EnEjecucion),
            "en-pausa" => Some(OrdenAccion::EnPausa),
            "aprobar-asignacion" => Some(OrdenAccion::AprobarAsignacion),
            _ => None,
        }
    }
}

/// Ítem listo para el backend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemPayload {
    pub tipo: TipoItem,
    pub descripcion: String,
    pub cantidad: f64,
    pub costo_unitario: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repuesto: Option<String>,
}

/// Payload de creación/edición de OT
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
pub struct WorkOrderPayload {
    #[validate(length(min = 1))]
    pub vehiculo: String,
    pub tipo: TipoOrden,
    pub prioridad: Prioridad,
    #[validate(length(min = 1))]
    pub motivo: String,
    #[validate(length(min = 1))]
    pub responsable: String,
    #[validate(length(min = 1))]
    pub items_data: Vec<ItemPayload>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_form_input_acepta_ids_numericos() {
        let input: WorkOrderFormInput = serde_json::from_value(json!({
            "vehiculo": 12,
            "tipo": "REPARACION",
            "prioridad": "ALTA",
            "motivo": "Frenos",
            "responsable": "7",
            "items": [{"tipo": "SERVICIO", "descripcion": "Cambio pastillas", "cantidad": 1, "costo_unitario": "100,50"}]
        }))
        .unwrap();

        assert_eq!(input.vehiculo.as_deref(), Some("12"));
        assert_eq!(input.tipo, TipoOrden::Reparacion);
        assert_eq!(input.prioridad, Prioridad::Alta);
        assert_eq!(
            input.items[0].costo_unitario,
            Some(EntradaNumerica::Texto("100,50".into()))
        );
    }

    #[test]
    fn test_orden_con_vehiculo_anidado() {
        let orden: OrdenTrabajo = serde_json::from_value(json!({
            "id": "b1f4",
            "vehiculo": {"id": 3, "patente": "AB1234"},
            "responsable": null,
            "motivo": "Ruido motor"
        }))
        .unwrap();

        let form = WorkOrderFormInput::from(orden);
        assert_eq!(form.vehiculo.as_deref(), Some("3"));
        assert!(form.sin_responsable());
        assert!(form.items.is_empty());
    }

    #[test]
    fn test_item_vacio() {
        let item = ItemInput {
            descripcion: Some("  ".into()),
            repuesto: Some(String::new()),
            ..Default::default()
        };
        assert!(item.esta_vacio());
    }

    #[test]
    fn test_accion_desde_segmento() {
        assert_eq!(OrdenAccion::desde_segmento("en-pausa"), Some(OrdenAccion::EnPausa));
        assert_eq!(OrdenAccion::desde_segmento("borrar"), None);
        assert_eq!(OrdenAccion::AprobarAsignacion.segmento(), "aprobar-asignacion");
    }
}

//! Modelo de Vehículo
//!
//! Formulario de registro, payload normalizado y referencia liviana
//! usada en los selectores de OT.

use serde::{Deserialize, Serialize};

use super::id_flexible;
use super::work_order::EntradaNumerica;

/// Formulario de vehículo
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleFormInput {
    #[serde(default)]
    pub patente: Option<String>,
    #[serde(default, deserialize_with = "id_flexible::deserialize")]
    pub marca: Option<String>,
    #[serde(default)]
    pub modelo: Option<String>,
    #[serde(default)]
    pub anio: Option<EntradaNumerica>,
}

/// Payload para `vehicles/`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehiclePayload {
    pub patente: String,
    pub marca: String,
    pub modelo: String,
    pub anio: i32,
}

/// Vehículo en listados
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehiculoRef {
    #[serde(deserialize_with = "id_flexible::deserialize_required")]
    pub id: String,
    #[serde(default)]
    pub patente: Option<String>,
    #[serde(default)]
    pub modelo: Option<String>,
}

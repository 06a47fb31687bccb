//! Repuestos de inventario

use serde::{Deserialize, Serialize};

use super::id_flexible;
use super::work_order::EntradaNumerica;

/// Repuesto de `inventory/repuestos/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repuesto {
    #[serde(deserialize_with = "id_flexible::deserialize_required")]
    pub id: String,
    #[serde(default)]
    pub codigo: Option<String>,
    pub nombre: String,
    #[serde(default)]
    pub precio_referencia: Option<EntradaNumerica>,
}

//! Modelo de Usuario y roles
//!
//! Cada rol tiene una página de inicio a la que se redirige cuando el
//! backend responde 403.

use serde::{Deserialize, Serialize};

use super::id_flexible;

/// Roles del taller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rol {
    Admin,
    Supervisor,
    JefeTaller,
    Coordinador,
    Mecanico,
    Guardia,
    #[serde(other)]
    Otro,
}

impl Rol {
    /// Página de inicio del rol
    pub fn ruta_inicio(&self) -> &'static str {
        match self {
            Rol::Admin => "/admin",
            Rol::Supervisor => "/supervisor",
            Rol::JefeTaller => "/jefe-taller/gestor",
            Rol::Coordinador => "/coordinador",
            Rol::Mecanico => "/mecanico",
            Rol::Guardia => "/guardia",
            Rol::Otro => "/dashboard",
        }
    }
}

/// Usuario en listados (selector de responsable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsuarioRef {
    #[serde(deserialize_with = "id_flexible::deserialize_required")]
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub rol: Option<Rol>,
}

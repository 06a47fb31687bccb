//! Modelos del sistema
//!
//! Tipos de formularios, payloads y respuestas del backend PGF.

pub mod api;
pub mod inventory;
pub mod user;
pub mod validation;
pub mod vehicle;
pub mod work_order;

pub use validation::{FieldErrors, ValidationResult};

/// Identificadores que el backend o la UI envían como string, número u
/// objeto anidado con `id`.
pub(crate) mod id_flexible {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdCrudo {
        Texto(String),
        Entero(i64),
        Objeto { id: Box<IdCrudo> },
    }

    impl IdCrudo {
        fn into_string(self) -> String {
            match self {
                IdCrudo::Texto(s) => s,
                IdCrudo::Entero(n) => n.to_string(),
                IdCrudo::Objeto { id } => id.into_string(),
            }
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let crudo = Option::<IdCrudo>::deserialize(deserializer)?;
        Ok(crudo.map(IdCrudo::into_string))
    }

    /// Variante para identificadores obligatorios
    pub fn deserialize_required<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(IdCrudo::deserialize(deserializer)?.into_string())
    }
}

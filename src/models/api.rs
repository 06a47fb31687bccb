//! Respuestas tipadas del backend
//!
//! Cada endpoint se interpreta con su propio tipo; una respuesta que no
//! calza produce `ParseError` en vez de un valor por defecto silencioso.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("respuesta inválida de {endpoint}: {source}")]
    Json {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Listados del backend: paginados (`results`) o arreglo plano
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listado<T> {
    Paginado {
        results: Vec<T>,
        #[serde(default)]
        count: Option<u64>,
    },
    Plano(Vec<T>),
}

impl<T> Listado<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Listado::Paginado { results, .. } => results,
            Listado::Plano(items) => items,
        }
    }
}

/// Respuesta JSON de `work/evidencias/{id}/download/` con URL prefirmada
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnlaceDescarga {
    #[serde(alias = "url", alias = "presigned_url")]
    pub download_url: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
}

/// Interpretar la respuesta de un endpoint
pub fn parse_respuesta<T: DeserializeOwned>(
    endpoint: &str,
    value: serde_json::Value,
) -> Result<T, ParseError> {
    serde_json::from_value(value).map_err(|source| ParseError::Json {
        endpoint: endpoint.to_string(),
        source,
    })
}

/// Interpretar un listado, paginado o no
pub fn parse_listado<T: DeserializeOwned>(
    endpoint: &str,
    value: serde_json::Value,
) -> Result<Vec<T>, ParseError> {
    parse_respuesta::<Listado<T>>(endpoint, value).map(Listado::into_vec)
}

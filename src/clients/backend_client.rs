//! Cliente HTTP del backend PGF
//!
//! `BackendApi` es la costura entre la lógica de formularios y la red:
//! el gateway usa `HttpBackendClient` y las pruebas un backend falso.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::{header, Client, Method};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::watch;

use crate::models::api::{parse_listado, parse_respuesta, ParseError};
use crate::models::inventory::Repuesto;
use crate::models::user::UsuarioRef;
use crate::models::vehicle::{VehiclePayload, VehiculoRef};
use crate::models::work_order::{OrdenAccion, OrdenTrabajo, WorkOrderPayload};

/// Tamaño de cada trozo enviado al subir evidencias
pub const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("error de red: {0}")]
    Network(String),

    #[error("el backend respondió HTTP {status}")]
    Http { status: u16, body: String },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        BackendError::Network(e.to_string())
    }
}

/// Operaciones JSON contra el backend
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn get_json(&self, path: &str) -> Result<Value, BackendError>;

    async fn send_json(&self, method: Method, path: &str, body: Value) -> Result<Value, BackendError>;
}

/// Progreso de una subida
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadProgress {
    pub enviados: u64,
    pub total: u64,
}

impl UploadProgress {
    pub fn porcentaje(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.enviados.min(self.total) * 100) / self.total) as u8
    }
}

/// Archivo de evidencia a subir
#[derive(Debug, Clone)]
pub struct EvidenciaArchivo {
    pub nombre: String,
    pub content_type: String,
    pub datos: Bytes,
}

/// Cliente reqwest autenticado con el token de la sesión
#[derive(Clone)]
pub struct HttpBackendClient {
    client: Client,
    api_base: String,
    token: Option<String>,
    cookie: Option<String>,
}

impl HttpBackendClient {
    pub fn new(client: Client, api_base: &str, token: Option<String>, cookie: Option<String>) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
            cookie,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    /// Solicitud con el token y la cookie de la sesión
    pub fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, self.url(path))
            .header(header::ACCEPT, "application/json");
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder
    }

    async fn leer_respuesta(path: &str, response: reqwest::Response) -> Result<Value, BackendError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            log::warn!("⚠️ {} respondió {}", path, status);
            return Err(BackendError::Http {
                status: status.as_u16(),
                body,
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|source| {
            BackendError::Parse(ParseError::Json {
                endpoint: path.to_string(),
                source,
            })
        })
    }

    /// Subir una evidencia reportando el avance por `progreso`
    pub async fn upload_evidence(
        &self,
        orden_id: &str,
        archivo: EvidenciaArchivo,
        progreso: Arc<watch::Sender<UploadProgress>>,
    ) -> Result<Value, BackendError> {
        let path = "work/evidencias/";
        let total = archivo.datos.len() as u64;
        progreso.send_replace(UploadProgress { enviados: 0, total });

        let trozos: Vec<Bytes> = (0..archivo.datos.len())
            .step_by(UPLOAD_CHUNK_SIZE)
            .map(|inicio| {
                let fin = (inicio + UPLOAD_CHUNK_SIZE).min(archivo.datos.len());
                archivo.datos.slice(inicio..fin)
            })
            .collect();

        let avance = progreso.clone();
        let mut enviados = 0u64;
        let stream = futures::stream::iter(trozos.into_iter().map(move |trozo| {
            enviados += trozo.len() as u64;
            avance.send_replace(UploadProgress { enviados, total });
            Ok::<Bytes, std::io::Error>(trozo)
        }));

        let parte = reqwest::multipart::Part::stream_with_length(reqwest::Body::wrap_stream(stream), total)
            .file_name(archivo.nombre.clone())
            .mime_str(&archivo.content_type)?;
        let form = reqwest::multipart::Form::new()
            .text("orden", orden_id.to_string())
            .part("archivo", parte);

        log::info!("📤 Subiendo evidencia '{}' ({} bytes) para OT {}", archivo.nombre, total, orden_id);

        let response = self.request(Method::POST, path).multipart(form).send().await?;
        Self::leer_respuesta(path, response).await
    }
}

#[async_trait]
impl BackendApi for HttpBackendClient {
    async fn get_json(&self, path: &str) -> Result<Value, BackendError> {
        let response = self.request(Method::GET, path).send().await?;
        Self::leer_respuesta(path, response).await
    }

    async fn send_json(&self, method: Method, path: &str, body: Value) -> Result<Value, BackendError> {
        let response = self.request(method, path).json(&body).send().await?;
        Self::leer_respuesta(path, response).await
    }
}

fn a_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Ruta de detalle de OT
pub fn ruta_orden(id: &str) -> String {
    format!("work/ordenes/{}/", urlencoding::encode(id))
}

pub async fn fetch_orden(api: &dyn BackendApi, id: &str) -> Result<OrdenTrabajo, BackendError> {
    let path = ruta_orden(id);
    let value = api.get_json(&path).await?;
    Ok(parse_respuesta(&path, value)?)
}

pub async fn fetch_vehiculos(api: &dyn BackendApi) -> Result<Vec<VehiculoRef>, BackendError> {
    let value = api.get_json("vehicles/").await?;
    Ok(parse_listado("vehicles/", value)?)
}

pub async fn fetch_usuarios(api: &dyn BackendApi) -> Result<Vec<UsuarioRef>, BackendError> {
    let value = api.get_json("users/").await?;
    Ok(parse_listado("users/", value)?)
}

pub async fn fetch_repuestos(api: &dyn BackendApi) -> Result<Vec<Repuesto>, BackendError> {
    let value = api.get_json("inventory/repuestos/").await?;
    Ok(parse_listado("inventory/repuestos/", value)?)
}

/// POST si es nueva, PUT si ya existe
pub async fn guardar_orden(
    api: &dyn BackendApi,
    id: Option<&str>,
    payload: &WorkOrderPayload,
) -> Result<Value, BackendError> {
    match id {
        Some(id) => api.send_json(Method::PUT, &ruta_orden(id), a_json(payload)).await,
        None => api.send_json(Method::POST, "work/ordenes/", a_json(payload)).await,
    }
}

pub async fn crear_vehiculo(api: &dyn BackendApi, payload: &VehiclePayload) -> Result<Value, BackendError> {
    api.send_json(Method::POST, "vehicles/", a_json(payload)).await
}

pub async fn ejecutar_accion(
    api: &dyn BackendApi,
    id: &str,
    accion: OrdenAccion,
) -> Result<Value, BackendError> {
    let path = format!("{}{}/", ruta_orden(id), accion.segmento());
    api.send_json(Method::POST, &path, Value::Object(Default::default())).await
}

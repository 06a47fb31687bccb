//! Proxy hacia el backend REST
//!
//! `ANY /api/proxy/*path` reenvía la solicitud con el token de la sesión,
//! cachea los GET JSON exitosos e invalida el namespace del recurso tras
//! cada mutación. Las descargas de evidencias con `use_proxy=true` se
//! sirven desde el gateway en vez de redirigir a la URL prefirmada.

use axum::{
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, Path, RawQuery, State},
    response::Response,
    routing::any,
    Router,
};
use http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use lazy_static::lazy_static;
use regex::Regex;
use uuid::Uuid;

use crate::{
    cache::cache_config::{cache_key, es_cacheable, namespace_de, CachedResponse},
    middleware::{cors::REQUEST_ID_HEADER, session::Session},
    models::api::{parse_respuesta, EnlaceDescarga, ParseError},
    state::AppState,
    utils::errors::{internal_error, AppError, AppResult},
};

lazy_static! {
    static ref DESCARGA_EVIDENCIA: Regex = Regex::new(r"^work/evidencias/[^/]+/download/?$").unwrap();
}

pub fn create_proxy_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/proxy/*path", any(proxy_request))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

fn externo(e: reqwest::Error) -> AppError {
    AppError::ExternalApi(e.to_string())
}

fn es_json(content_type: &str) -> bool {
    content_type.starts_with("application/json") || content_type.contains("+json")
}

/// `use_proxy=true` en la query
pub fn quiere_proxy(query: Option<&str>) -> bool {
    query
        .unwrap_or_default()
        .split('&')
        .filter_map(|par| par.split_once('='))
        .any(|(k, v)| k == "use_proxy" && matches!(v, "true" | "1"))
}

pub fn es_descarga_evidencia(path: &str) -> bool {
    DESCARGA_EVIDENCIA.is_match(path)
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn respuesta_cacheada(cached: CachedResponse, request_id: &str, estado_cache: &'static str) -> AppResult<Response> {
    Response::builder()
        .status(StatusCode::from_u16(cached.status).unwrap_or(StatusCode::OK))
        .header(header::CONTENT_TYPE, cached.content_type)
        .header(REQUEST_ID_HEADER, request_id)
        .header("x-cache", estado_cache)
        .body(Body::from(cached.body))
        .map_err(|e| internal_error(&e.to_string()))
}

/// Reenviar la respuesta del backend sin bufferizarla
fn respuesta_en_stream(resp: reqwest::Response, request_id: &str) -> AppResult<Response> {
    let mut builder = Response::builder()
        .status(resp.status())
        .header(REQUEST_ID_HEADER, request_id)
        .header("x-cache", "BYPASS");

    for name in [header::CONTENT_TYPE, header::CONTENT_DISPOSITION, header::CONTENT_LENGTH] {
        if let Some(value) = resp.headers().get(&name) {
            builder = builder.header(name, value.clone());
        }
    }

    builder
        .body(Body::from_stream(resp.bytes_stream()))
        .map_err(|e| internal_error(&e.to_string()))
}

/// Nombre de archivo para `Content-Disposition`
fn nombre_descarga(enlace: &EnlaceDescarga) -> String {
    enlace
        .filename
        .clone()
        .or_else(|| {
            let sin_query = enlace.download_url.split('?').next().unwrap_or_default();
            sin_query
                .rsplit('/')
                .next()
                .filter(|s| !s.is_empty())
                .map(|s| urlencoding::decode(s).map(|d| d.into_owned()).unwrap_or_else(|_| s.to_string()))
        })
        .unwrap_or_else(|| "evidencia".to_string())
        .replace('"', "")
}

/// Descargar el objeto de la URL prefirmada y servirlo desde el gateway
async fn servir_evidencia(state: &AppState, enlace: EnlaceDescarga, request_id: &str) -> AppResult<Response> {
    log::info!("📥 [{}] Descargando evidencia vía proxy", request_id);

    let resp = state
        .http_client
        .get(&enlace.download_url)
        .send()
        .await
        .map_err(externo)?;

    if !resp.status().is_success() {
        log::error!("❌ [{}] Almacenamiento respondió {}", request_id, resp.status());
        return Err(AppError::ExternalApi(format!(
            "No se pudo descargar la evidencia ({})",
            resp.status()
        )));
    }

    let content_type = enlace
        .content_type
        .clone()
        .or_else(|| header_str(resp.headers(), header::CONTENT_TYPE))
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let disposition = format!("attachment; filename=\"{}\"", nombre_descarga(&enlace));

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(REQUEST_ID_HEADER, request_id);
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        builder = builder.header(header::CONTENT_DISPOSITION, value);
    }
    if let Some(len) = resp.headers().get(header::CONTENT_LENGTH) {
        builder = builder.header(header::CONTENT_LENGTH, len.clone());
    }

    builder
        .body(Body::from_stream(resp.bytes_stream()))
        .map_err(|e| internal_error(&e.to_string()))
}

/// Handler del proxy
pub async fn proxy_request(
    State(state): State<AppState>,
    session: Session,
    method: Method,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let request_id = Uuid::new_v4().to_string();
    let token = session
        .token
        .as_deref()
        .ok_or_else(|| AppError::Unauthorized("Sesión no encontrada".to_string()))?;

    let path = path.trim_start_matches('/').to_string();
    let es_descarga = method == Method::GET && es_descarga_evidencia(&path);
    let cacheable = method == Method::GET && !es_descarga && es_cacheable(&path);
    let key = cache_key(&path, query.as_deref(), Some(token));

    if cacheable {
        if let Some(hit) = state.cache.get(&key).await {
            log::debug!("📥 [{}] GET {} servido desde cache", request_id, path);
            return respuesta_cacheada(hit, &request_id, "HIT");
        }
    }

    let destino = match &query {
        Some(q) if !q.is_empty() => format!("{}?{}", path, q),
        _ => path.clone(),
    };
    log::debug!("➡️ [{}] {} {}", request_id, method, destino);

    let mut req = state.backend_for(&session).request(method.clone(), &destino);
    if let Some(content_type) = headers.get(header::CONTENT_TYPE) {
        req = req.header(header::CONTENT_TYPE, content_type.clone());
    }
    if !body.is_empty() {
        req = req.body(body);
    }

    let resp = req.send().await.map_err(|e| {
        log::error!("❌ [{}] Backend no disponible: {}", request_id, e);
        externo(e)
    })?;

    let status = resp.status();
    let content_type = header_str(resp.headers(), header::CONTENT_TYPE).unwrap_or_default();
    log::debug!("⬅️ [{}] {} {} -> {}", request_id, method, path, status);

    if status.is_success() && !matches!(method, Method::GET | Method::HEAD | Method::OPTIONS) {
        state.cache.invalidate_related(namespace_de(&path)).await;
    }

    if es_descarga && status.is_success() && es_json(&content_type) {
        let texto = resp.text().await.map_err(externo)?;
        let value: serde_json::Value = serde_json::from_str(&texto).map_err(|source| ParseError::Json {
            endpoint: path.clone(),
            source,
        })?;

        if quiere_proxy(query.as_deref()) {
            let enlace: EnlaceDescarga = parse_respuesta(&path, value)?;
            return servir_evidencia(&state, enlace, &request_id).await;
        }

        return respuesta_cacheada(
            CachedResponse {
                status: status.as_u16(),
                content_type,
                body: texto,
            },
            &request_id,
            "BYPASS",
        );
    }

    if cacheable && status.is_success() && es_json(&content_type) {
        let cached = CachedResponse {
            status: status.as_u16(),
            content_type,
            body: resp.text().await.map_err(externo)?,
        };
        state.cache.set(&key, &cached).await;
        return respuesta_cacheada(cached, &request_id, "MISS");
    }

    respuesta_en_stream(resp, &request_id)
}

//! Sesión del usuario
//!
//! El token viaja en la cookie HTTP-only de sesión (o en `Authorization`).
//! El gateway no autentica por su cuenta: reenvía el token al backend y
//! solo lee el rol para decidir a dónde redirigir tras un 403.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::{models::user::Rol, state::AppState, utils::errors::AppError};

/// Claims que interesan al gateway
#[derive(Debug, Deserialize)]
pub struct SessionClaims {
    #[serde(default, alias = "user_id")]
    pub sub: Option<serde_json::Value>,
    #[serde(default, alias = "role")]
    pub rol: Option<Rol>,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub token: Option<String>,
    /// Cabecera `Cookie` original, reenviada tal cual
    pub cookie: Option<String>,
    pub rol: Option<Rol>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Valor de una cookie dentro de la cabecera `Cookie`
pub fn cookie_value<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header.split(';').find_map(|par| {
        let (clave, valor) = par.trim().split_once('=')?;
        (clave == name && !valor.is_empty()).then_some(valor)
    })
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Leer el rol del token; con secreto se verifica la firma
pub fn rol_del_token(token: &str, secret: Option<&str>) -> Result<Option<Rol>, AppError> {
    match secret {
        Some(secret) => {
            let mut validation = Validation::new(Algorithm::HS256);
            validation.validate_aud = false;
            let data = decode::<SessionClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
                .map_err(|e| {
                    log::warn!("🔐 Token de sesión rechazado: {}", e);
                    AppError::Unauthorized("Sesión inválida".to_string())
                })?;
            Ok(data.claims.rol)
        }
        None => {
            let mut validation = Validation::new(Algorithm::HS256);
            validation.insecure_disable_signature_validation();
            validation.validate_exp = false;
            validation.validate_aud = false;
            validation.required_spec_claims.clear();
            Ok(decode::<SessionClaims>(token, &DecodingKey::from_secret(&[]), &validation)
                .ok()
                .and_then(|data| data.claims.rol))
        }
    }
}

/// Construir la sesión a partir de las cabeceras
pub fn session_from_headers(
    headers: &HeaderMap,
    cookie_name: &str,
    secret: Option<&str>,
) -> Result<Session, AppError> {
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let token = bearer(headers).or_else(|| {
        cookie
            .as_deref()
            .and_then(|c| cookie_value(c, cookie_name))
            .map(str::to_string)
    });

    let rol = match &token {
        Some(token) => rol_del_token(token, secret)?,
        None => None,
    };

    Ok(Session { token, cookie, rol })
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        session_from_headers(
            &parts.headers,
            &state.config.session_cookie,
            state.config.jwt_secret.as_deref(),
        )
    }
}

//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use reqwest::Client;

use crate::cache::ResponseCache;
use crate::clients::HttpBackendClient;
use crate::config::environment::EnvironmentConfig;
use crate::middleware::session::Session;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<EnvironmentConfig>,
    pub http_client: Client,
    pub cache: ResponseCache,
}

impl AppState {
    pub fn new(config: EnvironmentConfig, cache: ResponseCache) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("pgf-gateway/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            config: Arc::new(config),
            http_client,
            cache,
        })
    }

    /// Cliente del backend autenticado con la sesión de la solicitud
    pub fn backend_for(&self, session: &Session) -> HttpBackendClient {
        HttpBackendClient::new(
            self.http_client.clone(),
            &self.config.api_base,
            session.token.clone(),
            session.cookie.clone(),
        )
    }
}

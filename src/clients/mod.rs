//! Clientes HTTP
//!
//! Este módulo contiene el cliente del backend PGF.

pub mod backend_client;

pub use backend_client::{BackendApi, BackendError, HttpBackendClient};

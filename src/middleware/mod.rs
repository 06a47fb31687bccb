//! Middleware del sistema
//!
//! Este módulo contiene la extracción de la sesión y la configuración
//! de CORS.

pub mod cors;
pub mod session;

pub use cors::cors_layer;
pub use session::Session;

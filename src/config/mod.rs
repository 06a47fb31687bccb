//! Configuración del proyecto
//!
//! Este módulo contiene las variables de entorno del gateway.

pub mod environment;

pub use environment::*;

//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores, validación
//! de campos y normalización de entradas.

pub mod errors;
pub mod normalization;
pub mod validation;

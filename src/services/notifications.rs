//! Notificaciones para el usuario
//!
//! Reemplaza el store global de toasts: cada formulario recibe un
//! `Notifier` inyectado y el gateway devuelve lo acumulado a la UI.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Nivel {
    Exito,
    Error,
    Advertencia,
    Info,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub nivel: Nivel,
    pub mensaje: String,
    pub creada: DateTime<Utc>,
}

impl Notification {
    pub fn new(nivel: Nivel, mensaje: impl Into<String>) -> Self {
        Self {
            nivel,
            mensaje: mensaje.into(),
            creada: Utc::now(),
        }
    }
}

/// Destino de las notificaciones
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);

    fn exito(&self, mensaje: &str) {
        self.notify(Notification::new(Nivel::Exito, mensaje));
    }

    fn error(&self, mensaje: &str) {
        self.notify(Notification::new(Nivel::Error, mensaje));
    }

    fn advertencia(&self, mensaje: &str) {
        self.notify(Notification::new(Nivel::Advertencia, mensaje));
    }
}

/// Acumula notificaciones en memoria durante una solicitud
#[derive(Debug, Default)]
pub struct NotificationCenter {
    pendientes: Mutex<Vec<Notification>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retirar todas las notificaciones pendientes
    pub fn drain(&self) -> Vec<Notification> {
        match self.pendientes.lock() {
            Ok(mut pendientes) => std::mem::take(&mut *pendientes),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl Notifier for NotificationCenter {
    fn notify(&self, notification: Notification) {
        log::debug!("🔔 [{:?}] {}", notification.nivel, notification.mensaje);
        match self.pendientes.lock() {
            Ok(mut pendientes) => pendientes.push(notification),
            Err(poisoned) => poisoned.into_inner().push(notification),
        }
    }
}

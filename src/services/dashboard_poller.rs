//! Refresco periódico del dashboard
//!
//! Una tarea consulta un endpoint cada `intervalo` y publica el último
//! valor por un canal `watch`. Soltar el `PollHandle` detiene la tarea.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::clients::BackendApi;

/// `tokio::time::interval` no admite un periodo cero
pub const INTERVALO_MINIMO: Duration = Duration::from_millis(100);

/// Último estado conocido del dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "estado", content = "datos", rename_all = "snake_case")]
pub enum DashboardSnapshot {
    #[default]
    Pendiente,
    Datos(Value),
    /// Falló la última consulta; se conserva el último valor bueno
    Error { mensaje: String, ultimo: Option<Value> },
}

pub struct PollHandle {
    receiver: watch::Receiver<DashboardSnapshot>,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.receiver.clone()
    }

    pub fn actual(&self) -> DashboardSnapshot {
        self.receiver.borrow().clone()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Iniciar el sondeo de `path`; la primera consulta es inmediata
pub fn spawn_dashboard_poller(api: Arc<dyn BackendApi>, path: String, intervalo: Duration) -> PollHandle {
    let (sender, receiver) = watch::channel(DashboardSnapshot::default());
    let intervalo = intervalo.max(INTERVALO_MINIMO);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(intervalo);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ultimo: Option<Value> = None;

        loop {
            ticker.tick().await;
            let snapshot = match api.get_json(&path).await {
                Ok(value) => {
                    ultimo = Some(value.clone());
                    DashboardSnapshot::Datos(value)
                }
                Err(e) => {
                    log::warn!("⚠️ Error refrescando dashboard {}: {}", path, e);
                    DashboardSnapshot::Error {
                        mensaje: e.to_string(),
                        ultimo: ultimo.clone(),
                    }
                }
            };

            if sender.send(snapshot).is_err() {
                log::debug!("🛑 Sin suscriptores para {}, fin del sondeo", path);
                break;
            }
        }
    });

    PollHandle { receiver, task }
}

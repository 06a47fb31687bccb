//! Services module
//!
//! Este módulo contiene la lógica de negocio del gateway: validación,
//! construcción de payloads, interpretación de errores del backend y
//! el ciclo de vida de los formularios.

pub mod backend_errors;
pub mod dashboard_poller;
pub mod form_reconciler;
pub mod notifications;
pub mod payload_builder;
pub mod vehicle_validation;
pub mod work_order_validation;

pub use backend_errors::{parse_backend_error, BackendErrorInfo};
pub use form_reconciler::{FormEdit, FormMode, FormState, Navigation, SubmitOutcome, VehicleForm, WorkOrderForm};
pub use notifications::{Notification, NotificationCenter, Notifier};
pub use vehicle_validation::validate_vehicle;
pub use work_order_validation::validate_work_order;

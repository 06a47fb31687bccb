//! Formularios de creación/edición
//!
//! Cada formulario sigue `Loading -> Ready -> Submitting -> Success`,
//! volviendo a `Ready` cuando el backend rechaza el envío. Una falla de
//! carga deja el formulario en `Closed` con una redirección.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::ResponseCache;
use crate::clients::backend_client::{
    self, crear_vehiculo, fetch_orden, fetch_repuestos, fetch_usuarios, fetch_vehiculos,
    guardar_orden, BackendApi, BackendError,
};
use crate::models::inventory::Repuesto;
use crate::models::user::{Rol, UsuarioRef};
use crate::models::validation::{item_path, FieldErrors};
use crate::models::vehicle::{VehicleFormInput, VehiculoRef};
use crate::models::work_order::{
    EntradaNumerica, ItemInput, OrdenAccion, Prioridad, TipoItem, TipoOrden, WorkOrderEdit,
    WorkOrderFormInput,
};
use crate::services::backend_errors::{parse_backend_error, BackendErrorInfo};
use crate::services::notifications::Notifier;
use crate::services::payload_builder::{build_vehicle_payload, build_work_order_payload};
use crate::services::vehicle_validation::validate_vehicle;
use crate::services::work_order_validation::validate_work_order;

pub const RUTA_ORDENES: &str = "/workorders";
pub const RUTA_VEHICULOS: &str = "/vehicles";
/// Espera antes de redirigir tras un 403
pub const PERMISO_REDIRECT_MS: u64 = 2000;

pub const MSG_ERROR_RED: &str = "No se pudo conectar con el servidor. Intente nuevamente.";
pub const MSG_ERROR_CARGA: &str = "No se pudo cargar la orden de trabajo";
pub const MSG_ERROR_REFERENCIAS: &str = "No se pudieron cargar los vehículos, usuarios o repuestos";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormState {
    Loading,
    Ready,
    Submitting,
    Success,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Crear,
    Editar(String),
}

impl FormMode {
    fn id(&self) -> Option<&str> {
        match self {
            FormMode::Crear => None,
            FormMode::Editar(id) => Some(id),
        }
    }
}

/// Redirección que la UI debe aplicar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub to: String,
    pub delay_ms: u64,
}

impl Navigation {
    pub fn inmediata(to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            delay_ms: 0,
        }
    }

    /// Redirección diferida a la página de inicio del rol
    pub fn sin_permiso(rol: Option<Rol>) -> Self {
        Self {
            to: rol.map_or("/", |r| r.ruta_inicio()).to_string(),
            delay_ms: PERMISO_REDIRECT_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "resultado", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Validación local fallida; no hubo llamada de red
    Invalido { errors: FieldErrors },
    Guardado {
        id: Option<String>,
        navigation: Navigation,
    },
    Rechazado {
        status: Option<u16>,
        detail: String,
        errors: FieldErrors,
    },
    SinPermiso {
        detail: String,
        navigation: Navigation,
    },
    /// El formulario no está en estado `Ready`
    NoDisponible { state: FormState },
}

/// Listas de referencia para los selectores
#[derive(Debug, Clone, Default, Serialize)]
pub struct Referencias {
    pub vehiculos: Vec<VehiculoRef>,
    pub usuarios: Vec<UsuarioRef>,
    pub repuestos: Vec<Repuesto>,
}

/// Un cambio hecho por el usuario
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "campo", content = "valor", rename_all = "snake_case")]
pub enum FormEdit {
    Vehiculo(String),
    Tipo(TipoOrden),
    Prioridad(Prioridad),
    Motivo(String),
    Responsable(String),
    AgregarItem(TipoItem),
    QuitarItem(usize),
    ItemTipo { index: usize, tipo: TipoItem },
    ItemDescripcion { index: usize, descripcion: String },
    ItemCantidad { index: usize, cantidad: EntradaNumerica },
    ItemCosto { index: usize, costo: EntradaNumerica },
    ItemRepuesto { index: usize, repuesto: Option<String> },
}

impl FormEdit {
    /// Error que se limpia al aplicar el cambio
    fn ruta_error(&self) -> String {
        match self {
            FormEdit::Vehiculo(_) => "vehiculo".to_string(),
            FormEdit::Tipo(_) => "tipo".to_string(),
            FormEdit::Prioridad(_) => "prioridad".to_string(),
            FormEdit::Motivo(_) => "motivo".to_string(),
            FormEdit::Responsable(_) => "responsable".to_string(),
            FormEdit::AgregarItem(_) | FormEdit::QuitarItem(_) => "items".to_string(),
            FormEdit::ItemTipo { index, .. } => item_path(*index, "tipo"),
            FormEdit::ItemDescripcion { index, .. } | FormEdit::ItemRepuesto { index, .. } => {
                item_path(*index, "descripcion")
            }
            FormEdit::ItemCantidad { index, .. } => item_path(*index, "cantidad"),
            FormEdit::ItemCosto { index, .. } => item_path(*index, "costo_unitario"),
        }
    }
}

fn resumen_errores(errors: &FieldErrors) -> String {
    format!("Revise el formulario: {} campo(s) con errores", errors.len())
}

fn solo_falta_responsable(errors: &FieldErrors) -> bool {
    errors.len() == 1 && errors.contains_key("responsable")
}

fn id_desde_respuesta(value: &Value) -> Option<String> {
    match value.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Convierte una falla del backend en el resultado que ve la UI
fn resultado_de_error(
    error: BackendError,
    notifier: &dyn Notifier,
    rol: Option<Rol>,
) -> (SubmitOutcome, FieldErrors) {
    match error {
        BackendError::Http { status: 403, body } => {
            let info = parse_backend_error(403, &body);
            notifier.error(&info.detail);
            let outcome = SubmitOutcome::SinPermiso {
                detail: info.detail,
                navigation: Navigation::sin_permiso(rol),
            };
            (outcome, FieldErrors::new())
        }
        BackendError::Http { status, body } => {
            let BackendErrorInfo { status, detail, errors } = parse_backend_error(status, &body);
            notifier.error(&detail);
            let outcome = SubmitOutcome::Rechazado {
                status: Some(status),
                detail,
                errors: errors.clone(),
            };
            (outcome, errors)
        }
        BackendError::Network(msg) => {
            log::error!("❌ Error de red al guardar: {}", msg);
            notifier.error(MSG_ERROR_RED);
            let outcome = SubmitOutcome::Rechazado {
                status: None,
                detail: MSG_ERROR_RED.to_string(),
                errors: FieldErrors::new(),
            };
            (outcome, FieldErrors::new())
        }
        BackendError::Parse(e) => {
            log::error!("❌ Respuesta ilegible del backend: {}", e);
            notifier.error(MSG_ERROR_RED);
            let outcome = SubmitOutcome::Rechazado {
                status: None,
                detail: e.to_string(),
                errors: FieldErrors::new(),
            };
            (outcome, FieldErrors::new())
        }
    }
}

/// Formulario de OT
pub struct WorkOrderForm {
    api: Arc<dyn BackendApi>,
    notifier: Arc<dyn Notifier>,
    cache: ResponseCache,
    rol: Option<Rol>,
    mode: FormMode,
    state: FormState,
    input: WorkOrderFormInput,
    errors: FieldErrors,
    referencias: Referencias,
}

impl WorkOrderForm {
    pub fn new(
        api: Arc<dyn BackendApi>,
        notifier: Arc<dyn Notifier>,
        cache: ResponseCache,
        rol: Option<Rol>,
        mode: FormMode,
    ) -> Self {
        Self {
            api,
            notifier,
            cache,
            rol,
            mode,
            state: FormState::Loading,
            input: WorkOrderFormInput::default(),
            errors: FieldErrors::new(),
            referencias: Referencias::default(),
        }
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn input(&self) -> &WorkOrderFormInput {
        &self.input
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn referencias(&self) -> &Referencias {
        &self.referencias
    }

    /// Cargar la OT (en edición) y las listas de referencia en paralelo
    pub async fn load(&mut self) -> Result<(), Navigation> {
        self.state = FormState::Loading;
        let api = Arc::clone(&self.api);
        let mode = self.mode.clone();

        let orden = async {
            match mode.id() {
                Some(id) => fetch_orden(api.as_ref(), id).await.map(Some),
                None => Ok(None),
            }
        };

        let (orden, vehiculos, usuarios, repuestos) = futures::join!(
            orden,
            fetch_vehiculos(api.as_ref()),
            fetch_usuarios(api.as_ref()),
            fetch_repuestos(api.as_ref()),
        );

        let cargado = match orden {
            Err(error) => Err((error, MSG_ERROR_CARGA)),
            Ok(orden) => (|| Ok::<_, BackendError>((orden, vehiculos?, usuarios?, repuestos?)))()
                .map_err(|error| (error, MSG_ERROR_REFERENCIAS)),
        };

        match cargado {
            Ok((orden, vehiculos, usuarios, repuestos)) => {
                if let Some(orden) = orden {
                    self.input = orden.into();
                }
                self.referencias = Referencias {
                    vehiculos,
                    usuarios,
                    repuestos,
                };
                self.state = FormState::Ready;
                log::debug!("📋 Formulario listo ({:?})", self.mode);
                Ok(())
            }
            Err((error, mensaje)) => {
                log::error!("❌ Error cargando formulario {:?}: {}", self.mode, error);
                self.state = FormState::Closed;
                match error {
                    BackendError::Http { status: 403, body } => {
                        self.notifier.error(&parse_backend_error(403, &body).detail);
                        Err(Navigation::sin_permiso(self.rol))
                    }
                    _ => {
                        self.notifier.error(mensaje);
                        Err(Navigation::inmediata(RUTA_ORDENES))
                    }
                }
            }
        }
    }

    fn item_mut(&mut self, index: usize) -> Option<&mut ItemInput> {
        self.input.items.get_mut(index)
    }

    /// Copiar nombre y precio del repuesto seleccionado a la fila
    fn autocompletar(&mut self, index: usize, sobrescribir: bool) {
        let Some(repuesto_id) = self
            .input
            .items
            .get(index)
            .and_then(|item| item.repuesto_id().map(str::to_string))
        else {
            return;
        };

        let Some(repuesto) = self
            .referencias
            .repuestos
            .iter()
            .find(|r| r.id == repuesto_id)
            .cloned()
        else {
            return;
        };

        if let Some(item) = self.item_mut(index) {
            if sobrescribir || item.descripcion_texto().is_empty() {
                item.descripcion = Some(repuesto.nombre.clone());
            }
            let sin_costo = item.costo_unitario.as_ref().map_or(true, |c| c.esta_vacia());
            if sobrescribir || sin_costo {
                if let Some(precio) = repuesto.precio_referencia {
                    item.costo_unitario = Some(precio);
                }
            }
        }
    }

    /// Aplicar un cambio del usuario; devuelve `false` si no corresponde
    pub fn apply_edit(&mut self, edit: FormEdit) -> bool {
        if self.state != FormState::Ready {
            return false;
        }

        let ruta = edit.ruta_error();
        let aplicado = match edit {
            FormEdit::Vehiculo(v) => {
                self.input.vehiculo = Some(v);
                true
            }
            FormEdit::Tipo(t) => {
                self.input.tipo = t;
                true
            }
            FormEdit::Prioridad(p) => {
                self.input.prioridad = p;
                true
            }
            FormEdit::Motivo(m) => {
                self.input.motivo = Some(m);
                true
            }
            FormEdit::Responsable(r) => {
                self.input.responsable = Some(r);
                true
            }
            FormEdit::AgregarItem(tipo) => {
                self.input.items.push(ItemInput {
                    tipo,
                    ..Default::default()
                });
                true
            }
            FormEdit::QuitarItem(index) => {
                if index < self.input.items.len() {
                    self.input.items.remove(index);
                    // Los índices posteriores cambian
                    self.errors.retain(|k, _| !k.starts_with("items."));
                    true
                } else {
                    false
                }
            }
            FormEdit::ItemTipo { index, tipo } => self.item_mut(index).map(|i| i.tipo = tipo).is_some(),
            FormEdit::ItemDescripcion { index, descripcion } => self
                .item_mut(index)
                .map(|i| i.descripcion = Some(descripcion))
                .is_some(),
            FormEdit::ItemCantidad { index, cantidad } => self
                .item_mut(index)
                .map(|i| i.cantidad = Some(cantidad))
                .is_some(),
            FormEdit::ItemCosto { index, costo } => self
                .item_mut(index)
                .map(|i| i.costo_unitario = Some(costo))
                .is_some(),
            FormEdit::ItemRepuesto { index, repuesto } => {
                let existe = self.item_mut(index).map(|i| i.repuesto = repuesto).is_some();
                if existe {
                    self.autocompletar(index, true);
                    self.errors.remove(&item_path(index, "costo_unitario"));
                }
                existe
            }
        };

        if aplicado {
            self.errors.remove(&ruta);
        }
        aplicado
    }

    /// Superponer cambios parciales sobre el estado cargado
    pub fn merge_input(&mut self, edit: WorkOrderEdit) {
        if let Some(v) = edit.vehiculo {
            self.input.vehiculo = Some(v);
        }
        if let Some(t) = edit.tipo {
            self.input.tipo = t;
        }
        if let Some(p) = edit.prioridad {
            self.input.prioridad = p;
        }
        if let Some(m) = edit.motivo {
            self.input.motivo = Some(m);
        }
        if let Some(r) = edit.responsable {
            self.input.responsable = Some(r);
        }
        if let Some(items) = edit.items {
            self.input.items = items;
            self.errors.retain(|k, _| !k.starts_with("items"));
        }

        for index in 0..self.input.items.len() {
            self.autocompletar(index, false);
        }
    }

    /// Responsable faltante: se toma de la OT guardada
    async fn completar_responsable(&mut self) {
        let Some(id) = self.mode.id().map(str::to_string) else {
            return;
        };
        if !self.input.sin_responsable() {
            return;
        }

        match fetch_orden(self.api.as_ref(), &id).await {
            Ok(orden) => {
                log::info!("🔁 Responsable tomado de la OT {} guardada", id);
                self.input.responsable = orden.responsable;
            }
            Err(e) => log::warn!("⚠️ No se pudo recuperar el responsable de la OT {}: {}", id, e),
        }
    }

    /// Validar y enviar
    pub async fn submit(&mut self) -> SubmitOutcome {
        if self.state != FormState::Ready {
            return SubmitOutcome::NoDisponible { state: self.state };
        }

        let mut result = validate_work_order(Some(&self.input));
        // Solo falta el responsable: se recupera de la OT guardada y se valida otra vez
        if solo_falta_responsable(&result.errors) {
            self.completar_responsable().await;
            result = validate_work_order(Some(&self.input));
        }
        if !result.is_valid {
            self.notifier.error(&resumen_errores(&result.errors));
            self.errors = result.errors.clone();
            return SubmitOutcome::Invalido {
                errors: result.errors,
            };
        }

        let payload = match build_work_order_payload(&self.input) {
            Ok(payload) => payload,
            Err(errors) => {
                self.notifier.error(&resumen_errores(&errors));
                self.errors = errors.clone();
                return SubmitOutcome::Invalido { errors };
            }
        };

        self.state = FormState::Submitting;
        self.errors.clear();
        let id_actual = self.mode.id().map(str::to_string);

        match guardar_orden(self.api.as_ref(), id_actual.as_deref(), &payload).await {
            Ok(respuesta) => self.exito(id_actual.or_else(|| id_desde_respuesta(&respuesta))).await,
            // 2xx con cuerpo ilegible: el backend ya guardó
            Err(BackendError::Parse(e)) => {
                log::warn!("⚠️ OT guardada pero la respuesta no es JSON: {}", e);
                self.exito(id_actual).await
            }
            Err(error) => {
                let (outcome, errors) = resultado_de_error(error, self.notifier.as_ref(), self.rol);
                self.errors = errors;
                self.state = match outcome {
                    SubmitOutcome::SinPermiso { .. } => FormState::Closed,
                    _ => FormState::Ready,
                };
                outcome
            }
        }
    }

    async fn exito(&mut self, id: Option<String>) -> SubmitOutcome {
        self.cache.invalidate_related("work").await;
        let mensaje = match self.mode {
            FormMode::Crear => "Orden de trabajo creada correctamente",
            FormMode::Editar(_) => "Orden de trabajo actualizada correctamente",
        };
        self.notifier.exito(mensaje);
        self.state = FormState::Success;

        let destino = match &id {
            Some(id) => format!("{}/{}", RUTA_ORDENES, id),
            None => RUTA_ORDENES.to_string(),
        };
        SubmitOutcome::Guardado {
            id,
            navigation: Navigation::inmediata(destino),
        }
    }
}

/// Registro de vehículo
pub struct VehicleForm {
    api: Arc<dyn BackendApi>,
    notifier: Arc<dyn Notifier>,
    cache: ResponseCache,
    rol: Option<Rol>,
    state: FormState,
    errors: FieldErrors,
}

impl VehicleForm {
    pub fn new(
        api: Arc<dyn BackendApi>,
        notifier: Arc<dyn Notifier>,
        cache: ResponseCache,
        rol: Option<Rol>,
    ) -> Self {
        Self {
            api,
            notifier,
            cache,
            rol,
            state: FormState::Ready,
            errors: FieldErrors::new(),
        }
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub async fn submit(&mut self, input: &VehicleFormInput) -> SubmitOutcome {
        if self.state != FormState::Ready {
            return SubmitOutcome::NoDisponible { state: self.state };
        }

        let result = validate_vehicle(Some(input));
        let construido = if result.is_valid {
            build_vehicle_payload(input)
        } else {
            Err(result.errors)
        };
        let payload = match construido {
            Ok(payload) => payload,
            Err(errors) => {
                self.notifier.error(&resumen_errores(&errors));
                self.errors = errors.clone();
                return SubmitOutcome::Invalido { errors };
            }
        };

        self.state = FormState::Submitting;
        match crear_vehiculo(self.api.as_ref(), &payload).await {
            Ok(_) | Err(BackendError::Parse(_)) => {
                self.cache.invalidate_related("vehicles").await;
                self.notifier.exito(&format!("Vehículo {} registrado", payload.patente));
                self.state = FormState::Success;
                SubmitOutcome::Guardado {
                    id: None,
                    navigation: Navigation::inmediata(RUTA_VEHICULOS),
                }
            }
            Err(error) => {
                let (outcome, errors) = resultado_de_error(error, self.notifier.as_ref(), self.rol);
                self.errors = errors;
                self.state = FormState::Ready;
                outcome
            }
        }
    }
}

/// Cambio de estado de una OT (`cerrar`, `en-pausa`, ...)
pub async fn ejecutar_accion_orden(
    api: &dyn BackendApi,
    notifier: &dyn Notifier,
    cache: &ResponseCache,
    rol: Option<Rol>,
    id: &str,
    accion: OrdenAccion,
) -> SubmitOutcome {
    match backend_client::ejecutar_accion(api, id, accion).await {
        Ok(_) | Err(BackendError::Parse(_)) => {
            cache.invalidate_related("work").await;
            notifier.exito(&format!("Acción '{}' aplicada a la OT", accion.segmento()));
            SubmitOutcome::Guardado {
                id: Some(id.to_string()),
                navigation: Navigation::inmediata(format!("{}/{}", RUTA_ORDENES, id)),
            }
        }
        Err(error) => resultado_de_error(error, notifier, rol).0,
    }
}

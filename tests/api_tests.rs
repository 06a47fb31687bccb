use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use pgf_gateway::{
    cache::{MemoryCache, ResponseCache},
    config::EnvironmentConfig,
    create_app,
    state::AppState,
};

#[derive(Clone)]
struct Backend {
    base: String,
    listados_ordenes: Arc<AtomicUsize>,
    ordenes_creadas: Arc<AtomicUsize>,
    consultas_dashboard: Arc<AtomicUsize>,
}

const TRES_MIB: usize = 3 * 1024 * 1024;

fn autorizado(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some("Bearer tok")
}

fn sin_autorizacion() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Credenciales no válidas"}))).into_response()
}

async fn vehiculos(headers: HeaderMap) -> Response {
    if !autorizado(&headers) {
        return sin_autorizacion();
    }
    Json(json!({"results": [{"id": 1, "patente": "AB1234", "modelo": "Sprinter"}], "count": 1})).into_response()
}

async fn crear_vehiculo() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"patente": ["Ya existe un vehículo con esta patente."]})),
    )
        .into_response()
}

async fn usuarios(headers: HeaderMap) -> Response {
    if !autorizado(&headers) {
        return sin_autorizacion();
    }
    Json(json!([{"id": 3, "username": "jefe", "rol": "JEFE_TALLER"}])).into_response()
}

async fn repuestos() -> Json<Value> {
    Json(json!([{"id": 9, "nombre": "Pastillas de freno", "precio_referencia": 25990}]))
}

async fn listar_ordenes(State(backend): State<Backend>) -> Json<Value> {
    let n = backend.listados_ordenes.fetch_add(1, Ordering::SeqCst);
    Json(json!([{"id": 1, "estado": "ABIERTA", "consulta": n}]))
}

async fn crear_orden(State(backend): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !autorizado(&headers) {
        return sin_autorizacion();
    }
    assert_eq!(body["items_data"][0]["costo_unitario"], "25990");
    backend.ordenes_creadas.fetch_add(1, Ordering::SeqCst);
    (StatusCode::CREATED, Json(json!({"id": 42}))).into_response()
}

async fn dashboard(State(backend): State<Backend>) -> Json<Value> {
    backend.consultas_dashboard.fetch_add(1, Ordering::SeqCst);
    Json(json!({"abiertas": backend.ordenes_creadas.load(Ordering::SeqCst)}))
}

/// Multipart sin interpretar: basta con el tamaño recibido
async fn recibir_evidencia(headers: HeaderMap, cuerpo: Bytes) -> Response {
    if !autorizado(&headers) {
        return sin_autorizacion();
    }
    let multipart = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v.starts_with("multipart/form-data"));
    assert!(multipart);
    (StatusCode::CREATED, Json(json!({"id": 77, "recibidos": cuerpo.len()}))).into_response()
}

async fn evidencia_binaria() -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"informe-ot-6.pdf\""),
        ],
        b"%PDF-1.4".to_vec(),
    )
        .into_response()
}

async fn enlace_descarga(State(backend): State<Backend>) -> Json<Value> {
    Json(json!({"download_url": format!("{}/files/foto%20freno.jpg?firma=abc", backend.base)}))
}

async fn archivo() -> Response {
    ([(header::CONTENT_TYPE, "image/jpeg")], vec![0xFFu8, 0xD8, 0xFF, 0xE0]).into_response()
}

/// Backend falso en un puerto efímero
async fn levantar_backend() -> Backend {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let backend = Backend {
        base,
        listados_ordenes: Arc::new(AtomicUsize::new(0)),
        ordenes_creadas: Arc::new(AtomicUsize::new(0)),
        consultas_dashboard: Arc::new(AtomicUsize::new(0)),
    };

    let router = Router::new()
        .route("/api/v1/vehicles/", get(vehiculos).post(crear_vehiculo))
        .route("/api/v1/users/", get(usuarios))
        .route("/api/v1/inventory/repuestos/", get(repuestos))
        .route("/api/v1/work/ordenes/", get(listar_ordenes).post(crear_orden))
        .route("/api/v1/work/evidencias/5/download/", get(enlace_descarga))
        .route("/api/v1/work/evidencias/6/download/", get(evidencia_binaria))
        .route(
            "/api/v1/work/evidencias/",
            post(recibir_evidencia).layer(DefaultBodyLimit::disable()),
        )
        .route("/api/v1/reports/dashboard/", get(dashboard))
        .route("/files/:nombre", get(archivo))
        .with_state(backend.clone());

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    backend
}

async fn gateway(backend: &Backend) -> Router {
    gateway_con(backend, EnvironmentConfig::default())
}

fn gateway_con(backend: &Backend, config: EnvironmentConfig) -> Router {
    let config = EnvironmentConfig {
        api_base: format!("{}/api/v1", backend.base),
        ..config
    };
    let cache = ResponseCache::Memory(MemoryCache::new(Duration::from_secs(60)));
    create_app(AppState::new(config, cache).unwrap())
}

fn solicitud(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, "csrftoken=x; pgf_access=tok");
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_de(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let backend = levantar_backend().await;
    let app = gateway(&backend).await;

    let response = app.oneshot(solicitud("GET", "/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_de(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["cache"], "memory");
}

#[tokio::test]
async fn test_validar_orden_vacia() {
    let backend = levantar_backend().await;
    let app = gateway(&backend).await;

    let response = app
        .oneshot(solicitud("POST", "/api/validate/orden", Some(Value::Null)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_de(response).await;
    assert_eq!(body["isValid"], false);
    assert!(body["errors"]["_general"].is_string());
}

#[tokio::test]
async fn test_validar_vehiculo() {
    let backend = levantar_backend().await;
    let app = gateway(&backend).await;

    let response = app
        .oneshot(solicitud(
            "POST",
            "/api/validate/vehiculo",
            Some(json!({"patente": "A-1", "marca": 1, "modelo": "Hilux", "anio": 2019})),
        ))
        .await
        .unwrap();

    let body = json_de(response).await;
    assert_eq!(body["isValid"], false);
    assert!(body["errors"]["patente"].is_string());
    assert!(body["errors"].get("anio").is_none());
}

#[tokio::test]
async fn test_proxy_sin_sesion() {
    let backend = levantar_backend().await;
    let app = gateway(&backend).await;

    let request = Request::builder()
        .uri("/api/proxy/vehicles/")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_proxy_cachea_e_invalida() {
    let backend = levantar_backend().await;
    let app = gateway(&backend).await;

    let primera = app
        .clone()
        .oneshot(solicitud("GET", "/api/proxy/work/ordenes/", None))
        .await
        .unwrap();
    assert_eq!(primera.headers()["x-cache"], "MISS");
    assert!(primera.headers().contains_key("x-request-id"));

    let segunda = app
        .clone()
        .oneshot(solicitud("GET", "/api/proxy/work/ordenes/", None))
        .await
        .unwrap();
    assert_eq!(segunda.headers()["x-cache"], "HIT");
    assert_eq!(json_de(segunda).await[0]["consulta"], 0);
    assert_eq!(backend.listados_ordenes.load(Ordering::SeqCst), 1);

    let creada = app
        .clone()
        .oneshot(solicitud(
            "POST",
            "/api/proxy/work/ordenes/",
            Some(json!({"items_data": [{"costo_unitario": "25990"}]})),
        ))
        .await
        .unwrap();
    assert_eq!(creada.status(), StatusCode::CREATED);

    let tercera = app
        .oneshot(solicitud("GET", "/api/proxy/work/ordenes/", None))
        .await
        .unwrap();
    assert_eq!(tercera.headers()["x-cache"], "MISS");
    assert_eq!(backend.listados_ordenes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_proxy_relay_de_errores() {
    let backend = levantar_backend().await;
    let app = gateway(&backend).await;

    let response = app
        .oneshot(solicitud("POST", "/api/proxy/vehicles/", Some(json!({"patente": "AB1234"}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_de(response).await;
    assert!(body["patente"].is_array());
}

#[tokio::test]
async fn test_crear_orden_completa() {
    let backend = levantar_backend().await;
    let app = gateway(&backend).await;

    let response = app
        .oneshot(solicitud(
            "POST",
            "/api/forms/ordenes",
            Some(json!({
                "vehiculo": {"id": 1},
                "tipo": "REPARACION",
                "prioridad": "ALTA",
                "motivo": "Frenos con ruido",
                "responsable": 3,
                "items": [{"tipo": "REPUESTO", "repuesto": 9, "cantidad": 2}]
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_de(response).await;
    assert_eq!(body["resultado"], "guardado");
    assert_eq!(body["id"], "42");
    assert_eq!(body["navigation"]["to"], "/workorders/42");
    assert_eq!(body["notifications"][0]["nivel"], "exito");
}

#[tokio::test]
async fn test_crear_orden_invalida() {
    let backend = levantar_backend().await;
    let app = gateway(&backend).await;

    let response = app
        .oneshot(solicitud(
            "POST",
            "/api/forms/ordenes",
            Some(json!({"motivo": "Sin ítems", "vehiculo": 1, "responsable": 3})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = json_de(response).await;
    assert_eq!(body["resultado"], "invalido");
    assert!(body["errors"]["items"].is_string());
    assert_eq!(body["notifications"][0]["nivel"], "error");
}

#[tokio::test]
async fn test_vehiculo_rechazado_por_backend() {
    let backend = levantar_backend().await;
    let app = gateway(&backend).await;

    let response = app
        .oneshot(solicitud(
            "POST",
            "/api/forms/vehiculos",
            Some(json!({"patente": "ab1234", "marca": 2, "modelo": "Hilux", "anio": "2019"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_de(response).await;
    assert_eq!(body["resultado"], "rechazado");
    assert!(body["errors"]["patente"].is_string());
}

#[tokio::test]
async fn test_accion_desconocida() {
    let backend = levantar_backend().await;
    let app = gateway(&backend).await;

    let response = app
        .oneshot(solicitud("POST", "/api/forms/ordenes/7/acciones/borrar", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_descarga_de_evidencia_via_proxy() {
    let backend = levantar_backend().await;
    let app = gateway(&backend).await;

    let response = app
        .clone()
        .oneshot(solicitud("GET", "/api/proxy/work/evidencias/5/download/?use_proxy=true", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"foto freno.jpg\""
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], &[0xFF, 0xD8, 0xFF, 0xE0]);

    // Sin use_proxy se devuelve el enlace
    let response = app
        .oneshot(solicitud("GET", "/api/proxy/work/evidencias/5/download/", None))
        .await
        .unwrap();
    let body = json_de(response).await;
    assert!(body["download_url"].as_str().unwrap().contains("/files/"));
}

#[tokio::test]
async fn test_dashboard_refleja_ordenes_nuevas() {
    let backend = levantar_backend().await;
    let app = gateway(&backend).await;

    let antes = app
        .clone()
        .oneshot(solicitud("GET", "/api/proxy/reports/dashboard/", None))
        .await
        .unwrap();
    assert_eq!(antes.headers()["x-cache"], "BYPASS");
    assert_eq!(json_de(antes).await["abiertas"], 0);

    let creada = app
        .clone()
        .oneshot(solicitud(
            "POST",
            "/api/proxy/work/ordenes/",
            Some(json!({"items_data": [{"costo_unitario": "25990"}]})),
        ))
        .await
        .unwrap();
    assert_eq!(creada.status(), StatusCode::CREATED);

    let despues = app
        .oneshot(solicitud("GET", "/api/proxy/reports/dashboard/", None))
        .await
        .unwrap();
    assert_eq!(json_de(despues).await["abiertas"], 1);
    assert_eq!(backend.consultas_dashboard.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_subir_evidencia_grande() {
    let backend = levantar_backend().await;
    let app = gateway(&backend).await;

    // Listado de OT en cache antes de subir
    let listado = app
        .clone()
        .oneshot(solicitud("GET", "/api/proxy/work/ordenes/", None))
        .await
        .unwrap();
    assert_eq!(listado.headers()["x-cache"], "MISS");

    let request = Request::builder()
        .method("POST")
        .uri("/api/evidencias/subir?ot=1&nombre=foto.jpg")
        .header(header::COOKIE, "pgf_access=tok")
        .header(header::CONTENT_TYPE, "image/jpeg")
        .body(Body::from(vec![0xABu8; TRES_MIB]))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_de(response).await;
    assert_eq!(body["evidencia"]["id"], 77);
    assert!(body["evidencia"]["recibidos"].as_u64().unwrap() > TRES_MIB as u64);
    assert_eq!(body["progreso"]["enviados"], TRES_MIB as u64);
    assert_eq!(body["progreso"]["total"], TRES_MIB as u64);
    assert_eq!(body["progreso"]["porcentaje"], 100);

    // La subida invalida el cache de OT
    let listado = app
        .oneshot(solicitud("GET", "/api/proxy/work/ordenes/", None))
        .await
        .unwrap();
    assert_eq!(listado.headers()["x-cache"], "MISS");
    assert_eq!(backend.listados_ordenes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_proxy_acepta_cuerpos_grandes() {
    let backend = levantar_backend().await;
    let app = gateway(&backend).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/proxy/work/evidencias/")
        .header(header::COOKIE, "pgf_access=tok")
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=x")
        .body(Body::from(vec![b'a'; TRES_MIB]))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(json_de(response).await["recibidos"], TRES_MIB as u64);
}

#[tokio::test]
async fn test_limite_de_subida_configurable() {
    let backend = levantar_backend().await;
    let config = EnvironmentConfig {
        max_upload_bytes: 1024,
        ..Default::default()
    };
    let app = gateway_con(&backend, config);

    let request = Request::builder()
        .method("POST")
        .uri("/api/evidencias/subir?ot=1")
        .header(header::COOKIE, "pgf_access=tok")
        .body(Body::from(vec![0u8; 4096]))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_descarga_binaria_conserva_cabeceras() {
    let backend = levantar_backend().await;
    let app = gateway(&backend).await;

    let response = app
        .oneshot(solicitud("GET", "/api/proxy/work/evidencias/6/download/", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"informe-ot-6.pdf\""
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"%PDF-1.4");
}

#[tokio::test]
async fn test_dashboard_en_vivo() {
    let backend = levantar_backend().await;
    let config = EnvironmentConfig {
        dashboard_poll_secs: 1,
        ..Default::default()
    };
    let app = gateway_con(&backend, config);

    let response = app
        .oneshot(solicitud("GET", "/api/dashboard/stream", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let mut eventos = response.into_body().into_data_stream();
    let primero = tokio::time::timeout(Duration::from_secs(5), eventos.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let texto = String::from_utf8(primero.to_vec()).unwrap();
    assert!(texto.contains("event: dashboard"));
    assert!(texto.contains(r#""estado":"datos""#));
    assert!(texto.contains(r#""abiertas":0"#));

    // Al cerrar la conexión el sondeo se detiene
    drop(eventos);
    let consultas = backend.consultas_dashboard.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(backend.consultas_dashboard.load(Ordering::SeqCst), consultas);
}

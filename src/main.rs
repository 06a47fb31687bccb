use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pgf_gateway::{cache::ResponseCache, config::EnvironmentConfig, create_app, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    let config = EnvironmentConfig::from_env()?;

    // Configurar logging
    let nivel = if config.is_development() { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(nivel)))
        .init();

    info!("🔧 PGF Gateway - Órdenes de trabajo y flota");
    info!("================================================");
    info!("🌍 Entorno: {}", config.environment);
    info!("🔗 Backend: {}", config.api_base);
    info!("📦 Límite de subida: {} MB", config.max_upload_bytes / (1024 * 1024));

    // Cache de respuestas (Redis si está configurado)
    let cache = ResponseCache::from_config(config.cache_config()).await;
    let (tipo_cache, _) = cache.estado().await;
    info!("💾 Cache de respuestas: {}", tipo_cache);

    let addr: SocketAddr = config.server_url().parse()?;
    let app_state = AppState::new(config, cache)?;
    let app = create_app(app_state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Estado del gateway");
    info!("   ANY  /api/proxy/*path - Proxy autenticado al backend");
    info!("   POST /api/validate/orden - Validar OT");
    info!("   POST /api/validate/vehiculo - Validar vehículo");
    info!("   POST /api/forms/ordenes - Crear OT");
    info!("   PUT  /api/forms/ordenes/:id - Editar OT");
    info!("   POST /api/forms/ordenes/:id/acciones/:accion - Cambiar estado de OT");
    info!("   POST /api/forms/vehiculos - Registrar vehículo");
    info!("   POST /api/evidencias/subir?ot=<id> - Subir evidencia");
    info!("   GET  /api/dashboard/stream - Dashboard en vivo (SSE)");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            e
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo escuchar Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo escuchar SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}

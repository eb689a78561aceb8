use product_api::{
    app::product::{InMemoryProductStore, ProductStore},
    create_app,
    infrastructure::logger::Logger,
    AppConfig, AppState,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[cfg(feature = "database")]
use product_api::infrastructure::database::DatabaseManager;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    Logger::init(&config.logging);

    match AppConfig::find_file() {
        Some(path) => info!("Loaded configuration from {}", path),
        None => info!("No configuration file found, using defaults"),
    }

    #[cfg(feature = "database")]
    let database = match config.database.uri.as_deref() {
        Some(uri) => {
            let manager = DatabaseManager::new(uri, &config.database)
                .await
                .map_err(|e| {
                    error!("Unable to connect to database: {}", e);
                    e
                })?;
            manager.ensure_schema().await?;
            Some(manager)
        }
        None => None,
    };

    #[cfg(feature = "database")]
    let store: Arc<dyn ProductStore> = match &database {
        Some(manager) => Arc::new(manager.product_store()),
        None => {
            warn!("No database configured, products are kept in memory");
            Arc::new(InMemoryProductStore::new())
        }
    };

    #[cfg(not(feature = "database"))]
    let store: Arc<dyn ProductStore> = {
        if config.database.uri.is_some() {
            warn!("Built without the `database` feature, ignoring database.uri");
        }
        Arc::new(InMemoryProductStore::new())
    };

    let app = create_app(AppState::new(store));

    let listener = TcpListener::bind(config.server.socket_addr()?).await?;
    let addr = listener.local_addr()?;

    info!("🚀 Product API running on http://{}", addr);
    info!("   GET    /api/health-check");
    info!("   GET    /api/products");
    info!("   POST   /api/products");
    info!("   GET    /api/products/:id");
    info!("   PUT    /api/products/:id");
    info!("   DELETE /api/products/:id");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    #[cfg(feature = "database")]
    if let Some(manager) = database {
        manager.close().await;
    }

    served?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use schoolfinder_core::settings::ServerSettings;
use schoolfinder_core::RecordSource;
use schoolfinder_store::SchoolRepo;

use crate::handlers;

/// Server configuration.
pub struct ServerConfig {
    pub port: u16,
    pub simulated_latency: Duration,
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from(&ServerSettings::default())
    }
}

impl From<&ServerSettings> for ServerConfig {
    fn from(settings: &ServerSettings) -> Self {
        Self {
            port: settings.port,
            simulated_latency: Duration::from_millis(settings.simulated_latency_ms),
            request_timeout: Duration::from_secs(settings.request_timeout_secs.max(1)),
        }
    }
}

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn RecordSource>,
    /// Backs `/api/schools/{id}`; absent when serving a third-party source.
    pub catalog: Option<SchoolRepo>,
    pub simulated_latency: Duration,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/places", get(handlers::places))
        .route("/api/schools/{id}", get(handlers::school_by_id))
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind and serve in the background.
pub async fn start(
    config: ServerConfig,
    source: Arc<dyn RecordSource>,
    catalog: Option<SchoolRepo>,
) -> Result<ServerHandle, std::io::Error> {
    let source_name = source.name().to_string();
    let state = AppState {
        source,
        catalog,
        simulated_latency: config.simulated_latency,
    };

    let router = build_router(state, config.request_timeout);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(port = local_addr.port(), source = %source_name, "SchoolFinder server started");

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!(error = %e, "server stopped");
        }
    });

    Ok(ServerHandle {
        port: local_addr.port(),
        server,
    })
}

/// Handle returned by `start()`. Dropping it leaves the server running.
pub struct ServerHandle {
    pub port: u16,
    server: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Wait until the server task exits.
    pub async fn wait(self) {
        if let Err(e) = self.server.await {
            tracing::error!(error = %e, "server task failed");
        }
    }

    pub fn abort(&self) {
        self.server.abort();
    }
}

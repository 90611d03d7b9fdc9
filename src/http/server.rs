//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the three public routes
//! - Wire up middleware (request ID, tracing, metrics, access control)
//! - Bind server to listener and shut down gracefully

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeFile,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::http::handlers;
use crate::observability::metrics;
use crate::provider::RoomDataProvider;
use crate::security::{access_control_middleware, AccessGuard};

/// `Debug` is `runserver`, `Production` is `production`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMode {
    Debug,
    Production,
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub provider: Arc<dyn RoomDataProvider>,
}

/// HTTP server for the room display.
pub struct HttpServer {
    router: Router,
    config: Arc<AppConfig>,
    mode: ServerMode,
}

impl HttpServer {
    pub fn new(config: Arc<AppConfig>, provider: Arc<dyn RoomDataProvider>, mode: ServerMode) -> Self {
        let state = AppState {
            config: config.clone(),
            provider,
        };
        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            mode,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        let guard = Arc::new(AccessGuard::from_config(&config.security));

        Router::new()
            .route_service("/", ServeFile::new(&config.frontend.index_path))
            .route("/data", get(handlers::data))
            .route("/instabook", post(handlers::instabook))
            .with_state(state)
            .layer(middleware::from_fn_with_state(guard, access_control_middleware))
            .layer(middleware::from_fn(metrics::track_requests))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn mode(&self) -> ServerMode {
        self.mode
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            mode = ?self.mode,
            demo_mode = self.config.demo_mode,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

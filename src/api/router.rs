//! API router configuration.

use axum::{
    http::header::AUTHORIZATION,
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{api_info, current_user, health, sign_in, sign_out, sign_up, AppState};
use super::middleware::require_session;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    // Routes that need a live session
    let protected = Router::new()
        .route("/users/me", get(current_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    // API v1 routes
    let api_v1 = Router::new()
        .route("/", get(api_info))
        .route("/sessions", post(sign_in))
        .route("/sessions/mine", delete(sign_out))
        .route("/users", post(sign_up))
        .merge(protected);

    // Build main router
    Router::new()
        .route("/health", get(health))
        .nest("/v1", api_v1)
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any)
                    .expose_headers([AUTHORIZATION]),
            ),
        )
        .with_state(state)
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Drain in-flight requests on Ctrl-C.
    pub graceful_shutdown: bool,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            graceful_shutdown: true,
        }
    }

    pub fn without_graceful_shutdown(mut self) -> Self {
        self.graceful_shutdown = false;
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("127.0.0.1", 3000)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Start the API server.
pub async fn serve(config: ServerConfig, state: AppState) -> crate::Result<()> {
    let addr = config.bind_address();
    let router = create_router(state);

    tracing::info!("Starting session-gate API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(crate::error::GatewayError::Io)?;

    if config.graceful_shutdown {
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    } else {
        axum::serve(listener, router).await?;
    }

    tracing::info!("Server stopped");
    Ok(())
}

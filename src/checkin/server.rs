use super::handlers::{check_in_handler, health_handler};
use super::store::InviteStore;
use crate::config::ServerConfig;
use crate::error::{CheckInError, KioskError, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state for the Axum server
#[derive(Clone)]
pub struct ServerState {
    pub(crate) store: Arc<dyn InviteStore>,
    pub(crate) device_token: Arc<str>,
}

/// HTTP check-in endpoint backed by an injected invite store
pub struct CheckInServer {
    pub(crate) config: ServerConfig,
    pub(crate) store: Arc<dyn InviteStore>,
}

impl CheckInServer {
    pub fn new(config: ServerConfig, store: Arc<dyn InviteStore>) -> Self {
        Self { config, store }
    }

    pub fn builder() -> CheckInServerBuilder {
        CheckInServerBuilder::new()
    }

    /// Router with every check-in route
    pub fn router(&self) -> Router {
        let state = ServerState {
            store: Arc::clone(&self.store),
            device_token: Arc::from(self.config.device_token.as_str()),
        };

        Router::new()
            .route("/api/check-in", post(check_in_handler))
            .route("/health", get(health_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Bind the configured address
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = self.config.bind_address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| CheckInError::BindFailed {
                address: addr.clone(),
                source,
            })?;

        info!("Check-in server listening on {}", addr);
        Ok(listener)
    }

    /// Serve requests on `listener` until `shutdown` is cancelled
    pub async fn serve(&self, listener: TcpListener, shutdown: CancellationToken) -> Result<()> {
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| CheckInError::ServerFailed {
                details: format!("Server error: {}", e),
            })?;

        info!("Check-in server stopped");
        Ok(())
    }

    /// Bind and serve until `shutdown` is cancelled
    pub async fn start(&self, shutdown: CancellationToken) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await
    }
}

/// Check-in server builder for configuration
pub struct CheckInServerBuilder {
    config: Option<ServerConfig>,
    store: Option<Arc<dyn InviteStore>>,
}

impl CheckInServerBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            store: None,
        }
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn store(mut self, store: Arc<dyn InviteStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Result<CheckInServer> {
        let config = self.config.ok_or_else(|| {
            KioskError::CheckIn(CheckInError::ServerFailed {
                details: "Server configuration is required".to_string(),
            })
        })?;

        let store = self.store.ok_or_else(|| {
            KioskError::CheckIn(CheckInError::ServerFailed {
                details: "Invite store is required".to_string(),
            })
        })?;

        if config.device_token.is_empty() {
            return Err(KioskError::CheckIn(CheckInError::ServerFailed {
                details: "Device token must not be empty".to_string(),
            }));
        }

        Ok(CheckInServer::new(config, store))
    }
}

impl Default for CheckInServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

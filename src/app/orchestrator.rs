use super::types::ComponentState;
#[cfg(feature = "server")]
use crate::checkin::CheckInServer;
use crate::checkin::{InviteStore, MemoryInviteStore};
use crate::client::CheckInClient;
use crate::config::KioskConfig;
use crate::error::Result;
use crate::events::EventBus;
use crate::scanner::ScanController;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
#[cfg(feature = "server")]
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Main application coordinator: owns the scanner, the check-in client and, when enabled,
/// the in-process check-in server
pub struct KioskOrchestrator {
    pub(super) config: KioskConfig,
    pub(super) event_bus: Arc<EventBus>,
    pub(super) client: CheckInClient,
    pub(super) store: Arc<dyn InviteStore>,

    // Components
    pub(super) scanner: Option<Arc<ScanController>>,
    #[cfg(feature = "server")]
    pub(super) server: Option<Arc<CheckInServer>>,
    #[cfg(feature = "server")]
    pub(super) server_task: Option<JoinHandle<Result<()>>>,

    // Lifecycle management
    pub(super) component_states: Arc<Mutex<HashMap<String, ComponentState>>>,
    pub(super) cancellation_token: CancellationToken,
}

impl KioskOrchestrator {
    /// Create a new orchestrator with the given configuration.
    ///
    /// The camera is not touched here; the scanner is built on first use so server-only and
    /// submit-code runs work on machines without one.
    pub async fn new(config: KioskConfig) -> Result<Self> {
        let event_bus = Arc::new(EventBus::new(config.system.event_bus_capacity));
        let client = CheckInClient::new(&config.client)?;

        let store: Arc<dyn InviteStore> = match &config.server.invites_path {
            Some(path) => Arc::new(MemoryInviteStore::load_from_file(path)?),
            None => {
                info!("No invites file configured, using sample invites");
                Arc::new(MemoryInviteStore::sample())
            }
        };

        #[cfg(feature = "server")]
        let server = if config.server.enabled {
            Some(Arc::new(
                CheckInServer::builder()
                    .config(config.server.clone())
                    .store(Arc::clone(&store))
                    .build()?,
            ))
        } else {
            None
        };

        Ok(Self {
            config,
            event_bus,
            client,
            store,
            scanner: None,
            #[cfg(feature = "server")]
            server,
            #[cfg(feature = "server")]
            server_task: None,
            component_states: Arc::new(Mutex::new(HashMap::new())),
            cancellation_token: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &KioskConfig {
        &self.config
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    /// Invites served by the in-process check-in server
    pub fn store(&self) -> Arc<dyn InviteStore> {
        Arc::clone(&self.store)
    }

    /// Token that stops the running mode when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }
}

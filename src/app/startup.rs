use super::{ComponentState, KioskOrchestrator};
use crate::camera::{VideoSource, VideoSourceBuilder};
use crate::decoder::QrDecoder;
use crate::error::Result;
use crate::scanner::ScanController;
use std::sync::Arc;
use tracing::{error, info};

impl KioskOrchestrator {
    /// Register all components as stopped
    pub async fn initialize(&mut self) -> Result<()> {
        info!("Initializing kiosk components");

        let mut states = self.component_states.lock().await;
        states.insert("scanner".to_string(), ComponentState::Stopped);
        if self.config.server.enabled {
            states.insert("server".to_string(), ComponentState::Stopped);
        }
        drop(states);

        info!("All components initialized successfully");
        Ok(())
    }

    /// Use `source` for scanning instead of the configured camera
    pub fn with_source(mut self, source: Box<dyn VideoSource>) -> Result<Self> {
        self.scanner = Some(Arc::new(self.build_scanner(source)?));
        Ok(self)
    }

    pub(super) fn scanner(&mut self) -> Result<Arc<ScanController>> {
        if let Some(scanner) = &self.scanner {
            return Ok(Arc::clone(scanner));
        }

        let source = VideoSourceBuilder::new()
            .config(self.config.camera.clone())
            .build()?;
        let scanner = Arc::new(self.build_scanner(source)?);
        self.scanner = Some(Arc::clone(&scanner));
        Ok(scanner)
    }

    fn build_scanner(&self, source: Box<dyn VideoSource>) -> Result<ScanController> {
        info!("Scanner using {} source", source.name());
        ScanController::builder()
            .source(source)
            .decoder(Arc::new(QrDecoder::new()))
            .config(&self.config.scanner)
            .event_bus(Arc::clone(&self.event_bus))
            .shutdown(self.cancellation_token.clone())
            .build()
    }

    /// Bind and start the in-process check-in server, if enabled
    #[cfg(feature = "server")]
    pub(super) async fn start_server(&mut self) -> Result<()> {
        let Some(server) = self.server.clone() else {
            return Ok(());
        };

        self.set_component_state("server", ComponentState::Starting)
            .await;

        let listener = match server.bind().await {
            Ok(listener) => listener,
            Err(e) => {
                error!("Failed to start check-in server: {}", e);
                let _ = self.event_bus.publish(crate::events::KioskEvent::SystemError {
                    component: "server".to_string(),
                    error: e.to_string(),
                });
                self.set_component_state("server", ComponentState::Failed)
                    .await;
                return Err(e);
            }
        };

        let shutdown = self.cancellation_token.child_token();
        self.server_task = Some(tokio::spawn(async move {
            let result = server.serve(listener, shutdown).await;
            if let Err(e) = &result {
                error!("Check-in server error: {}", e);
            }
            result
        }));

        self.set_component_state("server", ComponentState::Running)
            .await;
        info!("Check-in server started on {}", self.config.server.bind_address());
        Ok(())
    }

    #[cfg(not(feature = "server"))]
    pub(super) async fn start_server(&mut self) -> Result<()> {
        if self.config.server.enabled {
            tracing::warn!("Check-in server requested but this build has no server support");
        }
        Ok(())
    }
}

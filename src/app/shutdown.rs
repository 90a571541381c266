use super::{ComponentState, KioskOrchestrator};
use crate::error::Result;
use tracing::{error, info};

impl KioskOrchestrator {
    /// Stop every component. Returns the exit code contribution of the shutdown itself.
    pub async fn shutdown(&mut self) -> Result<i32> {
        info!("Beginning graceful shutdown");

        // Stops the scan session (if any) and the server
        self.cancellation_token.cancel();

        let mut exit_code = 0;

        if let Some(scanner) = &self.scanner {
            scanner.stop();
        }
        if self.get_component_state("scanner").await != Some(ComponentState::Failed) {
            self.set_component_state("scanner", ComponentState::Stopped)
                .await;
        }

        #[cfg(feature = "server")]
        {
            if let Err(e) = self.stop_server().await {
                error!("Error stopping check-in server: {}", e);
                exit_code = 1;
            }
        }

        info!("Graceful shutdown completed with exit code: {}", exit_code);
        Ok(exit_code)
    }

    #[cfg(feature = "server")]
    async fn stop_server(&mut self) -> Result<()> {
        use crate::error::KioskError;
        use std::time::Duration;
        use tokio::time::timeout;

        let Some(task) = self.server_task.take() else {
            return Ok(());
        };

        self.set_component_state("server", ComponentState::Stopping)
            .await;

        match timeout(Duration::from_secs(10), task).await {
            Ok(Ok(Ok(()))) => {
                self.set_component_state("server", ComponentState::Stopped)
                    .await;
                info!("server component stopped");
                Ok(())
            }
            Ok(Ok(Err(e))) => {
                self.set_component_state("server", ComponentState::Failed)
                    .await;
                Err(e)
            }
            Ok(Err(join_error)) => {
                self.set_component_state("server", ComponentState::Failed)
                    .await;
                Err(KioskError::component(
                    "server".to_string(),
                    format!("server task failed: {}", join_error),
                ))
            }
            Err(_) => {
                self.set_component_state("server", ComponentState::Failed)
                    .await;
                error!("server component stop timeout");
                Err(KioskError::component(
                    "server".to_string(),
                    "server component stop timeout".to_string(),
                ))
            }
        }
    }
}

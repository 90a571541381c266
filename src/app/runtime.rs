use super::{ComponentState, KioskOrchestrator, RunMode, ShutdownReason};
use crate::decoder::DecodedCode;
use crate::error::{KioskError, Result};
use crate::events::{EventBus, KioskEvent};
use crate::scanner::ScanOutcome;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::signal;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

impl KioskOrchestrator {
    /// Run `mode` to completion (or until a shutdown signal), then shut down
    pub async fn run(&mut self, mode: RunMode) -> Result<i32> {
        info!("Check-in kiosk running in {:?} mode", mode);

        self.setup_signal_handlers();

        let result = match self.start_server().await {
            Ok(()) => self.run_mode(mode).await,
            Err(e) => Err(e),
        };

        let reason = match &result {
            Ok(_) if self.cancellation_token.is_cancelled() => {
                ShutdownReason::Signal("shutdown requested".to_string())
            }
            Ok(_) => ShutdownReason::Completed,
            Err(e) => ShutdownReason::Error(e.to_string()),
        };
        info!("Shutdown initiated: {:?}", reason);

        let shutdown_code = self.shutdown().await?;
        let exit_code = result?;

        info!("Check-in kiosk shutdown complete");
        Ok(exit_code.max(shutdown_code))
    }

    async fn run_mode(&mut self, mode: RunMode) -> Result<i32> {
        match mode {
            RunMode::Kiosk { once } => self.kiosk_loop(once).await,
            RunMode::ServerOnly => self.serve_until_shutdown().await,
            RunMode::SubmitCode(code) => {
                let accepted = self.submit_code(&code).await;
                Ok(if accepted { 0 } else { 1 })
            }
        }
    }

    async fn serve_until_shutdown(&mut self) -> Result<i32> {
        #[cfg(feature = "server")]
        {
            if self.server_task.is_some() {
                info!("Serving check-ins; press Ctrl+C to stop");
                self.cancellation_token.cancelled().await;
                return Ok(0);
            }
        }

        Err(KioskError::system(
            "Server-only mode requires server.enabled and a build with server support",
        ))
    }

    /// Scan, check in, repeat
    async fn kiosk_loop(&mut self, once: bool) -> Result<i32> {
        let scanner = self.scanner()?;
        let continuous = self.config.scanner.continuous && !once;

        loop {
            if self.cancellation_token.is_cancelled() {
                return Ok(0);
            }

            self.set_component_state("scanner", ComponentState::Running)
                .await;
            println!("Hold an invite QR code up to the camera");

            let (code_tx, code_rx) = oneshot::channel::<DecodedCode>();
            let outcome = scanner
                .scan(move |code| {
                    let _ = code_tx.send(code);
                })
                .await?;
            self.set_component_state("scanner", ComponentState::Stopped)
                .await;

            let exit_code = match outcome {
                ScanOutcome::Decoded(_) => match code_rx.await {
                    Ok(code) => {
                        println!("Scanned {}", code);
                        if self.submit_code(code.as_str()).await {
                            0
                        } else {
                            1
                        }
                    }
                    Err(_) => 1,
                },
                ScanOutcome::Cancelled => {
                    debug!("Scan cancelled, leaving kiosk loop");
                    return Ok(0);
                }
                ScanOutcome::TimedOut => {
                    println!("No invite code detected");
                    1
                }
                ScanOutcome::Failed(e) => {
                    error!("Camera unavailable: {}", e);
                    eprintln!("✗ {}", e);
                    self.set_component_state("scanner", ComponentState::Failed)
                        .await;
                    return Ok(1);
                }
            };

            if !continuous {
                return Ok(exit_code);
            }
        }
    }

    /// Send `code` to the check-in API and report the result. Returns whether it was accepted.
    pub async fn submit_code(&self, code: &str) -> bool {
        match self.client.check_in(code).await {
            Ok(invite) => {
                println!("✓ Checked in: {}", invite.summary());
                let _ = self.event_bus.publish(KioskEvent::CheckInCompleted {
                    code: code.to_string(),
                    name: invite.name,
                    ticket_type: invite.ticket_type,
                });
                true
            }
            Err(e) => {
                warn!("Check-in of {} failed: {}", code, e);
                eprintln!("✗ Check-in failed: {}", e);
                let _ = self.event_bus.publish(KioskEvent::CheckInRejected {
                    code: code.to_string(),
                    reason: e.to_string(),
                });
                false
            }
        }
    }

    /// Cancel the shutdown token on SIGINT or SIGTERM
    fn setup_signal_handlers(&self) {
        #[cfg(unix)]
        {
            let token = self.cancellation_token.clone();
            let event_bus = Arc::clone(&self.event_bus);
            tokio::spawn(async move {
                let mut sigterm =
                    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                        Ok(sigterm) => sigterm,
                        Err(e) => {
                            error!("Failed to register SIGTERM handler: {}", e);
                            return;
                        }
                    };

                tokio::select! {
                    Some(()) = sigterm.recv() => {
                        info!("Received SIGTERM signal");
                        request_shutdown(&token, &event_bus, "SIGTERM");
                    }
                    _ = token.cancelled() => {}
                }
            });
        }

        let token = self.cancellation_token.clone();
        let event_bus = Arc::clone(&self.event_bus);
        tokio::spawn(async move {
            tokio::select! {
                result = signal::ctrl_c() => {
                    if result.is_ok() {
                        info!("Received SIGINT signal (Ctrl+C)");
                        request_shutdown(&token, &event_bus, "SIGINT");
                    }
                }
                _ = token.cancelled() => {}
            }
        });
    }
}

fn request_shutdown(token: &CancellationToken, event_bus: &EventBus, reason: &str) {
    let _ = event_bus.publish(KioskEvent::ShutdownRequested {
        timestamp: SystemTime::now(),
        reason: reason.to_string(),
    });
    token.cancel();
}

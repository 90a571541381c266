use super::handle::{ScanHandle, SessionSlot};
use super::session::{ScanOutcome, ScanSession, ScanState};
use crate::camera::VideoSource;
use crate::config::ScannerConfig;
use crate::decoder::{DecodedCode, Decoder};
use crate::error::{KioskError, Result, ScanError};
use crate::events::{EventBus, KioskEvent};
use crate::sampler::{FrameSampler, MAX_SAMPLE_INTERVAL};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Owns the camera for the lifetime of the controller and runs scan sessions against it.
///
/// Each call to [`ScanController::scan`] is one session:
/// `Idle -> Acquiring -> Scanning -> Done(..) | Failed(..)`. The camera is released on every
/// path out of `Acquiring` or `Scanning`, and again when the controller is dropped.
pub struct ScanController {
    source: tokio::sync::Mutex<Box<dyn VideoSource>>,
    decoder: Arc<dyn Decoder>,
    sample_interval: Duration,
    timeout: Option<Duration>,
    event_bus: Option<Arc<EventBus>>,
    shutdown: CancellationToken,
    slot: Arc<Mutex<SessionSlot>>,
    state: watch::Sender<ScanState>,
}

impl ScanController {
    pub fn new(
        source: Box<dyn VideoSource>,
        decoder: Arc<dyn Decoder>,
        sample_interval: Duration,
        timeout: Option<Duration>,
    ) -> Self {
        let (state, _) = watch::channel(ScanState::Idle);
        Self {
            source: tokio::sync::Mutex::new(source),
            decoder,
            sample_interval,
            timeout,
            event_bus: None,
            shutdown: CancellationToken::new(),
            slot: Arc::new(Mutex::new(SessionSlot::default())),
            state,
        }
    }

    pub fn builder() -> ScanControllerBuilder {
        ScanControllerBuilder::new()
    }

    /// Handle for stopping sessions and observing state from other tasks
    pub fn handle(&self) -> ScanHandle {
        ScanHandle::new(Arc::clone(&self.slot), self.state.subscribe())
    }

    pub fn state(&self) -> ScanState {
        self.state.borrow().clone()
    }

    /// Stop the running session, if any
    pub fn stop(&self) {
        self.handle().stop();
    }

    /// Run one scan session to its terminal outcome.
    ///
    /// `on_scan` runs at most once, with the decoded code, after the camera has been released.
    /// It is never called for cancelled, timed out or failed sessions. Fails with
    /// [`ScanError::SessionActive`] if another session is running on this controller.
    ///
    /// Dropping the returned future ends the session as `Cancelled` and releases the camera.
    pub async fn scan<F>(&self, on_scan: F) -> Result<ScanOutcome, ScanError>
    where
        F: FnOnce(DecodedCode) + Send,
    {
        let source = self
            .source
            .try_lock()
            .map_err(|_| ScanError::SessionActive)?;

        // Cancelling the shutdown token stops this and every later session
        let token = self.shutdown.child_token();
        let session = ScanSession::begin();
        let session_id = session.id.clone();
        {
            let mut slot = self.slot.lock();
            slot.token = Some(token.clone());
            slot.session = Some(session);
        }

        info!("Scan session {} starting on {}", session_id, source.name());
        self.publish(KioskEvent::ScanStarted {
            session_id: session_id.clone(),
            timestamp: std::time::SystemTime::now(),
        });
        self.set_state(ScanState::Acquiring);

        let mut active = ActiveSession {
            controller: self,
            source: Some(source),
            session_id,
            ticks: 0,
            finished: false,
        };
        let outcome = self.run_session(&mut active, &token).await;
        active.complete(&outcome);

        if let ScanOutcome::Decoded(code) = &outcome {
            on_scan(code.clone());
        }

        Ok(outcome)
    }

    async fn run_session(
        &self,
        active: &mut ActiveSession<'_>,
        token: &CancellationToken,
    ) -> ScanOutcome {
        let ActiveSession {
            source,
            session_id,
            ticks,
            ..
        } = active;
        let Some(source) = source.as_deref_mut() else {
            return ScanOutcome::Cancelled;
        };
        let source: &mut dyn VideoSource = &mut **source;

        let acquired = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            result = source.start() => Some(result),
        };

        let stream = match acquired {
            None => {
                debug!("Scan session {} cancelled while acquiring", session_id);
                return ScanOutcome::Cancelled;
            }
            Some(Err(error)) => return ScanOutcome::Failed(error),
            Some(Ok(stream)) => stream,
        };

        info!(
            "Scan session {} streaming {}x{} from {}",
            session_id,
            stream.width,
            stream.height,
            source.name()
        );
        self.publish(KioskEvent::CameraAcquired {
            session_id: session_id.to_string(),
        });
        self.set_state(ScanState::Scanning);

        let mut sampler = FrameSampler::new(self.sample_interval);
        let deadline = self.timeout.and_then(|timeout| {
            let deadline = Instant::now().checked_add(timeout);
            if deadline.is_none() {
                warn!("Scan timeout of {:?} is out of range, scanning without one", timeout);
            }
            deadline
        });

        loop {
            let frame = tokio::select! {
                biased;
                _ = token.cancelled() => return ScanOutcome::Cancelled,
                _ = deadline_elapsed(deadline) => return ScanOutcome::TimedOut,
                frame = sampler.next_frame(&mut *source) => frame,
            };
            *ticks = sampler.ticks();

            let Some(frame) = frame else {
                continue;
            };

            trace!(
                "Tick {}: decoding frame {} ({}x{})",
                sampler.ticks(),
                frame.id,
                frame.width,
                frame.height
            );

            // Awaited before the next tick, so decodes never overlap
            let frame_id = frame.id;
            let decoder = Arc::clone(&self.decoder);
            let decoded = match tokio::task::spawn_blocking(move || decoder.decode(&frame)).await
            {
                Ok(decoded) => decoded,
                Err(e) => {
                    warn!("Decode task for frame {} failed: {}", frame_id, e);
                    None
                }
            };

            if let Some(code) = decoded {
                if token.is_cancelled() {
                    debug!("Discarding decode of frame {} after stop", frame_id);
                    return ScanOutcome::Cancelled;
                }
                return ScanOutcome::Decoded(code);
            }
        }
    }

    fn finish(&self, session_id: &str, outcome: &ScanOutcome, ticks: u64) {
        {
            let mut slot = self.slot.lock();
            slot.token = None;
            if let Some(session) = slot.session.as_mut() {
                session.end(outcome, ticks);
            }
        }

        let session_id = session_id.to_string();
        match outcome {
            ScanOutcome::Decoded(code) => {
                self.publish(KioskEvent::CodeDecoded {
                    session_id,
                    code: code.to_string(),
                    ticks,
                });
            }
            ScanOutcome::Cancelled => {
                info!("Scan session {} cancelled after {} ticks", session_id, ticks);
                self.publish(KioskEvent::ScanCancelled { session_id });
            }
            ScanOutcome::TimedOut => {
                warn!("Scan session {} timed out after {} ticks", session_id, ticks);
                self.publish(KioskEvent::ScanTimedOut { session_id });
            }
            ScanOutcome::Failed(error) => {
                warn!("Scan session {} failed: {}", session_id, error.kind());
                self.publish(KioskEvent::ScanFailed {
                    session_id,
                    error: error.to_string(),
                });
            }
        }

        self.set_state(outcome.state());
    }

    fn set_state(&self, state: ScanState) {
        debug!("Scan state -> {:?}", state);
        self.state.send_replace(state);
    }

    fn publish(&self, event: KioskEvent) {
        if let Some(event_bus) = &self.event_bus {
            let _ = event_bus.publish(event);
        }
    }
}

impl Drop for ScanController {
    fn drop(&mut self) {
        self.source.get_mut().stop();
    }
}

/// A running session's hold on the camera.
///
/// Completing it releases the camera and publishes the outcome. Dropping it uncompleted, as
/// happens when the `scan` future is dropped, does the same with `Cancelled`.
struct ActiveSession<'a> {
    controller: &'a ScanController,
    source: Option<tokio::sync::MutexGuard<'a, Box<dyn VideoSource>>>,
    session_id: String,
    ticks: u64,
    finished: bool,
}

impl ActiveSession<'_> {
    fn complete(mut self, outcome: &ScanOutcome) {
        self.release();
        self.controller.finish(&self.session_id, outcome, self.ticks);
        self.finished = true;
    }

    /// Stop the camera and unlock it for the next session
    fn release(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.stop();
            debug!(
                "Scan session {} released {} ({} tracks held)",
                self.session_id,
                source.name(),
                source.active_tracks()
            );
        }
    }
}

impl Drop for ActiveSession<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!("Scan session {} abandoned, releasing camera", self.session_id);
        self.release();
        self.controller
            .finish(&self.session_id, &ScanOutcome::Cancelled, self.ticks);
    }
}

async fn deadline_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Builder for [`ScanController`]
pub struct ScanControllerBuilder {
    source: Option<Box<dyn VideoSource>>,
    decoder: Option<Arc<dyn Decoder>>,
    sample_interval: Duration,
    timeout: Option<Duration>,
    event_bus: Option<Arc<EventBus>>,
    shutdown: Option<CancellationToken>,
}

impl ScanControllerBuilder {
    pub fn new() -> Self {
        Self {
            source: None,
            decoder: None,
            sample_interval: Duration::from_millis(300),
            timeout: None,
            event_bus: None,
            shutdown: None,
        }
    }

    pub fn source(mut self, source: Box<dyn VideoSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn decoder(mut self, decoder: Arc<dyn Decoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Take cadence and timeout from the scanner configuration
    pub fn config(mut self, config: &ScannerConfig) -> Self {
        self.sample_interval = config.sample_interval();
        self.timeout = config.timeout();
        self
    }

    pub fn sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Application shutdown token; sessions run as its children
    pub fn shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = Some(token);
        self
    }

    pub fn build(self) -> Result<ScanController> {
        let source = self
            .source
            .ok_or_else(|| KioskError::component("scanner", "Video source is required"))?;
        let decoder = self
            .decoder
            .ok_or_else(|| KioskError::component("scanner", "Decoder is required"))?;

        if self.sample_interval.is_zero() {
            return Err(KioskError::component(
                "scanner",
                "Sample interval must be greater than 0",
            ));
        }
        if self.sample_interval > MAX_SAMPLE_INTERVAL {
            return Err(KioskError::component(
                "scanner".to_string(),
                format!("Sample interval must be at most {:?}", MAX_SAMPLE_INTERVAL),
            ));
        }

        let mut controller =
            ScanController::new(source, decoder, self.sample_interval, self.timeout);
        controller.event_bus = self.event_bus;
        if let Some(shutdown) = self.shutdown {
            controller.shutdown = shutdown;
        }
        Ok(controller)
    }
}

impl Default for ScanControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

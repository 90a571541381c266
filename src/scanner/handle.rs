use super::session::{ScanSession, ScanState};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Session bookkeeping shared between the controller and its handles
#[derive(Default)]
pub(crate) struct SessionSlot {
    pub(crate) token: Option<CancellationToken>,
    pub(crate) session: Option<ScanSession>,
}

/// Cheap, cloneable remote control for a [`super::ScanController`]
#[derive(Clone)]
pub struct ScanHandle {
    slot: Arc<Mutex<SessionSlot>>,
    state: watch::Receiver<ScanState>,
}

impl ScanHandle {
    pub(crate) fn new(slot: Arc<Mutex<SessionSlot>>, state: watch::Receiver<ScanState>) -> Self {
        Self { slot, state }
    }

    /// Request the running session to stop.
    ///
    /// Synchronous and idempotent; a no-op when no session is running.
    pub fn stop(&self) {
        let slot = self.slot.lock();
        match &slot.token {
            Some(token) if !token.is_cancelled() => {
                debug!("Stop requested for the active scan session");
                token.cancel();
            }
            _ => debug!("Stop requested with no active scan session"),
        }
    }

    /// Current controller state
    pub fn state(&self) -> ScanState {
        self.state.borrow().clone()
    }

    pub fn is_active(&self) -> bool {
        self.state.borrow().is_active()
    }

    /// Snapshot of the running or most recent session
    pub fn session(&self) -> Option<ScanSession> {
        self.slot.lock().session.clone()
    }

    /// Receiver for state changes
    pub fn subscribe(&self) -> watch::Receiver<ScanState> {
        self.state.clone()
    }

    /// Wait until the controller reaches a state matching `predicate`
    pub async fn wait_for<P>(&self, predicate: P) -> ScanState
    where
        P: FnMut(&ScanState) -> bool,
    {
        let mut receiver = self.state.clone();
        let waited = receiver.wait_for(predicate).await.map(|state| state.clone());
        match waited {
            Ok(state) => state,
            // Controller dropped; report whatever it left behind
            Err(_) => receiver.borrow().clone(),
        }
    }
}

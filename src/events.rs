use crate::error::EventBusError;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Events that can occur in the kiosk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum KioskEvent {
    /// A scan session was started
    ScanStarted {
        session_id: String,
        timestamp: SystemTime,
    },
    /// The camera delivered a live stream
    CameraAcquired { session_id: String },
    /// A frame decoded to a code
    CodeDecoded {
        session_id: String,
        code: String,
        ticks: u64,
    },
    /// The session was stopped before a decode
    ScanCancelled { session_id: String },
    /// The session hit its configured timeout
    ScanTimedOut { session_id: String },
    /// The camera could not be acquired
    ScanFailed { session_id: String, error: String },
    /// The check-in endpoint accepted a code
    CheckInCompleted {
        code: String,
        name: String,
        ticket_type: String,
    },
    /// The check-in endpoint rejected a code
    CheckInRejected { code: String, reason: String },
    /// A system error occurred in a component
    SystemError { component: String, error: String },
    /// System shutdown requested
    ShutdownRequested {
        timestamp: SystemTime,
        reason: String,
    },
}

impl KioskEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            KioskEvent::ScanStarted { session_id, .. } => {
                format!("Scan session {} started", session_id)
            }
            KioskEvent::CameraAcquired { session_id } => {
                format!("Camera acquired for session {}", session_id)
            }
            KioskEvent::CodeDecoded { code, ticks, .. } => {
                format!("Decoded {} after {} ticks", code, ticks)
            }
            KioskEvent::ScanCancelled { session_id } => {
                format!("Scan session {} cancelled", session_id)
            }
            KioskEvent::ScanTimedOut { session_id } => {
                format!("Scan session {} timed out", session_id)
            }
            KioskEvent::ScanFailed { session_id, error } => {
                format!("Scan session {} failed: {}", session_id, error)
            }
            KioskEvent::CheckInCompleted {
                code,
                name,
                ticket_type,
            } => format!("Checked in {} ({}, {})", code, name, ticket_type),
            KioskEvent::CheckInRejected { code, reason } => {
                format!("Check-in for {} rejected: {}", code, reason)
            }
            KioskEvent::SystemError { component, error } => {
                format!("Error in {}: {}", component, error)
            }
            KioskEvent::ShutdownRequested { reason, .. } => {
                format!("Shutdown requested: {}", reason)
            }
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            KioskEvent::ScanStarted { .. } => "scan_started",
            KioskEvent::CameraAcquired { .. } => "camera_acquired",
            KioskEvent::CodeDecoded { .. } => "code_decoded",
            KioskEvent::ScanCancelled { .. } => "scan_cancelled",
            KioskEvent::ScanTimedOut { .. } => "scan_timed_out",
            KioskEvent::ScanFailed { .. } => "scan_failed",
            KioskEvent::CheckInCompleted { .. } => "check_in_completed",
            KioskEvent::CheckInRejected { .. } => "check_in_rejected",
            KioskEvent::SystemError { .. } => "system_error",
            KioskEvent::ShutdownRequested { .. } => "shutdown_requested",
        }
    }
}

/// Async event bus for component coordination using broadcast channels
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<KioskEvent>,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to events and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<KioskEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all subscribers.
    ///
    /// Returns the number of receivers that saw the event. Having no subscribers is an error
    /// from the channel's point of view; callers that only log can ignore it.
    pub fn publish(&self, event: KioskEvent) -> Result<usize, EventBusError> {
        match &event {
            KioskEvent::ScanFailed { session_id, error } => {
                warn!("Scan session {} failed: {}", session_id, error);
            }
            KioskEvent::CodeDecoded { code, ticks, .. } => {
                info!("Decoded code {} after {} ticks", code, ticks);
            }
            KioskEvent::CheckInCompleted { code, name, .. } => {
                info!("Checked in {} for {}", code, name);
            }
            KioskEvent::CheckInRejected { code, reason } => {
                warn!("Check-in for {} rejected: {}", code, reason);
            }
            KioskEvent::SystemError { component, error } => {
                error!("System error in {}: {}", component, error);
            }
            KioskEvent::ShutdownRequested { reason, .. } => {
                info!("Shutdown requested: {}", reason);
            }
            _ => debug!("Event: {}", event.description()),
        }

        self.sender
            .send(event)
            .map_err(|e| EventBusError::PublishFailed {
                details: e.to_string(),
            })
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

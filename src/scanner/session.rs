use crate::decoder::DecodedCode;
use crate::error::CameraError;
use std::time::SystemTime;

/// How a session that did not fail ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Decoded,
    Cancelled,
    TimedOut,
}

/// Scan controller state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Acquiring,
    Scanning,
    Done(Completion),
    Failed(CameraError),
}

impl ScanState {
    pub fn is_active(&self) -> bool {
        matches!(self, ScanState::Acquiring | ScanState::Scanning)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanState::Done(_) | ScanState::Failed(_))
    }
}

/// Terminal result of one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Decoded(DecodedCode),
    Cancelled,
    TimedOut,
    Failed(CameraError),
}

impl ScanOutcome {
    pub fn state(&self) -> ScanState {
        match self {
            ScanOutcome::Decoded(_) => ScanState::Done(Completion::Decoded),
            ScanOutcome::Cancelled => ScanState::Done(Completion::Cancelled),
            ScanOutcome::TimedOut => ScanState::Done(Completion::TimedOut),
            ScanOutcome::Failed(error) => ScanState::Failed(error.clone()),
        }
    }

    pub fn code(&self) -> Option<&DecodedCode> {
        match self {
            ScanOutcome::Decoded(code) => Some(code),
            _ => None,
        }
    }
}

/// Snapshot of a scanning attempt
#[derive(Debug, Clone)]
pub struct ScanSession {
    pub id: String,
    pub active: bool,
    pub last_error: Option<String>,
    pub ticks: u64,
    pub started_at: SystemTime,
}

impl ScanSession {
    pub(crate) fn begin() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            active: true,
            last_error: None,
            ticks: 0,
            started_at: SystemTime::now(),
        }
    }

    /// Mark the session inactive. Only the first call has any effect.
    pub(crate) fn end(&mut self, outcome: &ScanOutcome, ticks: u64) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        self.ticks = ticks;
        if let ScanOutcome::Failed(error) = outcome {
            self.last_error = Some(error.to_string());
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ends_once() {
        let mut session = ScanSession::begin();
        assert!(session.active);

        assert!(session.end(&ScanOutcome::Failed(CameraError::DeviceNotFound), 0));
        assert!(!session.active);
        assert_eq!(
            session.last_error.as_deref(),
            Some("No camera found on this device.")
        );

        assert!(!session.end(&ScanOutcome::Cancelled, 7));
        assert_eq!(session.ticks, 0);
    }

    #[test]
    fn test_outcome_states() {
        let decoded = ScanOutcome::Decoded(DecodedCode::new("INVITE-1"));
        assert_eq!(decoded.state(), ScanState::Done(Completion::Decoded));
        assert_eq!(decoded.code().map(|c| c.as_str()), Some("INVITE-1"));

        let failed = ScanOutcome::Failed(CameraError::PermissionDenied);
        assert_eq!(failed.state(), ScanState::Failed(CameraError::PermissionDenied));
        assert!(failed.state().is_terminal());
        assert!(!failed.state().is_active());
        assert!(ScanState::Scanning.is_active());
    }
}

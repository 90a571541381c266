/// Component lifecycle states
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentState {
    Stopped,
    Starting,
    Running,
    Stopping,
    Failed,
}

/// System shutdown reason
#[derive(Debug, Clone)]
pub enum ShutdownReason {
    Signal(String),
    Error(String),
    Completed,
}

/// What the kiosk process does once started
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Scan invites with the camera and check them in. With `once`, exit after the first
    /// check-in attempt.
    Kiosk { once: bool },
    /// Serve the check-in endpoint only
    ServerOnly,
    /// Submit one code without scanning
    SubmitCode(String),
}

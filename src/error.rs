use thiserror::Error;

#[derive(Error, Debug)]
pub enum KioskError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Check-in error: {0}")]
    CheckIn(#[from] CheckInError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Event bus error: {0}")]
    EventBus(#[from] EventBusError),

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl KioskError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Acquisition failures. All of them end the scan session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("Camera access denied. Please allow camera access and try again.")]
    PermissionDenied,

    #[error("No camera found on this device.")]
    DeviceNotFound,

    #[error("Camera not available: {details}")]
    DeviceBusy { details: String },
}

impl CameraError {
    /// Short name used in events and state reporting
    pub fn kind(&self) -> &'static str {
        match self {
            CameraError::PermissionDenied => "PermissionDenied",
            CameraError::DeviceNotFound => "DeviceNotFound",
            CameraError::DeviceBusy { .. } => "DeviceBusy",
        }
    }

    pub fn busy<S: Into<String>>(details: S) -> Self {
        Self::DeviceBusy {
            details: details.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("A scan session is already active")]
    SessionActive,
}

#[derive(Error, Debug)]
pub enum CheckInError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid invite code: {code}")]
    InvalidCode { code: String },

    #[error("Check-in rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Check-in request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to bind {address}: {source}")]
    BindFailed {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Check-in server failed: {details}")]
    ServerFailed { details: String },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read invites from {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed invites file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum EventBusError {
    #[error("Failed to publish event: {details}")]
    PublishFailed { details: String },
}

pub type Result<T, E = KioskError> = std::result::Result<T, E>;

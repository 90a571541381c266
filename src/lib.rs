pub mod app;
pub mod camera;
pub mod checkin;
pub mod client;
pub mod config;
pub mod decoder;
pub mod error;
pub mod events;
pub mod frame;
pub mod sampler;
pub mod scanner;

pub use app::{ComponentState, KioskOrchestrator, RunMode, ShutdownReason};
pub use camera::{StreamInfo, VideoSource, VideoSourceBuilder};
pub use checkin::{Invite, InviteStore, MemoryInviteStore};
#[cfg(feature = "server")]
pub use checkin::{CheckInServer, CheckInServerBuilder};
pub use client::CheckInClient;
pub use config::KioskConfig;
pub use decoder::{DecodedCode, Decoder, QrDecoder};
pub use error::{KioskError, Result};
pub use events::{EventBus, KioskEvent};
pub use frame::Frame;
pub use scanner::{ScanController, ScanControllerBuilder, ScanHandle, ScanOutcome, ScanState};

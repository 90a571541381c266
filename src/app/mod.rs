mod orchestrator;
mod runtime;
mod shutdown;
mod startup;
mod state;
mod types;


pub use orchestrator::KioskOrchestrator;
pub use types::{ComponentState, RunMode, ShutdownReason};

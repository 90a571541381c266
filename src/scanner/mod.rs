mod controller;
mod handle;
mod session;

pub use controller::{ScanController, ScanControllerBuilder};
pub use handle::ScanHandle;
pub use session::{Completion, ScanOutcome, ScanSession, ScanState};

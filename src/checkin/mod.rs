#[cfg(feature = "server")]
mod handlers;
mod model;
#[cfg(feature = "server")]
mod server;
mod store;

pub use model::{CheckInRequest, ErrorBody, Invite};
#[cfg(feature = "server")]
pub use server::{CheckInServer, CheckInServerBuilder};
pub use store::{InviteStore, MemoryInviteStore};

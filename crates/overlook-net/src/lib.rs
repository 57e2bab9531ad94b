//! Overlook Net - camera-state relay
//!
//! Viewers publish their camera pose to a relay, which fans it out to every
//! other connected viewer. This crate holds the wire contract, the relay
//! server, a non-blocking client for the render thread, and the ingest side
//! that turns relay events into remote-user state.

pub mod client;
pub mod error;
pub mod protocol;
pub mod relay;
pub mod session;

pub use client::RelayClient;
pub use error::RelayError;
pub use protocol::{ClientEvent, PoseUpdate, PoseUpdates, ServerEvent, UserPayload};
pub use relay::{RelayConfig, RelayServer};
pub use session::{AvatarScene, RemoteUserState, SessionIngest};

//! # Networking
//!
//! How the client reaches a hub:
//!
//! - [`transport`]: the [`Transport`] trait and the JSON envelope format.
//! - [`ws`]: [`WsTransport`], a reconnecting WebSocket implementation.
//! - [`api`]: [`NetworkApi`], typed light-client calls and the method
//!   registry.

pub mod api;
pub mod transport;
pub mod ws;

pub use api::{wire_command, CoinRequest, CoinSelection, LightProps, NetworkApi, API_METHODS};
pub use transport::{Notification, Transport, TransportError, WireMessage};
pub use ws::WsTransport;

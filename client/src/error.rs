//! Crate-level error types.
//!
//! Each layer keeps its own error enum ([`KeyError`], [`CanonicalError`],
//! [`UnitError`], [`TransportError`]); [`ClientError`] is what the public
//! client surface returns.

use thiserror::Error;

use crate::crypto::KeyError;
use crate::network::TransportError;
use crate::unit::{CanonicalError, Unit, UnitError};

/// Problems with what the caller asked for. Raised before any network
/// traffic whenever the check can be made locally.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("no private key: pass one per call or configure a default")]
    MissingKey,

    #[error("private key: {0}")]
    Key(#[from] KeyError),

    #[error("application name must not be empty")]
    EmptyApp,

    #[error("unknown application {0:?}")]
    UnknownApp(String),

    #[error("unknown API method {0:?}")]
    UnknownMethod(String),

    #[error("invalid payment payload: {0}")]
    InvalidPayment(String),

    #[error("invalid address {0:?}")]
    InvalidAddress(String),

    #[error("payload cannot be encoded: {0}")]
    InvalidPayload(#[from] CanonicalError),

    #[error("definition of {0} is unknown to the network; pass it along with the address")]
    UnknownDefinition(String),

    #[error("no spendable {} at {address}", .asset.as_deref().unwrap_or("bytes"))]
    InsufficientFunds {
        address: String,
        asset: Option<String>,
    },
}

/// Everything a [`crate::Client`] call can fail with.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The hub refused the unit. The unit itself is handed back.
    #[error("unit {} rejected: {reason}", .unit.unit.as_deref().unwrap_or("<unhashed>"))]
    Rejected { unit: Box<Unit>, reason: String },

    #[error("composition failed: {0}")]
    Unit(#[from] UnitError),
}

impl From<KeyError> for ClientError {
    fn from(e: KeyError) -> Self {
        Self::Input(InputError::Key(e))
    }
}

/// Convenience alias used across the client surface.
pub type Result<T, E = ClientError> = std::result::Result<T, E>;

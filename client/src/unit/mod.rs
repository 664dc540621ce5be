//! # Units
//!
//! A unit is the ledger's record: one or more messages, the authors who
//! sign them, and the parents it attaches to in the DAG. Composing one
//! means reproducing, byte for byte, the hashing and fee rules validators
//! apply when they receive it.
//!
//! ## Module Layout
//!
//! - [`canonical`]: source-string encoding and the length function.
//! - [`types`]: the unit and its parts.
//! - [`address`]: definition to address.
//! - [`fees`]: header and payload commissions.
//! - [`hash`]: payload hash, hash to sign, unit id.
//! - [`composer`]: draft assembly and finalization.

pub mod address;
pub mod canonical;
pub mod composer;
pub mod fees;
pub mod hash;
pub mod types;

use thiserror::Error;

use crate::crypto::SignatureError;

pub use canonical::CanonicalError;
pub use composer::PaymentRequest;
pub use types::{
    Author, Checkpoint, Definition, HeadersCommissionShare, Input, Message, MessagePayload,
    Output, PaymentPayload, Unit,
};

/// Failures while turning a draft into a signed unit.
#[derive(Debug, Error)]
pub enum UnitError {
    #[error("canonical encoding failed: {0}")]
    Canonical(#[from] CanonicalError),

    #[error("unit serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("selected inputs total {total} but {requested} was requested")]
    InsufficientInputs { total: u64, requested: u64 },

    #[error("output amounts overflow")]
    AmountOverflow,

    #[error("first message has no change output to deduct commissions from")]
    MissingChangeOutput,

    #[error("commissions of {fees} exceed the change output of {change}")]
    FeeExceedsChange { change: u64, fees: u64 },

    #[error("unit has no id; only finalized units can be posted")]
    Unsigned,

    #[error("signing failed: {0}")]
    Signing(#[from] SignatureError),
}

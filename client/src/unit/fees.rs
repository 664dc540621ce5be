//! # Commissions
//!
//! A unit pays two commissions, both measured with [`length`]:
//!
//! - **headers**: the unit minus its messages and a few bookkeeping
//!   fields, plus a flat allowance for `parent_units` (the composer does
//!   not know how many parents a validator will see, so it is never
//!   charged per parent).
//! - **payload**: the messages.
//!
//! Both are computed on the draft with placeholder authentifiers. The
//! placeholder is exactly as long as a real signature, so the numbers stay
//! correct after signing.

use serde_json::Value;

use super::canonical::length;
use super::types::Unit;
use crate::config::PARENT_UNITS_SIZE;

/// Top-level fields excluded from the header commission.
const NON_HEADER_FIELDS: &[&str] = &[
    "unit",
    "headers_commission",
    "payload_commission",
    "main_chain_index",
    "timestamp",
    "messages",
    "parent_units",
];

/// Header commission of `unit`.
pub fn headers_size(unit: &Unit) -> Result<u64, serde_json::Error> {
    let mut header = serde_json::to_value(unit)?;
    if let Value::Object(map) = &mut header {
        for field in NON_HEADER_FIELDS {
            map.remove(*field);
        }
    }
    Ok(length(&header) + PARENT_UNITS_SIZE)
}

/// Payload commission of `unit`.
pub fn payload_size(unit: &Unit) -> Result<u64, serde_json::Error> {
    Ok(length(&serde_json::to_value(&unit.messages)?))
}

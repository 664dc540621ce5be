//! Address derivation: an address is the chash160 of its definition's
//! canonical source string.

use super::canonical::{source_string, CanonicalError};
use super::types::Definition;
use crate::crypto::hash::{chash160, is_valid_chash160};

/// Derive the address controlled by `definition`.
pub fn derive(definition: &Definition) -> Result<String, CanonicalError> {
    Ok(chash160(&source_string(definition.as_value())?))
}

/// Returns `true` for a 32-character base32 address with a valid checksum.
pub fn is_valid_address(address: &str) -> bool {
    is_valid_chash160(address)
}

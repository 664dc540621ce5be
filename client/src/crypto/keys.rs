//! # Key Management
//!
//! secp256k1 private keys as the ledger uses them.
//!
//! Keys arrive in Wallet Import Format (base58check with a version byte and
//! an optional compression flag). The public half is always published as
//! the base64 of its 33-byte compressed SEC1 encoding, which is also what
//! goes into a `["sig", {"pubkey": ...}]` address definition.
//!
//! Key bytes are never logged and never appear in `Debug` output.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use k256::ecdsa::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use std::fmt;
use thiserror::Error;

use crate::config::{Network, WIF_COMPRESSED_FLAG};

/// Length of a raw secp256k1 secret scalar.
pub const SECRET_KEY_LENGTH: usize = 32;

/// Length of a compressed SEC1 public key.
pub const COMPRESSED_PUBKEY_LENGTH: usize = 33;

/// Errors that can occur while decoding or encoding keys.
///
/// None of the variants carry key material.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid WIF encoding: {0}")]
    InvalidWif(String),

    #[error("WIF version byte {found:#04x} does not match {network} (expected {expected:#04x})")]
    WrongNetwork {
        network: Network,
        expected: u8,
        found: u8,
    },

    #[error("invalid secret key bytes: wrong length or not a valid scalar")]
    InvalidSecretKey,

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
}

/// A secp256k1 signing key.
///
/// Deliberately not `Serialize`; use [`PrivateKey::to_wif`] when a key has
/// to leave the process.
///
/// # Examples
///
/// ```
/// use obyte_client::config::Network;
/// use obyte_client::crypto::PrivateKey;
///
/// let key = PrivateKey::generate();
/// let wif = key.to_wif(Network::Testnet);
/// let decoded = PrivateKey::from_wif(&wif, Network::Testnet).unwrap();
/// assert_eq!(key.public_key(), decoded.public_key());
/// ```
#[derive(Clone)]
pub struct PrivateKey {
    signing_key: SigningKey,
}

impl PrivateKey {
    /// Generate a fresh key from the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }

    /// Build a key from a raw 32-byte secret scalar.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != SECRET_KEY_LENGTH {
            return Err(KeyError::InvalidSecretKey);
        }
        let signing_key = SigningKey::from_slice(bytes).map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self { signing_key })
    }

    /// Build a key from a hex-encoded secret scalar.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str).map_err(|_| KeyError::InvalidSecretKey)?;
        Self::from_bytes(&bytes)
    }

    /// Decode a WIF string for the given network.
    ///
    /// The payload is `version || secret(32) [|| 0x01]`. A mismatched
    /// version byte is rejected rather than silently accepted, so a testnet
    /// key cannot end up signing mainnet units.
    pub fn from_wif(wif: &str, network: Network) -> Result<Self, KeyError> {
        let payload = bs58::decode(wif.trim())
            .with_check(None)
            .into_vec()
            .map_err(|e| KeyError::InvalidWif(e.to_string()))?;

        let (version, rest) = payload
            .split_first()
            .ok_or_else(|| KeyError::InvalidWif("empty payload".into()))?;

        let expected = network.wif_version();
        if *version != expected {
            return Err(KeyError::WrongNetwork {
                network,
                expected,
                found: *version,
            });
        }

        let secret = match rest.len() {
            SECRET_KEY_LENGTH => rest,
            n if n == SECRET_KEY_LENGTH + 1 && rest[SECRET_KEY_LENGTH] == WIF_COMPRESSED_FLAG => {
                &rest[..SECRET_KEY_LENGTH]
            }
            n => {
                return Err(KeyError::InvalidWif(format!(
                    "unexpected payload length {}",
                    n + 1
                )))
            }
        };

        Self::from_bytes(secret)
    }

    /// Encode as compressed-flag WIF for the given network.
    pub fn to_wif(&self, network: Network) -> String {
        let mut payload = Vec::with_capacity(SECRET_KEY_LENGTH + 2);
        payload.push(network.wif_version());
        payload.extend_from_slice(&self.signing_key.to_bytes());
        payload.push(WIF_COMPRESSED_FLAG);
        bs58::encode(payload).with_check().into_string()
    }

    /// Base64 of the compressed SEC1 public key (44 characters).
    pub fn public_key(&self) -> String {
        BASE64.encode(self.public_key_bytes())
    }

    /// The compressed SEC1 public key.
    pub fn public_key_bytes(&self) -> [u8; COMPRESSED_PUBKEY_LENGTH] {
        let point = self.signing_key.verifying_key().to_encoded_point(true);
        let mut out = [0u8; COMPRESSED_PUBKEY_LENGTH];
        out.copy_from_slice(point.as_bytes());
        out
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Decode a base64 compressed public key back into a verifying key.
pub fn decode_public_key(pubkey: &str) -> Result<VerifyingKey, KeyError> {
    let bytes = BASE64
        .decode(pubkey)
        .map_err(|e| KeyError::InvalidPublicKey(e.to_string()))?;
    if bytes.len() != COMPRESSED_PUBKEY_LENGTH {
        return Err(KeyError::InvalidPublicKey(format!(
            "expected {} bytes, got {}",
            COMPRESSED_PUBKEY_LENGTH,
            bytes.len()
        )));
    }
    VerifyingKey::from_sec1_bytes(&bytes).map_err(|e| KeyError::InvalidPublicKey(e.to_string()))
}

//! # Digital Signatures
//!
//! ECDSA over secp256k1, applied to a 32-byte digest the caller has
//! already computed (the unit's hash to sign). Nonces follow RFC 6979 and
//! signatures are normalized to low-S, so signing the same digest with the
//! same key always yields the same 88-character base64 string.
//!
//! The wire form is the 64-byte compact `r || s` encoding, base64 encoded.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::Signature;
use thiserror::Error;

use super::keys::{decode_public_key, PrivateKey};

/// Length of a digest accepted by [`sign`] and [`verify`].
pub const DIGEST_LENGTH: usize = 32;

/// Errors during signature operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("digest must be {DIGEST_LENGTH} bytes, got {0}")]
    InvalidDigestLength(usize),

    #[error("signing failed")]
    SigningFailed,
}

/// Sign a 32-byte digest and return the base64 compact signature.
///
/// # Example
///
/// ```
/// use obyte_client::crypto::{sha256, sign, verify, PrivateKey};
///
/// let key = PrivateKey::generate();
/// let digest = sha256(b"unit");
/// let signature = sign(&digest, &key).unwrap();
///
/// assert_eq!(signature.len(), 88);
/// assert!(verify(&key.public_key(), &digest, &signature));
/// ```
pub fn sign(digest: &[u8], key: &PrivateKey) -> Result<String, SignatureError> {
    if digest.len() != DIGEST_LENGTH {
        return Err(SignatureError::InvalidDigestLength(digest.len()));
    }
    let signature = PrehashSigner::<Signature>::sign_prehash(key.signing_key(), digest)
        .map_err(|_| SignatureError::SigningFailed)?;
    let signature = signature.normalize_s().unwrap_or(signature);
    Ok(BASE64.encode(signature.to_bytes()))
}

/// Verify a base64 signature over a 32-byte digest.
///
/// Returns `false` for anything that does not check out, including a
/// malformed public key or signature.
pub fn verify(pubkey: &str, digest: &[u8], signature: &str) -> bool {
    if digest.len() != DIGEST_LENGTH {
        return false;
    }
    let Ok(verifying_key) = decode_public_key(pubkey) else {
        return false;
    };
    let Ok(bytes) = BASE64.decode(signature) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(&bytes) else {
        return false;
    };
    verifying_key.verify_prehash(digest, &signature).is_ok()
}

//! # Cryptographic Primitives
//!
//! Everything the composer needs to hash and sign a unit:
//!
//! - **SHA-256** for payload, content and unit hashes.
//! - **RIPEMD-160 + base32** for checksummed addresses (`chash160`).
//! - **ECDSA/secp256k1** with RFC 6979 nonces for authentifiers.
//!
//! Thin wrappers over `sha2`, `ripemd` and `k256`. Nothing here is
//! hand-rolled beyond the chash160 bit layout, which no crate provides.

pub mod hash;
pub mod keys;
pub mod signatures;

pub use hash::{base64_sha256, chash160, is_valid_chash160, sha256};
pub use keys::{KeyError, PrivateKey};
pub use signatures::{sign, verify, SignatureError};

//! # Hashing Utilities
//!
//! The hash functions the ledger is built on:
//!
//! - **SHA-256**: payload hashes, unit hashes, the signing digest, and the
//!   checksum inside addresses.
//! - **RIPEMD-160**: the body of a 160-bit checksummed hash (`chash160`),
//!   which is what an address is.
//!
//! ## chash160
//!
//! ```text
//! data
//!     -> RIPEMD-160(data)                  20 bytes
//!     -> drop first 4 bytes                16 bytes = 128 data bits
//!     -> SHA-256(truncated)[5,13,21,29]    4 bytes  = 32 checksum bits
//!     -> interleave checksum bits at pi-digit offsets -> 160 bits
//!     -> base32 (RFC 4648)                 32 characters
//! ```
//!
//! The checksum bits sit at positions given by the running sum of the
//! non-zero decimal digits of pi. Any single mistyped character of an
//! address breaks the checksum.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use data_encoding::BASE32;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Digits of pi driving the checksum bit offsets.
const PI_DIGITS: &[u8] = b"14159265358979323846264338327950288419716939937510";

/// Bits in a chash160.
const CHASH160_BITS: usize = 160;

/// Checksum bits mixed into a chash160.
const CHECKSUM_BITS: usize = 32;

/// Length of a base32-encoded chash160.
pub const CHASH160_LENGTH: usize = 32;

/// Compute the SHA-256 hash of the input data.
///
/// # Example
///
/// ```
/// use obyte_client::crypto::sha256;
///
/// let hash = sha256(b"obyte");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute the RIPEMD-160 hash of the input data.
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    let mut output = [0u8; 20];
    output.copy_from_slice(&hasher.finalize());
    output
}

/// SHA-256 of a UTF-8 string, base64 encoded (44 characters).
///
/// This is the form every content hash on the ledger takes: payload
/// hashes, content hashes and unit ids.
pub fn base64_sha256(data: &str) -> String {
    BASE64.encode(sha256(data.as_bytes()))
}

/// Compute the base32 chash160 of a UTF-8 string.
pub fn chash160(data: &str) -> String {
    let hash = ripemd160(data.as_bytes());
    let truncated = &hash[4..];
    let checksum = checksum(truncated);
    let mixed = mix_checksum(&to_bits(truncated), &to_bits(&checksum));
    BASE32.encode(&from_bits(&mixed))
}

/// Returns `true` if `chash` is a well-formed chash160 with a valid checksum.
pub fn is_valid_chash160(chash: &str) -> bool {
    if chash.len() != CHASH160_LENGTH {
        return false;
    }
    let Ok(decoded) = BASE32.decode(chash.as_bytes()) else {
        return false;
    };
    let bits = to_bits(&decoded);
    if bits.len() != CHASH160_BITS {
        return false;
    }

    let offsets = checksum_offsets();
    let mut clean = Vec::with_capacity(CHASH160_BITS - CHECKSUM_BITS);
    let mut embedded = Vec::with_capacity(CHECKSUM_BITS);
    for (position, bit) in bits.into_iter().enumerate() {
        if offsets.contains(&position) {
            embedded.push(bit);
        } else {
            clean.push(bit);
        }
    }

    let clean_bytes = from_bits(&clean);
    to_bits(&checksum(&clean_bytes)) == embedded
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

/// Four checksum bytes picked out of SHA-256 of the clean data.
fn checksum(clean: &[u8]) -> [u8; 4] {
    let full = sha256(clean);
    [full[5], full[13], full[21], full[29]]
}

/// Absolute bit positions of the 32 checksum bits inside a chash160.
fn checksum_offsets() -> Vec<usize> {
    let mut offsets = Vec::with_capacity(CHECKSUM_BITS);
    let mut offset = 0usize;
    for digit in PI_DIGITS.iter().map(|d| (d - b'0') as usize) {
        if digit == 0 {
            continue;
        }
        offset += digit;
        if offset >= CHASH160_BITS {
            break;
        }
        offsets.push(offset);
    }
    debug_assert_eq!(offsets.len(), CHECKSUM_BITS);
    offsets
}

/// Places checksum bits at their offsets and fills the rest with clean bits.
fn mix_checksum(clean: &[bool], checksum: &[bool]) -> Vec<bool> {
    let offsets = checksum_offsets();
    let total = clean.len() + checksum.len();
    let mut clean_bits = clean.iter();
    let mut checksum_bits = checksum.iter();

    (0..total)
        .filter_map(|position| {
            if offsets.contains(&position) {
                checksum_bits.next().copied()
            } else {
                clean_bits.next().copied()
            }
        })
        .collect()
}

/// Big-endian bit expansion of a byte slice.
fn to_bits(bytes: &[u8]) -> Vec<bool> {
    bytes
        .iter()
        .flat_map(|byte| (0..8).rev().map(move |i| (byte >> i) & 1 == 1))
        .collect()
}

/// Packs big-endian bits back into bytes. Trailing bits short of a full
/// byte are zero-padded.
fn from_bits(bits: &[bool]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |acc, (i, &bit)| acc | ((bit as u8) << (7 - i)))
        })
        .collect()
}

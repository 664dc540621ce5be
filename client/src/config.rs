//! # Protocol Configuration & Constants
//!
//! Every magic number the composer depends on lives here. Most of them are
//! not ours to choose: validators recompute commissions and hashes with the
//! same values, and a unit built with a different one is simply rejected.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Network Identifiers
// ---------------------------------------------------------------------------

/// Default mainnet hub for light clients.
pub const DEFAULT_NODE: &str = "wss://obyte.org/bb";

/// Default testnet hub.
pub const DEFAULT_TESTNET_NODE: &str = "wss://obyte.org/bb-test";

/// Unit `version` tag on mainnet.
pub const VERSION: &str = "1.0";

/// Unit `version` tag on testnet.
pub const VERSION_TESTNET: &str = "1.0t";

/// Unit `alt` tag on mainnet.
pub const ALT: &str = "1";

/// Unit `alt` tag on testnet.
pub const ALT_TESTNET: &str = "2";

// ---------------------------------------------------------------------------
// Composition Parameters
// ---------------------------------------------------------------------------

/// Length of a base64-encoded 64-byte secp256k1 signature.
pub const SIGNATURE_LENGTH: usize = 88;

/// Character the authentifier placeholder is made of. The placeholder is
/// [`SIGNATURE_LENGTH`] characters long so that the header commission
/// computed before signing equals the one a validator computes after.
pub const PLACEHOLDER_CHAR: char = '-';

/// Fixed size charged for `parent_units` in the header commission,
/// regardless of how many parents the unit actually references.
pub const PARENT_UNITS_SIZE: u64 = 2 * 44;

/// Signing path used when the caller does not name one.
pub const DEFAULT_SIGNING_PATH: &str = "r";

/// Extra bytes requested from coin selection on top of the transferred
/// amount, so the change output can absorb the commissions.
pub const FEE_HEADROOM: u64 = 1_000;

/// `last_ball_mci` sent with coin-selection requests: "any stable coin".
pub const COIN_SELECTION_LAST_BALL_MCI: u64 = 1_000_000_000;

/// Share of the header commission granted to the signer of a
/// multi-authored unit, in percent.
pub const SIGNER_COMMISSION_SHARE: u8 = 100;

/// `payload_location` for every message this client builds.
pub const PAYLOAD_LOCATION_INLINE: &str = "inline";

/// Application tag of payment messages.
pub const PAYMENT_APP: &str = "payment";

// ---------------------------------------------------------------------------
// Key Encoding
// ---------------------------------------------------------------------------

/// WIF version byte for mainnet private keys.
pub const WIF_VERSION_MAINNET: u8 = 0x80;

/// WIF version byte for testnet private keys.
pub const WIF_VERSION_TESTNET: u8 = 0xEF;

/// Trailing WIF flag marking a compressed public key.
pub const WIF_COMPRESSED_FLAG: u8 = 0x01;

// ---------------------------------------------------------------------------
// Transport Timing
// ---------------------------------------------------------------------------

/// Interval between client heartbeats on an open connection.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// Default per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// First reconnection delay; doubles per failed attempt.
pub const RECONNECT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Upper bound for the reconnection delay.
pub const RECONNECT_MAX_DELAY: Duration = Duration::from_secs(60);

/// Capacity of the push-notification broadcast channel.
pub const NOTIFICATION_CHANNEL_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// Network Selection
// ---------------------------------------------------------------------------

/// Which ledger the client composes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    /// Picks a network from the usual boolean flag.
    pub fn from_testnet_flag(testnet: bool) -> Self {
        if testnet {
            Self::Testnet
        } else {
            Self::Mainnet
        }
    }

    pub fn is_testnet(self) -> bool {
        self == Self::Testnet
    }

    /// Unit `version` tag for this network.
    pub fn version(self) -> &'static str {
        match self {
            Self::Mainnet => VERSION,
            Self::Testnet => VERSION_TESTNET,
        }
    }

    /// Unit `alt` tag for this network.
    pub fn alt(self) -> &'static str {
        match self {
            Self::Mainnet => ALT,
            Self::Testnet => ALT_TESTNET,
        }
    }

    /// Hub a client connects to when no URL is configured.
    pub fn default_node(self) -> &'static str {
        match self {
            Self::Mainnet => DEFAULT_NODE,
            Self::Testnet => DEFAULT_TESTNET_NODE,
        }
    }

    /// WIF version byte expected for private keys on this network.
    pub fn wif_version(self) -> u8 {
        match self {
            Self::Mainnet => WIF_VERSION_MAINNET,
            Self::Testnet => WIF_VERSION_TESTNET,
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mainnet => write!(f, "mainnet"),
            Self::Testnet => write!(f, "testnet"),
        }
    }
}

/// Returns the authentifier placeholder used while commissions are computed.
pub fn signature_placeholder() -> String {
    std::iter::repeat(PLACEHOLDER_CHAR)
        .take(SIGNATURE_LENGTH)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_tags_are_distinct() {
        assert_ne!(Network::Mainnet.version(), Network::Testnet.version());
        assert_ne!(Network::Mainnet.alt(), Network::Testnet.alt());
        assert_ne!(
            Network::Mainnet.wif_version(),
            Network::Testnet.wif_version()
        );
    }

    #[test]
    fn test_from_testnet_flag() {
        assert_eq!(Network::from_testnet_flag(false), Network::Mainnet);
        assert_eq!(Network::from_testnet_flag(true), Network::Testnet);
        assert!(Network::Testnet.is_testnet());
    }

    #[test]
    fn test_placeholder_matches_signature_length() {
        let placeholder = signature_placeholder();
        assert_eq!(placeholder.len(), SIGNATURE_LENGTH);
        assert!(placeholder.chars().all(|c| c == PLACEHOLDER_CHAR));
    }

    #[test]
    fn test_parent_units_allowance() {
        // Two base64 unit hashes of 44 characters each.
        assert_eq!(PARENT_UNITS_SIZE, 88);
    }

    #[test]
    fn test_network_serde_lowercase() {
        let json = serde_json::to_string(&Network::Testnet).unwrap();
        assert_eq!(json, "\"testnet\"");
    }
}

//! # Unit Types
//!
//! The ledger record and its parts, shaped exactly like their JSON
//! encoding. Field names are wire names; optional fields are omitted rather
//! than serialized as `null`, since `null` has no canonical encoding.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Unit
// ---------------------------------------------------------------------------

/// A ledger record: messages, their authors, and the DAG position it claims.
///
/// `unit` is the content-addressed id. It is set last by the composer and
/// nothing is mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub version: String,
    pub alt: String,
    pub messages: Vec<Message>,
    pub authors: Vec<Author>,
    pub parent_units: Vec<String>,
    pub last_ball: String,
    pub last_ball_unit: String,
    pub witness_list_unit: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earned_headers_commission_recipients: Option<Vec<HeadersCommissionShare>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers_commission: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_commission: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Unit {
    /// Sum of both commissions, zero until they are computed.
    pub fn total_commission(&self) -> u64 {
        self.headers_commission.unwrap_or(0) + self.payload_commission.unwrap_or(0)
    }

    pub fn is_multi_authored(&self) -> bool {
        self.authors.len() > 1
    }
}

/// Where a unit hooks into the DAG: parents plus the last stable ball, as
/// reported by the hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub parent_units: Vec<String>,
    pub last_ball: String,
    pub last_ball_unit: String,
    pub witness_list_unit: String,
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// One application message inside a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub app: String,
    pub payload_location: String,
    pub payload_hash: String,
    pub payload: MessagePayload,
}

impl Message {
    /// The payment payload, if this is a payment message.
    pub fn payment(&self) -> Option<&PaymentPayload> {
        match &self.payload {
            MessagePayload::Payment(p) => Some(p),
            MessagePayload::Custom(_) => None,
        }
    }

    pub fn payment_mut(&mut self) -> Option<&mut PaymentPayload> {
        match &mut self.payload {
            MessagePayload::Payment(p) => Some(p),
            MessagePayload::Custom(_) => None,
        }
    }
}

/// Message body. Payments are typed because the composer edits them;
/// every other app's payload is carried as opaque JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessagePayload {
    Payment(PaymentPayload),
    Custom(Value),
}

/// Body of a `payment` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPayload {
    /// Absent for the base currency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
}

impl PaymentPayload {
    /// Sorts outputs by address, then amount.
    pub fn sort_outputs(&mut self) {
        self.outputs.sort();
    }

    pub fn output_total(&self) -> u64 {
        self.outputs.iter().fold(0, |acc, o| acc.saturating_add(o.amount))
    }
}

/// Sum of output amounts, `None` on overflow.
pub fn checked_total(outputs: &[Output]) -> Option<u64> {
    outputs.iter().try_fold(0u64, |acc, o| acc.checked_add(o.amount))
}

/// A payment output. Field order gives the ledger's sort order: by
/// address, ties broken by amount.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Output {
    pub address: String,
    pub amount: u64,
}

impl Output {
    pub fn new(address: impl Into<String>, amount: u64) -> Self {
        Self {
            address: address.into(),
            amount,
        }
    }
}

/// A coin reference chosen by the hub's coin selection. Its shape depends
/// on the input type (transfer, headers commission, witnessing) and it is
/// carried verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Input(pub Map<String, Value>);

// ---------------------------------------------------------------------------
// Authors
// ---------------------------------------------------------------------------

/// One author of a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub address: String,
    /// Signing path -> signature (or placeholder while composing).
    pub authentifiers: BTreeMap<String, String>,
    /// Only present when the network has not seen this address's
    /// definition yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<Definition>,
}

impl Author {
    pub fn new(address: impl Into<String>, definition: Option<Definition>) -> Self {
        Self {
            address: address.into(),
            authentifiers: BTreeMap::new(),
            definition,
        }
    }

    /// Replaces all authentifiers with a single `path -> value` entry.
    pub fn set_authentifier(&mut self, path: &str, value: String) {
        self.authentifiers.clear();
        self.authentifiers.insert(path.to_string(), value);
    }
}

/// Share of the header commission a unit pays out to one of its authors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadersCommissionShare {
    pub address: String,
    pub earned_headers_commission_share: u8,
}

/// An address definition: the spending policy an address is the hash of.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Definition(pub Value);

impl Definition {
    /// Single-signature definition `["sig", {"pubkey": <pubkey>}]`.
    pub fn sig(pubkey: &str) -> Self {
        Self(json!(["sig", { "pubkey": pubkey }]))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outputs_sort_by_address_then_amount() {
        let mut payload = PaymentPayload {
            asset: None,
            inputs: vec![],
            outputs: vec![
                Output::new("B", 1),
                Output::new("A", 9),
                Output::new("A", 3),
            ],
        };
        payload.sort_outputs();
        assert_eq!(
            payload.outputs,
            vec![Output::new("A", 3), Output::new("A", 9), Output::new("B", 1)]
        );
        assert_eq!(payload.output_total(), 13);
    }

    #[test]
    fn test_sig_definition_shape() {
        let def = Definition::sig("PUB");
        assert_eq!(
            serde_json::to_value(&def).unwrap(),
            json!(["sig", {"pubkey": "PUB"}])
        );
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let author = Author::new("ADDR", None);
        let value = serde_json::to_value(&author).unwrap();
        assert!(value.get("definition").is_none());

        let payload = PaymentPayload {
            asset: None,
            inputs: vec![],
            outputs: vec![Output::new("A", 1)],
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert!(value.get("asset").is_none());
    }

    #[test]
    fn test_payload_untagged_deserialization() {
        let json = json!({
            "app": "data",
            "payload_location": "inline",
            "payload_hash": "h",
            "payload": {"key": "value"}
        });
        let message: Message = serde_json::from_value(json).unwrap();
        assert!(message.payment().is_none());

        let json = json!({
            "app": "payment",
            "payload_location": "inline",
            "payload_hash": "h",
            "payload": {
                "inputs": [{"unit": "U", "message_index": 0, "output_index": 1}],
                "outputs": [{"address": "A", "amount": 5}]
            }
        });
        let message: Message = serde_json::from_value(json).unwrap();
        assert_eq!(message.payment().unwrap().output_total(), 5);
    }

    #[test]
    fn test_set_authentifier_replaces() {
        let mut author = Author::new("ADDR", None);
        author.set_authentifier("r", "placeholder".into());
        author.set_authentifier("r.0", "sig".into());
        assert_eq!(author.authentifiers.len(), 1);
        assert_eq!(author.authentifiers["r.0"], "sig");
    }
}

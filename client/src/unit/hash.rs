//! # Hash Chain
//!
//! Three hashes tie a unit together:
//!
//! ```text
//! payload_hash   = b64(sha256(src(payload)))              per message
//! hash_to_sign   = sha256(src(naked unit, no authentifiers))  32 raw bytes
//! unit           = b64(sha256(src({content_hash, version, alt, authors[].address,
//!                                  witness_list_unit, parent_units,
//!                                  last_ball, last_ball_unit})))
//! content_hash   = b64(sha256(src(naked unit)))
//! ```
//!
//! The *naked* unit drops fields that are either derived (`unit`, the two
//! commissions) or assigned by the network (`main_chain_index`,
//! `timestamp`), and replaces every message by its envelope without the
//! payload. Payloads are only committed through their `payload_hash`.
//!
//! `hash_to_sign` also drops authentifiers, so a draft carrying
//! placeholders and the signed unit yield the same digest. This is what
//! lets a validator check the signature we attach.

use serde_json::Value;

use super::canonical::source_string;
use super::types::Unit;
use super::UnitError;
use crate::crypto::hash::{base64_sha256, sha256};

const NON_CONTENT_FIELDS: &[&str] = &[
    "unit",
    "headers_commission",
    "payload_commission",
    "main_chain_index",
    "timestamp",
];

const MESSAGE_BODY_FIELDS: &[&str] = &["payload", "payload_uri"];

/// Base64 SHA-256 of a payload's source string.
pub fn payload_hash(payload: &Value) -> Result<String, UnitError> {
    Ok(base64_sha256(&source_string(payload)?))
}

/// The unit without derived fields and without message bodies.
pub fn naked_unit(unit: &Unit) -> Result<Value, UnitError> {
    let mut naked = serde_json::to_value(unit)?;
    if let Value::Object(map) = &mut naked {
        for field in NON_CONTENT_FIELDS {
            map.remove(*field);
        }
        if let Some(Value::Array(messages)) = map.get_mut("messages") {
            for message in messages.iter_mut().filter_map(Value::as_object_mut) {
                for field in MESSAGE_BODY_FIELDS {
                    message.remove(*field);
                }
            }
        }
    }
    Ok(naked)
}

/// The 32-byte digest every author signs.
pub fn hash_to_sign(unit: &Unit) -> Result<[u8; 32], UnitError> {
    let mut naked = naked_unit(unit)?;
    if let Some(Value::Array(authors)) = naked.get_mut("authors") {
        for author in authors.iter_mut().filter_map(Value::as_object_mut) {
            author.remove("authentifiers");
        }
    }
    Ok(sha256(source_string(&naked)?.as_bytes()))
}

/// Base64 hash of the naked unit, authentifiers included.
pub fn content_hash(unit: &Unit) -> Result<String, UnitError> {
    Ok(base64_sha256(&source_string(&naked_unit(unit)?)?))
}

/// The unit's id.
pub fn unit_hash(unit: &Unit) -> Result<String, UnitError> {
    let authors: Vec<Value> = unit
        .authors
        .iter()
        .map(|a| serde_json::json!({ "address": a.address }))
        .collect();
    let stripped = serde_json::json!({
        "content_hash": content_hash(unit)?,
        "version": unit.version,
        "alt": unit.alt,
        "authors": authors,
        "witness_list_unit": unit.witness_list_unit,
        "parent_units": unit.parent_units,
        "last_ball": unit.last_ball,
        "last_ball_unit": unit.last_ball_unit,
    });
    Ok(base64_sha256(&source_string(&stripped)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::fees::{headers_size, payload_size};
    use crate::unit::types::{Author, Input, Message, MessagePayload, Output, PaymentPayload};
    use serde_json::json;

    fn sample_unit() -> Unit {
        let mut author = Author::new("A".repeat(32), None);
        author.set_authentifier("r", "-".repeat(88));
        let mut input = serde_json::Map::new();
        input.insert("unit".into(), json!("I".repeat(44)));
        input.insert("message_index".into(), json!(0));
        input.insert("output_index".into(), json!(0));
        let payload = PaymentPayload {
            asset: None,
            inputs: vec![Input(input)],
            outputs: vec![Output::new("A".repeat(32), 500)],
        };
        let hash = payload_hash(&serde_json::to_value(&payload).unwrap()).unwrap();
        Unit {
            version: "1.0".into(),
            alt: "1".into(),
            messages: vec![Message {
                app: "payment".into(),
                payload_location: "inline".into(),
                payload_hash: hash,
                payload: MessagePayload::Payment(payload),
            }],
            authors: vec![author],
            parent_units: vec!["P".repeat(44)],
            last_ball: "B".repeat(44),
            last_ball_unit: "U".repeat(44),
            witness_list_unit: "W".repeat(44),
            earned_headers_commission_recipients: None,
            headers_commission: Some(300),
            payload_commission: Some(200),
            unit: None,
        }
    }

    #[test]
    fn test_naked_unit_strips_derived_fields_and_payloads() {
        let mut unit = sample_unit();
        unit.unit = Some("X".into());
        let naked = naked_unit(&unit).unwrap();
        assert!(naked.get("unit").is_none());
        assert!(naked.get("headers_commission").is_none());
        assert!(naked.get("payload_commission").is_none());
        assert!(naked["messages"][0].get("payload").is_none());
        assert!(naked["messages"][0].get("payload_hash").is_some());
        assert!(naked["authors"][0].get("authentifiers").is_some());
    }

    #[test]
    fn test_hash_to_sign_ignores_authentifiers() {
        let unit = sample_unit();
        let mut signed = unit.clone();
        signed.authors[0].set_authentifier("r", "S".repeat(88));
        assert_eq!(hash_to_sign(&unit).unwrap(), hash_to_sign(&signed).unwrap());
        // The content hash commits to them.
        assert_ne!(content_hash(&unit).unwrap(), content_hash(&signed).unwrap());
    }

    #[test]
    fn test_hash_to_sign_ignores_commissions_but_not_payload_hash() {
        let unit = sample_unit();
        let mut changed = unit.clone();
        changed.headers_commission = Some(1);
        assert_eq!(hash_to_sign(&unit).unwrap(), hash_to_sign(&changed).unwrap());

        changed.messages[0].payload_hash = "Z".repeat(44);
        assert_ne!(hash_to_sign(&unit).unwrap(), hash_to_sign(&changed).unwrap());
    }

    #[test]
    fn test_unit_hash_is_idempotent() {
        let mut unit = sample_unit();
        let first = unit_hash(&unit).unwrap();
        unit.unit = Some(first.clone());
        assert_eq!(unit_hash(&unit).unwrap(), first);
        assert_eq!(first.len(), 44);
    }

    #[test]
    fn test_unit_hash_commits_to_parents() {
        let unit = sample_unit();
        let mut other = unit.clone();
        other.parent_units.push("Q".repeat(44));
        assert_ne!(unit_hash(&unit).unwrap(), unit_hash(&other).unwrap());
    }

    /// A fully specified unit whose hashes were computed independently
    /// with the ledger's reference hashing rules.
    fn reference_unit() -> Unit {
        let genesis = "oj8yEksX9Ubq7lLc+p6F2uyHUuynugeVq4+ikT67X6E=";
        let address = "DVXZGAFW2FODP7YUJZ4S7PX64XL4VWKE";
        let payment = json!({
            "inputs": [{"unit": genesis, "message_index": 0, "output_index": 1}],
            "outputs": [
                {"address": "BVVJ2K7ENPZZ3VYZFWQWK7ISPCATFIW3", "amount": 1234},
                {"address": address, "amount": 5000}
            ]
        });
        serde_json::from_value(json!({
            "version": "1.0",
            "alt": "1",
            "messages": [
                {
                    "app": "payment",
                    "payload_location": "inline",
                    "payload_hash": "KQAW/cgHmwI/ZpwC3eZx06FJN7l0Dsmul+lLagskUfE=",
                    "payload": payment
                },
                {
                    "app": "text",
                    "payload_location": "inline",
                    "payload_hash": "gC2EKFPWD6yh7/5opSCOoBU7p0dVrfIawrvx7G+m6PA=",
                    "payload": "hello"
                }
            ],
            "authors": [{
                "address": address,
                "authentifiers": {"r": format!("{}==", "A".repeat(86))},
                "definition": ["sig", {"pubkey": "Anm+Zn753LusVaBilc6HCwcCm/zbLc4o2VnygVsW+BeY"}]
            }],
            "parent_units": [genesis],
            "last_ball": format!("{}=", "B".repeat(43)),
            "last_ball_unit": format!("{}=", "L".repeat(43)),
            "witness_list_unit": genesis
        }))
        .unwrap()
    }

    #[test]
    fn test_reference_unit_hashes() {
        let unit = reference_unit();
        for message in &unit.messages {
            let payload = serde_json::to_value(&message.payload).unwrap();
            assert_eq!(payload_hash(&payload).unwrap(), message.payload_hash);
        }
        assert_eq!(
            hex::encode(hash_to_sign(&unit).unwrap()),
            "8fe721c466fd8353a12c50e5823e77e1c2b113c552eeefbcf561e4f157dfa424"
        );
        assert_eq!(
            content_hash(&unit).unwrap(),
            "3VOMD4/lsmNNCspM0gHrw+U3Nwil5UCHdhx4re9IunY="
        );
        assert_eq!(
            unit_hash(&unit).unwrap(),
            "kfRiy3mTqcQkIaMlixJfOyfjc84thALpc1vI3C3nIAk="
        );
    }

    #[test]
    fn test_reference_unit_commissions() {
        let unit = reference_unit();
        assert_eq!(headers_size(&unit).unwrap(), 391);
        assert_eq!(payload_size(&unit).unwrap(), 256);
    }

    #[test]
    fn test_payload_hash_rejects_null() {
        assert!(matches!(
            payload_hash(&json!({"a": null})),
            Err(UnitError::Canonical(_))
        ));
    }
}

//! # Unit Composition
//!
//! The network-free half of composing a unit. [`crate::client::Client`]
//! fetches coins, parents and definitions and hands them to the functions
//! here in this order:
//!
//! 1. [`PaymentRequest::parse`] / [`custom_message`]: validate the caller's
//!    payload before anything touches the network.
//! 2. [`payment_message`]: turn selected coins into a payment with a
//!    change output in front.
//! 3. [`draft`]: assemble authors, checkpoint and placeholder
//!    authentifiers.
//! 4. [`finalize`]: commissions, fee deduction, output ordering, signing
//!    and the unit id.
//!
//! `finalize` takes the draft by value and only returns a unit once every
//! step has succeeded, so a half-signed unit never escapes.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::address::is_valid_address;
use super::fees::{headers_size, payload_size};
use super::hash::{hash_to_sign, payload_hash, unit_hash};
use super::types::{
    checked_total, Author, Checkpoint, HeadersCommissionShare, Input, Message, MessagePayload,
    Output, PaymentPayload, Unit,
};
use super::UnitError;
use crate::config::{
    signature_placeholder, Network, DEFAULT_SIGNING_PATH, FEE_HEADROOM, PAYLOAD_LOCATION_INLINE,
    PAYMENT_APP, SIGNER_COMMISSION_SHARE,
};
use crate::crypto::{sign, PrivateKey};
use crate::error::InputError;

// ---------------------------------------------------------------------------
// Payload validation
// ---------------------------------------------------------------------------

/// What a caller asks for with the `payment` app.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentRequest {
    /// `None` pays in the base currency.
    #[serde(default)]
    pub asset: Option<String>,
    pub outputs: Vec<Output>,
}

impl PaymentRequest {
    /// Parse and validate a `payment` payload.
    pub fn parse(payload: &Value) -> Result<Self, InputError> {
        let request: Self = serde_json::from_value(payload.clone())
            .map_err(|e| InputError::InvalidPayment(e.to_string()))?;

        if request.outputs.is_empty() {
            return Err(InputError::InvalidPayment("no outputs".into()));
        }
        if let Some(asset) = &request.asset {
            if asset.is_empty() {
                return Err(InputError::InvalidPayment("empty asset id".into()));
            }
        }
        for output in &request.outputs {
            if !is_valid_address(&output.address) {
                return Err(InputError::InvalidAddress(output.address.clone()));
            }
            if output.amount == 0 {
                return Err(InputError::InvalidPayment(format!(
                    "zero amount to {}",
                    output.address
                )));
            }
        }
        // The base payment asks coin selection for the total plus headroom.
        checked_total(&request.outputs)
            .and_then(|total| total.checked_add(FEE_HEADROOM))
            .ok_or_else(|| InputError::InvalidPayment("amount overflow".into()))?;
        Ok(request)
    }

    /// Total amount requested across all outputs, `None` on overflow.
    pub fn amount(&self) -> Option<u64> {
        checked_total(&self.outputs)
    }
}

/// Build an inline message for any app other than `payment`.
pub fn custom_message(app: &str, payload: Value) -> Result<Message, UnitError> {
    let hash = payload_hash(&payload)?;
    Ok(Message {
        app: app.to_string(),
        payload_location: PAYLOAD_LOCATION_INLINE.to_string(),
        payload_hash: hash,
        payload: MessagePayload::Custom(payload),
    })
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

/// Build a payment from selected coins.
///
/// The change output goes first and receives `total_amount - requested`.
/// For the base currency this is where commissions are later deducted
/// from. A zero change on an asset payment is left out, since zero-amount
/// outputs are invalid.
pub fn payment_message(
    asset: Option<String>,
    change_address: &str,
    inputs: Vec<Input>,
    total_amount: u64,
    requested: Vec<Output>,
) -> Result<Message, UnitError> {
    let requested_total = checked_total(&requested).ok_or(UnitError::AmountOverflow)?;
    let change = total_amount
        .checked_sub(requested_total)
        .ok_or(UnitError::InsufficientInputs {
            total: total_amount,
            requested: requested_total,
        })?;

    let mut outputs = Vec::with_capacity(requested.len() + 1);
    if change > 0 || asset.is_none() {
        outputs.push(Output::new(change_address, change));
    }
    outputs.extend(requested);

    let payload = PaymentPayload {
        asset,
        inputs,
        outputs,
    };
    let hash = payload_hash(&serde_json::to_value(&payload)?)?;
    Ok(Message {
        app: PAYMENT_APP.to_string(),
        payload_location: PAYLOAD_LOCATION_INLINE.to_string(),
        payload_hash: hash,
        payload: MessagePayload::Payment(payload),
    })
}

// ---------------------------------------------------------------------------
// Draft
// ---------------------------------------------------------------------------

/// Assemble an unsigned unit with placeholder authentifiers.
///
/// `paying` is the first author and is signed under `path`. A `signer`
/// distinct from the payer makes the unit multi-authored: it becomes the
/// second author, signs under the default path and collects the whole
/// header commission.
pub fn draft(
    network: Network,
    messages: Vec<Message>,
    mut paying: Author,
    signer: Option<Author>,
    checkpoint: Checkpoint,
    path: &str,
) -> Unit {
    paying.set_authentifier(path, signature_placeholder());
    let mut authors = vec![paying];

    let mut recipients = None;
    if let Some(mut signer) = signer {
        signer.set_authentifier(DEFAULT_SIGNING_PATH, signature_placeholder());
        recipients = Some(vec![HeadersCommissionShare {
            address: signer.address.clone(),
            earned_headers_commission_share: SIGNER_COMMISSION_SHARE,
        }]);
        authors.push(signer);
    }

    Unit {
        version: network.version().to_string(),
        alt: network.alt().to_string(),
        messages,
        authors,
        parent_units: checkpoint.parent_units,
        last_ball: checkpoint.last_ball,
        last_ball_unit: checkpoint.last_ball_unit,
        witness_list_unit: checkpoint.witness_list_unit,
        earned_headers_commission_recipients: recipients,
        headers_commission: None,
        payload_commission: None,
        unit: None,
    }
}

// ---------------------------------------------------------------------------
// Finalization
// ---------------------------------------------------------------------------

/// Charge commissions, order outputs, sign and assign the unit id.
///
/// Commissions are deducted from the first output of the first message,
/// which [`payment_message`] made the base-currency change.
pub fn finalize(mut unit: Unit, key: &PrivateKey, path: &str) -> Result<Unit, UnitError> {
    let headers_commission = headers_size(&unit)?;
    let payload_commission = payload_size(&unit)?;
    unit.headers_commission = Some(headers_commission);
    unit.payload_commission = Some(payload_commission);
    let fees = headers_commission + payload_commission;
    debug!(headers_commission, payload_commission, "commissions computed");

    let change = unit
        .messages
        .first_mut()
        .and_then(Message::payment_mut)
        .and_then(|p| p.outputs.first_mut())
        .ok_or(UnitError::MissingChangeOutput)?;
    change.amount = change
        .amount
        .checked_sub(fees)
        .ok_or(UnitError::FeeExceedsChange {
            change: change.amount,
            fees,
        })?;

    for message in unit.messages.iter_mut() {
        let Some(payment) = message.payment_mut() else {
            continue;
        };
        payment.sort_outputs();
        message.payload_hash = payload_hash(&serde_json::to_value(&message.payload)?)?;
    }

    let digest = hash_to_sign(&unit)?;
    let signature = sign(&digest, key)?;
    if let Some(first) = unit.authors.first_mut() {
        first.set_authentifier(path, signature.clone());
    }
    if let Some(second) = unit.authors.get_mut(1) {
        second.set_authentifier(DEFAULT_SIGNING_PATH, signature);
    }

    let id = unit_hash(&unit)?;
    debug!(unit = %id, authors = unit.authors.len(), "unit signed");
    unit.unit = Some(id);
    Ok(unit)
}

//! # Light-Client API
//!
//! Typed wrappers around the hub commands the composer needs, plus a
//! generic [`NetworkApi::call`] over the full registry of light-client
//! methods. Method names are the camelCase names applications use; the
//! registry maps them to wire commands.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

use super::transport::{Transport, TransportError};
use crate::config::COIN_SELECTION_LAST_BALL_MCI;
use crate::error::{ClientError, InputError, Result};
use crate::unit::{Checkpoint, Definition, Input, Unit};

/// Light-client method name -> wire command.
pub const API_METHODS: &[(&str, &str)] = &[
    ("getWitnesses", "get_witnesses"),
    ("getPeers", "get_peers"),
    ("getJoint", "get_joint"),
    ("postJoint", "post_joint"),
    ("getLastMci", "get_last_mci"),
    ("getBots", "hub/get_bots"),
    ("getAssetMetadata", "hub/get_asset_metadata"),
    (
        "getParentsAndLastBallAndWitnessListUnit",
        "light/get_parents_and_last_ball_and_witness_list_unit",
    ),
    ("getDefinition", "light/get_definition"),
    ("getDefinitionForAddress", "light/get_definition_for_address"),
    (
        "pickDivisibleCoinsForAmount",
        "light/pick_divisible_coins_for_amount",
    ),
    ("getHistory", "light/get_history"),
    ("getLinkProofs", "light/get_link_proofs"),
    ("getAttestation", "light/get_attestation"),
    ("getAttestations", "light/get_attestations"),
    ("getBalances", "light/get_balances"),
    ("getProfileUnits", "light/get_profile_units"),
    ("getDataFeed", "light/get_data_feed"),
    ("dryRunAa", "light/dry_run_aa"),
    ("getAaStateVars", "light/get_aa_state_vars"),
    ("getAasByBaseAas", "light/get_aas_by_base_aas"),
    ("getAaResponses", "light/get_aa_responses"),
    ("getAaResponseChain", "light/get_aa_response_chain"),
    ("getAaBalances", "light/get_aa_balances"),
    ("executeGetter", "light/execute_getter"),
];

/// Wire command for a light-client method name.
pub fn wire_command(method: &str) -> Option<&'static str> {
    API_METHODS
        .iter()
        .find(|(name, _)| *name == method)
        .map(|(_, command)| *command)
}

// ---------------------------------------------------------------------------
// Request / response shapes
// ---------------------------------------------------------------------------

/// Response of `getParentsAndLastBallAndWitnessListUnit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightProps {
    pub parent_units: Vec<String>,
    pub last_stable_mc_ball: String,
    pub last_stable_mc_ball_unit: String,
    #[serde(default)]
    pub last_stable_mc_ball_mci: Option<u64>,
    pub witness_list_unit: String,
}

impl From<LightProps> for Checkpoint {
    fn from(props: LightProps) -> Self {
        Self {
            parent_units: props.parent_units,
            last_ball: props.last_stable_mc_ball,
            last_ball_unit: props.last_stable_mc_ball_unit,
            witness_list_unit: props.witness_list_unit,
        }
    }
}

/// Parameters of `pickDivisibleCoinsForAmount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoinRequest {
    pub addresses: Vec<String>,
    pub last_ball_mci: u64,
    pub amount: u64,
    pub spend_unconfirmed: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
}

impl CoinRequest {
    /// Coins from `address`, spending own unconfirmed outputs too.
    pub fn new(address: impl Into<String>, amount: u64, asset: Option<String>) -> Self {
        Self {
            addresses: vec![address.into()],
            last_ball_mci: COIN_SELECTION_LAST_BALL_MCI,
            amount,
            spend_unconfirmed: "own".to_string(),
            asset,
        }
    }
}

/// Coins chosen by the hub.
#[derive(Debug, Clone, PartialEq)]
pub struct CoinSelection {
    pub inputs: Vec<Input>,
    pub total_amount: u64,
}

#[derive(Deserialize)]
struct InputWithProof {
    input: Input,
}

#[derive(Default, Deserialize)]
struct CoinSelectionWire {
    #[serde(default)]
    inputs_with_proofs: Option<Vec<InputWithProof>>,
    #[serde(default)]
    total_amount: u64,
}

// ---------------------------------------------------------------------------
// NetworkApi
// ---------------------------------------------------------------------------

/// Typed access to a hub over any [`Transport`].
#[derive(Clone)]
pub struct NetworkApi {
    transport: Arc<dyn Transport>,
}

impl NetworkApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Call any registered method by its camelCase name.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let command =
            wire_command(method).ok_or_else(|| InputError::UnknownMethod(method.to_string()))?;
        Ok(self.transport.request(command, params).await?)
    }

    /// The hub's current witness list.
    pub async fn get_witnesses(&self) -> Result<Vec<String>> {
        let value = self.call("getWitnesses", None).await?;
        Ok(decode(value, "getWitnesses")?)
    }

    /// Parents, last stable ball and witness list unit for a new unit.
    pub async fn get_parents_and_last_ball_and_witness_list_unit(
        &self,
        witnesses: &[String],
    ) -> Result<LightProps> {
        let value = self
            .call(
                "getParentsAndLastBallAndWitnessListUnit",
                Some(json!({ "witnesses": witnesses })),
            )
            .await?;
        Ok(decode(value, "getParentsAndLastBallAndWitnessListUnit")?)
    }

    /// The definition the network holds for `address`.
    ///
    /// `None` means the network has not seen it yet and the unit has to
    /// carry it.
    pub async fn get_definition(&self, address: &str) -> Result<Option<Definition>> {
        let value = self.call("getDefinition", Some(json!(address))).await?;
        Ok(match value {
            Value::Null => None,
            other => Some(Definition(other)),
        })
    }

    /// Ask the hub to select coins covering `request.amount`.
    pub async fn pick_divisible_coins_for_amount(
        &self,
        request: &CoinRequest,
    ) -> Result<CoinSelection> {
        let params = serde_json::to_value(request)
            .map_err(|e| TransportError::Malformed(e.to_string()))?;
        let value = self.call("pickDivisibleCoinsForAmount", Some(params)).await?;
        let wire: CoinSelectionWire = match value {
            Value::Null => CoinSelectionWire::default(),
            other => decode(other, "pickDivisibleCoinsForAmount")?,
        };

        let inputs: Vec<Input> = wire
            .inputs_with_proofs
            .unwrap_or_default()
            .into_iter()
            .map(|p| p.input)
            .collect();
        if inputs.is_empty() {
            return Err(InputError::InsufficientFunds {
                address: request.addresses.join(","),
                asset: request.asset.clone(),
            }
            .into());
        }
        debug!(
            inputs = inputs.len(),
            total_amount = wire.total_amount,
            asset = request.asset.as_deref().unwrap_or("base"),
            "coins selected"
        );
        Ok(CoinSelection {
            inputs,
            total_amount: wire.total_amount,
        })
    }

    /// Submit a signed unit. A refusal by the hub comes back as
    /// [`ClientError::Rejected`] carrying the unit.
    pub async fn post_joint(&self, unit: &Unit) -> Result<()> {
        let joint = serde_json::to_value(unit)
            .map_err(|e| TransportError::Malformed(e.to_string()))?;
        match self.call("postJoint", Some(json!({ "unit": joint }))).await {
            Ok(_) => {
                info!(unit = unit.unit.as_deref().unwrap_or_default(), "unit accepted");
                Ok(())
            }
            Err(ClientError::Transport(TransportError::Remote(reason))) => {
                Err(ClientError::Rejected {
                    unit: Box::new(unit.clone()),
                    reason,
                })
            }
            Err(e) => Err(e),
        }
    }
}

fn decode<T: for<'de> Deserialize<'de>>(value: Value, method: &str) -> Result<T, TransportError> {
    serde_json::from_value(value)
        .map_err(|e| TransportError::Malformed(format!("{} response: {}", method, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        assert_eq!(wire_command("getWitnesses"), Some("get_witnesses"));
        assert_eq!(wire_command("getDefinition"), Some("light/get_definition"));
        assert_eq!(wire_command("getBots"), Some("hub/get_bots"));
        assert_eq!(wire_command("get_witnesses"), None);
    }

    #[test]
    fn test_registry_names_are_unique() {
        let mut names: Vec<&str> = API_METHODS.iter().map(|(n, _)| *n).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), API_METHODS.len());
    }

    #[test]
    fn test_coin_request_shape() {
        let value = serde_json::to_value(CoinRequest::new("ADDR", 2_000, None)).unwrap();
        assert_eq!(
            value,
            json!({
                "addresses": ["ADDR"],
                "last_ball_mci": 1_000_000_000u64,
                "amount": 2_000,
                "spend_unconfirmed": "own"
            })
        );
    }

    #[test]
    fn test_light_props_to_checkpoint() {
        let props: LightProps = serde_json::from_value(json!({
            "parent_units": ["P1", "P2"],
            "last_stable_mc_ball": "BALL",
            "last_stable_mc_ball_unit": "BALLUNIT",
            "last_stable_mc_ball_mci": 100,
            "witness_list_unit": "WLU"
        }))
        .unwrap();
        let checkpoint = Checkpoint::from(props);
        assert_eq!(checkpoint.last_ball, "BALL");
        assert_eq!(checkpoint.last_ball_unit, "BALLUNIT");
        assert_eq!(checkpoint.parent_units.len(), 2);
    }

    #[test]
    fn test_light_props_requires_witness_list_unit() {
        let result: std::result::Result<LightProps, _> = serde_json::from_value(json!({
            "parent_units": ["P1"],
            "last_stable_mc_ball": "BALL",
            "last_stable_mc_ball_unit": "BALLUNIT"
        }));
        assert!(result.is_err());
    }
}

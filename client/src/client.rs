//! # Client
//!
//! The public entry point: compose, sign and post units over a hub
//! connection.
//!
//! A compose call runs in three phases:
//!
//! 1. **Local checks.** Resolve the key, validate the app name and
//!    payload, derive addresses. Nothing has touched the network yet, so a
//!    bad key or payload costs nothing.
//! 2. **Lookups.** Coin selection, definitions and the checkpoint, all
//!    concurrently. The checkpoint needs the witness list, which is cached
//!    per client.
//! 3. **Finalize.** Commissions, fee deduction, output ordering, signing
//!    and the unit id, all synchronous.
//!
//! Compose calls are independent and can run concurrently on one client;
//! the witness cache is the only state they share.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, OnceCell};
use tracing::{debug, info};

use crate::apps::{self, App};
use crate::config::{Network, DEFAULT_SIGNING_PATH, FEE_HEADROOM, PAYMENT_APP, REQUEST_TIMEOUT};
use crate::crypto::PrivateKey;
use crate::error::{ClientError, InputError, Result};
use crate::network::{CoinRequest, NetworkApi, Notification, Transport, WsTransport};
use crate::unit::address::{derive, is_valid_address};
use crate::unit::composer::{custom_message, draft, finalize, payment_message, PaymentRequest};
use crate::unit::types::checked_total;
use crate::unit::{Author, Definition, Message, Output, Unit, UnitError};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Settings fixed for the lifetime of a client.
#[derive(Clone)]
pub struct ClientOptions {
    pub network: Network,
    /// Key used when a compose call does not bring its own.
    pub wif: Option<String>,
    /// Hub URL; the network's default hub when `None`.
    pub node: Option<String>,
    pub request_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            wif: None,
            node: None,
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}

impl ClientOptions {
    pub fn testnet() -> Self {
        Self {
            network: Network::Testnet,
            ..Self::default()
        }
    }

    pub fn with_wif(mut self, wif: impl Into<String>) -> Self {
        self.wif = Some(wif.into());
        self
    }

    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }

    /// The hub URL this client connects to.
    pub fn node_url(&self) -> &str {
        self.node
            .as_deref()
            .unwrap_or_else(|| self.network.default_node())
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("network", &self.network)
            .field("wif", &self.wif.as_ref().map(|_| "<redacted>"))
            .field("node", &self.node)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Per-call overrides for [`Client::compose`].
#[derive(Clone, Default)]
pub struct ComposeOptions {
    /// Signing key for this call only.
    pub wif: Option<String>,
    /// Paying address when it differs from the signer's.
    pub address: Option<String>,
    /// Definition of the paying address; its address is derived when
    /// `address` is not given.
    pub definition: Option<Definition>,
    /// Path the signature is stored under for the first author.
    pub path: Option<String>,
}

impl ComposeOptions {
    pub fn with_wif(mut self, wif: impl Into<String>) -> Self {
        self.wif = Some(wif.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_definition(mut self, definition: Definition) -> Self {
        self.definition = Some(definition);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl fmt::Debug for ComposeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposeOptions")
            .field("wif", &self.wif.as_ref().map(|_| "<redacted>"))
            .field("address", &self.address)
            .field("definition", &self.definition)
            .field("path", &self.path)
            .finish()
    }
}

/// What the caller's payload turns into.
enum Body {
    /// Base-currency payment: outputs ride on the base payment message.
    Bytes(Vec<Output>),
    /// Asset payment: a second payment message funded by the payer.
    Asset { asset: String, outputs: Vec<Output> },
    /// Any other app.
    Custom(Message),
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// A light client bound to one hub.
pub struct Client {
    api: NetworkApi,
    options: ClientOptions,
    witnesses: OnceCell<Vec<String>>,
}

impl Client {
    /// Connect to the configured hub over WebSocket.
    ///
    /// The connection is established in the background; must be called
    /// from within a Tokio runtime.
    pub fn connect(options: ClientOptions) -> Self {
        let transport = WsTransport::with_timeout(options.node_url(), options.request_timeout);
        info!(node = %transport.url(), network = %options.network, "client created");
        Self::with_transport(Arc::new(transport), options)
    }

    /// Build a client over any transport.
    pub fn with_transport(transport: Arc<dyn Transport>, options: ClientOptions) -> Self {
        Self {
            api: NetworkApi::new(transport),
            options,
            witnesses: OnceCell::new(),
        }
    }

    pub fn network(&self) -> Network {
        self.options.network
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Typed and generic light-client calls.
    pub fn api(&self) -> &NetworkApi {
        &self.api
    }

    /// The witness list, fetched on first use and kept for the client's
    /// lifetime. A failed fetch leaves the cache empty for the next caller.
    pub async fn cached_witnesses(&self) -> Result<&[String]> {
        let witnesses = self
            .witnesses
            .get_or_try_init(|| async {
                let witnesses = self.api.get_witnesses().await?;
                debug!(count = witnesses.len(), "witness list cached");
                Ok::<_, ClientError>(witnesses)
            })
            .await?;
        Ok(witnesses.as_slice())
    }

    /// Compose and sign a unit carrying one `app` message.
    ///
    /// For `app == "payment"` the payload is `{asset?, outputs}`; any other
    /// app's payload is embedded verbatim. Every unit also carries a base
    /// payment that funds its commissions.
    pub async fn compose(&self, app: &str, payload: Value, options: &ComposeOptions) -> Result<Unit> {
        // Phase 1: local checks.
        let key = self.resolve_key(options)?;
        if app.is_empty() {
            return Err(InputError::EmptyApp.into());
        }
        let path = options.path.as_deref().unwrap_or(DEFAULT_SIGNING_PATH);

        let body = if app == PAYMENT_APP {
            let request = PaymentRequest::parse(&payload)?;
            match request.asset {
                Some(asset) => Body::Asset {
                    asset,
                    outputs: request.outputs,
                },
                None => Body::Bytes(request.outputs),
            }
        } else {
            Body::Custom(custom_message(app, payload).map_err(payload_error)?)
        };

        let signer_definition = Definition::sig(&key.public_key());
        let signer_address = derive(&signer_definition).map_err(InputError::InvalidPayload)?;
        let paying_address = match (&options.address, &options.definition) {
            (Some(address), _) => {
                if !is_valid_address(address) {
                    return Err(InputError::InvalidAddress(address.clone()).into());
                }
                address.clone()
            }
            (None, Some(definition)) => derive(definition).map_err(InputError::InvalidPayload)?,
            (None, None) => signer_address.clone(),
        };
        let multi_authored = paying_address != signer_address;
        let funding_address = if multi_authored {
            &signer_address
        } else {
            &paying_address
        };
        debug!(
            app,
            paying = %paying_address,
            signer = %signer_address,
            multi_authored,
            "composing unit"
        );

        // Phase 2: lookups. Coin selection, the checkpoint and the definition
        // lookups are independent of each other and run concurrently.
        let (bytes_outputs, asset_part, custom) = match body {
            Body::Bytes(outputs) => (outputs, None, None),
            Body::Asset { asset, outputs } => (Vec::new(), Some((asset, outputs)), None),
            Body::Custom(message) => (Vec::new(), None, Some(message)),
        };

        let bytes_amount = checked_total(&bytes_outputs)
            .and_then(|requested| requested.checked_add(FEE_HEADROOM))
            .ok_or_else(|| InputError::InvalidPayment("amount overflow".into()))?;
        let bytes_request = CoinRequest::new(funding_address.as_str(), bytes_amount, None);
        let asset_request = match &asset_part {
            Some((asset, outputs)) => {
                let amount = checked_total(outputs)
                    .ok_or_else(|| InputError::InvalidPayment("amount overflow".into()))?;
                Some(CoinRequest::new(
                    paying_address.as_str(),
                    amount,
                    Some(asset.clone()),
                ))
            }
            None => None,
        };

        let (bytes_coins, asset_coins, checkpoint, paying_known, signer_known) = tokio::try_join!(
            self.api.pick_divisible_coins_for_amount(&bytes_request),
            async {
                match &asset_request {
                    Some(request) => self.api.pick_divisible_coins_for_amount(request).await.map(Some),
                    None => Ok(None),
                }
            },
            async {
                let witnesses = self.cached_witnesses().await?;
                self.api
                    .get_parents_and_last_ball_and_witness_list_unit(witnesses)
                    .await
            },
            self.api.get_definition(&paying_address),
            async {
                if multi_authored {
                    self.api.get_definition(&signer_address).await.map(Some)
                } else {
                    Ok(None)
                }
            },
        )?;

        let mut messages = vec![payment_message(
            None,
            funding_address,
            bytes_coins.inputs,
            bytes_coins.total_amount,
            bytes_outputs,
        )?];
        if let (Some((asset, outputs)), Some(coins)) = (asset_part, asset_coins) {
            messages.push(payment_message(
                Some(asset),
                &paying_address,
                coins.inputs,
                coins.total_amount,
                outputs,
            )?);
        }
        messages.extend(custom);

        // Phase 3: finalize.
        let (paying, signer) = if multi_authored {
            let paying_definition = match (paying_known, &options.definition) {
                (Some(_), _) => None,
                (None, Some(definition)) => Some(definition.clone()),
                // The first authoring of an address must carry its definition.
                (None, None) => {
                    return Err(InputError::UnknownDefinition(paying_address.clone()).into());
                }
            };
            let signer_definition = match signer_known.flatten() {
                Some(_) => None,
                None => Some(signer_definition),
            };
            (
                Author::new(&paying_address, paying_definition),
                Some(Author::new(&signer_address, signer_definition)),
            )
        } else {
            let definition = paying_known.is_none().then_some(signer_definition);
            (Author::new(&paying_address, definition), None)
        };

        let unit = draft(self.options.network, messages, paying, signer, checkpoint.into(), path);
        let unit = finalize(unit, &key, path)?;
        info!(
            unit = unit.unit.as_deref().unwrap_or_default(),
            app,
            commission = unit.total_commission(),
            "unit composed"
        );
        Ok(unit)
    }

    /// Compose a unit and submit it. Returns the unit id.
    pub async fn post(&self, app: &str, payload: Value, options: &ComposeOptions) -> Result<String> {
        let unit = self.compose(app, payload, options).await?;
        self.broadcast(unit).await
    }

    /// Submit an already signed unit. Returns its id.
    pub async fn broadcast(&self, unit: Unit) -> Result<String> {
        let id = unit.unit.clone().ok_or(UnitError::Unsigned)?;
        self.api.post_joint(&unit).await?;
        Ok(id)
    }

    /// A handle with compose/post bound to a registered application.
    pub fn app(&self, name: &str) -> Result<App<'_>> {
        let name = apps::lookup(name).ok_or_else(|| InputError::UnknownApp(name.to_string()))?;
        Ok(App::new(self, name))
    }

    /// Receive hub notifications pushed from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.api.transport().subscribe()
    }

    /// Send a fire-and-forget message to the hub.
    pub async fn justsaying(&self, subject: &str, body: Option<Value>) -> Result<()> {
        Ok(self.api.transport().justsaying(subject, body).await?)
    }

    /// Close the underlying transport.
    pub async fn close(&self) {
        self.api.transport().close().await;
    }

    fn resolve_key(&self, options: &ComposeOptions) -> Result<PrivateKey> {
        let wif = options
            .wif
            .as_deref()
            .or(self.options.wif.as_deref())
            .ok_or(InputError::MissingKey)?;
        Ok(PrivateKey::from_wif(wif, self.options.network)?)
    }
}

/// A payload that cannot be encoded is the caller's mistake.
fn payload_error(error: UnitError) -> ClientError {
    match error {
        UnitError::Canonical(e) => InputError::InvalidPayload(e).into(),
        other => other.into(),
    }
}

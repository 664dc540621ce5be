// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Obyte Client: Unit Composer & Signer
//!
//! Builds fully valid, signed units for the Obyte DAG ledger on the client
//! side, then submits them to a hub. Validators recompute every hash and
//! commission from the unit they receive, so everything here reproduces
//! the network's rules byte for byte.
//!
//! ## Architecture
//!
//! - **crypto**: SHA-256, RIPEMD-160, chash160 addresses, secp256k1 keys
//!   and signatures.
//! - **unit**: canonical encoding, unit types, commissions, the hash chain
//!   and the composer.
//! - **network**: the transport contract, a reconnecting WebSocket
//!   transport and typed light-client calls.
//! - **apps**: the registry of application tags.
//! - **client**: [`Client`], the public compose/post surface.
//! - **config**: protocol constants and network parameters.
//! - **error**: [`ClientError`] and [`InputError`].
//!
//! ## Example
//!
//! ```no_run
//! use obyte_client::{Client, ClientOptions, ComposeOptions};
//! use serde_json::json;
//!
//! # async fn run() -> obyte_client::error::Result<()> {
//! let client = Client::connect(ClientOptions::testnet().with_wif("92..."));
//! let unit_id = client
//!     .post(
//!         "payment",
//!         json!({"outputs": [{"address": "2QVJOY3BRRGWP7IOYL64O5BU3WLUJ4TZ", "amount": 1000}]}),
//!         &ComposeOptions::default(),
//!     )
//!     .await?;
//! println!("posted {}", unit_id);
//! client.close().await;
//! # Ok(())
//! # }
//! ```

pub mod apps;
pub mod client;
pub mod config;
pub mod crypto;
pub mod error;
pub mod network;
pub mod unit;

pub use apps::App;
pub use client::{Client, ClientOptions, ComposeOptions};
pub use config::Network;
pub use error::{ClientError, InputError};
pub use unit::Unit;

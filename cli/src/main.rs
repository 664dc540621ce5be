// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Obyte CLI
//!
//! Entry point for the `obyte-cli` binary. Parses arguments, initializes
//! logging, and runs one command against a hub:
//!
//! - `keygen`    generate a key (offline)
//! - `address`   show the address of a key (offline)
//! - `compose`   build and sign a unit, print it
//! - `post`      build, sign and submit a unit
//! - `witnesses` print the hub's witness list
//! - `call`      call any light-client API method

mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{json, Value};
use std::time::Duration;

use obyte_client::config::Network;
use obyte_client::crypto::PrivateKey;
use obyte_client::unit::address::derive;
use obyte_client::unit::Definition;
use obyte_client::{Client, ClientOptions, ComposeOptions};

use cli::{CallArgs, Commands, ComposeArgs, GlobalArgs, ObyteCli};

/// Log filter when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "obyte_cli=info,obyte_client=info";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = ObyteCli::parse();
    logging::init_logging(DEFAULT_LOG_FILTER, cli.global.log_format);
    let network = Network::from_testnet_flag(cli.global.testnet);

    match cli.command {
        Commands::Keygen => keygen(network),
        Commands::Address => show_address(&cli.global, network),
        Commands::Compose(args) => compose(&cli.global, network, args).await,
        Commands::Post(args) => post(&cli.global, network, args).await,
        Commands::Witnesses => witnesses(&cli.global, network).await,
        Commands::Call(args) => call(&cli.global, network, args).await,
    }
}

fn keygen(network: Network) -> Result<()> {
    let key = PrivateKey::generate();
    let definition = Definition::sig(&key.public_key());
    let address = derive(&definition).context("failed to derive address")?;
    print_json(&json!({
        "network": network,
        "wif": key.to_wif(network),
        "pubkey": key.public_key(),
        "address": address,
    }))
}

fn show_address(global: &GlobalArgs, network: Network) -> Result<()> {
    let key = load_key(global, network)?;
    let definition = Definition::sig(&key.public_key());
    let address = derive(&definition).context("failed to derive address")?;
    print_json(&json!({
        "network": network,
        "pubkey": key.public_key(),
        "definition": definition,
        "address": address,
    }))
}

async fn compose(global: &GlobalArgs, network: Network, args: ComposeArgs) -> Result<()> {
    let client = connect(global, network);
    let (payload, options) = compose_request(&args)?;
    let result = client.compose(&args.app, payload, &options).await;
    client.close().await;

    let unit = result.context("composition failed")?;
    print_json(&serde_json::to_value(&unit)?)
}

async fn post(global: &GlobalArgs, network: Network, args: ComposeArgs) -> Result<()> {
    let client = connect(global, network);
    let (payload, options) = compose_request(&args)?;
    let result = client.post(&args.app, payload, &options).await;
    client.close().await;

    let unit_id = result.context("posting failed")?;
    tracing::info!(unit = %unit_id, app = %args.app, "unit posted");
    println!("{}", unit_id);
    Ok(())
}

async fn witnesses(global: &GlobalArgs, network: Network) -> Result<()> {
    let client = connect(global, network);
    let result = client.cached_witnesses().await.map(|w| w.to_vec());
    client.close().await;

    print_json(&json!(result.context("failed to fetch witnesses")?))
}

async fn call(global: &GlobalArgs, network: Network, args: CallArgs) -> Result<()> {
    let params = args
        .params
        .as_deref()
        .map(serde_json::from_str::<Value>)
        .transpose()
        .context("params are not valid JSON")?;

    let client = connect(global, network);
    let result = client.api().call(&args.method, params).await;
    client.close().await;

    print_json(&result.with_context(|| format!("{} failed", args.method))?)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn connect(global: &GlobalArgs, network: Network) -> Client {
    let options = ClientOptions {
        network,
        wif: global.wif.clone(),
        node: global.node.clone(),
        request_timeout: Duration::from_secs(global.timeout),
    };
    tracing::debug!(node = options.node_url(), %network, "connecting");
    Client::connect(options)
}

fn load_key(global: &GlobalArgs, network: Network) -> Result<PrivateKey> {
    let wif = global
        .wif
        .as_deref()
        .context("a key is required: pass --wif or set OBYTE_WIF")?;
    PrivateKey::from_wif(wif, network).context("invalid WIF")
}

fn compose_request(args: &ComposeArgs) -> Result<(Value, ComposeOptions)> {
    let payload: Value =
        serde_json::from_str(&args.payload).context("payload is not valid JSON")?;

    let mut options = ComposeOptions::default();
    if let Some(address) = &args.address {
        options = options.with_address(address);
    }
    if let Some(definition) = &args.definition {
        let definition: Value =
            serde_json::from_str(definition).context("definition is not valid JSON")?;
        options = options.with_definition(Definition(definition));
    }
    if let Some(path) = &args.path {
        options = options.with_path(path);
    }
    Ok((payload, options))
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

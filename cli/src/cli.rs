//! # CLI Interface
//!
//! Argument structure for `obyte-cli`, via `clap` derive. Connection and
//! key settings are global flags that can also come from the environment.

use clap::{Args, Parser, Subcommand};

use crate::logging::LogFormat;

/// Compose, sign and post Obyte units from the command line.
#[derive(Parser, Debug)]
#[command(
    name = "obyte-cli",
    about = "Obyte light client: compose, sign and post units",
    version,
    propagate_version = true
)]
pub struct ObyteCli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Settings shared by every subcommand.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Hub WebSocket URL. Defaults to the public hub of the selected network.
    #[arg(long, global = true, env = "OBYTE_NODE")]
    pub node: Option<String>,

    /// Use testnet (version/alt tags, WIF prefix, default hub).
    #[arg(long, global = true, env = "OBYTE_TESTNET")]
    pub testnet: bool,

    /// Private key in Wallet Import Format.
    ///
    /// Prefer the environment variable over the flag; flags end up in
    /// shell history.
    #[arg(long, global = true, env = "OBYTE_WIF", hide_env_values = true)]
    pub wif: Option<String>,

    /// Log output format.
    #[arg(
        long,
        global = true,
        env = "OBYTE_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Pretty
    )]
    pub log_format: LogFormat,

    /// Per-request timeout in seconds.
    #[arg(long, global = true, default_value_t = 30)]
    pub timeout: u64,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a fresh key and print its WIF, public key and address.
    Keygen,
    /// Print the public key, definition and address of `--wif`.
    Address,
    /// Compose and sign a unit without posting it; prints the unit JSON.
    Compose(ComposeArgs),
    /// Compose, sign and post a unit; prints the unit id.
    Post(ComposeArgs),
    /// Print the hub's witness list.
    Witnesses,
    /// Call any light-client API method by name, e.g. `getBalances`.
    Call(CallArgs),
}

/// Arguments for `compose` and `post`.
#[derive(Args, Debug)]
pub struct ComposeArgs {
    /// Application tag, e.g. "payment", "data", "text".
    pub app: String,

    /// Message payload as JSON. For "payment":
    /// '{"outputs":[{"address":"...","amount":1000}]}'.
    pub payload: String,

    /// Paying address, when it differs from the signing key's address.
    #[arg(long)]
    pub address: Option<String>,

    /// Definition (JSON) of the paying address.
    #[arg(long)]
    pub definition: Option<String>,

    /// Signing path within the paying address's definition.
    #[arg(long)]
    pub path: Option<String>,
}

/// Arguments for `call`.
#[derive(Args, Debug)]
pub struct CallArgs {
    /// API method name, e.g. "getBalances".
    pub method: String,

    /// Parameters as JSON.
    pub params: Option<String>,
}

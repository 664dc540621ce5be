//! Application registry.
//!
//! Every message carries an `app` tag naming how validators interpret its
//! payload. [`APPS`] lists the ones a light client can author;
//! [`crate::Client::app`] hands out an [`App`] with compose/post bound to
//! one of them.

use serde_json::Value;

use crate::client::{Client, ComposeOptions};
use crate::error::Result;
use crate::unit::Unit;

/// Application tags a light client can compose messages for.
pub const APPS: &[&str] = &[
    "address_definition_change",
    "asset",
    "asset_attestors",
    "attestation",
    "data",
    "data_feed",
    "definition",
    "definition_template",
    "payment",
    "poll",
    "profile",
    "text",
    "vote",
];

/// The registered tag equal to `name`, if any.
pub fn lookup(name: &str) -> Option<&'static str> {
    APPS.iter().copied().find(|app| *app == name)
}

/// Compose/post bound to one application.
///
/// ```no_run
/// # async fn run(client: &obyte_client::Client) -> obyte_client::error::Result<()> {
/// use obyte_client::ComposeOptions;
/// use serde_json::json;
///
/// let unit_id = client
///     .app("data")?
///     .post(json!({"temperature": 21}), &ComposeOptions::default())
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Copy)]
pub struct App<'a> {
    client: &'a Client,
    name: &'static str,
}

impl<'a> App<'a> {
    pub(crate) fn new(client: &'a Client, name: &'static str) -> Self {
        Self { client, name }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn compose(&self, payload: Value, options: &ComposeOptions) -> Result<Unit> {
        self.client.compose(self.name, payload, options).await
    }

    /// Compose and submit; returns the unit id.
    pub async fn post(&self, payload: Value, options: &ComposeOptions) -> Result<String> {
        self.client.post(self.name, payload, options).await
    }
}

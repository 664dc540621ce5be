//! # Transport Contract
//!
//! The composer and the API layer only ever talk to the hub through
//! [`Transport`]. [`super::ws::WsTransport`] is the real implementation;
//! tests plug in an in-memory one.
//!
//! ## Wire envelopes
//!
//! Every frame is a two-element JSON array `[kind, body]`:
//!
//! ```text
//! ["request",    {"command": "...", "params": ..., "tag": "..."}]
//! ["response",   {"tag": "...", "response": ...}]
//! ["justsaying", {"subject": "...", "body": ...}]
//! ```
//!
//! A response whose body is an object with an `error` field is a failure
//! reported by the hub.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;

/// Errors raised by a transport. Surfaced to callers verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("failed to connect: {0}")]
    Connect(String),

    #[error("connection lost before a response arrived")]
    ConnectionLost,

    #[error("transport is closed")]
    Closed,

    #[error("request {command} timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("hub returned an error: {0}")]
    Remote(String),

    #[error("malformed message: {0}")]
    Malformed(String),
}

/// Unsolicited traffic pushed by the hub.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// A fire-and-forget message.
    Justsaying { subject: String, body: Option<Value> },
    /// A request the hub sent us (other than heartbeats, which the
    /// transport answers itself).
    Request { command: String, params: Option<Value> },
}

/// A request/response channel to a hub.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and wait for its response.
    async fn request(&self, command: &str, params: Option<Value>) -> Result<Value, TransportError>;

    /// Send a message that expects no response.
    async fn justsaying(&self, subject: &str, body: Option<Value>) -> Result<(), TransportError>;

    /// Receive every notification pushed after this call.
    fn subscribe(&self) -> broadcast::Receiver<Notification>;

    /// Shut the transport down. Idempotent; pending requests fail with
    /// [`TransportError::Closed`].
    async fn close(&self);
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseBody {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JustsayingBody {
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// One decoded frame.
#[derive(Debug, Clone, PartialEq)]
pub enum WireMessage {
    Request(RequestBody),
    Response(ResponseBody),
    Justsaying(JustsayingBody),
}

impl WireMessage {
    pub fn encode(&self) -> Result<String, TransportError> {
        let (kind, body) = match self {
            Self::Request(b) => ("request", serde_json::to_value(b)),
            Self::Response(b) => ("response", serde_json::to_value(b)),
            Self::Justsaying(b) => ("justsaying", serde_json::to_value(b)),
        };
        let body = body.map_err(|e| TransportError::Malformed(e.to_string()))?;
        Ok(json!([kind, body]).to_string())
    }

    pub fn decode(text: &str) -> Result<Self, TransportError> {
        let malformed = |e: serde_json::Error| TransportError::Malformed(e.to_string());
        let (kind, body): (String, Value) = serde_json::from_str(text).map_err(malformed)?;
        match kind.as_str() {
            "request" => Ok(Self::Request(serde_json::from_value(body).map_err(malformed)?)),
            "response" => Ok(Self::Response(serde_json::from_value(body).map_err(malformed)?)),
            "justsaying" => Ok(Self::Justsaying(
                serde_json::from_value(body).map_err(malformed)?,
            )),
            other => Err(TransportError::Malformed(format!(
                "unknown message kind {:?}",
                other
            ))),
        }
    }
}

/// Splits a response payload into success or hub-reported error.
pub fn response_result(response: Option<Value>) -> Result<Value, TransportError> {
    match response {
        Some(Value::Object(map)) if map.contains_key("error") => {
            let error = match &map["error"] {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Err(TransportError::Remote(error))
        }
        Some(value) => Ok(value),
        None => Ok(Value::Null),
    }
}

//! # Canonical Encoding
//!
//! Two structural functions over JSON values that every hash and every
//! commission on the ledger is defined in terms of.
//!
//! ## Source string
//!
//! A depth-first walk that emits type-tagged tokens joined by `\0`:
//!
//! ```text
//! "abc"          -> s \0 abc
//! 42             -> n \0 42
//! true           -> b \0 true
//! [x, y]         -> [ \0 <x> \0 <y> \0 ]
//! {"b":x,"a":y}  -> a \0 <y> \0 b \0 <x>        (keys sorted)
//! ```
//!
//! `null`, empty arrays and empty objects have no encoding and are
//! rejected. Nothing the composer builds ever contains them, so hitting
//! one means the caller handed us a payload the network would refuse.
//!
//! ## Length
//!
//! The "size" a validator charges for: strings count UTF-16 code units,
//! numbers 8, booleans 1, null 0. Containers are the sum of their
//! elements; object keys are free.

use serde_json::{Number, Value};
use thiserror::Error;

const SEPARATOR: &str = "\0";

/// Charged size of any number.
const NUMBER_LENGTH: u64 = 8;

/// Charged size of a boolean.
const BOOLEAN_LENGTH: u64 = 1;

/// Values that have no canonical encoding.
///
/// Non-finite numbers need no variant: `serde_json::Number` cannot hold them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CanonicalError {
    #[error("null value at {0}")]
    Null(String),

    #[error("empty array at {0}")]
    EmptyArray(String),

    #[error("empty object at {0}")]
    EmptyObject(String),
}

/// Canonical source string of a JSON value.
pub fn source_string(value: &Value) -> Result<String, CanonicalError> {
    let mut tokens = Vec::new();
    collect_tokens(value, "$", &mut tokens)?;
    Ok(tokens.join(SEPARATOR))
}

/// Charged length of a JSON value.
pub fn length(value: &Value) -> u64 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => BOOLEAN_LENGTH,
        Value::Number(_) => NUMBER_LENGTH,
        Value::String(s) => s.encode_utf16().count() as u64,
        Value::Array(items) => items.iter().map(length).sum(),
        Value::Object(map) => map.values().map(length).sum(),
    }
}

fn collect_tokens(value: &Value, path: &str, tokens: &mut Vec<String>) -> Result<(), CanonicalError> {
    match value {
        Value::Null => return Err(CanonicalError::Null(path.to_string())),
        Value::String(s) => {
            tokens.push("s".into());
            tokens.push(s.clone());
        }
        Value::Number(n) => {
            tokens.push("n".into());
            tokens.push(render_number(n));
        }
        Value::Bool(b) => {
            tokens.push("b".into());
            tokens.push(b.to_string());
        }
        Value::Array(items) => {
            if items.is_empty() {
                return Err(CanonicalError::EmptyArray(path.to_string()));
            }
            tokens.push("[".into());
            for (i, item) in items.iter().enumerate() {
                collect_tokens(item, &format!("{}[{}]", path, i), tokens)?;
            }
            tokens.push("]".into());
        }
        Value::Object(map) => {
            if map.is_empty() {
                return Err(CanonicalError::EmptyObject(path.to_string()));
            }
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                tokens.push(key.clone());
                collect_tokens(&map[key], &format!("{}.{}", path, key), tokens)?;
            }
        }
    }
    Ok(())
}

/// Decimal rendering of a number. Integral floats print without a
/// fractional part, so `1.0` and `1` hash the same.
fn render_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Text rendered for a JSON `null` (or absent) `data` field.
pub const NULL_PAYLOAD: &str = "null";

/// `{ "success": bool, "data": any }` as returned by every endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default)]
    pub data: Payload,
}

impl Envelope {
    /// Decodes a response body.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the body is not an envelope.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// The order id carried by a successful purchase, if any.
    #[must_use]
    pub fn order_id(&self) -> Option<u64> {
        if !self.success {
            return None;
        }
        self.data.as_positive_integer()
    }
}

/// The `data` field flattened to text.
///
/// Strings are kept verbatim; numbers, booleans, arrays and objects are
/// re-encoded as JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Payload {
    #[default]
    Null,
    Text(String),
}

impl Payload {
    #[must_use]
    pub fn as_text(&self) -> &str {
        match self {
            Payload::Null => NULL_PAYLOAD,
            Payload::Text(text) => text,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Payload::Null)
    }

    #[must_use]
    pub fn as_positive_integer(&self) -> Option<u64> {
        match self {
            Payload::Null => None,
            Payload::Text(text) => text.trim().parse::<u64>().ok().filter(|id| *id > 0),
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_text())
    }
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Null => Payload::Null,
            Value::String(text) => Payload::Text(text),
            other @ (Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_)) => {
                Payload::Text(other.to_string())
            }
        })
    }
}

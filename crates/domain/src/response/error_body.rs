//! Server error envelope.
//!
//! The backend answers failures in a few shapes: `{ "detail": ... }` from the
//! framework, `{ "success": false, "message": ..., "error_code": ... }` from the
//! enhanced handler, `{ "error": ... }` from function views, and
//! `{ "<field>": ["..."] }` for validation errors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keys of the envelope that never carry field errors.
const ENVELOPE_KEYS: &[&str] = &[
    "detail",
    "message",
    "error_code",
    "code",
    "success",
    "path",
    "method",
    "details",
    "errors",
    "error",
];

/// Normalised view of a failure response body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Framework `detail` message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Handler `message`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Machine-readable error code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Per-field validation messages.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Vec<String>>,
    /// Body text when it was not JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl ApiErrorBody {
    /// Parses a response body. Never fails: unknown shapes end up in `raw`.
    #[must_use]
    pub fn parse(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Self::default();
        }
        match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(map)) => {
                let mut body = Self {
                    detail: map.get("detail").and_then(as_message),
                    message: map
                        .get("message")
                        .or_else(|| map.get("error"))
                        .and_then(as_message),
                    error_code: map
                        .get("error_code")
                        .or_else(|| map.get("code"))
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    ..Self::default()
                };
                for (key, value) in &map {
                    if !ENVELOPE_KEYS.contains(&key.as_str()) {
                        body.push_field(key, value);
                    }
                }
                if let Some(Value::Object(details)) = map.get("details") {
                    for (key, value) in details {
                        body.push_field(key, value);
                    }
                }
                body
            }
            Ok(Value::Array(items)) => {
                let mut body = Self::default();
                body.push_field("non_field_errors", &Value::Array(items));
                body
            }
            Ok(Value::String(text)) => Self {
                detail: Some(text),
                ..Self::default()
            },
            _ => Self {
                raw: Some(String::from_utf8_lossy(bytes).into_owned()),
                ..Self::default()
            },
        }
    }

    /// Returns the most specific server-provided message.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        self.detail.as_deref().or(self.message.as_deref())
    }

    fn push_field(&mut self, key: &str, value: &Value) {
        let messages: Vec<String> = match value {
            Value::String(s) => vec![s.clone()],
            Value::Array(items) => items.iter().filter_map(as_message).collect(),
            _ => Vec::new(),
        };
        if !messages.is_empty() {
            self.fields.entry(key.to_string()).or_default().extend(messages);
        }
    }
}

fn as_message(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.first().and_then(as_message),
        _ => None,
    }
}

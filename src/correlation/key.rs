// ============================================================================
// Correlation Keys
// ============================================================================
//
// A correlation key tells two outstanding requests of the same operation kind
// apart. Three shapes exist:
// - Explicit:  caller supplied (storage key, leaderboard name, product id)
// - Composite: a name plus the canonical JSON of an options object
// - Singleton: no key at all; every concurrent caller shares one request
//
// The wire form of a key is what the platform echoes back inside a keyed
// envelope, so equal keys must always render to byte-identical strings.
//
// ============================================================================

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::core::{BridgeError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CorrelationKey {
    Explicit(String),
    Composite(String, String),
    Singleton,
}

impl CorrelationKey {
    pub fn explicit(key: impl Into<String>) -> Self {
        CorrelationKey::Explicit(key.into())
    }

    /// Build a composite key from a name and any serializable options object.
    ///
    /// Object fields are emitted in sorted order at every nesting level, so the
    /// result never depends on how the caller's map happened to iterate.
    pub fn composite<T: Serialize + ?Sized>(name: impl Into<String>, options: &T) -> Result<Self> {
        let value = serde_json::to_value(options)
            .map_err(|e| BridgeError::validation(format!("options are not serializable: {e}")))?;
        Ok(CorrelationKey::Composite(name.into(), canonical_json(&value)))
    }

    /// String the platform echoes back in the envelope's key field
    pub fn wire(&self) -> String {
        match self {
            CorrelationKey::Explicit(key) => key.clone(),
            CorrelationKey::Composite(name, options) => format!("{name}:{options}"),
            CorrelationKey::Singleton => String::new(),
        }
    }
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationKey::Singleton => write!(f, "<singleton>"),
            other => f.write_str(&other.wire()),
        }
    }
}

/// Serialize a JSON value with object keys sorted recursively
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // String keys always serialize
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

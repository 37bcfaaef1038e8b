use std::collections::BTreeMap;

use serde_json::Value;

use super::{Bridge, OperationRequest, decode_json, require_non_empty};
use crate::core::{BridgeError, OperationKind, Result};
use crate::correlation::CorrelationKey;
use crate::host::HostCall;
use crate::models::ClientFeature;

const FLAGS_KEY: &str = "flags";

impl Bridge {
    /// Remote config flags.
    ///
    /// `defaults` fill in any flag the platform does not return. Calls with
    /// equal defaults and features share one request.
    pub async fn get_flags(
        &self,
        defaults: &BTreeMap<String, String>,
        client_features: &[ClientFeature],
    ) -> Result<BTreeMap<String, String>> {
        for feature in client_features {
            require_non_empty("client feature name", &feature.name)?;
        }

        let key = CorrelationKey::composite(
            FLAGS_KEY,
            &serde_json::json!({ "defaultFlags": defaults, "clientFeatures": client_features }),
        )?;
        let call = HostCall::GetFlags {
            request_key: key.wire(),
            default_flags: to_json(defaults)?,
            client_features: to_json(client_features)?,
        };

        let kind = OperationKind::Flags;
        let received: BTreeMap<String, Value> = self
            .call(OperationRequest::new(kind, key, call), |body| {
                decode_json(kind, body)
            })
            .await?;

        let mut flags = defaults.clone();
        flags.extend(received.into_iter().map(|(name, value)| (name, flag_text(value))));
        Ok(flags)
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| BridgeError::validation(e.to_string()))
}

// Flag values are strings on the wire; tolerate hosts that send raw JSON
fn flag_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_text() {
        assert_eq!(flag_text(Value::String("on".into())), "on");
        assert_eq!(flag_text(serde_json::json!(3)), "3");
        assert_eq!(flag_text(serde_json::json!(true)), "true");
    }
}

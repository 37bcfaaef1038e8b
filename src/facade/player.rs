use super::{Bridge, OperationRequest, decode_json, require_non_empty};
use crate::core::{OperationKind, Result};
use crate::correlation::CorrelationKey;
use crate::host::HostCall;
use crate::models::PlayerData;

impl Bridge {
    /// Profile of the current player. Concurrent callers share one request.
    pub async fn get_player_data(&self) -> Result<PlayerData> {
        let kind = OperationKind::PlayerData;
        let request = OperationRequest::singleton(kind, HostCall::GetPlayerData);
        self.call(request, |body| decode_json(kind, body)).await
    }

    /// Store `data` in the player's cloud storage under `key`.
    ///
    /// Two saves of the same key with different data are issued one after
    /// the other, never merged.
    pub async fn save_data(&self, key: &str, data: &str) -> Result<()> {
        require_non_empty("key", key)?;

        let request = OperationRequest::new(
            OperationKind::SaveData,
            CorrelationKey::explicit(key),
            HostCall::SaveData {
                key: key.to_string(),
                data: data.to_string(),
            },
        )
        .fingerprint(data);
        self.call(request, |_| Ok(())).await
    }

    /// Value stored under `key`, or `None` when nothing was saved
    pub async fn load_data(&self, key: &str) -> Result<Option<String>> {
        require_non_empty("key", key)?;

        let request = OperationRequest::new(
            OperationKind::LoadData,
            CorrelationKey::explicit(key),
            HostCall::LoadData {
                key: key.to_string(),
            },
        );
        self.call(request, |body| Ok(stored_value(body))).await
    }
}

// Legacy hosts answer a missing value with an empty or "null" bare payload
fn stored_value(body: Option<String>) -> Option<String> {
    body.filter(|raw| !raw.is_empty() && raw != "null")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_value() {
        assert_eq!(stored_value(None), None);
        assert_eq!(stored_value(Some(String::new())), None);
        assert_eq!(stored_value(Some("null".into())), None);
        assert_eq!(stored_value(Some("X".into())), Some("X".into()));
        assert_eq!(stored_value(Some("{\"a\":1}".into())), Some("{\"a\":1}".into()));
    }
}

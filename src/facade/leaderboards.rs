use super::{Bridge, OperationRequest, decode_json, require_non_empty};
use crate::core::{BridgeError, OperationKind, Result};
use crate::correlation::CorrelationKey;
use crate::host::HostCall;
use crate::models::{
    EntriesQuery, LeaderboardDescription, LeaderboardEntriesResponse, LeaderboardEntry,
};

/// Prefix of the composite key for entries queries
const ENTRIES_KEY: &str = "entries";

impl Bridge {
    /// Submit `score` to `leaderboard`.
    ///
    /// Identical submissions in flight share one platform call; a different
    /// score for the same leaderboard waits for the first to finish.
    pub async fn set_leaderboard_score(
        &self,
        leaderboard: &str,
        score: i64,
        extra_data: Option<&str>,
    ) -> Result<()> {
        require_non_empty("leaderboard name", leaderboard)?;
        if !(0..=i64::from(i32::MAX)).contains(&score) {
            return Err(BridgeError::validation(format!(
                "score must be between 0 and {}, got {score}",
                i32::MAX
            )));
        }
        let extra_data = extra_data.unwrap_or_default();
        let max_extra = self.config().max_extra_data_len;
        if extra_data.len() > max_extra {
            return Err(BridgeError::validation(format!(
                "extra data must be at most {max_extra} bytes, got {}",
                extra_data.len()
            )));
        }

        let request = OperationRequest::new(
            OperationKind::SetLeaderboardScore,
            CorrelationKey::explicit(leaderboard),
            HostCall::SetLeaderboardScore {
                leaderboard: leaderboard.to_string(),
                score,
                extra_data: extra_data.to_string(),
            },
        )
        .fingerprint(format!("{score}:{extra_data}"));
        self.call(request, |_| Ok(())).await
    }

    pub async fn get_leaderboard_description(
        &self,
        leaderboard: &str,
    ) -> Result<LeaderboardDescription> {
        require_non_empty("leaderboard name", leaderboard)?;

        let kind = OperationKind::LeaderboardDescription;
        let request = OperationRequest::new(
            kind,
            CorrelationKey::explicit(leaderboard),
            HostCall::GetLeaderboardDescription {
                leaderboard: leaderboard.to_string(),
            },
        );
        self.call(request, |body| decode_json(kind, body)).await
    }

    /// The current player's entry. Fails with a platform error when the
    /// player has no score on this leaderboard.
    pub async fn get_leaderboard_player_entry(&self, leaderboard: &str) -> Result<LeaderboardEntry> {
        require_non_empty("leaderboard name", leaderboard)?;

        let kind = OperationKind::LeaderboardPlayerEntry;
        let request = OperationRequest::new(
            kind,
            CorrelationKey::explicit(leaderboard),
            HostCall::GetLeaderboardPlayerEntry {
                leaderboard: leaderboard.to_string(),
            },
        );
        self.call(request, |body| decode_json(kind, body)).await
    }

    /// Top entries, optionally with the entries around the current player
    pub async fn get_leaderboard_entries(
        &self,
        leaderboard: &str,
        query: EntriesQuery,
    ) -> Result<LeaderboardEntriesResponse> {
        require_non_empty("leaderboard name", leaderboard)?;
        let config = self.config();
        check_range("quantity_top", query.quantity_top, config.max_entries_top)?;
        check_range("quantity_around", query.quantity_around, config.max_entries_around)?;

        let key = CorrelationKey::composite(
            ENTRIES_KEY,
            &serde_json::json!({ "leaderboardName": leaderboard, "query": query }),
        )?;
        let kind = OperationKind::LeaderboardEntries;
        let call = HostCall::GetLeaderboardEntries {
            request_key: key.wire(),
            leaderboard: leaderboard.to_string(),
            include_user: query.include_user,
            quantity_around: query.quantity_around,
            quantity_top: query.quantity_top,
        };
        self.call(OperationRequest::new(kind, key, call), |body| {
            decode_json(kind, body)
        })
        .await
    }
}

fn check_range(field: &str, value: u32, max: u32) -> Result<()> {
    if value == 0 || value > max {
        return Err(BridgeError::validation(format!(
            "{field} must be between 1 and {max}, got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_range() {
        assert!(check_range("quantity_top", 1, 20).is_ok());
        assert!(check_range("quantity_top", 20, 20).is_ok());
        assert!(check_range("quantity_top", 0, 20).is_err());
        let err = check_range("quantity_around", 11, 10).unwrap_err();
        assert!(err.to_string().contains("quantity_around"));
    }
}

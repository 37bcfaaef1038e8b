// ============================================================================
// Host Platform Boundary
// ============================================================================
//
// The host exposes one fire-and-forget entry point per operation. A call
// returns nothing useful synchronously: the outcome arrives later on the
// operation's named channels. The host may still refuse a call outright
// (e.g. the JS function is missing), which surfaces as `HostError`.
//
// ============================================================================

use thiserror::Error;

use crate::core::OperationKind;

/// Synchronous refusal of a host call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct HostError(String);

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// One invocation of a host entry point with its primitive arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Initialize,
    GetPlayerData,
    SaveData {
        key: String,
        data: String,
    },
    LoadData {
        key: String,
    },
    ShowInterstitialAd,
    ShowRewardedAd,
    SetLeaderboardScore {
        leaderboard: String,
        score: i64,
        extra_data: String,
    },
    GetLeaderboardDescription {
        leaderboard: String,
    },
    GetLeaderboardPlayerEntry {
        leaderboard: String,
    },
    GetLeaderboardEntries {
        request_key: String,
        leaderboard: String,
        include_user: bool,
        quantity_around: u32,
        quantity_top: u32,
    },
    GetFlags {
        request_key: String,
        /// JSON object of default flag values
        default_flags: String,
        /// JSON array of `{name, value}` pairs
        client_features: String,
    },
    CanReview,
    RequestReview,
    GetCatalog,
    Purchase {
        product_id: String,
        developer_payload: String,
    },
    GetPurchases,
    ConsumePurchase {
        purchase_token: String,
    },
}

impl HostCall {
    /// Operation this call starts; `None` for initialization
    pub fn kind(&self) -> Option<OperationKind> {
        let kind = match self {
            HostCall::Initialize => return None,
            HostCall::GetPlayerData => OperationKind::PlayerData,
            HostCall::SaveData { .. } => OperationKind::SaveData,
            HostCall::LoadData { .. } => OperationKind::LoadData,
            HostCall::ShowInterstitialAd => OperationKind::InterstitialAd,
            HostCall::ShowRewardedAd => OperationKind::RewardedAd,
            HostCall::SetLeaderboardScore { .. } => OperationKind::SetLeaderboardScore,
            HostCall::GetLeaderboardDescription { .. } => OperationKind::LeaderboardDescription,
            HostCall::GetLeaderboardPlayerEntry { .. } => OperationKind::LeaderboardPlayerEntry,
            HostCall::GetLeaderboardEntries { .. } => OperationKind::LeaderboardEntries,
            HostCall::GetFlags { .. } => OperationKind::Flags,
            HostCall::CanReview => OperationKind::CanReview,
            HostCall::RequestReview => OperationKind::RequestReview,
            HostCall::GetCatalog => OperationKind::Catalog,
            HostCall::Purchase { .. } => OperationKind::Purchase,
            HostCall::GetPurchases => OperationKind::Purchases,
            HostCall::ConsumePurchase { .. } => OperationKind::ConsumePurchase,
        };
        Some(kind)
    }

    pub fn entry_point(&self) -> &'static str {
        match self.kind() {
            Some(kind) => kind.entry_point(),
            None => "YandexGamesInitialize",
        }
    }
}

/// The host environment's fire-and-forget entry points.
///
/// Implementations must not deliver callbacks re-entrantly from inside
/// `invoke`; deliver them later through [`crate::Bridge::dispatch`].
pub trait HostPlatform: Send + Sync {
    fn invoke(&self, call: &HostCall) -> Result<(), HostError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_points() {
        assert_eq!(HostCall::Initialize.entry_point(), "YandexGamesInitialize");
        assert_eq!(HostCall::Initialize.kind(), None);
        let call = HostCall::SetLeaderboardScore {
            leaderboard: "weekly".into(),
            score: 500,
            extra_data: String::new(),
        };
        assert_eq!(call.entry_point(), "SetLeaderboardScoreAsyncJS");
        assert_eq!(call.kind(), Some(OperationKind::SetLeaderboardScore));
    }
}

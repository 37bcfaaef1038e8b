// ============================================================================
// Operation Kinds
// ============================================================================
//
// Every platform capability is one operation kind. A kind fixes:
// - the host entry point that starts it
// - the pair of named channels the platform answers on
// - the envelope field that carries the correlation key (if any)
//
// ============================================================================

use std::fmt;

/// Which envelope field carries the correlation key for an operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyField {
    /// `{ "key": ..., "data" | "error": ... }`
    Key,
    /// `{ "leaderboardName": ..., "data" | "error": ... }`
    LeaderboardName,
    /// `{ "requestKey": ..., "data" | "error": ... }`
    RequestKey,
    /// Payloads never carry a key; callbacks are matched positionally
    Positional,
}

impl KeyField {
    /// JSON field name, or `None` for positional kinds
    pub fn field_name(&self) -> Option<&'static str> {
        match self {
            KeyField::Key => Some("key"),
            KeyField::LeaderboardName => Some("leaderboardName"),
            KeyField::RequestKey => Some("requestKey"),
            KeyField::Positional => None,
        }
    }
}

/// Role of a named callback channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelRole {
    Completion,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperationKind {
    PlayerData,
    SaveData,
    LoadData,
    InterstitialAd,
    RewardedAd,
    SetLeaderboardScore,
    LeaderboardDescription,
    LeaderboardPlayerEntry,
    LeaderboardEntries,
    Flags,
    CanReview,
    RequestReview,
    Catalog,
    Purchase,
    Purchases,
    ConsumePurchase,
}

impl OperationKind {
    pub const ALL: [OperationKind; 16] = [
        OperationKind::PlayerData,
        OperationKind::SaveData,
        OperationKind::LoadData,
        OperationKind::InterstitialAd,
        OperationKind::RewardedAd,
        OperationKind::SetLeaderboardScore,
        OperationKind::LeaderboardDescription,
        OperationKind::LeaderboardPlayerEntry,
        OperationKind::LeaderboardEntries,
        OperationKind::Flags,
        OperationKind::CanReview,
        OperationKind::RequestReview,
        OperationKind::Catalog,
        OperationKind::Purchase,
        OperationKind::Purchases,
        OperationKind::ConsumePurchase,
    ];

    pub fn key_field(&self) -> KeyField {
        match self {
            OperationKind::SaveData
            | OperationKind::LoadData
            | OperationKind::Purchase
            | OperationKind::ConsumePurchase => KeyField::Key,
            OperationKind::SetLeaderboardScore
            | OperationKind::LeaderboardDescription
            | OperationKind::LeaderboardPlayerEntry => KeyField::LeaderboardName,
            OperationKind::LeaderboardEntries | OperationKind::Flags => KeyField::RequestKey,
            OperationKind::PlayerData
            | OperationKind::InterstitialAd
            | OperationKind::RewardedAd
            | OperationKind::CanReview
            | OperationKind::RequestReview
            | OperationKind::Catalog
            | OperationKind::Purchases => KeyField::Positional,
        }
    }

    /// Name of the fire-and-forget host entry point
    pub fn entry_point(&self) -> &'static str {
        match self {
            OperationKind::PlayerData => "GetPlayerDataAsyncJS",
            OperationKind::SaveData => "SaveDataAsyncJS",
            OperationKind::LoadData => "LoadDataAsyncJS",
            OperationKind::InterstitialAd => "ShowInterstitialAdAsyncJS",
            OperationKind::RewardedAd => "ShowRewardedAdAsyncJS",
            OperationKind::SetLeaderboardScore => "SetLeaderboardScoreAsyncJS",
            OperationKind::LeaderboardDescription => "GetLeaderboardDescriptionAsyncJS",
            OperationKind::LeaderboardPlayerEntry => "GetLeaderboardPlayerEntryAsyncJS",
            OperationKind::LeaderboardEntries => "GetLeaderboardEntriesAsyncJS",
            OperationKind::Flags => "GetFlagsAsyncJS",
            OperationKind::CanReview => "CanReviewAsyncJS",
            OperationKind::RequestReview => "RequestReviewAsyncJS",
            OperationKind::Catalog => "GetCatalogAsyncJS",
            OperationKind::Purchase => "PurchaseAsyncJS",
            OperationKind::Purchases => "GetPurchasesAsyncJS",
            OperationKind::ConsumePurchase => "ConsumePurchaseAsyncJS",
        }
    }

    /// Channel the platform invokes with the result payload
    pub fn completion_channel(&self) -> &'static str {
        match self {
            // Historical name kept by the JS side
            OperationKind::PlayerData => "OnPlayerDataReceived",
            OperationKind::SaveData => "OnSaveDataComplete",
            OperationKind::LoadData => "OnLoadDataComplete",
            OperationKind::InterstitialAd => "OnInterstitialAdComplete",
            OperationKind::RewardedAd => "OnRewardedAdComplete",
            OperationKind::SetLeaderboardScore => "OnSetLeaderboardScoreComplete",
            OperationKind::LeaderboardDescription => "OnGetLeaderboardDescriptionComplete",
            OperationKind::LeaderboardPlayerEntry => "OnGetLeaderboardPlayerEntryComplete",
            OperationKind::LeaderboardEntries => "OnGetLeaderboardEntriesComplete",
            OperationKind::Flags => "OnGetFlagsComplete",
            OperationKind::CanReview => "OnCanReviewComplete",
            OperationKind::RequestReview => "OnRequestReviewComplete",
            OperationKind::Catalog => "OnGetCatalogComplete",
            OperationKind::Purchase => "OnPurchaseComplete",
            OperationKind::Purchases => "OnGetPurchasesComplete",
            OperationKind::ConsumePurchase => "OnConsumePurchaseComplete",
        }
    }

    /// Channel the platform invokes with an error message
    pub fn error_channel(&self) -> &'static str {
        match self {
            OperationKind::PlayerData => "OnPlayerDataError",
            OperationKind::SaveData => "OnSaveDataError",
            OperationKind::LoadData => "OnLoadDataError",
            OperationKind::InterstitialAd => "OnInterstitialAdError",
            OperationKind::RewardedAd => "OnRewardedAdError",
            OperationKind::SetLeaderboardScore => "OnSetLeaderboardScoreError",
            OperationKind::LeaderboardDescription => "OnGetLeaderboardDescriptionError",
            OperationKind::LeaderboardPlayerEntry => "OnGetLeaderboardPlayerEntryError",
            OperationKind::LeaderboardEntries => "OnGetLeaderboardEntriesError",
            OperationKind::Flags => "OnGetFlagsError",
            OperationKind::CanReview => "OnCanReviewError",
            OperationKind::RequestReview => "OnRequestReviewError",
            OperationKind::Catalog => "OnGetCatalogError",
            OperationKind::Purchase => "OnPurchaseError",
            OperationKind::Purchases => "OnGetPurchasesError",
            OperationKind::ConsumePurchase => "OnConsumePurchaseError",
        }
    }

    pub fn channel(&self, role: ChannelRole) -> &'static str {
        match role {
            ChannelRole::Completion => self.completion_channel(),
            ChannelRole::Failure => self.error_channel(),
        }
    }

    /// Human readable label used in error messages and log fields
    pub fn label(&self) -> &'static str {
        match self {
            OperationKind::PlayerData => "get player data",
            OperationKind::SaveData => "save data",
            OperationKind::LoadData => "load data",
            OperationKind::InterstitialAd => "show interstitial ad",
            OperationKind::RewardedAd => "show rewarded ad",
            OperationKind::SetLeaderboardScore => "set leaderboard score",
            OperationKind::LeaderboardDescription => "get leaderboard description",
            OperationKind::LeaderboardPlayerEntry => "get leaderboard player entry",
            OperationKind::LeaderboardEntries => "get leaderboard entries",
            OperationKind::Flags => "get flags",
            OperationKind::CanReview => "check review availability",
            OperationKind::RequestReview => "request review",
            OperationKind::Catalog => "get catalog",
            OperationKind::Purchase => "purchase product",
            OperationKind::Purchases => "get purchases",
            OperationKind::ConsumePurchase => "consume purchase",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

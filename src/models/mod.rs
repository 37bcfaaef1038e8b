// ============================================================================
// Typed Platform Payloads
// ============================================================================
//
// Serde models for the JSON the platform hands back through the completion
// channels. Field names follow the platform's wire spelling via renames.
//
// ============================================================================

pub mod leaderboards;
pub mod payments;
pub mod player;
pub mod remote_config;
pub mod review;

pub use leaderboards::{
    DescriptionConfig, EntriesQuery, EntryRange, LeaderboardDescription, LeaderboardEntriesResponse,
    LeaderboardEntry, LeaderboardPlayer, LocalizedTitles, ScopePermissions, ScoreFormat,
    ScoreFormatOptions, ScoreType,
};
pub use payments::{CurrencyIconSize, Product, Purchase};
pub use player::PlayerData;
pub use remote_config::ClientFeature;
pub use review::{ReviewAvailability, ReviewOutcome};

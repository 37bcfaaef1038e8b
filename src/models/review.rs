use serde::{Deserialize, Serialize};

/// Answer to "may the game ask for a review now?"
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReviewAvailability {
    pub value: bool,
    /// Why not, e.g. `NO_AUTH`, `GAME_RATED`, `REVIEW_ALREADY_REQUESTED`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReviewOutcome {
    #[serde(rename = "feedbackSent")]
    pub feedback_sent: bool,
}

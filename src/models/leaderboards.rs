use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalizedTitles {
    pub en: String,
    pub ru: String,
    pub tr: String,
    pub de: String,
    pub fr: String,
    pub es: String,
    pub pt: String,
}

impl LocalizedTitles {
    /// Title for `lang`, falling back to English
    pub fn get(&self, lang: &str) -> &str {
        let title = match lang {
            "ru" => &self.ru,
            "tr" => &self.tr,
            "de" => &self.de,
            "fr" => &self.fr,
            "es" => &self.es,
            "pt" => &self.pt,
            _ => &self.en,
        };
        if title.is_empty() { &self.en } else { title }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreType {
    #[default]
    Numeric,
    /// Score is a duration in milliseconds
    Time,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreFormatOptions {
    /// Decimal places to display; 2 renders 1234 as "12.34"
    pub decimal_offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreFormat {
    #[serde(rename = "type")]
    pub kind: ScoreType,
    pub options: ScoreFormatOptions,
}

impl ScoreFormat {
    /// Render a raw score the way the leaderboard displays it
    pub fn format(&self, score: i64) -> String {
        match self.kind {
            ScoreType::Time => format_time(score),
            ScoreType::Numeric | ScoreType::Unknown => {
                format_decimal(score, self.options.decimal_offset)
            }
        }
    }
}

fn format_decimal(score: i64, offset: u32) -> String {
    if offset == 0 {
        return score.to_string();
    }
    let sign = if score < 0 { "-" } else { "" };
    let digits = format!("{:0>width$}", score.unsigned_abs(), width = offset as usize + 1);
    let (whole, fraction) = digits.split_at(digits.len() - offset as usize);
    format!("{sign}{whole}.{fraction}")
}

fn format_time(millis: i64) -> String {
    let millis = millis.max(0);
    let minutes = millis / 60_000;
    let seconds = (millis / 1000) % 60;
    format!("{minutes}:{seconds:02}.{:03}", millis % 1000)
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptionConfig {
    /// Lower scores rank higher
    pub invert_sort_order: bool,
    pub score_format: ScoreFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardDescription {
    #[serde(rename = "appID")]
    pub app_id: String,
    pub name: String,
    /// Whether this is the game's primary leaderboard
    #[serde(rename = "default")]
    pub is_default: bool,
    pub title: LocalizedTitles,
    pub description: DescriptionConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopePermissions {
    /// `allow` or `forbid`
    pub avatar: String,
    pub public_name: String,
}

impl ScopePermissions {
    pub fn avatar_allowed(&self) -> bool {
        self.avatar != "forbid"
    }

    pub fn public_name_allowed(&self) -> bool {
        self.public_name != "forbid"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardPlayer {
    #[serde(rename = "uniqueID")]
    pub unique_id: String,
    /// `"User Hidden"` when the player restricted their name
    #[serde(rename = "publicName")]
    pub public_name: String,
    pub lang: String,
    #[serde(rename = "scopePermissions")]
    pub scope_permissions: ScopePermissions,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardEntry {
    pub score: i64,
    #[serde(rename = "extraData")]
    pub extra_data: String,
    /// 1-based
    pub rank: u32,
    pub player: LeaderboardPlayer,
    #[serde(rename = "formattedScore")]
    pub formatted_score: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntryRange {
    pub start: u32,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardEntriesResponse {
    pub leaderboard: LeaderboardDescription,
    /// 0 when the user is not ranked or was not requested
    #[serde(rename = "userRank")]
    pub user_rank: u32,
    pub ranges: Vec<EntryRange>,
    pub entries: Vec<LeaderboardEntry>,
}

/// Options for an entries query; also forms the request's composite key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntriesQuery {
    pub include_user: bool,
    /// Entries on each side of the user
    pub quantity_around: u32,
    pub quantity_top: u32,
}

impl Default for EntriesQuery {
    fn default() -> Self {
        Self {
            include_user: false,
            quantity_around: 5,
            quantity_top: 5,
        }
    }
}

impl EntriesQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include_user(mut self, include: bool) -> Self {
        self.include_user = include;
        self
    }

    pub fn quantity_around(mut self, n: u32) -> Self {
        self.quantity_around = n;
        self
    }

    pub fn quantity_top(mut self, n: u32) -> Self {
        self.quantity_top = n;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_format() {
        let plain = ScoreFormat::default();
        assert_eq!(plain.format(1234), "1234");

        let cents = ScoreFormat {
            kind: ScoreType::Numeric,
            options: ScoreFormatOptions { decimal_offset: 2 },
        };
        assert_eq!(cents.format(1234), "12.34");
        assert_eq!(cents.format(5), "0.05");

        let time = ScoreFormat {
            kind: ScoreType::Time,
            options: ScoreFormatOptions::default(),
        };
        assert_eq!(time.format(83_042), "1:23.042");
    }

    #[test]
    fn test_description_wire_names() {
        let json = r#"{
            "appID": "12345",
            "name": "weekly",
            "default": true,
            "title": {"en": "Weekly", "ru": "Неделя"},
            "description": {
                "invert_sort_order": true,
                "score_format": {"type": "time", "options": {"decimal_offset": 0}}
            }
        }"#;
        let desc: LeaderboardDescription = serde_json::from_str(json).unwrap();

        assert_eq!(desc.app_id, "12345");
        assert!(desc.is_default);
        assert!(desc.description.invert_sort_order);
        assert_eq!(desc.description.score_format.kind, ScoreType::Time);
        assert_eq!(desc.title.get("ru"), "Неделя");
        // Missing translation falls back to English
        assert_eq!(desc.title.get("de"), "Weekly");
    }

    #[test]
    fn test_unknown_score_type_tolerated() {
        let format: ScoreFormat = serde_json::from_str(r#"{"type":"stars"}"#).unwrap();
        assert_eq!(format.kind, ScoreType::Unknown);
    }

    #[test]
    fn test_entries_response() {
        let json = r#"{
            "leaderboard": {"name": "weekly"},
            "userRank": 3,
            "ranges": [{"start": 0, "size": 2}],
            "entries": [{
                "score": 900, "rank": 1, "formattedScore": "900",
                "player": {"uniqueID": "p1", "publicName": "User Hidden",
                           "scopePermissions": {"avatar": "forbid", "public_name": "forbid"}}
            }]
        }"#;
        let response: LeaderboardEntriesResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.user_rank, 3);
        assert_eq!(response.ranges, vec![EntryRange { start: 0, size: 2 }]);
        let player = &response.entries[0].player;
        assert!(!player.scope_permissions.avatar_allowed());
        assert!(response.entries[0].extra_data.is_empty());
    }

    #[test]
    fn test_entries_query_serializes_camel_case() {
        let query = EntriesQuery::new().include_user(true).quantity_top(10);
        let json = serde_json::to_value(query).unwrap();
        assert_eq!(json["includeUser"], true);
        assert_eq!(json["quantityTop"], 10);
        assert_eq!(json["quantityAround"], 5);
    }
}

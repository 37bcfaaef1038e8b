use serde::{Deserialize, Serialize};

/// Profile of the signed-in player
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerData {
    pub name: String,
    /// Avatar URL; empty when hidden
    pub avatar: String,
    /// ISO 639-1 language code
    pub lang: String,
    /// `desktop`, `mobile`, `tablet` or `tv`
    pub device: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default() {
        let player: PlayerData = serde_json::from_str(r#"{"name":"Ann","lang":"ru"}"#).unwrap();
        assert_eq!(player.name, "Ann");
        assert_eq!(player.lang, "ru");
        assert!(player.avatar.is_empty());
        assert!(player.device.is_empty());
    }
}

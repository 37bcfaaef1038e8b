use std::time::Duration;

/// Bridge configuration
///
/// Builder-style; every setter consumes and returns the config.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// How long `initialize` waits for the ready/failure callback
    pub init_timeout: Duration,

    /// Optional deadline for each platform request; `None` waits forever
    pub request_timeout: Option<Duration>,

    /// Upper bound for `quantity_top` in leaderboard entry queries
    pub max_entries_top: u32,

    /// Upper bound for `quantity_around` in leaderboard entry queries
    pub max_entries_around: u32,

    /// Maximum length of leaderboard `extra_data`, in bytes
    pub max_extra_data_len: usize,
}

impl BridgeConfig {
    pub const INIT_TIMEOUT_ENV: &'static str = "YG_BRIDGE_INIT_TIMEOUT_MS";
    pub const REQUEST_TIMEOUT_ENV: &'static str = "YG_BRIDGE_REQUEST_TIMEOUT_MS";

    pub fn new() -> Self {
        Self {
            init_timeout: Duration::from_secs(10),
            request_timeout: None,
            max_entries_top: 20,
            max_entries_around: 10,
            max_extra_data_len: 128,
        }
    }

    /// Set initialization timeout
    pub fn init_timeout(mut self, timeout: Duration) -> Self {
        self.init_timeout = timeout;
        self
    }

    /// Set per-request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn max_entries_top(mut self, max: u32) -> Self {
        self.max_entries_top = max;
        self
    }

    pub fn max_entries_around(mut self, max: u32) -> Self {
        self.max_entries_around = max;
        self
    }

    pub fn max_extra_data_len(mut self, max: usize) -> Self {
        self.max_extra_data_len = max;
        self
    }

    /// Defaults overridden by `YG_BRIDGE_INIT_TIMEOUT_MS` and
    /// `YG_BRIDGE_REQUEST_TIMEOUT_MS` when set
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let mut config = Self::new();

        if let Some(raw) = lookup(Self::INIT_TIMEOUT_ENV) {
            config.init_timeout = parse_millis(Self::INIT_TIMEOUT_ENV, &raw)?;
        }
        if let Some(raw) = lookup(Self::REQUEST_TIMEOUT_ENV) {
            config.request_timeout = Some(parse_millis(Self::REQUEST_TIMEOUT_ENV, &raw)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.init_timeout.is_zero() {
            return Err("init_timeout must be > 0".to_string());
        }

        if self.request_timeout.is_some_and(|t| t.is_zero()) {
            return Err("request_timeout must be > 0".to_string());
        }

        if self.max_entries_top == 0 || self.max_entries_around == 0 {
            return Err("leaderboard entry bounds must be > 0".to_string());
        }

        Ok(())
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_millis(name: &str, raw: &str) -> Result<Duration, String> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| format!("{name} must be a whole number of milliseconds, got '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.init_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.max_entries_top, 20);
        assert_eq!(config.max_entries_around, 10);
    }

    #[test]
    fn test_builder_pattern() {
        let config = BridgeConfig::new()
            .init_timeout(Duration::from_secs(3))
            .request_timeout(Duration::from_secs(30))
            .max_entries_top(5);

        assert_eq!(config.init_timeout, Duration::from_secs(3));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.max_entries_top, 5);
    }

    #[test]
    fn test_from_lookup() {
        let env: HashMap<&str, &str> = HashMap::from([
            (BridgeConfig::INIT_TIMEOUT_ENV, "2500"),
            (BridgeConfig::REQUEST_TIMEOUT_ENV, " 60000 "),
        ]);
        let config = BridgeConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.init_timeout, Duration::from_millis(2500));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let err = BridgeConfig::from_lookup(|k| {
            (k == BridgeConfig::INIT_TIMEOUT_ENV).then(|| "ten".to_string())
        })
        .unwrap_err();
        assert!(err.contains(BridgeConfig::INIT_TIMEOUT_ENV));

        let err = BridgeConfig::from_lookup(|k| {
            (k == BridgeConfig::INIT_TIMEOUT_ENV).then(|| "0".to_string())
        })
        .unwrap_err();
        assert!(err.contains("init_timeout"));
    }

    #[test]
    fn test_validate() {
        assert!(BridgeConfig::new().validate().is_ok());
        assert!(BridgeConfig::new().init_timeout(Duration::ZERO).validate().is_err());
        assert!(BridgeConfig::new().request_timeout(Duration::ZERO).validate().is_err());
        assert!(BridgeConfig::new().max_entries_top(0).validate().is_err());
    }
}

use std::time::Duration;

use crate::error::ConfigError;

const DEFAULT_REFRESH_SECS: u64 = 120;

/// Settings for `ProgressionTracker`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressionConfig {
    pub refresh_interval: Duration,
    /// Post detected level-ups to the activity feed.
    pub record_level_ups: bool,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
            record_level_ups: true,
        }
    }
}

impl ProgressionConfig {
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidRefreshInterval` for a zero interval.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Result<Self, ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::InvalidRefreshInterval(format!("{interval:?}")));
        }
        self.refresh_interval = interval;
        Ok(self)
    }

    #[must_use]
    pub fn with_record_level_ups(mut self, enabled: bool) -> Self {
        self.record_level_ups = enabled;
        self
    }

    /// Read `LEARN_PROGRESSION_REFRESH_SECS`, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidRefreshInterval` if the value is not a
    /// positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// # Errors
    ///
    /// See [`ProgressionConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = Self::default();
        match lookup("LEARN_PROGRESSION_REFRESH_SECS") {
            None => Ok(config),
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.with_refresh_interval(Duration::from_secs(secs)),
                _ => Err(ConfigError::InvalidRefreshInterval(raw)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_two_minutes() {
        let config = ProgressionConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.refresh_interval, Duration::from_secs(120));
        assert!(config.record_level_ups);
    }

    #[test]
    fn reads_refresh_interval() {
        let config = ProgressionConfig::from_lookup(|key| {
            (key == "LEARN_PROGRESSION_REFRESH_SECS").then(|| "30".to_string())
        })
        .unwrap();
        assert_eq!(config.refresh_interval, Duration::from_secs(30));
    }

    #[test]
    fn rejects_zero_and_garbage() {
        for raw in ["0", "soon", "-5"] {
            let err = ProgressionConfig::from_lookup(|_| Some(raw.to_string())).unwrap_err();
            assert_eq!(err, ConfigError::InvalidRefreshInterval(raw.to_string()));
        }
        assert!(
            ProgressionConfig::default()
                .with_refresh_interval(Duration::ZERO)
                .is_err()
        );
    }
}

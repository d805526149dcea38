//! # Economy Configuration
//!
//! All tuning constants of the reward economy in one place, with presets.
//!
//! ## Usage
//! ```rust
//! use of_economy::config::EconomyConfig;
//!
//! let config = EconomyConfig::default();
//! let casual = EconomyConfig::casual();
//! assert!(casual.reward.base_match_coins > config.reward.base_match_coins);
//! ```
//!
//! A JSON override file can be supplied through `OF_ECONOMY_CONFIG_PATH`;
//! see [`EconomyConfig::load_from_env`].

mod inflation_config;
mod market_config;
mod reward_config;
mod season_config;
mod sync_config;

pub use inflation_config::InflationConfig;
pub use market_config::MarketConfig;
pub use reward_config::RewardConfig;
pub use season_config::SeasonConfig;
pub use sync_config::SyncConfig;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::{env, fs};

pub const CONFIG_PATH_ENV: &str = "OF_ECONOMY_CONFIG_PATH";

/// Upper bounds keeping every configured window a valid `chrono::Duration`.
const MAX_SEASON_DAYS: i64 = 3_650;
const MAX_WINDOW_HOURS: i64 = 24 * 365;
const MAX_RETRY_INTERVAL_SECS: i64 = 86_400;

/// Full economy configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EconomyConfig {
    #[serde(default)]
    pub reward: RewardConfig,
    #[serde(default)]
    pub inflation: InflationConfig,
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub season: SeasonConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

impl EconomyConfig {
    /// Standard ranked economy (default)
    pub fn standard() -> Self {
        Self::default()
    }

    /// More generous rewards, gentler market decay
    pub fn casual() -> Self {
        let mut cfg = Self::default();
        cfg.reward.base_match_coins = 180.0;
        cfg.reward.farming_floor = 0.85;
        cfg.market.base_decay = 0.98;
        cfg.market.min_multiplier = 0.95;
        cfg.season.base_threshold = 80.0;
        cfg
    }

    /// Scarcer rewards, stricter farming detection
    pub fn competitive() -> Self {
        let mut cfg = Self::default();
        cfg.reward.base_match_coins = 130.0;
        cfg.reward.suspicion_high = 0.6;
        cfg.reward.farming_decay = 0.93;
        cfg.inflation.coin_upper_band = 60_000.0;
        cfg.season.base_threshold = 120.0;
        cfg
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Reads the file named by `OF_ECONOMY_CONFIG_PATH`, falling back to the
    /// defaults when the variable is unset or empty.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let Ok(path) = env::var(CONFIG_PATH_ENV) else {
            return Ok(Self::default());
        };

        let path = path.trim();
        if path.is_empty() {
            return Ok(Self::default());
        }

        Self::load_from_path(path)
    }

    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_string(), source })?;
        let config = Self::from_json(&content)?;
        config.validate()?;
        tracing::info!(path, "loaded economy config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.reward;
        positive("reward.base_match_coins", r.base_match_coins)?;
        positive("reward.reference_match_minutes", r.reference_match_minutes)?;
        positive("reward.pis_reference", r.pis_reference)?;
        positive("reward.rank_bonus_divisor", r.rank_bonus_divisor)?;
        if r.diamond_min > r.diamond_max {
            return Err(invalid("reward.diamond_min", "must not exceed diamond_max"));
        }
        if !(0.0 < r.farming_floor && r.farming_floor <= r.farming_ceiling) {
            return Err(invalid("reward.farming_floor", "must be in (0, farming_ceiling]"));
        }
        if r.suspicion_low > r.suspicion_high {
            return Err(invalid("reward.suspicion_low", "must not exceed suspicion_high"));
        }

        let i = &self.inflation;
        within("inflation.cooldown_hours", i.cooldown_hours, 0, MAX_WINDOW_HOURS)?;
        if !(0.0..=1.0).contains(&i.max_step) {
            return Err(invalid("inflation.max_step", "must be within [0, 1]"));
        }
        if i.diamond_lower_band > i.diamond_upper_band {
            return Err(invalid("inflation.diamond_lower_band", "must not exceed upper band"));
        }

        let m = &self.market;
        if !(0.0 < m.min_multiplier && m.min_multiplier <= m.base_decay && m.base_decay <= 1.0) {
            return Err(invalid("market.base_decay", "requires 0 < min_multiplier <= base_decay <= 1"));
        }
        if !(0.0 < m.natural_decay && m.natural_decay <= 1.0) {
            return Err(invalid("market.natural_decay", "must be within (0, 1]"));
        }
        within("market.rapid_window_hours", m.rapid_window_hours, 0, MAX_WINDOW_HOURS)?;
        within("market.natural_decay_interval_hours", m.natural_decay_interval_hours, 1, MAX_WINDOW_HOURS)?;

        let s = &self.season;
        within("season.duration_days", s.duration_days, 1, MAX_SEASON_DAYS)?;
        if s.milestone_count == 0 {
            return Err(invalid("season.milestone_count", "must be positive"));
        }
        if s.stage_weight_base < 1.0 {
            return Err(invalid("season.stage_weight_base", "must be >= 1.0"));
        }

        within("sync.retry_interval_secs", self.sync.retry_interval_secs, 0, MAX_RETRY_INTERVAL_SECS)?;
        if self.sync.max_retries == 0 {
            return Err(invalid("sync.max_retries", "must be positive"));
        }
        if self.sync.queue_key == self.sync.dead_letter_key {
            return Err(invalid("sync.dead_letter_key", "must differ from queue_key"));
        }
        Ok(())
    }
}

fn within(field: &'static str, value: i64, min: i64, max: i64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, &format!("must be within [{min}, {max}], got {value}")))
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, &format!("must be positive, got {value}")))
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field, reason: reason.to_string() }
}

// ========== Tests ==========

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let cfg = EconomyConfig::default();
        assert!((cfg.reward.base_match_coins - 150.0).abs() < f64::EPSILON);
        assert_eq!(cfg.sync.max_retries, 3);
        assert_eq!(cfg.season.milestone_count, 10);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(EconomyConfig::casual().validate().is_ok());
        assert!(EconomyConfig::competitive().validate().is_ok());

        let competitive = EconomyConfig::competitive();
        assert!(competitive.reward.suspicion_high < EconomyConfig::standard().reward.suspicion_high);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg = EconomyConfig::from_json(r#"{"sync": {"max_retries": 5, "retry_interval_secs": 1,
            "queue_key": "q", "dead_letter_key": "dlq"}}"#)
        .unwrap();
        assert_eq!(cfg.sync.max_retries, 5);
        assert!((cfg.market.base_decay - 0.97).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut cfg = EconomyConfig::default();
        cfg.reward.diamond_min = 300;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid { field: "reward.diamond_min", .. })));

        let mut cfg = EconomyConfig::default();
        cfg.sync.dead_letter_key = cfg.sync.queue_key.clone();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_time_windows_bounded() {
        let field = |cfg: EconomyConfig| match cfg.validate() {
            Err(ConfigError::Invalid { field, .. }) => Some(field),
            _ => None,
        };

        let mut cfg = EconomyConfig::default();
        cfg.season.duration_days = i64::MAX;
        assert_eq!(field(cfg), Some("season.duration_days"));

        let mut cfg = EconomyConfig::default();
        cfg.inflation.cooldown_hours = i64::MAX;
        assert_eq!(field(cfg), Some("inflation.cooldown_hours"));

        let mut cfg = EconomyConfig::default();
        cfg.market.rapid_window_hours = -1;
        assert_eq!(field(cfg), Some("market.rapid_window_hours"));

        let mut cfg = EconomyConfig::default();
        cfg.market.natural_decay_interval_hours = i64::MAX;
        assert_eq!(field(cfg), Some("market.natural_decay_interval_hours"));

        let mut cfg = EconomyConfig::default();
        cfg.sync.retry_interval_secs = -5;
        assert_eq!(field(cfg), Some("sync.retry_interval_secs"));

        let mut cfg = EconomyConfig::default();
        cfg.sync.retry_interval_secs = i64::MAX;
        assert_eq!(field(cfg), Some("sync.retry_interval_secs"));
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"reward": {}}}"#, serde_json::to_string(&RewardConfig::default()).unwrap())
            .unwrap();
        let cfg = EconomyConfig::load_from_path(file.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.reward.diamond_max, 200);

        let missing = EconomyConfig::load_from_path("/nonexistent/economy.json");
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}

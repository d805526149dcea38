//! EconomyEngine
//!
//! Converts difficulty, clean play and match length into coins, and
//! performance/upset/late-game signals into ranked-only diamonds. Holds the
//! farming multiplier, which drifts between its floor and ceiling as
//! suspicious sessions come and go.

use crate::config::RewardConfig;
use crate::error::{ensure_non_negative, ensure_range, ValidationError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const SHORT_MATCH_MINUTES: f64 = 30.0;
const LOW_INPUT_VARIANCE: f64 = 0.3;
const LOW_ACTION_DIVERSITY: f64 = 0.4;
const LONG_SESSION_HOURS: f64 = 6.0;

/// Weighted farming suspicion in [0, 1].
pub fn farming_suspicion(
    match_duration_minutes: f64,
    input_variance: f64,
    action_diversity: f64,
    session_length_hours: f64,
) -> f64 {
    let mut suspicion = 0.0;
    if match_duration_minutes < SHORT_MATCH_MINUTES {
        suspicion += 0.2;
    }
    if input_variance < LOW_INPUT_VARIANCE {
        suspicion += 0.25;
    }
    if action_diversity < LOW_ACTION_DIVERSITY {
        suspicion += 0.25;
    }
    if session_length_hours > LONG_SESSION_HOURS {
        suspicion += 0.1;
    }
    f64::min(suspicion, 1.0)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomyEngine {
    config: RewardConfig,
    farming_diamond_multiplier: f64,
}

impl Default for EconomyEngine {
    fn default() -> Self {
        Self::new(RewardConfig::default())
    }
}

impl EconomyEngine {
    pub fn new(config: RewardConfig) -> Self {
        let farming_diamond_multiplier = config.farming_ceiling;
        Self { config, farming_diamond_multiplier }
    }

    pub fn farming_multiplier(&self) -> f64 {
        self.farming_diamond_multiplier
    }

    /// Coins for one match: `floor(base · difficulty · clean_play · length_factor)`.
    pub fn calculate_match_coins(
        &self,
        difficulty: f64,
        clean_play_modifier: f64,
        match_length_minutes: f64,
        is_farming_weak_ai: bool,
    ) -> Result<u64, ValidationError> {
        ensure_non_negative("difficulty", difficulty)?;
        ensure_range("clean_play_modifier", clean_play_modifier, 0.0, 1.0)?;
        ensure_non_negative("match_length_minutes", match_length_minutes)?;

        let difficulty_multiplier = if is_farming_weak_ai {
            difficulty * self.config.farming_difficulty_penalty
        } else {
            difficulty
        };
        let length_factor = (match_length_minutes / self.config.reference_match_minutes)
            .min(self.config.max_match_length_factor);

        let coins = (self.config.base_match_coins
            * difficulty_multiplier
            * clean_play_modifier
            * length_factor)
            .floor();
        Ok(coins as u64)
    }

    /// Diamonds for one match: 0 for friendlies, otherwise within
    /// `[diamond_min, diamond_max]`.
    pub fn calculate_diamonds(
        &self,
        performance_factor: f64,
        opponent_rank_gap: i64,
        match_importance: f64,
        match_time_minutes: f64,
        score_gap: u32,
        is_friendly: bool,
    ) -> Result<u32, ValidationError> {
        if is_friendly {
            return Ok(0);
        }
        ensure_range("performance_factor", performance_factor, 0.0, 1.0)?;
        ensure_range("match_importance", match_importance, 0.5, 1.5)?;
        ensure_non_negative("match_time_minutes", match_time_minutes)?;

        let cfg = &self.config;
        let mut diamonds = cfg.diamond_base + performance_factor * cfg.diamond_performance_weight;

        // Only beating a higher-ranked opponent earns the upset bonus.
        if opponent_rank_gap < 0 {
            let gap = opponent_rank_gap.unsigned_abs() as f64;
            diamonds += (gap / cfg.rank_bonus_divisor).min(cfg.rank_bonus_cap);
        }

        if match_time_minutes > cfg.late_game_minute && score_gap <= cfg.close_game_max_gap {
            diamonds += match_importance * cfg.importance_bonus_weight;
        }

        let scaled = (diamonds * self.farming_diamond_multiplier).floor();
        Ok((scaled as u32).clamp(cfg.diamond_min, cfg.diamond_max))
    }

    /// Feeds one match into the farming detector and returns the new multiplier.
    ///
    /// Suspicion in (low, high] leaves the multiplier where it is.
    pub fn update_farming_multiplier(
        &mut self,
        match_duration_minutes: f64,
        input_variance: f64,
        action_diversity: f64,
        session_length_hours: f64,
    ) -> Result<f64, ValidationError> {
        ensure_non_negative("match_duration_minutes", match_duration_minutes)?;
        ensure_range("input_variance", input_variance, 0.0, 1.0)?;
        ensure_range("action_diversity", action_diversity, 0.0, 1.0)?;
        ensure_non_negative("session_length_hours", session_length_hours)?;

        let suspicion = farming_suspicion(
            match_duration_minutes,
            input_variance,
            action_diversity,
            session_length_hours,
        );

        let previous = self.farming_diamond_multiplier;
        if suspicion > self.config.suspicion_high {
            self.farming_diamond_multiplier =
                (previous * self.config.farming_decay).max(self.config.farming_floor);
        } else if suspicion < self.config.suspicion_low {
            self.farming_diamond_multiplier =
                (previous * self.config.farming_recovery).min(self.config.farming_ceiling);
        }

        if self.farming_diamond_multiplier != previous {
            info!(
                suspicion,
                from = previous,
                to = self.farming_diamond_multiplier,
                "farming multiplier changed"
            );
        } else {
            debug!(suspicion, multiplier = previous, "farming multiplier unchanged");
        }
        Ok(self.farming_diamond_multiplier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_match_coins() {
        let engine = EconomyEngine::default();
        assert_eq!(engine.calculate_match_coins(1.0, 1.0, 90.0, false).unwrap(), 150);
    }

    #[test]
    fn test_coin_modifiers() {
        let engine = EconomyEngine::default();
        // Farming penalty: floor(150 * 0.98)
        assert_eq!(engine.calculate_match_coins(1.0, 1.0, 90.0, true).unwrap(), 147);
        // Length factor capped at 1.5
        assert_eq!(engine.calculate_match_coins(1.0, 1.0, 400.0, false).unwrap(), 225);
        // Half match, half clean play
        assert_eq!(engine.calculate_match_coins(1.0, 0.5, 45.0, false).unwrap(), 37);
        assert!(engine.calculate_match_coins(f64::NAN, 1.0, 90.0, false).is_err());
        assert!(engine.calculate_match_coins(1.0, 1.0, -5.0, false).is_err());
    }

    #[test]
    fn test_friendly_never_awards_diamonds() {
        let engine = EconomyEngine::default();
        assert_eq!(engine.calculate_diamonds(1.0, -5000, 1.5, 90.0, 0, true).unwrap(), 0);
        // Even garbage input is irrelevant for friendlies.
        assert_eq!(engine.calculate_diamonds(f64::NAN, 0, 0.0, -1.0, 9, true).unwrap(), 0);
    }

    #[test]
    fn test_diamond_components() {
        let engine = EconomyEngine::default();
        // Base only
        assert_eq!(engine.calculate_diamonds(0.0, 0, 1.0, 60.0, 3, false).unwrap(), 100);
        // Performance
        assert_eq!(engine.calculate_diamonds(0.5, 0, 1.0, 60.0, 3, false).unwrap(), 125);
        // Upset bonus capped at 20; beating a weaker side earns nothing
        assert_eq!(engine.calculate_diamonds(0.0, -50_000, 1.0, 60.0, 3, false).unwrap(), 120);
        assert_eq!(engine.calculate_diamonds(0.0, 50_000, 1.0, 60.0, 3, false).unwrap(), 100);
        // Late close game
        assert_eq!(engine.calculate_diamonds(0.0, 0, 1.0, 80.0, 1, false).unwrap(), 115);
        assert_eq!(engine.calculate_diamonds(0.0, 0, 1.0, 80.0, 2, false).unwrap(), 100);
        // Everything at once is clamped
        assert_eq!(engine.calculate_diamonds(1.0, -50_000, 1.5, 90.0, 0, false).unwrap(), 192);
    }

    #[test]
    fn test_farming_multiplier_hysteresis() {
        let mut engine = EconomyEngine::default();

        // 0.2 + 0.25 + 0.25 + 0.1 = 0.8 > 0.7
        let m = engine.update_farming_multiplier(10.0, 0.1, 0.1, 8.0).unwrap();
        assert!((m - 0.95).abs() < 1e-9);

        // 0.45 suspicion: unchanged
        let m = engine.update_farming_multiplier(10.0, 0.1, 0.9, 1.0).unwrap();
        assert!((m - 0.95).abs() < 1e-9);

        // Clean session recovers, never past 1.0
        for _ in 0..10 {
            engine.update_farming_multiplier(90.0, 0.9, 0.9, 1.0).unwrap();
        }
        assert_eq!(engine.farming_multiplier(), 1.0);
    }

    #[test]
    fn test_farming_multiplier_floor() {
        let mut engine = EconomyEngine::default();
        let mut previous = engine.farming_multiplier();
        for _ in 0..50 {
            let m = engine.update_farming_multiplier(5.0, 0.0, 0.0, 10.0).unwrap();
            assert!(m <= previous);
            assert!(m >= 0.75);
            previous = m;
        }
        assert!((engine.farming_multiplier() - 0.75).abs() < 1e-9);

        // Floored multiplier still lands inside the clamp.
        assert_eq!(engine.calculate_diamonds(0.0, 0, 1.0, 60.0, 3, false).unwrap(), 100);
    }
}

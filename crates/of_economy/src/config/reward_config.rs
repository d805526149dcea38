//! Match reward tuning (coins, diamonds, farming dampening)

use serde::{Deserialize, Serialize};

/// Coin/diamond reward parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    // === Coins ===
    /// Coins for a full-length match at difficulty 1.0 (default: 150)
    pub base_match_coins: f64,
    /// Difficulty multiplier applied when farming weak AI is flagged (default: 0.98)
    pub farming_difficulty_penalty: f64,
    /// Match length that yields a length factor of 1.0 (default: 90)
    pub reference_match_minutes: f64,
    /// Cap on the match length factor (default: 1.5)
    pub max_match_length_factor: f64,

    // === Diamonds ===
    pub diamond_base: f64,
    /// Weight of the [0,1] performance factor (default: 50)
    pub diamond_performance_weight: f64,
    pub diamond_min: u32,
    pub diamond_max: u32,
    /// Rank gap divisor for the upset bonus (default: 1000)
    pub rank_bonus_divisor: f64,
    pub rank_bonus_cap: f64,
    /// Importance weight for late close games (default: 15)
    pub importance_bonus_weight: f64,
    /// Minute after which a close game earns the importance bonus (default: 75)
    pub late_game_minute: f64,
    pub close_game_max_gap: u32,
    /// PIS mapped to a performance factor of 1.0 (default: 200)
    pub pis_reference: f64,

    // === Farming ===
    pub farming_floor: f64,
    pub farming_ceiling: f64,
    /// Multiplier step while suspicion is high (default: 0.95)
    pub farming_decay: f64,
    /// Multiplier step while suspicion is low (default: 1.02)
    pub farming_recovery: f64,
    pub suspicion_high: f64,
    pub suspicion_low: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            base_match_coins: 150.0,
            farming_difficulty_penalty: 0.98,
            reference_match_minutes: 90.0,
            max_match_length_factor: 1.5,

            diamond_base: 100.0,
            diamond_performance_weight: 50.0,
            diamond_min: 100,
            diamond_max: 200,
            rank_bonus_divisor: 1000.0,
            rank_bonus_cap: 20.0,
            importance_bonus_weight: 15.0,
            late_game_minute: 75.0,
            close_game_max_gap: 1,
            pis_reference: 200.0,

            farming_floor: 0.75,
            farming_ceiling: 1.0,
            farming_decay: 0.95,
            farming_recovery: 1.02,
            suspicion_high: 0.7,
            suspicion_low: 0.3,
        }
    }
}

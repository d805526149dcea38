//! Anti-inflation controller tuning

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InflationConfig {
    /// Minimum time between two adjustments (default: 24h)
    pub cooldown_hours: i64,
    /// Average coins per player above which forge costs rise (default: 80000)
    pub coin_upper_band: f64,
    /// Average diamonds per player below which the diamond side eases back
    /// toward neutral (default: 2000)
    pub diamond_lower_band: f64,
    /// Average diamonds per player above which premium costs rise (default: 3500)
    pub diamond_upper_band: f64,
    /// Largest relative move of one multiplier per evaluation (default: 0.05)
    pub max_step: f64,
    pub recycler_floor: f64,
    /// Market velocity that triggers the extra premium nudge (default: 0.8)
    pub market_velocity_threshold: f64,
    pub market_velocity_nudge: f64,
    /// Per-call step back toward 1.0 in `reset_weekly_if_needed` (default: 0.01)
    pub reversion_step: f64,
    /// Also pull premium/recycler multipliers back toward 1.0
    pub revert_diamond_side: bool,
    /// Health report warns when average diamonds fall below this (default: 1500)
    pub low_diamond_warning: f64,
}

impl Default for InflationConfig {
    fn default() -> Self {
        Self {
            cooldown_hours: 24,
            coin_upper_band: 80_000.0,
            diamond_lower_band: 2_000.0,
            diamond_upper_band: 3_500.0,
            max_step: 0.05,
            recycler_floor: 0.95,
            market_velocity_threshold: 0.8,
            market_velocity_nudge: 0.01,
            reversion_step: 0.01,
            revert_diamond_side: true,
            low_diamond_warning: 1_500.0,
        }
    }
}

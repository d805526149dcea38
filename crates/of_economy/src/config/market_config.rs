use serde::{Deserialize, Serialize};

/// Player market decay parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Decay applied on every sale (default: 0.97)
    pub base_decay: f64,
    /// Extra decay per consecutive rapid sale (default: 0.005)
    pub consecutive_step: f64,
    /// Lowest per-sale multiplier (default: 0.93)
    pub min_multiplier: f64,
    /// Sales closer together than this count as consecutive (default: 24h)
    pub rapid_window_hours: i64,
    /// Idle decay per natural-decay pass (default: 0.9999)
    pub natural_decay: f64,
    pub natural_decay_interval_hours: i64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            base_decay: 0.97,
            consecutive_step: 0.005,
            min_multiplier: 0.93,
            rapid_window_hours: 24,
            natural_decay: 0.9999,
            natural_decay_interval_hours: 1,
        }
    }
}

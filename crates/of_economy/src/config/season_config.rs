use serde::{Deserialize, Serialize};

/// Season window and milestone ladder parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonConfig {
    pub duration_days: i64,
    pub milestone_count: u32,
    /// Base threshold of the ladder (default: 100)
    pub base_threshold: f64,
    /// Linear growth of the base threshold per id (default: 0.3)
    pub threshold_growth: f64,
    /// Geometric stage weight base (default: 1.5)
    pub stage_weight_base: f64,
    /// Reserved tuning knob, currently 1.0
    pub difficulty_scaling: f64,
    pub milestone_coin_base: f64,
    pub diamonds_per_stage: u32,
    /// Milestone ids that also grant a cosmetic
    pub cosmetic_milestones: Vec<u32>,
}

impl Default for SeasonConfig {
    fn default() -> Self {
        Self {
            duration_days: 30,
            milestone_count: 10,
            base_threshold: 100.0,
            threshold_growth: 0.3,
            stage_weight_base: 1.5,
            difficulty_scaling: 1.0,
            milestone_coin_base: 250.0,
            diamonds_per_stage: 10,
            cosmetic_milestones: vec![5, 10],
        }
    }
}

//! AntiInflationSystem
//!
//! Daily feedback controller over population-wide currency averages. Each
//! evaluation may move a multiplier by at most `max_step` of its own current
//! value; evaluations inside the cooldown are no-ops.

use crate::config::InflationConfig;
use crate::error::{ensure_non_negative, ensure_range, ValidationError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Population summary fed in by the external aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InflationMetrics {
    pub average_coins_per_player: f64,
    pub average_diamonds_per_player: f64,
    /// Share of listed players that changed hands recently, [0, 1]
    pub market_velocity: f64,
    #[serde(default)]
    pub active_players: u64,
}

impl InflationMetrics {
    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_non_negative("average_coins_per_player", self.average_coins_per_player)?;
        ensure_non_negative("average_diamonds_per_player", self.average_diamonds_per_player)?;
        ensure_range("market_velocity", self.market_velocity, 0.0, 1.0)?;
        Ok(())
    }
}

/// Cost/efficiency multipliers around 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EconomyAdjustments {
    pub forge_cost_multiplier: f64,
    pub premium_pack_cost_multiplier: f64,
    pub recycler_efficiency_multiplier: f64,
}

impl Default for EconomyAdjustments {
    fn default() -> Self {
        Self {
            forge_cost_multiplier: 1.0,
            premium_pack_cost_multiplier: 1.0,
            recycler_efficiency_multiplier: 1.0,
        }
    }
}

impl EconomyAdjustments {
    /// Match coins shrink as forge costs rise.
    pub fn coin_reward_factor(&self) -> f64 {
        1.0 / self.forge_cost_multiplier
    }

    /// Match diamonds shrink as premium pack costs rise.
    pub fn diamond_reward_factor(&self) -> f64 {
        1.0 / self.premium_pack_cost_multiplier
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AntiInflationSystem {
    config: InflationConfig,
    adjustments: EconomyAdjustments,
    last_adjustment_time: Option<DateTime<Utc>>,
}

impl Default for AntiInflationSystem {
    fn default() -> Self {
        Self::new(InflationConfig::default())
    }
}

impl AntiInflationSystem {
    pub fn new(config: InflationConfig) -> Self {
        Self { config, adjustments: EconomyAdjustments::default(), last_adjustment_time: None }
    }

    pub fn current_adjustments(&self) -> EconomyAdjustments {
        self.adjustments
    }

    pub fn last_adjustment_time(&self) -> Option<DateTime<Utc>> {
        self.last_adjustment_time
    }

    pub fn config(&self) -> &InflationConfig {
        &self.config
    }

    pub fn evaluate_and_adjust(
        &mut self,
        metrics: &InflationMetrics,
    ) -> Result<EconomyAdjustments, ValidationError> {
        self.evaluate_and_adjust_at(metrics, Utc::now())
    }

    /// Returns the current adjustments untouched while the cooldown runs.
    pub fn evaluate_and_adjust_at(
        &mut self,
        metrics: &InflationMetrics,
        now: DateTime<Utc>,
    ) -> Result<EconomyAdjustments, ValidationError> {
        metrics.validate()?;

        if let Some(last) = self.last_adjustment_time {
            if now - last < Duration::hours(self.config.cooldown_hours) {
                debug!(since_last_secs = (now - last).num_seconds(), "inflation evaluation on cooldown");
                return Ok(self.adjustments);
            }
        }

        let cfg = &self.config;
        let cap = 1.0 + cfg.max_step;
        let mut next = self.adjustments;

        if metrics.average_coins_per_player > cfg.coin_upper_band {
            let excess = (metrics.average_coins_per_player - cfg.coin_upper_band) / cfg.coin_upper_band;
            let adjustment = 1.0 + excess.min(cfg.max_step);
            let current = next.forge_cost_multiplier;
            next.forge_cost_multiplier = (current * adjustment).min(current * cap);
        }

        if metrics.average_diamonds_per_player > cfg.diamond_upper_band {
            let excess =
                (metrics.average_diamonds_per_player - cfg.diamond_upper_band) / cfg.diamond_upper_band;
            let step = excess.min(cfg.max_step);

            let current = next.premium_pack_cost_multiplier;
            next.premium_pack_cost_multiplier = (current * (1.0 + step)).min(current * cap);
            next.recycler_efficiency_multiplier =
                (next.recycler_efficiency_multiplier * (1.0 - step)).max(cfg.recycler_floor);
        } else if metrics.average_diamonds_per_player < cfg.diamond_lower_band {
            // Scarce diamonds: ease the diamond side back toward neutral.
            next.premium_pack_cost_multiplier =
                (next.premium_pack_cost_multiplier * (1.0 - cfg.max_step)).max(1.0);
            next.recycler_efficiency_multiplier =
                (next.recycler_efficiency_multiplier * (1.0 + cfg.max_step)).min(1.0);
        }

        if metrics.market_velocity > cfg.market_velocity_threshold {
            next.premium_pack_cost_multiplier *= 1.0 + cfg.market_velocity_nudge;
        }

        if next != self.adjustments {
            info!(
                forge = next.forge_cost_multiplier,
                premium = next.premium_pack_cost_multiplier,
                recycler = next.recycler_efficiency_multiplier,
                avg_coins = metrics.average_coins_per_player,
                avg_diamonds = metrics.average_diamonds_per_player,
                "economy adjustments updated"
            );
        }

        self.adjustments = next;
        self.last_adjustment_time = Some(now);
        Ok(self.adjustments)
    }

    /// Pulls multipliers one `reversion_step` back toward 1.0.
    ///
    /// The forge multiplier always reverts; the diamond side (premium pack,
    /// recycler) only when `revert_diamond_side` is set.
    pub fn reset_weekly_if_needed(&mut self) -> EconomyAdjustments {
        let step = self.config.reversion_step;
        let adj = &mut self.adjustments;

        if adj.forge_cost_multiplier > 1.0 {
            adj.forge_cost_multiplier = (adj.forge_cost_multiplier * (1.0 - step)).max(1.0);
        }

        if self.config.revert_diamond_side {
            if adj.premium_pack_cost_multiplier > 1.0 {
                adj.premium_pack_cost_multiplier =
                    (adj.premium_pack_cost_multiplier * (1.0 - step)).max(1.0);
            }
            if adj.recycler_efficiency_multiplier < 1.0 {
                adj.recycler_efficiency_multiplier =
                    (adj.recycler_efficiency_multiplier * (1.0 + step)).min(1.0);
            }
        }

        self.adjustments
    }
}

//! Performance Index Score (PIS)
//!
//! Collapses one match's telemetry into a single non-negative number that
//! feeds season progression and the diamond performance factor.
//!
//! ```text
//! PIS = result·importance·100 + skill·50 + rank·30 + participation·20
//! ```

use crate::error::ValidationError;
use crate::metrics::{MatchOutcome, MatchPerformanceMetrics};
use serde::{Deserialize, Serialize};

const RESULT_SCALE: f64 = 100.0;
const SKILL_SCALE: f64 = 50.0;
const RANK_SCALE: f64 = 30.0;
const PARTICIPATION_SCALE: f64 = 20.0;

const SPAM_THRESHOLD: f64 = 0.4;
const SPRINT_SPAM_PENALTY: f64 = 0.85;
const LONG_BALL_SPAM_PENALTY: f64 = 0.90;
const FOUL_RATE_THRESHOLD: f64 = 0.5;
const FOUL_PENALTY: f64 = 0.88;
const POSSESSION_BONUS: f64 = 1.05;
const POSSESSION_BONUS_WINDOW: f64 = 0.2;
/// Diversity (max 1.05) times possession bonus (1.05).
pub const MAX_PERFORMANCE_QUALITY: f64 = 1.1025;

/// Rank points that move the rank factor by 1.0.
const RANK_GAP_DIVISOR: f64 = 5000.0;
const WEAKER_OPPONENT_BASE: f64 = 0.8;
const WEAKER_OPPONENT_BONUS_CAP: f64 = 0.1;
const STRONGER_OPPONENT_BONUS_CAP: f64 = 0.3;

/// Individual PIS terms, mostly for dashboards and debugging.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PisBreakdown {
    pub result_weight: f64,
    pub performance_quality: f64,
    pub skill_weight: f64,
    pub rank_difference_factor: f64,
    pub event_participation_weight: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PerformanceIndexScoreEngine;

impl PerformanceIndexScoreEngine {
    pub fn new() -> Self {
        Self
    }

    /// PIS of one match, always `>= 0`.
    pub fn calculate_pis(&self, metrics: &MatchPerformanceMetrics) -> Result<f64, ValidationError> {
        Ok(self.breakdown(metrics)?.total)
    }

    pub fn breakdown(&self, metrics: &MatchPerformanceMetrics) -> Result<PisBreakdown, ValidationError> {
        metrics.validate()?;

        let result_weight = result_weight(metrics.result);
        let performance_quality = performance_quality(metrics);
        let skill_weight = metrics.shot_accuracy * 0.5 + performance_quality * 0.5;
        let rank_difference_factor = rank_difference_factor(metrics.player_rank, metrics.opponent_rank);
        let event_participation_weight =
            (metrics.defensive_actions as f64 * 0.1 + metrics.clean_tackles as f64 * 0.2) / 100.0;

        let total = (result_weight * metrics.match_importance * RESULT_SCALE
            + skill_weight * SKILL_SCALE
            + rank_difference_factor * RANK_SCALE
            + event_participation_weight * PARTICIPATION_SCALE)
            .max(0.0);

        Ok(PisBreakdown {
            result_weight,
            performance_quality,
            skill_weight,
            rank_difference_factor,
            event_participation_weight,
            total,
        })
    }
}

pub fn result_weight(result: MatchOutcome) -> f64 {
    match result {
        MatchOutcome::Win => 1.0,
        MatchOutcome::Draw => 0.6,
        MatchOutcome::Loss => 0.3,
    }
}

fn performance_quality(metrics: &MatchPerformanceMetrics) -> f64 {
    let mut quality = 1.0;

    if metrics.sprint_spam_rate > SPAM_THRESHOLD {
        quality *= SPRINT_SPAM_PENALTY;
    }
    if metrics.long_ball_spam_rate > SPAM_THRESHOLD {
        quality *= LONG_BALL_SPAM_PENALTY;
    }
    if metrics.fouls_per_minute() > FOUL_RATE_THRESHOLD {
        quality *= FOUL_PENALTY;
    }

    quality *= 0.95 + metrics.skill_diversity * 0.1;

    if (metrics.possession_balance - 0.5).abs() < POSSESSION_BONUS_WINDOW {
        quality *= POSSESSION_BONUS;
    }

    quality.clamp(0.0, MAX_PERFORMANCE_QUALITY)
}

/// 1.0 without rank data; [0.8, 0.9] against weaker, [1.0, 1.3] against stronger.
pub fn rank_difference_factor(player_rank: Option<i64>, opponent_rank: Option<i64>) -> f64 {
    let (Some(player), Some(opponent)) = (player_rank, opponent_rank) else {
        return 1.0;
    };

    let gap = player.abs_diff(opponent) as f64 / RANK_GAP_DIVISOR;
    match player.cmp(&opponent) {
        std::cmp::Ordering::Greater => WEAKER_OPPONENT_BASE + gap.min(WEAKER_OPPONENT_BONUS_CAP),
        std::cmp::Ordering::Less => 1.0 + gap.min(STRONGER_OPPONENT_BONUS_CAP),
        std::cmp::Ordering::Equal => 1.0,
    }
}

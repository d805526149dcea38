use crate::error::ValidationError;
use crate::metrics::MatchPerformanceMetrics;

pub const MIN_CLEAN_PLAY_MODIFIER: f64 = 0.5;

/// Clean-play coin modifier in [0.5, 1.0].
///
/// Penalises fouling, lopsided possession and one-trick play independently of
/// the match result.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanPlayEvaluator;

impl CleanPlayEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate_clean_play(&self, metrics: &MatchPerformanceMetrics) -> Result<f64, ValidationError> {
        metrics.validate()?;

        let mut modifier: f64 = 1.0;

        let fouls_per_minute = metrics.fouls_per_minute();
        if fouls_per_minute > 1.0 {
            modifier *= 0.8;
        } else if fouls_per_minute > 0.5 {
            modifier *= 0.9;
        }

        if (metrics.possession_balance - 0.5).abs() > 0.3 {
            modifier *= 0.95;
        }

        if metrics.skill_diversity < 0.3 {
            modifier *= 0.85;
        }

        Ok(modifier.clamp(MIN_CLEAN_PLAY_MODIFIER, 1.0))
    }
}

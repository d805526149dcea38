//! Per-match telemetry consumed by the scoring engines.

use crate::error::{ensure_non_negative, ensure_range, ensure_rank, ValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchOutcome {
    Win,
    Draw,
    Loss,
}

impl MatchOutcome {
    pub fn from_score(goals_for: u32, goals_against: u32) -> Self {
        match goals_for.cmp(&goals_against) {
            std::cmp::Ordering::Greater => MatchOutcome::Win,
            std::cmp::Ordering::Equal => MatchOutcome::Draw,
            std::cmp::Ordering::Less => MatchOutcome::Loss,
        }
    }
}

/// Raw telemetry of one completed match.
///
/// Ratio fields are expected in [0,1]; [`validate`](Self::validate) rejects
/// anything else instead of clamping it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchPerformanceMetrics {
    pub result: MatchOutcome,
    /// 0.5 (friendly-level) to 1.5 (final-level)
    pub match_importance: f64,
    pub shot_accuracy: f64,
    pub defensive_actions: u32,
    /// 0.5 = even possession
    pub possession_balance: f64,
    pub clean_tackles: u32,
    pub fouls: u32,
    pub sprint_spam_rate: f64,
    pub long_ball_spam_rate: f64,
    pub skill_diversity: f64,
    #[serde(default)]
    pub opponent_rank: Option<i64>,
    #[serde(default)]
    pub player_rank: Option<i64>,
    /// Seconds
    pub match_duration: f64,
    #[serde(default)]
    pub goals_for: Option<u32>,
    #[serde(default)]
    pub goals_against: Option<u32>,
}

impl MatchPerformanceMetrics {
    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_range("match_importance", self.match_importance, 0.5, 1.5)?;
        ensure_range("shot_accuracy", self.shot_accuracy, 0.0, 1.0)?;
        ensure_range("possession_balance", self.possession_balance, 0.0, 1.0)?;
        ensure_range("sprint_spam_rate", self.sprint_spam_rate, 0.0, 1.0)?;
        ensure_range("long_ball_spam_rate", self.long_ball_spam_rate, 0.0, 1.0)?;
        ensure_range("skill_diversity", self.skill_diversity, 0.0, 1.0)?;
        ensure_non_negative("match_duration", self.match_duration)?;
        if self.match_duration == 0.0 {
            return Err(ValidationError::ZeroDuration);
        }
        if let Some(rank) = self.player_rank {
            ensure_rank("player_rank", rank)?;
        }
        if let Some(rank) = self.opponent_rank {
            ensure_rank("opponent_rank", rank)?;
        }
        Ok(())
    }

    pub fn duration_minutes(&self) -> f64 {
        self.match_duration / 60.0
    }

    pub fn fouls_per_minute(&self) -> f64 {
        self.fouls as f64 / self.duration_minutes()
    }

    /// Absolute goal difference, 0 when the score was not reported.
    pub fn score_gap(&self) -> u32 {
        match (self.goals_for, self.goals_against) {
            (Some(f), Some(a)) => f.abs_diff(a),
            _ => 0,
        }
    }

    /// Proxy for input variety: the less spam, the more varied the input.
    pub fn input_variance(&self) -> f64 {
        1.0 - self.sprint_spam_rate.max(self.long_ball_spam_rate)
    }
}

impl Default for MatchPerformanceMetrics {
    fn default() -> Self {
        Self {
            result: MatchOutcome::Draw,
            match_importance: 1.0,
            shot_accuracy: 0.0,
            defensive_actions: 0,
            possession_balance: 0.5,
            clean_tackles: 0,
            fouls: 0,
            sprint_spam_rate: 0.0,
            long_ball_spam_rate: 0.0,
            skill_diversity: 0.5,
            opponent_rank: None,
            player_rank: None,
            match_duration: 90.0 * 60.0,
            goals_for: None,
            goals_against: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_score() {
        assert_eq!(MatchOutcome::from_score(2, 1), MatchOutcome::Win);
        assert_eq!(MatchOutcome::from_score(0, 0), MatchOutcome::Draw);
        assert_eq!(MatchOutcome::from_score(0, 3), MatchOutcome::Loss);
    }

    #[test]
    fn test_validation() {
        let metrics = MatchPerformanceMetrics::default();
        assert!(metrics.validate().is_ok());

        let bad = MatchPerformanceMetrics { shot_accuracy: 1.2, ..Default::default() };
        assert!(matches!(
            bad.validate(),
            Err(ValidationError::OutOfRange { field: "shot_accuracy", .. })
        ));

        let nan = MatchPerformanceMetrics { sprint_spam_rate: f64::NAN, ..Default::default() };
        assert!(matches!(nan.validate(), Err(ValidationError::NotFinite { .. })));

        let zero = MatchPerformanceMetrics { match_duration: 0.0, ..Default::default() };
        assert_eq!(zero.validate(), Err(ValidationError::ZeroDuration));

        let negative = MatchPerformanceMetrics { match_duration: -60.0, ..Default::default() };
        assert!(matches!(negative.validate(), Err(ValidationError::Negative { .. })));
    }

    #[test]
    fn test_extreme_ranks_rejected() {
        let extreme = MatchPerformanceMetrics {
            player_rank: Some(i64::MAX),
            opponent_rank: Some(-1),
            ..Default::default()
        };
        assert!(matches!(
            extreme.validate(),
            Err(ValidationError::OutOfRange { field: "player_rank", .. })
        ));

        let ranked = MatchPerformanceMetrics {
            player_rank: Some(0),
            opponent_rank: Some(crate::error::MAX_RANK),
            ..Default::default()
        };
        assert!(ranked.validate().is_ok());
    }

    #[test]
    fn test_derived_values() {
        let metrics = MatchPerformanceMetrics {
            fouls: 45,
            goals_for: Some(1),
            goals_against: Some(3),
            sprint_spam_rate: 0.2,
            long_ball_spam_rate: 0.6,
            ..Default::default()
        };
        assert!((metrics.fouls_per_minute() - 0.5).abs() < 1e-9);
        assert_eq!(metrics.score_gap(), 2);
        assert!((metrics.input_variance() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_json_uses_screaming_case_results() {
        let json = r#"{"result":"WIN","match_importance":1.0,"shot_accuracy":0.5,
            "defensive_actions":3,"possession_balance":0.5,"clean_tackles":2,"fouls":1,
            "sprint_spam_rate":0.1,"long_ball_spam_rate":0.1,"skill_diversity":0.6,
            "match_duration":5400}"#;
        let metrics: MatchPerformanceMetrics = serde_json::from_str(json).unwrap();
        assert_eq!(metrics.result, MatchOutcome::Win);
        assert!(metrics.player_rank.is_none());
    }
}

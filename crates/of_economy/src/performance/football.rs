//! FootballEconomyMetricsEngine
//!
//! Football-specific front end for the PIS pipeline. Turns box-score style
//! statistics (goals, clean sheets, tackles, xG) into a per-position rating,
//! a match importance, morale and form, and can lower a stat line into a
//! [`MatchPerformanceMetrics`] record.

use crate::error::{ensure_non_negative, ensure_range, ValidationError};
use crate::metrics::{MatchOutcome, MatchPerformanceMetrics};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Ratings kept for the form calculation.
pub const FORM_WINDOW: usize = 5;
const NEUTRAL_RATING: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerRole {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompetitionType {
    Friendly,
    League,
    Cup,
    Continental,
}

/// Box-score statistics of one player in one match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FootballMatchStats {
    pub minutes_played: f64,
    pub goals: u32,
    pub assists: u32,
    pub shots: u32,
    pub shots_on_target: u32,
    pub expected_goals: f64,
    pub tackles_attempted: u32,
    pub tackles_won: u32,
    pub interceptions: u32,
    pub saves: u32,
    pub passes_attempted: u32,
    pub passes_completed: u32,
    pub fouls_committed: u32,
    pub team_goals: u32,
    pub opponent_goals: u32,
    /// Share of possession held by the player's team
    pub possession: f64,
}

impl FootballMatchStats {
    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_non_negative("minutes_played", self.minutes_played)?;
        if self.minutes_played == 0.0 {
            return Err(ValidationError::ZeroDuration);
        }
        ensure_non_negative("expected_goals", self.expected_goals)?;
        ensure_range("possession", self.possession, 0.0, 1.0)?;
        Ok(())
    }

    pub fn clean_sheet(&self) -> bool {
        self.opponent_goals == 0
    }

    pub fn outcome(&self) -> MatchOutcome {
        MatchOutcome::from_score(self.team_goals, self.opponent_goals)
    }

    fn pass_accuracy(&self) -> f64 {
        ratio(self.passes_completed, self.passes_attempted)
    }
}

/// Where and what the match was played for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchContext {
    pub competition: CompetitionType,
    /// 0.0 = opening round, 1.0 = final / last matchday
    pub stage: f64,
    pub is_derby: bool,
    /// League table distance to the opponent (positions)
    #[serde(default)]
    pub table_gap: u32,
}

impl Default for MatchContext {
    fn default() -> Self {
        Self { competition: CompetitionType::League, stage: 0.0, is_derby: false, table_gap: 0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FootballEconomyMetricsEngine {
    morale: f64,
    recent_ratings: VecDeque<f64>,
}

impl Default for FootballEconomyMetricsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FootballEconomyMetricsEngine {
    pub fn new() -> Self {
        Self { morale: NEUTRAL_RATING, recent_ratings: VecDeque::with_capacity(FORM_WINDOW) }
    }

    pub fn morale(&self) -> f64 {
        self.morale
    }

    /// Position-weighted match rating in [0, 100].
    pub fn calculate_performance(
        &self,
        role: PlayerRole,
        stats: &FootballMatchStats,
    ) -> Result<f64, ValidationError> {
        stats.validate()?;

        let goals = stats.goals as f64;
        let assists = stats.assists as f64;
        let defensive = (stats.tackles_won + stats.interceptions) as f64;
        let finishing = goals - stats.expected_goals;
        let shot_quality = ratio(stats.shots_on_target, stats.shots);
        let clean_sheet = if stats.clean_sheet() { 1.0 } else { 0.0 };
        let conceded = stats.opponent_goals as f64;

        let mut rating = NEUTRAL_RATING;
        rating += match role {
            PlayerRole::Goalkeeper => {
                stats.saves as f64 * 3.0 + clean_sheet * 15.0 - conceded * 5.0
            }
            PlayerRole::Defender => {
                defensive * 2.0 + clean_sheet * 10.0 - conceded * 3.0 + goals * 8.0 + assists * 5.0
            }
            PlayerRole::Midfielder => {
                defensive * 1.2 + goals * 9.0 + assists * 7.0 + stats.pass_accuracy() * 10.0
            }
            PlayerRole::Forward => {
                goals * 10.0 + assists * 6.0 + finishing * 5.0 + shot_quality * 6.0
            }
        };
        rating -= stats.fouls_committed as f64 * 1.5;

        // Scale short cameos toward neutral.
        let involvement = (stats.minutes_played / 90.0).min(1.0);
        rating = NEUTRAL_RATING + (rating - NEUTRAL_RATING) * involvement;

        Ok(rating.clamp(0.0, 100.0))
    }

    /// Match importance in [0.5, 1.5].
    pub fn calculate_importance(&self, context: &MatchContext) -> Result<f64, ValidationError> {
        ensure_range("stage", context.stage, 0.0, 1.0)?;

        let base = match context.competition {
            CompetitionType::Friendly => 0.5,
            CompetitionType::League => 0.9,
            CompetitionType::Cup => 1.0,
            CompetitionType::Continental => 1.1,
        };
        let stage_bonus = if context.competition == CompetitionType::Friendly {
            0.0
        } else {
            context.stage * 0.3
        };
        let derby_bonus = if context.is_derby { 0.1 } else { 0.0 };
        // Six-pointers between neighbours in the table matter more.
        let table_bonus = if context.competition == CompetitionType::League && context.table_gap <= 3 {
            0.05
        } else {
            0.0
        };

        Ok((base + stage_bonus + derby_bonus + table_bonus).clamp(0.5, 1.5))
    }

    /// Moves morale toward the rating and by the result; returns the new morale in [0, 100].
    pub fn update_morale(&mut self, outcome: MatchOutcome, rating: f64) -> Result<f64, ValidationError> {
        ensure_range("rating", rating, 0.0, 100.0)?;

        let result_delta = match outcome {
            MatchOutcome::Win => 5.0,
            MatchOutcome::Draw => 0.0,
            MatchOutcome::Loss => -5.0,
        };
        let rating_delta = (rating - NEUTRAL_RATING) * 0.1;

        self.morale = (self.morale + result_delta + rating_delta).clamp(0.0, 100.0);
        Ok(self.morale)
    }

    /// Records a rating and returns the recency-weighted form over the last
    /// [`FORM_WINDOW`] matches.
    pub fn record_rating(&mut self, rating: f64) -> Result<f64, ValidationError> {
        ensure_range("rating", rating, 0.0, 100.0)?;
        if self.recent_ratings.len() == FORM_WINDOW {
            self.recent_ratings.pop_front();
        }
        self.recent_ratings.push_back(rating);
        Ok(self.form())
    }

    /// Weighted average with weights 1..=n, newest heaviest. Neutral with no history.
    pub fn form(&self) -> f64 {
        if self.recent_ratings.is_empty() {
            return NEUTRAL_RATING;
        }
        let (weighted, weights) = self
            .recent_ratings
            .iter()
            .enumerate()
            .fold((0.0, 0.0), |(sum, w), (i, r)| (sum + r * (i + 1) as f64, w + (i + 1) as f64));
        weighted / weights
    }

    /// Lowers a football stat line into the generic telemetry record.
    pub fn to_performance_metrics(
        &self,
        stats: &FootballMatchStats,
        context: &MatchContext,
    ) -> Result<MatchPerformanceMetrics, ValidationError> {
        stats.validate()?;

        // Categories of contribution the player touched this match.
        let categories = [
            stats.goals + stats.shots,
            stats.assists,
            stats.passes_completed,
            stats.tackles_won,
            stats.interceptions,
            stats.saves,
        ];
        let used = categories.iter().filter(|&&c| c > 0).count();
        let skill_diversity = used as f64 / categories.len() as f64;

        Ok(MatchPerformanceMetrics {
            result: stats.outcome(),
            match_importance: self.calculate_importance(context)?,
            shot_accuracy: ratio(stats.shots_on_target, stats.shots),
            defensive_actions: stats.tackles_attempted + stats.interceptions + stats.saves,
            possession_balance: stats.possession,
            clean_tackles: stats.tackles_won,
            fouls: stats.fouls_committed,
            sprint_spam_rate: 0.0,
            long_ball_spam_rate: 0.0,
            skill_diversity,
            opponent_rank: None,
            player_rank: None,
            match_duration: stats.minutes_played * 60.0,
            goals_for: Some(stats.team_goals),
            goals_against: Some(stats.opponent_goals),
        })
    }
}

fn ratio(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64).min(1.0)
    }
}

//! Match performance scoring
//!
//! - `PerformanceIndexScoreEngine`: how well the match was played (feeds the season ladder)
//! - `CleanPlayEvaluator`: how cleanly it was played (feeds the coin multiplier)
//! - `FootballEconomyMetricsEngine`: football box-score front end for both

mod clean_play;
mod football;
mod pis;

pub use clean_play::{CleanPlayEvaluator, MIN_CLEAN_PLAY_MODIFIER};
pub use football::{
    CompetitionType, FootballEconomyMetricsEngine, FootballMatchStats, MatchContext, PlayerRole,
    FORM_WINDOW,
};
pub use pis::{
    rank_difference_factor, result_weight, PerformanceIndexScoreEngine, PisBreakdown,
    MAX_PERFORMANCE_QUALITY,
};

//! SeasonRewardSystem
//!
//! Hidden season score plus a 10-step milestone ladder with geometric
//! thresholds. The score only ever grows; milestones are claimed once.

use crate::config::SeasonConfig;
use crate::error::{ensure_non_negative, EconomyError, ValidationError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::info;

const RANK_MODIFIER_MIN: f64 = 0.8;
const RANK_MODIFIER_MAX: f64 = 1.2;
/// Rank at which the modifier is exactly 1.0.
const RANK_MODIFIER_PIVOT: f64 = 2500.0;
const RANK_MODIFIER_SPAN: f64 = 12_500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeasonRewardState {
    Active,
    Claimed,
    Ended,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MilestoneRewards {
    pub coins: u64,
    pub diamonds: u32,
    #[serde(default)]
    pub cosmetic_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneDefinition {
    pub id: u32,
    pub base_threshold: f64,
    pub difficulty_scaling: f64,
    pub stage_weight: f64,
    pub rewards: MilestoneRewards,
}

impl MilestoneDefinition {
    pub fn threshold(&self) -> f64 {
        self.base_threshold * self.difficulty_scaling * self.stage_weight
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonMetadata {
    pub season_id: u64,
    pub season_start_timestamp: DateTime<Utc>,
    pub season_end_timestamp: DateTime<Utc>,
    pub season_hidden_score: f64,
    pub season_rank_modifier: f64,
    pub season_reward_state: SeasonRewardState,
}

/// Next unmet milestone and how far along it the score is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneProgress {
    pub milestone: MilestoneDefinition,
    /// score / threshold, 1.0 once every milestone is met
    pub progress: f64,
}

/// Dashboard view of the season.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonProgress {
    pub season_id: u64,
    pub hidden_score: f64,
    pub milestones_reached: u32,
    pub next_milestone_id: u32,
    pub next_milestone_progress: f64,
    pub claimed_milestones: Vec<u32>,
    pub state: SeasonRewardState,
    pub ends_at: DateTime<Utc>,
}

/// Ladder entry `i` (1-based): `base·(1 + i·growth) · scaling · weight^(i-1)`.
pub fn generate_milestones(config: &SeasonConfig) -> Vec<MilestoneDefinition> {
    (1..=config.milestone_count)
        .map(|id| {
            let stage_weight = config.stage_weight_base.powi(id as i32 - 1);
            let cosmetic_ids = if config.cosmetic_milestones.contains(&id) {
                vec![format!("season_cosmetic_{id}")]
            } else {
                Vec::new()
            };
            MilestoneDefinition {
                id,
                base_threshold: config.base_threshold * (1.0 + id as f64 * config.threshold_growth),
                difficulty_scaling: config.difficulty_scaling,
                stage_weight,
                rewards: MilestoneRewards {
                    coins: (config.milestone_coin_base * stage_weight).round() as u64,
                    diamonds: config.diamonds_per_stage * id,
                    cosmetic_ids,
                },
            }
        })
        .collect()
}

/// Season id of the window containing `start`.
pub fn season_id_for(start: DateTime<Utc>, duration_days: i64) -> u64 {
    let window = duration_days * 86_400;
    (start.timestamp().max(0) / window) as u64
}

pub fn rank_modifier(player_rank: i64) -> f64 {
    (1.0 + (player_rank as f64 - RANK_MODIFIER_PIVOT) / RANK_MODIFIER_SPAN)
        .clamp(RANK_MODIFIER_MIN, RANK_MODIFIER_MAX)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonRewardSystem {
    config: SeasonConfig,
    player_rank: i64,
    metadata: SeasonMetadata,
    milestones: Vec<MilestoneDefinition>,
    claimed: BTreeSet<u32>,
}

impl SeasonRewardSystem {
    pub fn new(config: SeasonConfig, player_rank: i64) -> Self {
        Self::starting_at(config, player_rank, Utc::now())
    }

    pub fn starting_at(config: SeasonConfig, player_rank: i64, start: DateTime<Utc>) -> Self {
        let metadata = SeasonMetadata {
            season_id: season_id_for(start, config.duration_days),
            season_start_timestamp: start,
            season_end_timestamp: start + Duration::days(config.duration_days),
            season_hidden_score: 0.0,
            season_rank_modifier: rank_modifier(player_rank),
            season_reward_state: SeasonRewardState::Active,
        };
        let milestones = generate_milestones(&config);
        info!(season_id = metadata.season_id, player_rank, "season started");
        Self { config, player_rank, metadata, milestones, claimed: BTreeSet::new() }
    }

    pub fn metadata(&self) -> &SeasonMetadata {
        &self.metadata
    }

    pub fn milestones(&self) -> &[MilestoneDefinition] {
        &self.milestones
    }

    pub fn hidden_score(&self) -> f64 {
        self.metadata.season_hidden_score
    }

    /// Adds a match PIS to the hidden score; returns ids of milestones this
    /// addition newly reached.
    pub fn add_season_score(&mut self, pis: f64) -> Result<Vec<u32>, ValidationError> {
        ensure_non_negative("pis", pis)?;

        let before = self.metadata.season_hidden_score;
        let after = before + pis;
        self.metadata.season_hidden_score = after;

        let unlocked: Vec<u32> = self
            .milestones
            .iter()
            .filter(|m| before < m.threshold() && m.threshold() <= after)
            .map(|m| m.id)
            .collect();
        for id in &unlocked {
            info!(season_id = self.metadata.season_id, milestone = id, score = after, "milestone reached");
        }
        Ok(unlocked)
    }

    /// First unmet milestone by id, or the last one at 1.0 when all are met.
    pub fn get_nearest_milestone(&self) -> Option<MilestoneProgress> {
        let score = self.metadata.season_hidden_score;
        if let Some(next) = self.milestones.iter().find(|m| score < m.threshold()) {
            return Some(MilestoneProgress {
                milestone: next.clone(),
                progress: score / next.threshold(),
            });
        }
        self.milestones
            .last()
            .map(|last| MilestoneProgress { milestone: last.clone(), progress: 1.0 })
    }

    pub fn milestones_reached(&self) -> u32 {
        let score = self.metadata.season_hidden_score;
        self.milestones.iter().filter(|m| m.threshold() <= score).count() as u32
    }

    pub fn is_season_active(&self) -> bool {
        self.is_season_active_at(Utc::now())
    }

    pub fn is_season_active_at(&self, now: DateTime<Utc>) -> bool {
        self.metadata.season_start_timestamp <= now && now < self.metadata.season_end_timestamp
    }

    pub fn claim_milestone(&mut self, id: u32) -> Result<MilestoneRewards, EconomyError> {
        self.claim_milestone_at(id, Utc::now())
    }

    /// Pays out a reached, unclaimed milestone scaled by the rank modifier.
    pub fn claim_milestone_at(
        &mut self,
        id: u32,
        now: DateTime<Utc>,
    ) -> Result<MilestoneRewards, EconomyError> {
        if now >= self.metadata.season_end_timestamp {
            self.end_season();
        }
        if self.metadata.season_reward_state == SeasonRewardState::Ended {
            return Err(EconomyError::SeasonEnded(self.metadata.season_id));
        }

        let milestone = self
            .milestones
            .iter()
            .find(|m| m.id == id)
            .ok_or(EconomyError::UnknownMilestone(id))?;

        let score = self.metadata.season_hidden_score;
        if score < milestone.threshold() {
            return Err(EconomyError::MilestoneNotReached {
                id,
                score,
                threshold: milestone.threshold(),
            });
        }
        if self.claimed.contains(&id) {
            return Err(EconomyError::MilestoneAlreadyClaimed(id));
        }

        let modifier = self.metadata.season_rank_modifier;
        let rewards = MilestoneRewards {
            coins: (milestone.rewards.coins as f64 * modifier).round() as u64,
            diamonds: (milestone.rewards.diamonds as f64 * modifier).round() as u32,
            cosmetic_ids: milestone.rewards.cosmetic_ids.clone(),
        };
        let is_final = self.milestones.last().map(|m| m.id) == Some(id);

        self.claimed.insert(id);
        if is_final {
            self.metadata.season_reward_state = SeasonRewardState::Claimed;
        }
        info!(season_id = self.metadata.season_id, milestone = id, coins = rewards.coins, "milestone claimed");
        Ok(rewards)
    }

    pub fn claimed_milestones(&self) -> Vec<u32> {
        self.claimed.iter().copied().collect()
    }

    /// Closes the season; later claims are rejected.
    pub fn end_season(&mut self) {
        if self.metadata.season_reward_state != SeasonRewardState::Ended {
            info!(season_id = self.metadata.season_id, "season ended");
            self.metadata.season_reward_state = SeasonRewardState::Ended;
        }
    }

    /// Starts a fresh season at `now`, keeping config and rank.
    pub fn roll_over(&self, now: DateTime<Utc>) -> Self {
        Self::starting_at(self.config.clone(), self.player_rank, now)
    }

    pub fn progress(&self) -> SeasonProgress {
        let nearest = self.get_nearest_milestone();
        SeasonProgress {
            season_id: self.metadata.season_id,
            hidden_score: self.metadata.season_hidden_score,
            milestones_reached: self.milestones_reached(),
            next_milestone_id: nearest.as_ref().map_or(0, |n| n.milestone.id),
            next_milestone_progress: nearest.map_or(0.0, |n| n.progress),
            claimed_milestones: self.claimed_milestones(),
            state: self.metadata.season_reward_state,
            ends_at: self.metadata.season_end_timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap()
    }

    fn season() -> SeasonRewardSystem {
        SeasonRewardSystem::starting_at(SeasonConfig::default(), 2500, t0())
    }

    #[test]
    fn test_first_two_thresholds() {
        let s = season();
        let m = s.milestones();
        assert_eq!(m.len(), 10);
        assert!((m[0].threshold() - 130.0).abs() < 1e-9);
        assert!((m[1].base_threshold - 160.0).abs() < 1e-9);
        assert!((m[1].threshold() - 240.0).abs() < 1e-9);
    }

    #[test]
    fn test_thresholds_strictly_increasing() {
        let s = season();
        for pair in s.milestones().windows(2) {
            assert!(pair[1].threshold() > pair[0].threshold());
            assert!(pair[1].rewards.coins > pair[0].rewards.coins);
        }
        assert_eq!(s.milestones()[4].rewards.cosmetic_ids, vec!["season_cosmetic_5".to_string()]);
    }

    #[test]
    fn test_window_and_id() {
        let s = season();
        let meta = s.metadata();
        assert_eq!(meta.season_end_timestamp - meta.season_start_timestamp, Duration::days(30));
        assert_eq!(meta.season_id, (t0().timestamp() / (30 * 86_400)) as u64);
        assert!(s.is_season_active_at(t0() + Duration::days(29)));
        assert!(!s.is_season_active_at(t0() + Duration::days(30)));
        assert!(!s.is_season_active_at(t0() - Duration::seconds(1)));
    }

    #[test]
    fn test_rank_modifier_bounds() {
        assert_eq!(rank_modifier(2500), 1.0);
        assert_eq!(rank_modifier(-10_000), 0.8);
        assert_eq!(rank_modifier(100_000), 1.2);
    }

    #[test]
    fn test_score_is_monotonic_and_unlocks() {
        let mut s = season();
        let unlocked = s.add_season_score(171.25).unwrap();
        assert_eq!(unlocked, vec![1]);
        assert!(s.add_season_score(-5.0).is_err());
        assert!((s.hidden_score() - 171.25).abs() < 1e-9);

        let unlocked = s.add_season_score(500.0).unwrap();
        // Thresholds: 130, 240, 427.5, 742.5
        assert_eq!(unlocked, vec![2, 3]);
        assert_eq!(s.milestones_reached(), 3);
    }

    #[test]
    fn test_nearest_milestone() {
        let mut s = season();
        let first = s.get_nearest_milestone().unwrap();
        assert_eq!(first.milestone.id, 1);
        assert_eq!(first.progress, 0.0);

        s.add_season_score(180.0).unwrap();
        let next = s.get_nearest_milestone().unwrap();
        assert_eq!(next.milestone.id, 2);
        assert!((next.progress - 0.75).abs() < 1e-9);

        s.add_season_score(1_000_000.0).unwrap();
        let done = s.get_nearest_milestone().unwrap();
        assert_eq!(done.milestone.id, 10);
        assert_eq!(done.progress, 1.0);
    }

    #[test]
    fn test_claim_flow() {
        let mut s = SeasonRewardSystem::starting_at(SeasonConfig::default(), 5000, t0());
        let now = t0() + Duration::days(1);

        assert!(matches!(s.claim_milestone_at(1, now), Err(EconomyError::MilestoneNotReached { .. })));
        s.add_season_score(200.0).unwrap();

        let rewards = s.claim_milestone_at(1, now).unwrap();
        // 250 coins, 10 diamonds at modifier 1.2
        assert_eq!(rewards.coins, 300);
        assert_eq!(rewards.diamonds, 12);
        assert!(matches!(s.claim_milestone_at(1, now), Err(EconomyError::MilestoneAlreadyClaimed(1))));
        assert!(matches!(s.claim_milestone_at(42, now), Err(EconomyError::UnknownMilestone(42))));
        assert_eq!(s.metadata().season_reward_state, SeasonRewardState::Active);

        s.add_season_score(1_000_000.0).unwrap();
        s.claim_milestone_at(10, now).unwrap();
        assert_eq!(s.metadata().season_reward_state, SeasonRewardState::Claimed);
    }

    #[test]
    fn test_claims_rejected_after_end() {
        let mut s = season();
        s.add_season_score(200.0).unwrap();
        let late = t0() + Duration::days(31);
        assert!(matches!(s.claim_milestone_at(1, late), Err(EconomyError::SeasonEnded(_))));
        assert_eq!(s.metadata().season_reward_state, SeasonRewardState::Ended);
    }

    #[test]
    fn test_roll_over_resets_progress() {
        let mut s = season();
        s.add_season_score(500.0).unwrap();
        let next = s.roll_over(t0() + Duration::days(45));

        assert_eq!(next.hidden_score(), 0.0);
        assert!(next.claimed_milestones().is_empty());
        assert_eq!(next.metadata().season_start_timestamp, t0() + Duration::days(45));
        assert_eq!(next.metadata().season_rank_modifier, s.metadata().season_rank_modifier);
    }
}

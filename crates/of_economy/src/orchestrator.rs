//! MasterEconomyOrchestrator
//!
//! Per-player session context owning every engine. One instance is built at
//! login and handed to every call site; nothing here is process-global.
//!
//! Per match, [`MasterEconomyOrchestrator::process_match_completion_at`] runs:
//! 1. current stability phase
//! 2. PIS
//! 3. season score
//! 4. clean-play modifier
//! 5. coins at `difficulty · resource_availability`
//! 6. diamonds from the PIS-derived performance factor
//! 7. current inflation adjustments (not re-evaluated)
//! 8. farming multiplier update
//! 9. MATCH_RESULT sync packet
//!
//! All input is validated before any engine state changes. Engine updates are
//! staged on copies and committed only once the sync packet is persisted, so
//! a failed store write leaves the session as it was.

use crate::config::EconomyConfig;
use crate::economy::EconomyEngine;
use crate::error::{ensure_non_negative, ensure_rank, EconomyError, Result};
use crate::inflation::{AntiInflationSystem, EconomyAdjustments, InflationMetrics};
use crate::market::{MarketSelfCorrectionEngine, SaleOutcome};
use crate::metrics::MatchPerformanceMetrics;
use crate::performance::{
    CleanPlayEvaluator, CompetitionType, FootballEconomyMetricsEngine, FootballMatchStats,
    MatchContext, PerformanceIndexScoreEngine, PlayerRole,
};
use crate::season::{MilestoneRewards, SeasonProgress, SeasonRewardSystem};
use crate::stability::{EconomyPhase, LongTermStabilityModel, PhaseConfiguration};
use crate::sync::{
    KeyValueStore, MemoryStore, OfflineFirstSyncEngine, RemoteAuthority, SyncActionType, SyncReport,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

/// Everything one finished match paid out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRewardPackage {
    pub pis: f64,
    pub clean_play_modifier: f64,
    pub coins: u64,
    pub diamonds: u32,
    pub season_progress: SeasonProgress,
    /// Milestones first reached by this match
    pub unlocked_milestones: Vec<u32>,
    pub phase: EconomyPhase,
    /// Always empty from the match path; sales go through `process_player_sale`.
    pub market_adjustments: Vec<SaleOutcome>,
    pub adjustments: EconomyAdjustments,
    pub farming_multiplier: f64,
    pub sync_packet_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EconomyHealthReport {
    pub adjustments: EconomyAdjustments,
    pub adjustments_changed: bool,
    pub phase: PhaseConfiguration,
    pub phase_progress: f64,
    pub no_dead_currency: bool,
    pub system_stable: bool,
    pub recommendations: Vec<String>,
    /// Set when the adjustments changed and an ECONOMY_UPDATE was queued
    pub sync_packet_id: Option<String>,
}

impl EconomyHealthReport {
    pub fn is_healthy(&self) -> bool {
        self.recommendations.is_empty()
    }
}

/// A football match run through the rating front end and the reward pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FootballMatchReport {
    pub rating: f64,
    pub morale: f64,
    pub form: f64,
    pub rewards: MatchRewardPackage,
}

pub struct MasterEconomyOrchestrator {
    config: EconomyConfig,
    pis_engine: PerformanceIndexScoreEngine,
    clean_play: CleanPlayEvaluator,
    economy: EconomyEngine,
    inflation: AntiInflationSystem,
    market: MarketSelfCorrectionEngine,
    season: SeasonRewardSystem,
    stability: LongTermStabilityModel,
    sync: OfflineFirstSyncEngine,
    football: FootballEconomyMetricsEngine,
    /// Match minutes played since `start_session`
    session_minutes: f64,
}

impl std::fmt::Debug for MasterEconomyOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterEconomyOrchestrator")
            .field("season", &self.season.metadata())
            .field("stability", &self.stability)
            .field("sync", &self.sync)
            .field("session_minutes", &self.session_minutes)
            .finish()
    }
}

impl MasterEconomyOrchestrator {
    pub fn new(
        config: EconomyConfig,
        player_rank: i64,
        store: Box<dyn KeyValueStore>,
    ) -> Result<Self> {
        Self::starting_at(config, player_rank, store, Utc::now(), Utc::now())
    }

    /// Orchestrator backed by a [`MemoryStore`].
    pub fn in_memory(config: EconomyConfig, player_rank: i64) -> Result<Self> {
        Self::new(config, player_rank, Box::new(MemoryStore::new()))
    }

    /// Builds every engine with an explicit economy start and season start.
    /// Any queue already persisted in `store` is reloaded.
    pub fn starting_at(
        config: EconomyConfig,
        player_rank: i64,
        store: Box<dyn KeyValueStore>,
        economy_start: DateTime<Utc>,
        season_start: DateTime<Utc>,
    ) -> Result<Self> {
        config.validate()?;
        let sync = OfflineFirstSyncEngine::new(config.sync.clone(), store)?;

        info!(player_rank, %economy_start, %season_start, "economy session created");
        Ok(Self {
            pis_engine: PerformanceIndexScoreEngine::new(),
            clean_play: CleanPlayEvaluator::new(),
            economy: EconomyEngine::new(config.reward.clone()),
            inflation: AntiInflationSystem::new(config.inflation.clone()),
            market: MarketSelfCorrectionEngine::new(config.market.clone()),
            season: SeasonRewardSystem::starting_at(config.season.clone(), player_rank, season_start),
            stability: LongTermStabilityModel::new(economy_start),
            football: FootballEconomyMetricsEngine::new(),
            sync,
            config,
            session_minutes: 0.0,
        })
    }

    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    pub fn economy(&self) -> &EconomyEngine {
        &self.economy
    }

    pub fn inflation(&self) -> &AntiInflationSystem {
        &self.inflation
    }

    pub fn market(&self) -> &MarketSelfCorrectionEngine {
        &self.market
    }

    pub fn season(&self) -> &SeasonRewardSystem {
        &self.season
    }

    pub fn stability(&self) -> &LongTermStabilityModel {
        &self.stability
    }

    pub fn football(&self) -> &FootballEconomyMetricsEngine {
        &self.football
    }

    pub fn sync_engine(&self) -> &OfflineFirstSyncEngine {
        &self.sync
    }

    pub fn sync_engine_mut(&mut self) -> &mut OfflineFirstSyncEngine {
        &mut self.sync
    }

    /// Consumes the session and returns its store for a later reload.
    pub fn into_store(self) -> Box<dyn KeyValueStore> {
        self.sync.into_store()
    }

    /// Resets the session length fed to the farming detector.
    pub fn start_session(&mut self) {
        debug!(previous_minutes = self.session_minutes, "session restarted");
        self.session_minutes = 0.0;
    }

    pub fn session_hours(&self) -> f64 {
        self.session_minutes / 60.0
    }

    pub fn process_match_completion(
        &mut self,
        metrics: &MatchPerformanceMetrics,
        player_rank: i64,
        difficulty: f64,
        is_farming_weak_ai: bool,
        is_friendly: bool,
    ) -> Result<MatchRewardPackage> {
        self.process_match_completion_at(
            metrics,
            player_rank,
            difficulty,
            is_farming_weak_ai,
            is_friendly,
            Utc::now(),
        )
    }

    pub fn process_match_completion_at(
        &mut self,
        metrics: &MatchPerformanceMetrics,
        player_rank: i64,
        difficulty: f64,
        is_farming_weak_ai: bool,
        is_friendly: bool,
        now: DateTime<Utc>,
    ) -> Result<MatchRewardPackage> {
        metrics.validate()?;
        ensure_non_negative("difficulty", difficulty)?;
        ensure_rank("player_rank", player_rank)?;

        // Telemetry rank wins when present; PIS and the diamond gap share it.
        let mut metrics = metrics.clone();
        let player_rank = *metrics.player_rank.get_or_insert(player_rank);

        // Pure part: nothing below mutates engine state until every value is known.
        let phase = self.stability.get_current_phase_at(now);
        let pis = self.pis_engine.calculate_pis(&metrics)?;
        let clean_play_modifier = self.clean_play.evaluate_clean_play(&metrics)?;
        let minutes = metrics.duration_minutes();

        let effective_difficulty = difficulty * phase.resource_availability;
        let raw_coins = self.economy.calculate_match_coins(
            effective_difficulty,
            clean_play_modifier,
            minutes,
            is_farming_weak_ai,
        )?;

        let performance_factor = (pis / self.config.reward.pis_reference).clamp(0.0, 1.0);
        let opponent_rank_gap = metrics.opponent_rank.map_or(0, |opponent| player_rank - opponent);
        let raw_diamonds = self.economy.calculate_diamonds(
            performance_factor,
            opponent_rank_gap,
            metrics.match_importance,
            minutes,
            metrics.score_gap(),
            is_friendly,
        )?;

        let adjustments = self.inflation.current_adjustments();
        let coins = (raw_coins as f64 * adjustments.coin_reward_factor()).floor() as u64;
        let diamonds = (raw_diamonds as f64 * adjustments.diamond_reward_factor()).floor() as u32;

        // Stateful part, staged until the packet is queued.
        let mut season = if now >= self.season.metadata().season_end_timestamp {
            let rolled = self.season.roll_over(now);
            info!(
                expired = self.season.metadata().season_id,
                season_id = rolled.metadata().season_id,
                "season rolled over"
            );
            rolled
        } else {
            self.season.clone()
        };
        let unlocked_milestones = season.add_season_score(pis)?;

        let session_minutes = self.session_minutes + minutes;
        let mut economy = self.economy.clone();
        let farming_multiplier = economy.update_farming_multiplier(
            minutes,
            metrics.input_variance(),
            metrics.skill_diversity,
            session_minutes / 60.0,
        )?;

        let season_progress = season.progress();
        let packet = self.sync.queue_action_at(
            SyncActionType::MatchResult,
            json!({
                "result": metrics.result,
                "pis": pis,
                "clean_play_modifier": clean_play_modifier,
                "coins": coins,
                "diamonds": diamonds,
                "phase": phase.phase,
                "season_id": season_progress.season_id,
                "hidden_score": season_progress.hidden_score,
                "unlocked_milestones": unlocked_milestones,
                "farming_multiplier": farming_multiplier,
                "is_friendly": is_friendly,
            }),
            now,
        )?;

        self.season = season;
        self.economy = economy;
        self.session_minutes = session_minutes;

        info!(
            pis,
            coins,
            diamonds,
            phase = phase.phase.number(),
            unlocked = unlocked_milestones.len(),
            "match rewards computed"
        );

        Ok(MatchRewardPackage {
            pis,
            clean_play_modifier,
            coins,
            diamonds,
            season_progress,
            unlocked_milestones,
            phase: phase.phase,
            market_adjustments: Vec::new(),
            adjustments,
            farming_multiplier,
            sync_packet_id: packet.packet_id,
        })
    }

    /// Rates a football stat line, updates morale and form, then runs the
    /// lowered telemetry through the match pipeline. Friendlies earn no diamonds.
    pub fn process_football_match_at(
        &mut self,
        role: PlayerRole,
        stats: &FootballMatchStats,
        context: &MatchContext,
        player_rank: i64,
        opponent_rank: Option<i64>,
        difficulty: f64,
        now: DateTime<Utc>,
    ) -> Result<FootballMatchReport> {
        let rating = self.football.calculate_performance(role, stats)?;
        let mut metrics = self.football.to_performance_metrics(stats, context)?;
        metrics.opponent_rank = opponent_rank;

        let is_friendly = context.competition == CompetitionType::Friendly;
        let rewards =
            self.process_match_completion_at(&metrics, player_rank, difficulty, false, is_friendly, now)?;

        let morale = self.football.update_morale(stats.outcome(), rating)?;
        let form = self.football.record_rating(rating)?;
        Ok(FootballMatchReport { rating, morale, form, rewards })
    }

    pub fn process_player_sale(
        &mut self,
        player_id: &str,
        sale_price: u64,
        buyer_coins: u64,
    ) -> Result<SaleOutcome> {
        self.process_player_sale_at(player_id, sale_price, buyer_coins, Utc::now())
    }

    pub fn process_player_sale_at(
        &mut self,
        player_id: &str,
        sale_price: u64,
        buyer_coins: u64,
        now: DateTime<Utc>,
    ) -> Result<SaleOutcome> {
        let mut market = self.market.clone();
        let outcome = market.process_sale_at(player_id, sale_price, buyer_coins, now)?;
        self.sync.queue_action_at(
            SyncActionType::MarketTransaction,
            json!({
                "player_id": player_id,
                "sale_price": sale_price,
                "buyer_coins": outcome.buyer_coins,
                "decayed_value": outcome.decayed_value,
                "decay_multiplier": outcome.decay_multiplier,
            }),
            now,
        )?;
        self.market = market;
        Ok(outcome)
    }

    pub fn apply_market_decay(&mut self) -> usize {
        self.apply_market_decay_at(Utc::now())
    }

    pub fn apply_market_decay_at(&mut self, now: DateTime<Utc>) -> usize {
        self.market.apply_natural_decay_at(now)
    }

    pub fn claim_season_milestone(&mut self, milestone_id: u32) -> Result<MilestoneRewards> {
        self.claim_season_milestone_at(milestone_id, Utc::now())
    }

    pub fn claim_season_milestone_at(
        &mut self,
        milestone_id: u32,
        now: DateTime<Utc>,
    ) -> Result<MilestoneRewards> {
        let mut season = self.season.clone();
        let rewards = season.claim_milestone_at(milestone_id, now)?;
        let progress = season.progress();
        self.sync.queue_action_at(
            SyncActionType::SeasonProgress,
            json!({
                "season_id": progress.season_id,
                "milestone_id": milestone_id,
                "hidden_score": progress.hidden_score,
                "claimed_milestones": progress.claimed_milestones,
                "rewards": rewards,
            }),
            now,
        )?;
        self.season = season;
        Ok(rewards)
    }

    pub fn get_season_progress(&self) -> SeasonProgress {
        self.season.progress()
    }

    pub fn evaluate_economy_health(&mut self, metrics: &InflationMetrics) -> Result<EconomyHealthReport> {
        self.evaluate_economy_health_at(metrics, Utc::now())
    }

    /// Runs the inflation controller and checks the stability phase.
    pub fn evaluate_economy_health_at(
        &mut self,
        metrics: &InflationMetrics,
        now: DateTime<Utc>,
    ) -> Result<EconomyHealthReport> {
        let before = self.inflation.current_adjustments();
        let mut inflation = self.inflation.clone();
        let adjustments = inflation.evaluate_and_adjust_at(metrics, now)?;
        let adjustments_changed = adjustments != before;

        let phase = self.stability.get_current_phase_at(now);
        let phase_progress = self.stability.get_phase_progress_at(now);
        let no_dead_currency = self.stability.should_no_dead_currency_at(now);
        let system_stable = self.stability.should_system_not_collapse_at(now);

        let thresholds = &self.config.inflation;
        let mut recommendations = Vec::new();
        if metrics.average_coins_per_player > thresholds.coin_upper_band {
            recommendations.push(format!(
                "High coin inflation: average {:.0} coins per player exceeds {:.0}",
                metrics.average_coins_per_player, thresholds.coin_upper_band
            ));
        }
        if metrics.average_diamonds_per_player < thresholds.low_diamond_warning {
            recommendations.push(format!(
                "Diamond scarcity: average {:.0} diamonds per player is below {:.0}",
                metrics.average_diamonds_per_player, thresholds.low_diamond_warning
            ));
        }
        if !system_stable {
            recommendations.push(format!(
                "System stability at risk in phase {}",
                phase.phase.number()
            ));
        }
        for recommendation in &recommendations {
            warn!(%recommendation, "economy health warning");
        }

        let sync_packet_id = if adjustments_changed {
            let packet = self.sync.queue_action_at(
                SyncActionType::EconomyUpdate,
                json!({
                    "forge_cost_multiplier": adjustments.forge_cost_multiplier,
                    "premium_pack_cost_multiplier": adjustments.premium_pack_cost_multiplier,
                    "recycler_efficiency_multiplier": adjustments.recycler_efficiency_multiplier,
                    "phase": phase.phase,
                }),
                now,
            )?;
            Some(packet.packet_id)
        } else {
            None
        };
        self.inflation = inflation;

        Ok(EconomyHealthReport {
            adjustments,
            adjustments_changed,
            phase,
            phase_progress,
            no_dead_currency,
            system_stable,
            recommendations,
            sync_packet_id,
        })
    }

    /// Weekly pull of the inflation multipliers back toward neutral.
    pub fn revert_adjustments(&mut self) -> EconomyAdjustments {
        self.inflation.reset_weekly_if_needed()
    }

    pub fn sync(&mut self, online: bool, authority: &mut dyn RemoteAuthority) -> Result<SyncReport> {
        self.sync_at(online, authority, Utc::now())
    }

    pub fn sync_at(
        &mut self,
        online: bool,
        authority: &mut dyn RemoteAuthority,
        now: DateTime<Utc>,
    ) -> Result<SyncReport> {
        self.sync
            .sync_pending_packets_at(|| online, authority, now)
            .map_err(EconomyError::from)
    }
}

// ========== Tests ==========

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MatchOutcome;
    use crate::error::SyncError;
    use crate::sync::store::FlakyStore;
    use crate::sync::LoopbackAuthority;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    /// Economy in phase 3 (full resource availability).
    fn orchestrator() -> MasterEconomyOrchestrator {
        MasterEconomyOrchestrator::starting_at(
            EconomyConfig::default(),
            2500,
            Box::new(MemoryStore::new()),
            t0() - Duration::days(70),
            t0(),
        )
        .unwrap()
    }

    fn worked_example() -> MatchPerformanceMetrics {
        MatchPerformanceMetrics {
            result: MatchOutcome::Win,
            shot_accuracy: 0.6,
            ..Default::default()
        }
    }

    #[test]
    fn test_worked_example_pipeline() {
        let mut orch = orchestrator();
        let package = orch
            .process_match_completion_at(&worked_example(), 2500, 1.0, false, false, t0())
            .unwrap();

        assert!((package.pis - 171.25).abs() < 1e-9);
        assert_eq!(package.clean_play_modifier, 1.0);
        assert_eq!(package.coins, 150);
        // 100 + 0.85625·50 + late close game 15
        assert_eq!(package.diamonds, 157);
        assert_eq!(package.phase, EconomyPhase::Phase3);
        assert_eq!(package.unlocked_milestones, vec![1]);
        assert!(package.market_adjustments.is_empty());
        assert_eq!(package.farming_multiplier, 1.0);

        let pending = orch.sync_engine().get_pending_packets();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].packet_id, package.sync_packet_id);
        assert_eq!(pending[0].action_type, SyncActionType::MatchResult);
        assert_eq!(pending[0].data["coins"], json!(150));
    }

    #[test]
    fn test_early_phase_pays_fewer_coins() {
        let mut early = MasterEconomyOrchestrator::starting_at(
            EconomyConfig::default(),
            2500,
            Box::new(MemoryStore::new()),
            t0(),
            t0(),
        )
        .unwrap();
        let mut mature = orchestrator();

        let early_pkg = early.process_match_completion_at(&worked_example(), 2500, 1.0, false, false, t0()).unwrap();
        let mature_pkg = mature.process_match_completion_at(&worked_example(), 2500, 1.0, false, false, t0()).unwrap();

        assert_eq!(early_pkg.phase, EconomyPhase::Phase1);
        assert!(early_pkg.coins < mature_pkg.coins);
    }

    #[test]
    fn test_friendly_pays_no_diamonds() {
        let mut orch = orchestrator();
        let package = orch
            .process_match_completion_at(&worked_example(), 2500, 1.0, false, true, t0())
            .unwrap();
        assert_eq!(package.diamonds, 0);
        assert!(package.coins > 0);
    }

    #[test]
    fn test_invalid_metrics_leave_state_untouched() {
        let mut orch = orchestrator();
        let bad = MatchPerformanceMetrics { shot_accuracy: f64::NAN, ..worked_example() };

        let err = orch.process_match_completion_at(&bad, 2500, 1.0, false, false, t0()).unwrap_err();
        assert!(matches!(err, EconomyError::Validation(_)));
        assert_eq!(orch.season().hidden_score(), 0.0);
        assert!(orch.sync_engine().get_pending_packets().is_empty());
        assert_eq!(orch.session_hours(), 0.0);

        assert!(orch
            .process_match_completion_at(&worked_example(), 2500, -1.0, false, false, t0())
            .is_err());
    }

    fn orchestrator_on(store: &FlakyStore) -> MasterEconomyOrchestrator {
        MasterEconomyOrchestrator::starting_at(
            EconomyConfig::default(),
            2500,
            Box::new(store.clone()),
            t0() - Duration::days(70),
            t0(),
        )
        .unwrap()
    }

    #[test]
    fn test_failed_store_write_rolls_back_match() {
        let store = FlakyStore::failing_on(None);
        let mut orch = orchestrator_on(&store);
        store.set_broken(true);

        let err = orch
            .process_match_completion_at(&worked_example(), 2500, 1.0, false, false, t0())
            .unwrap_err();
        assert!(matches!(err, EconomyError::Sync(SyncError::Io(_))));
        assert_eq!(orch.season().hidden_score(), 0.0);
        assert_eq!(orch.session_hours(), 0.0);
        assert_eq!(orch.economy().farming_multiplier(), 1.0);
        assert!(orch.sync_engine().get_pending_packets().is_empty());

        // Same match goes through once the store recovers
        store.set_broken(false);
        let package = orch
            .process_match_completion_at(&worked_example(), 2500, 1.0, false, false, t0())
            .unwrap();
        assert!((package.season_progress.hidden_score - 171.25).abs() < 1e-9);
        assert_eq!(orch.sync_engine().get_pending_packets().len(), 1);
    }

    #[test]
    fn test_failed_store_write_rolls_back_sale_claim_and_health() {
        let store = FlakyStore::failing_on(None);
        let mut orch = orchestrator_on(&store);
        orch.process_match_completion_at(&worked_example(), 2500, 1.0, false, false, t0()).unwrap();
        store.set_broken(true);

        assert!(orch.process_player_sale_at("p1", 1000, 0, t0()).is_err());
        assert!(orch.market().listing("p1").is_none());

        assert!(orch.claim_season_milestone_at(1, t0()).is_err());
        assert!(orch.get_season_progress().claimed_milestones.is_empty());

        let inflated = InflationMetrics {
            average_coins_per_player: 200_000.0,
            average_diamonds_per_player: 2_500.0,
            market_velocity: 0.1,
            active_players: 1_000,
        };
        assert!(orch.evaluate_economy_health_at(&inflated, t0()).is_err());
        assert!(orch.inflation().current_adjustments().is_neutral());
        assert!(orch.inflation().last_adjustment_time().is_none());

        store.set_broken(false);
        assert_eq!(orch.claim_season_milestone_at(1, t0()).unwrap().coins, 250);
        assert_eq!(orch.sync_engine().get_pending_packets().len(), 2);
    }

    #[test]
    fn test_rank_source_is_shared() {
        let mut orch = orchestrator();
        let with_rank = MatchPerformanceMetrics {
            player_rank: Some(1000),
            opponent_rank: Some(6000),
            ..worked_example()
        };
        // Telemetry rank 1000 vs 6000: upset bonus min(5000/1000, 20) = 5
        let package = orch
            .process_match_completion_at(&with_rank, 9000, 1.0, false, false, t0())
            .unwrap();
        let mut argument_only = orchestrator();
        let baseline = argument_only
            .process_match_completion_at(
                &MatchPerformanceMetrics { player_rank: None, ..with_rank.clone() },
                1000,
                1.0,
                false,
                false,
                t0(),
            )
            .unwrap();
        assert_eq!(package.pis, baseline.pis);
        assert_eq!(package.diamonds, baseline.diamonds);

        assert!(matches!(
            orch.process_match_completion_at(&worked_example(), i64::MAX, 1.0, false, false, t0()),
            Err(EconomyError::Validation(_))
        ));
    }

    #[test]
    fn test_adjustments_scale_rewards() {
        let mut orch = orchestrator();
        let inflated = InflationMetrics {
            average_coins_per_player: 200_000.0,
            average_diamonds_per_player: 2_500.0,
            market_velocity: 0.1,
            active_players: 1_000,
        };
        let report = orch.evaluate_economy_health_at(&inflated, t0()).unwrap();
        assert!(report.adjustments_changed);
        assert!((report.adjustments.forge_cost_multiplier - 1.05).abs() < 1e-9);
        assert!(report.sync_packet_id.is_some());

        let package = orch
            .process_match_completion_at(&worked_example(), 2500, 1.0, false, false, t0())
            .unwrap();
        // floor(150 / 1.05)
        assert_eq!(package.coins, 142);
    }

    #[test]
    fn test_health_recommendations() {
        let mut orch = MasterEconomyOrchestrator::starting_at(
            EconomyConfig::default(),
            2500,
            Box::new(MemoryStore::new()),
            t0(),
            t0(),
        )
        .unwrap();
        let metrics = InflationMetrics {
            average_coins_per_player: 90_000.0,
            average_diamonds_per_player: 1_000.0,
            market_velocity: 0.5,
            active_players: 10,
        };

        let report = orch.evaluate_economy_health_at(&metrics, t0()).unwrap();
        // Phase 1: forge activity 0.4 fails the collapse check
        assert!(!report.system_stable);
        assert_eq!(report.recommendations.len(), 3);
        assert!(!report.is_healthy());

        // Cooldown: second evaluation changes nothing and queues nothing new
        let again = orch.evaluate_economy_health_at(&metrics, t0() + Duration::hours(1)).unwrap();
        assert!(!again.adjustments_changed);
        assert_eq!(again.adjustments, report.adjustments);
        assert!(again.sync_packet_id.is_none());
    }

    #[test]
    fn test_claim_milestone_queues_progress() {
        let mut orch = orchestrator();
        orch.process_match_completion_at(&worked_example(), 2500, 1.0, false, false, t0()).unwrap();

        let rewards = orch.claim_season_milestone_at(1, t0()).unwrap();
        assert_eq!(rewards.coins, 250);
        assert_eq!(rewards.diamonds, 10);
        assert_eq!(orch.get_season_progress().claimed_milestones, vec![1]);

        let last = orch.sync_engine().get_pending_packets().pop().unwrap().clone();
        assert_eq!(last.action_type, SyncActionType::SeasonProgress);

        assert!(matches!(
            orch.claim_season_milestone_at(1, t0()),
            Err(EconomyError::MilestoneAlreadyClaimed(1))
        ));
        assert!(matches!(
            orch.claim_season_milestone_at(2, t0()),
            Err(EconomyError::MilestoneNotReached { id: 2, .. })
        ));
    }

    #[test]
    fn test_player_sale_queues_transaction() {
        let mut orch = orchestrator();
        let outcome = orch.process_player_sale_at("p1", 1000, 500, t0()).unwrap();
        assert_eq!(outcome.buyer_coins, 1500);
        assert_eq!(outcome.decayed_value, 970);

        let pending = orch.sync_engine().get_pending_packets();
        assert_eq!(pending[0].action_type, SyncActionType::MarketTransaction);
        assert_eq!(pending[0].data["decayed_value"], json!(970));

        assert_eq!(orch.apply_market_decay_at(t0() + Duration::hours(2)), 1);
        assert!(orch.process_player_sale_at("", 1, 1, t0()).is_err());
    }

    #[test]
    fn test_session_length_feeds_farming() {
        let mut orch = orchestrator();
        // Short, spammy, narrow matches
        let farm = MatchPerformanceMetrics {
            match_duration: 10.0 * 60.0,
            sprint_spam_rate: 0.9,
            skill_diversity: 0.1,
            ..worked_example()
        };
        let mut multiplier = 1.0;
        for i in 0..40 {
            let now = t0() + Duration::minutes(10 * i);
            let package = orch.process_match_completion_at(&farm, 2500, 1.0, true, false, now).unwrap();
            assert!(package.farming_multiplier <= multiplier);
            multiplier = package.farming_multiplier;
        }
        // Past six session hours the suspicion clears the high band
        assert!(orch.session_hours() > 6.0);
        assert!(multiplier < 1.0);
        assert!(multiplier >= 0.75);

        orch.start_session();
        assert_eq!(orch.session_hours(), 0.0);
    }

    #[test]
    fn test_sync_round_trip() {
        let mut orch = orchestrator();
        orch.process_match_completion_at(&worked_example(), 2500, 1.0, false, false, t0()).unwrap();
        let mut authority = LoopbackAuthority::new();

        let offline = orch.sync_at(false, &mut authority, t0()).unwrap();
        assert_eq!(offline.remaining, 1);

        let report = orch.sync_at(true, &mut authority, t0()).unwrap();
        assert_eq!(report.successful, 1);
        assert!(orch.sync_engine().get_pending_packets().is_empty());
    }

    #[test]
    fn test_season_rolls_over_when_expired() {
        let mut orch = orchestrator();
        let first_id = orch.get_season_progress().season_id;
        let later = t0() + Duration::days(31);

        let package = orch
            .process_match_completion_at(&worked_example(), 2500, 1.0, false, false, later)
            .unwrap();
        assert_ne!(package.season_progress.season_id, first_id);
        assert!((package.season_progress.hidden_score - 171.25).abs() < 1e-9);
    }

    #[test]
    fn test_football_match() {
        let mut orch = orchestrator();
        let stats = FootballMatchStats {
            minutes_played: 90.0,
            goals: 1,
            shots: 3,
            shots_on_target: 2,
            expected_goals: 0.6,
            passes_attempted: 30,
            passes_completed: 25,
            team_goals: 2,
            opponent_goals: 0,
            possession: 0.55,
            ..Default::default()
        };
        let context = MatchContext { competition: CompetitionType::Friendly, ..Default::default() };

        let report = orch
            .process_football_match_at(PlayerRole::Forward, &stats, &context, 2500, None, 1.0, t0())
            .unwrap();
        assert!((0.0..=100.0).contains(&report.rating));
        assert_eq!(report.rewards.diamonds, 0);
        assert!(report.morale >= 50.0);
        assert_eq!(report.form, report.rating);
    }
}

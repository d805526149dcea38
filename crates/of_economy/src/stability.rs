//! LongTermStabilityModel
//!
//! Six 30-day phases over a 180-day economy lifetime. The phase is a pure
//! function of elapsed wall-clock time since the start date; after day 180
//! the model stays in the steady-state phase until the cycle is restarted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EconomyPhase {
    Phase1,
    Phase2,
    Phase3,
    Phase4,
    Phase5,
    Phase6,
}

impl EconomyPhase {
    pub const ALL: [EconomyPhase; 6] = [
        EconomyPhase::Phase1,
        EconomyPhase::Phase2,
        EconomyPhase::Phase3,
        EconomyPhase::Phase4,
        EconomyPhase::Phase5,
        EconomyPhase::Phase6,
    ];

    pub fn number(self) -> u8 {
        match self {
            EconomyPhase::Phase1 => 1,
            EconomyPhase::Phase2 => 2,
            EconomyPhase::Phase3 => 3,
            EconomyPhase::Phase4 => 4,
            EconomyPhase::Phase5 => 5,
            EconomyPhase::Phase6 => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhaseConfiguration {
    pub phase: EconomyPhase,
    pub resource_availability: f64,
    pub forge_activity: f64,
    pub recycler_multiplier: f64,
    pub skill_gap_visibility: f64,
    /// Target market volatility for the phase
    pub market_volatility: f64,
    pub cosmetic_priority: f64,
    pub duration_days: u32,
    pub description: &'static str,
}

const fn phase(
    phase: EconomyPhase,
    values: [f64; 6],
    description: &'static str,
) -> PhaseConfiguration {
    PhaseConfiguration {
        phase,
        resource_availability: values[0],
        forge_activity: values[1],
        recycler_multiplier: values[2],
        skill_gap_visibility: values[3],
        market_volatility: values[4],
        cosmetic_priority: values[5],
        duration_days: 30,
        description,
    }
}

/// resource, forge, recycler, skill gap, volatility, cosmetic
pub static PHASES: [PhaseConfiguration; 6] = [
    phase(EconomyPhase::Phase1, [0.70, 0.40, 0.90, 0.30, 0.60, 0.20], "Foundation: scarce resources, volatile market"),
    phase(EconomyPhase::Phase2, [0.85, 0.60, 0.95, 0.50, 0.50, 0.30], "Growth: forge opens up, skill gaps emerge"),
    phase(EconomyPhase::Phase3, [1.00, 0.80, 1.00, 0.70, 0.40, 0.40], "Expansion: full resource flow"),
    phase(EconomyPhase::Phase4, [1.00, 0.90, 1.00, 0.85, 0.30, 0.60], "Maturity: peak crafting, market settles"),
    phase(EconomyPhase::Phase5, [0.95, 0.85, 1.05, 0.90, 0.25, 0.80], "Consolidation: recycling favoured, cosmetics rise"),
    phase(EconomyPhase::Phase6, [0.90, 0.75, 1.10, 1.00, 0.20, 1.00], "Steady state: stable market, cosmetic-driven"),
];

pub fn total_lifecycle_days() -> u32 {
    PHASES.iter().map(|p| p.duration_days).sum()
}

/// First phase whose cumulative end covers `elapsed_days`; the last phase otherwise.
pub fn phase_for_elapsed_days(elapsed_days: f64) -> &'static PhaseConfiguration {
    let mut accumulated = 0.0;
    for config in &PHASES {
        accumulated += config.duration_days as f64;
        if elapsed_days <= accumulated {
            return config;
        }
    }
    &PHASES[PHASES.len() - 1]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LongTermStabilityModel {
    start_date: DateTime<Utc>,
    current_phase: EconomyPhase,
}

impl Default for LongTermStabilityModel {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl LongTermStabilityModel {
    pub fn new(start_date: DateTime<Utc>) -> Self {
        Self { start_date, current_phase: EconomyPhase::Phase1 }
    }

    pub fn start_date(&self) -> DateTime<Utc> {
        self.start_date
    }

    pub fn elapsed_days_at(&self, now: DateTime<Utc>) -> f64 {
        ((now - self.start_date).num_seconds() as f64 / SECONDS_PER_DAY).max(0.0)
    }

    pub fn get_current_phase(&mut self) -> PhaseConfiguration {
        self.get_current_phase_at(Utc::now())
    }

    pub fn get_current_phase_at(&mut self, now: DateTime<Utc>) -> PhaseConfiguration {
        let config = *phase_for_elapsed_days(self.elapsed_days_at(now));
        if config.phase != self.current_phase {
            info!(from = self.current_phase.number(), to = config.phase.number(), "economy phase changed");
            self.current_phase = config.phase;
        }
        config
    }

    pub fn get_phase_progress(&mut self) -> f64 {
        self.get_phase_progress_at(Utc::now())
    }

    /// Fraction of the current phase elapsed, in [0, 1].
    pub fn get_phase_progress_at(&mut self, now: DateTime<Utc>) -> f64 {
        let elapsed = self.elapsed_days_at(now);
        let config = self.get_current_phase_at(now);

        let phase_start: f64 = PHASES
            .iter()
            .take_while(|p| p.phase != config.phase)
            .map(|p| p.duration_days as f64)
            .sum();
        ((elapsed - phase_start) / config.duration_days as f64).clamp(0.0, 1.0)
    }

    /// Market volatility the current phase aims for.
    pub fn target_market_volatility_at(&mut self, now: DateTime<Utc>) -> f64 {
        self.get_current_phase_at(now).market_volatility
    }

    pub fn should_no_dead_currency(&mut self) -> bool {
        self.should_no_dead_currency_at(Utc::now())
    }

    /// Coins have somewhere to go: forge active and recycling pays.
    pub fn should_no_dead_currency_at(&mut self, now: DateTime<Utc>) -> bool {
        let p = self.get_current_phase_at(now);
        p.forge_activity > 0.5 && p.recycler_multiplier > 0.8
    }

    pub fn should_system_not_collapse(&mut self) -> bool {
        self.should_system_not_collapse_at(Utc::now())
    }

    pub fn should_system_not_collapse_at(&mut self, now: DateTime<Utc>) -> bool {
        let p = self.get_current_phase_at(now);
        p.resource_availability > 0.5 && p.forge_activity > 0.5 && (1.0 - p.market_volatility) > 0.2
    }

    /// Begins a new 180-day cycle at `now`.
    pub fn restart_cycle(&mut self, now: DateTime<Utc>) {
        info!(previous_start = %self.start_date, "economy cycle restarted");
        self.start_date = now;
        self.current_phase = EconomyPhase::Phase1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_lifecycle_is_180_days() {
        assert_eq!(total_lifecycle_days(), 180);
        for (i, p) in PHASES.iter().enumerate() {
            assert_eq!(p.phase, EconomyPhase::ALL[i]);
        }
    }

    #[test]
    fn test_phase_from_start_date() {
        let mut fresh = LongTermStabilityModel::new(now());
        assert_eq!(fresh.get_current_phase_at(now()).phase, EconomyPhase::Phase1);

        let mut month_old = LongTermStabilityModel::new(now() - Duration::days(31));
        assert_eq!(month_old.get_current_phase_at(now()).phase, EconomyPhase::Phase2);
    }

    #[test]
    fn test_phase_boundaries() {
        assert_eq!(phase_for_elapsed_days(0.0).phase, EconomyPhase::Phase1);
        assert_eq!(phase_for_elapsed_days(30.0).phase, EconomyPhase::Phase1);
        assert_eq!(phase_for_elapsed_days(30.5).phase, EconomyPhase::Phase2);
        assert_eq!(phase_for_elapsed_days(179.9).phase, EconomyPhase::Phase6);
    }

    #[test]
    fn test_steady_state_after_lifecycle() {
        let mut model = LongTermStabilityModel::new(now() - Duration::days(400));
        assert_eq!(model.get_current_phase_at(now()).phase, EconomyPhase::Phase6);
        assert_eq!(model.get_phase_progress_at(now()), 1.0);

        model.restart_cycle(now());
        assert_eq!(model.get_current_phase_at(now()).phase, EconomyPhase::Phase1);
    }

    #[test]
    fn test_phase_progress() {
        let mut model = LongTermStabilityModel::new(now() - Duration::days(45));
        assert!((model.get_phase_progress_at(now()) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_health_gates_by_phase() {
        let mut early = LongTermStabilityModel::new(now());
        assert!(!early.should_no_dead_currency_at(now()));
        assert!(!early.should_system_not_collapse_at(now()));

        let mut mature = LongTermStabilityModel::new(now() - Duration::days(100));
        assert!(mature.should_no_dead_currency_at(now()));
        assert!(mature.should_system_not_collapse_at(now()));
        assert!((mature.target_market_volatility_at(now()) - 0.30).abs() < 1e-9);
    }

    #[test]
    fn test_resources_grow_early() {
        assert!(PHASES[0].resource_availability < PHASES[2].resource_availability);
    }
}

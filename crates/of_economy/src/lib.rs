//! # of_economy - Match Performance & Reward Economy Core
//!
//! Turns finished-match telemetry into a performance score, pays coins and
//! diamonds from it, damps farming and flip-trading, paces season progress
//! over a 180-day economy lifetime and queues every mutation for
//! offline-first reconciliation with a server of record.
//!
//! ## Features
//! - Per-match pipeline through [`MasterEconomyOrchestrator`]
//! - Validated input: NaN or negative telemetry never becomes currency
//! - Explicit clocks (`*_at(now)`) on every time-dependent operation
//! - Durable sync queue with dead-letter bucket
//!
//! ## Usage
//! ```rust
//! use of_economy::{EconomyConfig, MasterEconomyOrchestrator, MatchOutcome, MatchPerformanceMetrics};
//!
//! let mut economy = MasterEconomyOrchestrator::in_memory(EconomyConfig::default(), 2500).unwrap();
//! let metrics = MatchPerformanceMetrics {
//!     result: MatchOutcome::Win,
//!     shot_accuracy: 0.6,
//!     ..Default::default()
//! };
//! let rewards = economy.process_match_completion(&metrics, 2500, 1.0, false, false).unwrap();
//! assert!(rewards.coins > 0);
//! ```

// Doc formatting lints - purely cosmetic
#![allow(clippy::doc_lazy_continuation)]
// Reward formulas take their inputs positionally
#![allow(clippy::too_many_arguments)]

pub mod config;
pub mod economy;
pub mod error;
pub mod inflation;
pub mod market;
pub mod metrics;
pub mod orchestrator;
pub mod performance;
pub mod season;
pub mod stability;
pub mod sync;

pub use config::EconomyConfig;
pub use error::{ConfigError, EconomyError, Result, SyncError, ValidationError};
pub use metrics::{MatchOutcome, MatchPerformanceMetrics};

// Re-export engines
pub use economy::EconomyEngine;
pub use inflation::{AntiInflationSystem, EconomyAdjustments, InflationMetrics};
pub use market::{MarketSelfCorrectionEngine, PlayerMarketListing, SaleOutcome};
pub use performance::{CleanPlayEvaluator, FootballEconomyMetricsEngine, PerformanceIndexScoreEngine};
pub use season::{MilestoneDefinition, MilestoneRewards, SeasonProgress, SeasonRewardSystem};
pub use stability::{EconomyPhase, LongTermStabilityModel, PhaseConfiguration};

// Re-export orchestration
pub use orchestrator::{
    EconomyHealthReport, FootballMatchReport, MasterEconomyOrchestrator, MatchRewardPackage,
};
pub use sync::{
    FileStore, KeyValueStore, LoopbackAuthority, MemoryStore, OfflineFirstSyncEngine,
    RemoteAuthority, SyncActionType, SyncPacket, SyncReport,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

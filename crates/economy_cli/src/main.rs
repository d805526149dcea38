//! Economy operator CLI
//!
//! Scores telemetry files, runs the match pipeline against a file-backed
//! sync queue, evaluates economy health and inspects the queue.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use of_economy::config::EconomyConfig;
use of_economy::performance::PerformanceIndexScoreEngine;
use of_economy::stability::{phase_for_elapsed_days, PHASES};
use of_economy::{
    CleanPlayEvaluator, FileStore, InflationMetrics, LongTermStabilityModel, LoopbackAuthority,
    MasterEconomyOrchestrator, MatchPerformanceMetrics, OfflineFirstSyncEngine,
};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "of_economy")]
#[command(about = "Inspect and drive the football reward economy", long_about = None)]
struct Cli {
    /// JSON config file (defaults to $OF_ECONOMY_CONFIG_PATH, then the preset)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Tuning preset used when no config file is given
    #[arg(long, global = true, value_enum, default_value = "standard")]
    preset: Preset,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Standard,
    Casual,
    Competitive,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one match telemetry file (PIS breakdown + clean play)
    Score {
        /// MatchPerformanceMetrics JSON file
        #[arg(long)]
        metrics: PathBuf,
    },

    /// Run the full reward pipeline for one match and queue it
    Match {
        #[arg(long)]
        metrics: PathBuf,

        #[arg(long, default_value_t = 2500)]
        rank: i64,

        #[arg(long, default_value_t = 1.0)]
        difficulty: f64,

        /// Opponent is a weak AI the player keeps farming
        #[arg(long)]
        farming: bool,

        #[arg(long)]
        friendly: bool,

        /// Directory of the durable sync queue
        #[arg(long, default_value = "economy_store")]
        store: PathBuf,

        /// Economy start date (RFC 3339), defaults to now
        #[arg(long)]
        economy_start: Option<DateTime<Utc>>,
    },

    /// Evaluate population metrics against the inflation bands
    Health {
        /// InflationMetrics JSON file
        #[arg(long)]
        metrics: PathBuf,

        #[arg(long)]
        economy_start: Option<DateTime<Utc>>,
    },

    /// Show the stability phase for an economy start date
    Phase {
        #[arg(long)]
        economy_start: Option<DateTime<Utc>>,

        /// Print the whole 180-day timeline
        #[arg(long)]
        all: bool,
    },

    /// Inspect or drive the sync queue
    Queue {
        #[arg(long, default_value = "economy_store")]
        store: PathBuf,

        #[command(subcommand)]
        action: QueueAction,
    },
}

#[derive(Subcommand)]
enum QueueAction {
    /// List pending packets
    List,
    /// List dead-lettered packets
    Dead,
    /// Move a dead-lettered packet back to pending
    Requeue { packet_id: String },
    /// Drop a dead-lettered packet
    Purge { packet_id: String },
    /// Submit pending packets to the loopback authority
    Sync,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.preset)?;

    match cli.command {
        Commands::Score { metrics } => {
            let metrics: MatchPerformanceMetrics = read_json(&metrics)?;
            let breakdown = PerformanceIndexScoreEngine::new().breakdown(&metrics)?;
            let clean_play = CleanPlayEvaluator::new().evaluate_clean_play(&metrics)?;

            println!("PIS:              {:.2}", breakdown.total);
            println!("  result weight:  {:.3}", breakdown.result_weight);
            println!("  quality:        {:.4}", breakdown.performance_quality);
            println!("  skill weight:   {:.4}", breakdown.skill_weight);
            println!("  rank factor:    {:.3}", breakdown.rank_difference_factor);
            println!("  participation:  {:.3}", breakdown.event_participation_weight);
            println!("Clean play:       {:.3}", clean_play);
        }

        Commands::Match { metrics, rank, difficulty, farming, friendly, store, economy_start } => {
            let metrics: MatchPerformanceMetrics = read_json(&metrics)?;
            let now = Utc::now();
            let store = FileStore::new(&store)
                .with_context(|| format!("opening store {}", store.display()))?;

            let mut economy = MasterEconomyOrchestrator::starting_at(
                config,
                rank,
                Box::new(store),
                economy_start.unwrap_or(now),
                now,
            )?;
            let package =
                economy.process_match_completion_at(&metrics, rank, difficulty, farming, friendly, now)?;
            println!("{}", serde_json::to_string_pretty(&package)?);
        }

        Commands::Health { metrics, economy_start } => {
            let metrics: InflationMetrics = read_json(&metrics)?;
            let now = Utc::now();
            let mut economy = MasterEconomyOrchestrator::starting_at(
                config,
                2500,
                Box::new(of_economy::MemoryStore::new()),
                economy_start.unwrap_or(now),
                now,
            )?;
            let report = economy.evaluate_economy_health_at(&metrics, now)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.is_healthy() {
                std::process::exit(2);
            }
        }

        Commands::Phase { economy_start, all } => {
            let now = Utc::now();
            if all {
                let mut start_day = 0;
                for phase in &PHASES {
                    println!(
                        "Phase {} (days {:>3}-{:>3}) resources {:.2} forge {:.2} volatility {:.2}  {}",
                        phase.phase.number(),
                        start_day,
                        start_day + phase.duration_days,
                        phase.resource_availability,
                        phase.forge_activity,
                        phase.market_volatility,
                        phase.description
                    );
                    start_day += phase.duration_days;
                }
                return Ok(());
            }

            let mut model = LongTermStabilityModel::new(economy_start.unwrap_or(now));
            let elapsed = model.elapsed_days_at(now);
            let phase = phase_for_elapsed_days(elapsed);
            println!("Day {:.1}: phase {} - {}", elapsed, phase.phase.number(), phase.description);
            println!("  progress:          {:.0}%", model.get_phase_progress_at(now) * 100.0);
            println!("  no dead currency:  {}", model.should_no_dead_currency_at(now));
            println!("  system stable:     {}", model.should_system_not_collapse_at(now));
        }

        Commands::Queue { store, action } => {
            let store = FileStore::new(&store)
                .with_context(|| format!("opening store {}", store.display()))?;
            let mut engine = OfflineFirstSyncEngine::new(config.sync, Box::new(store))?;

            match action {
                QueueAction::List => {
                    for packet in engine.get_pending_packets() {
                        println!(
                            "{}  {:?}  attempts={}  {}",
                            packet.packet_id, packet.action_type, packet.sync_attempts, packet.timestamp
                        );
                    }
                }
                QueueAction::Dead => {
                    for packet in engine.get_dead_letter_packets() {
                        println!(
                            "{}  {:?}  attempts={}  error={}",
                            packet.packet_id,
                            packet.action_type,
                            packet.sync_attempts,
                            packet.last_error.as_deref().unwrap_or("-")
                        );
                    }
                }
                QueueAction::Requeue { packet_id } => {
                    engine.requeue_dead_letter(&packet_id)?;
                    println!("Requeued {packet_id}");
                }
                QueueAction::Purge { packet_id } => {
                    engine.purge_dead_letter(&packet_id)?;
                    println!("Purged {packet_id}");
                }
                QueueAction::Sync => {
                    let mut authority = LoopbackAuthority::new();
                    let report = engine.sync_pending_packets(|| true, &mut authority)?;
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>, preset: Preset) -> Result<EconomyConfig> {
    if let Some(path) = path {
        let path = path.to_string_lossy();
        return EconomyConfig::load_from_path(&path).with_context(|| format!("loading config {path}"));
    }
    if std::env::var_os(of_economy::config::CONFIG_PATH_ENV).is_some() {
        return Ok(EconomyConfig::load_from_env()?);
    }
    Ok(match preset {
        Preset::Standard => EconomyConfig::standard(),
        Preset::Casual => EconomyConfig::casual(),
        Preset::Competitive => EconomyConfig::competitive(),
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

//! OfflineFirstSyncEngine
//!
//! Every economic mutation is queued locally first and mirrored to the
//! [`KeyValueStore`] on each change. Sync runs submit pending packets one at a
//! time; packets that keep failing move to a dead-letter bucket for manual
//! resolution instead of being retried forever.

use super::authority::RemoteAuthority;
use super::packet::{SyncActionType, SyncPacket};
use super::store::KeyValueStore;
use crate::config::SyncConfig;
use crate::error::SyncError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// Server-side view of a record used for conflict resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerRecord {
    pub timestamp: DateTime<Utc>,
    pub data: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    Offline,
    /// Previous run was less than the retry interval ago
    Throttled,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub successful: usize,
    /// Packets whose submission failed during this run
    pub failed: usize,
    /// Packets moved to the dead-letter bucket during this run
    pub dead_lettered: usize,
    /// Packets still pending after this run
    pub remaining: usize,
    pub skipped: Option<SkipReason>,
}

impl SyncReport {
    fn skipped(reason: SkipReason, remaining: usize) -> Self {
        Self { remaining, skipped: Some(reason), ..Default::default() }
    }
}

pub struct OfflineFirstSyncEngine {
    config: SyncConfig,
    store: Box<dyn KeyValueStore>,
    queue: Vec<SyncPacket>,
    dead_letter: Vec<SyncPacket>,
    last_sync_run: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for OfflineFirstSyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineFirstSyncEngine")
            .field("config", &self.config)
            .field("pending", &self.queue.len())
            .field("dead_letter", &self.dead_letter.len())
            .field("last_sync_run", &self.last_sync_run)
            .finish()
    }
}

impl OfflineFirstSyncEngine {
    /// Builds the engine and reloads any persisted queue and dead-letter bucket.
    pub fn new(config: SyncConfig, store: Box<dyn KeyValueStore>) -> Result<Self, SyncError> {
        let queue = load_packets(store.as_ref(), &config.queue_key)?;
        let dead_letter = load_packets(store.as_ref(), &config.dead_letter_key)?;
        if !queue.is_empty() || !dead_letter.is_empty() {
            info!(pending = queue.len(), dead_letter = dead_letter.len(), "sync queue restored");
        }
        Ok(Self { config, store, queue, dead_letter, last_sync_run: None })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Hands back the underlying store, e.g. to rebuild the engine from it.
    pub fn into_store(self) -> Box<dyn KeyValueStore> {
        self.store
    }

    pub fn queue_action(&mut self, action_type: SyncActionType, data: Value) -> Result<SyncPacket, SyncError> {
        self.queue_action_at(action_type, data, Utc::now())
    }

    pub fn queue_action_at(
        &mut self,
        action_type: SyncActionType,
        data: Value,
        now: DateTime<Utc>,
    ) -> Result<SyncPacket, SyncError> {
        let packet = SyncPacket::new(action_type, data, now)?;
        self.queue.push(packet.clone());
        if let Err(err) = self.persist_queue() {
            self.queue.pop();
            return Err(err);
        }
        debug!(packet_id = %packet.packet_id, ?action_type, "sync packet queued");
        Ok(packet)
    }

    pub fn get_pending_packets(&self) -> Vec<&SyncPacket> {
        self.queue.iter().filter(|p| !p.synced).collect()
    }

    pub fn get_dead_letter_packets(&self) -> &[SyncPacket] {
        &self.dead_letter
    }

    pub fn sync_pending_packets(
        &mut self,
        online_check: impl FnOnce() -> bool,
        authority: &mut dyn RemoteAuthority,
    ) -> Result<SyncReport, SyncError> {
        self.sync_pending_packets_at(online_check, authority, Utc::now())
    }

    /// Submits every pending packet once.
    ///
    /// Success marks the packet synced and drops it from the queue. Failure
    /// increments `sync_attempts`; at `max_retries`, or on a non-retryable
    /// rejection, the packet moves to the dead-letter bucket.
    pub fn sync_pending_packets_at(
        &mut self,
        online_check: impl FnOnce() -> bool,
        authority: &mut dyn RemoteAuthority,
        now: DateTime<Utc>,
    ) -> Result<SyncReport, SyncError> {
        if !online_check() {
            debug!("sync skipped: offline");
            return Ok(SyncReport::skipped(SkipReason::Offline, self.get_pending_packets().len()));
        }
        if let Some(last) = self.last_sync_run {
            if now - last < Duration::seconds(self.config.retry_interval_secs) {
                debug!("sync skipped: throttled");
                return Ok(SyncReport::skipped(SkipReason::Throttled, self.get_pending_packets().len()));
            }
        }
        self.last_sync_run = Some(now);

        let mut report = SyncReport::default();
        let mut still_pending = Vec::with_capacity(self.queue.len());

        for mut packet in std::mem::take(&mut self.queue) {
            if packet.synced {
                continue;
            }
            match authority.submit(&packet) {
                Ok(()) => {
                    packet.synced = true;
                    packet.last_error = None;
                    report.successful += 1;
                }
                Err(err) => {
                    packet.sync_attempts += 1;
                    packet.last_error = Some(err.to_string());
                    report.failed += 1;

                    if !err.is_retryable() || packet.sync_attempts >= self.config.max_retries {
                        warn!(
                            packet_id = %packet.packet_id,
                            attempts = packet.sync_attempts,
                            error = %err,
                            "sync packet moved to dead letter"
                        );
                        self.dead_letter.push(packet);
                        report.dead_lettered += 1;
                    } else {
                        still_pending.push(packet);
                    }
                }
            }
        }

        self.queue = still_pending;
        report.remaining = self.queue.len();
        // Dead letters hit the store before the queue drops them.
        if report.dead_lettered > 0 {
            self.persist_dead_letter()?;
        }
        self.persist_queue()?;

        info!(
            successful = report.successful,
            failed = report.failed,
            dead_lettered = report.dead_lettered,
            remaining = report.remaining,
            "sync run complete"
        );
        Ok(report)
    }

    /// Moves a dead-lettered packet back into the pending queue with a fresh
    /// attempt budget.
    pub fn requeue_dead_letter(&mut self, packet_id: &str) -> Result<(), SyncError> {
        let index = self.dead_letter_index(packet_id)?;
        let mut packet = self.dead_letter.remove(index);
        packet.sync_attempts = 0;
        packet.last_error = None;
        self.queue.push(packet);

        self.persist_queue()?;
        self.persist_dead_letter()?;
        info!(packet_id, "dead-letter packet requeued");
        Ok(())
    }

    pub fn purge_dead_letter(&mut self, packet_id: &str) -> Result<SyncPacket, SyncError> {
        let index = self.dead_letter_index(packet_id)?;
        let packet = self.dead_letter.remove(index);
        self.persist_dead_letter()?;
        warn!(packet_id, "dead-letter packet purged");
        Ok(packet)
    }

    /// Resolves a local packet against the server's copy of the same record.
    pub fn handle_conflict(&self, local: &SyncPacket, server: &ServerRecord) -> Value {
        resolve_conflict(local, server)
    }

    fn dead_letter_index(&self, packet_id: &str) -> Result<usize, SyncError> {
        self.dead_letter
            .iter()
            .position(|p| p.packet_id == packet_id)
            .ok_or_else(|| SyncError::PacketNotFound(packet_id.to_string()))
    }

    fn persist_queue(&mut self) -> Result<(), SyncError> {
        let json = serde_json::to_string(&self.queue)?;
        self.store.set(&self.config.queue_key, &json)
    }

    fn persist_dead_letter(&mut self) -> Result<(), SyncError> {
        let json = serde_json::to_string(&self.dead_letter)?;
        self.store.set(&self.config.dead_letter_key, &json)
    }
}

fn load_packets(store: &dyn KeyValueStore, key: &str) -> Result<Vec<SyncPacket>, SyncError> {
    match store.get(key)? {
        Some(json) if !json.trim().is_empty() => Ok(serde_json::from_str(&json)?),
        _ => Ok(Vec::new()),
    }
}

/// Per-action resolution rules:
/// - `EconomyUpdate`: the server is authoritative for currency.
/// - `MatchResult`: newer timestamp wins, ties go to the server.
/// - `SeasonProgress`: additive merge, granted rewards are never revoked.
/// - anything else: local wins.
pub fn resolve_conflict(local: &SyncPacket, server: &ServerRecord) -> Value {
    match local.action_type {
        SyncActionType::EconomyUpdate => server.data.clone(),
        SyncActionType::MatchResult => {
            if local.timestamp > server.timestamp {
                local.data.clone()
            } else {
                server.data.clone()
            }
        }
        SyncActionType::SeasonProgress => merge_additive(&local.data, &server.data),
        SyncActionType::MarketTransaction => local.data.clone(),
    }
}

fn merge_additive(local: &Value, server: &Value) -> Value {
    match (local, server) {
        (Value::Object(l), Value::Object(s)) => {
            let mut merged = Map::new();
            for (key, value) in s {
                let combined = match l.get(key) {
                    Some(local_value) => merge_additive(local_value, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), combined);
            }
            for (key, value) in l {
                if !merged.contains_key(key) {
                    merged.insert(key.clone(), value.clone());
                }
            }
            Value::Object(merged)
        }
        (Value::Array(l), Value::Array(s)) => {
            let mut union = s.clone();
            for item in l {
                if !union.contains(item) {
                    union.push(item.clone());
                }
            }
            Value::Array(union)
        }
        (Value::Number(l), Value::Number(s)) => match (l.as_f64(), s.as_f64()) {
            (Some(lf), Some(sf)) if lf > sf => local.clone(),
            _ => server.clone(),
        },
        (_, Value::Null) => local.clone(),
        _ => server.clone(),
    }
}

// ========== Tests ==========

use crate::error::SyncError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncActionType {
    MatchResult,
    EconomyUpdate,
    SeasonProgress,
    MarketTransaction,
}

/// One locally generated economic mutation awaiting server confirmation.
///
/// `hash_signature` and `local_checksum` detect payload corruption only; they
/// are not authentication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncPacket {
    pub packet_id: String,
    pub timestamp: DateTime<Utc>,
    pub action_type: SyncActionType,
    pub hash_signature: String,
    pub local_checksum: u64,
    pub data: Value,
    pub synced: bool,
    pub sync_attempts: u32,
    #[serde(default)]
    pub last_error: Option<String>,
}

impl SyncPacket {
    pub fn new(action_type: SyncActionType, data: Value, now: DateTime<Utc>) -> Result<Self, SyncError> {
        let canonical = canonical_payload(&data)?;
        Ok(Self {
            packet_id: generate_packet_id(now),
            timestamp: now,
            action_type,
            hash_signature: hash_payload(&canonical),
            local_checksum: char_code_checksum(&canonical),
            data,
            synced: false,
            sync_attempts: 0,
            last_error: None,
        })
    }

    /// Recomputes hash and checksum against the current payload.
    pub fn verify_integrity(&self) -> Result<bool, SyncError> {
        let canonical = canonical_payload(&self.data)?;
        Ok(hash_payload(&canonical) == self.hash_signature
            && char_code_checksum(&canonical) == self.local_checksum)
    }

    pub fn has_empty_payload(&self) -> bool {
        match &self.data {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }
}

/// Serialized payload with sorted object keys.
fn canonical_payload(data: &Value) -> Result<String, SyncError> {
    Ok(serde_json::to_string(data)?)
}

fn hash_payload(canonical: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn char_code_checksum(canonical: &str) -> u64 {
    canonical.chars().map(|c| c as u64).sum()
}

fn generate_packet_id(now: DateTime<Utc>) -> String {
    format!("pkt_{}_{:08x}", now.timestamp_millis(), rand::random::<u32>())
}

use serde::{Deserialize, Serialize};

/// Offline queue parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Failed attempts before a packet moves to the dead-letter bucket (default: 3)
    pub max_retries: u32,
    /// Minimum spacing between two sync runs (default: 5s)
    pub retry_interval_secs: i64,
    pub queue_key: String,
    pub dead_letter_key: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_interval_secs: 5,
            queue_key: "economy_sync_queue".to_string(),
            dead_letter_key: "economy_sync_dead_letter".to_string(),
        }
    }
}

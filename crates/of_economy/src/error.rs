use thiserror::Error;

/// Rejected caller input at a public entry point.
///
/// Every numeric value that can flow into a currency amount is checked here
/// first, so NaN or negative telemetry never turns into coins or diamonds.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange { field: &'static str, value: f64, min: f64, max: f64 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("match duration must be greater than zero")]
    ZeroDuration,

    #[error("player id must not be empty")]
    EmptyPlayerId,
}

impl ValidationError {
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::NotFinite { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::Negative { field, .. } => Some(field),
            ValidationError::ZeroDuration => Some("match_duration"),
            ValidationError::EmptyPlayerId => Some("player_id"),
        }
    }
}

/// Checks that `value` is finite.
pub(crate) fn ensure_finite(field: &'static str, value: f64) -> std::result::Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::NotFinite { field, value })
    }
}

/// Checks that `value` is finite and not negative.
pub(crate) fn ensure_non_negative(field: &'static str, value: f64) -> std::result::Result<f64, ValidationError> {
    ensure_finite(field, value)?;
    if value < 0.0 {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(value)
}

/// Checks that `value` is finite and inside `[min, max]`.
pub(crate) fn ensure_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> std::result::Result<f64, ValidationError> {
    ensure_finite(field, value)?;
    if !(min..=max).contains(&value) {
        return Err(ValidationError::OutOfRange { field, value, min, max });
    }
    Ok(value)
}

/// Highest rank accepted from telemetry or callers.
pub const MAX_RANK: i64 = 1_000_000;

/// Checks that a rank is inside `[0, MAX_RANK]`.
pub(crate) fn ensure_rank(field: &'static str, rank: i64) -> std::result::Result<i64, ValidationError> {
    if (0..=MAX_RANK).contains(&rank) {
        Ok(rank)
    } else {
        Err(ValidationError::OutOfRange { field, value: rank as f64, min: 0.0, max: MAX_RANK as f64 })
    }
}

/// Failures of the offline sync queue, its storage and the remote authority.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("packet {packet_id} rejected: {reason}")]
    Rejected { packet_id: String, reason: String },

    #[error("remote authority unavailable")]
    Unavailable,

    #[error("packet not found: {0}")]
    PacketNotFound(String),
}

impl SyncError {
    /// Whether a later attempt may succeed without operator action.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Io(_) => true,
            SyncError::Unavailable => true,
            SyncError::Serialization(_) => false,
            SyncError::Rejected { .. } => false,
            SyncError::PacketNotFound(_) => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Umbrella error returned by the orchestrator.
#[derive(Error, Debug)]
pub enum EconomyError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("unknown milestone {0}")]
    UnknownMilestone(u32),

    #[error("milestone {id} not reached: score {score:.1} of {threshold:.1}")]
    MilestoneNotReached { id: u32, score: f64, threshold: f64 },

    #[error("milestone {0} already claimed")]
    MilestoneAlreadyClaimed(u32),

    #[error("season {0} has ended")]
    SeasonEnded(u64),
}

pub type Result<T> = std::result::Result<T, EconomyError>;

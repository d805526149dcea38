//! Offline-first synchronization
//!
//! - [`packet`]: the integrity-checked [`SyncPacket`]
//! - [`store`]: durable key-value storage for the queue
//! - [`authority`]: the remote authority boundary
//! - [`engine`]: queueing, retries, dead letters and conflict resolution

pub mod authority;
pub mod engine;
pub mod packet;
pub mod store;

pub use authority::{validate_packet, LoopbackAuthority, RemoteAuthority};
pub use engine::{resolve_conflict, OfflineFirstSyncEngine, ServerRecord, SkipReason, SyncReport};
pub use packet::{SyncActionType, SyncPacket};
pub use store::{FileStore, KeyValueStore, MemoryStore};

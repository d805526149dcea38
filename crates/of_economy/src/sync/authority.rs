//! Remote authority boundary
//!
//! The transport is out of scope; [`RemoteAuthority`] is the per-packet
//! contract the queue drives. [`LoopbackAuthority`] applies the server-side
//! checks in-process.

use super::packet::SyncPacket;
use crate::error::SyncError;
use std::collections::HashMap;

pub trait RemoteAuthority {
    /// Submits one packet. `Ok` means the server has durably accepted it;
    /// resubmitting an accepted packet id must also return `Ok`.
    fn submit(&mut self, packet: &SyncPacket) -> Result<(), SyncError>;
}

/// Checks a server applies before accepting a packet.
pub fn validate_packet(packet: &SyncPacket) -> Result<(), SyncError> {
    if packet.has_empty_payload() {
        return Err(SyncError::Rejected {
            packet_id: packet.packet_id.clone(),
            reason: "empty payload".to_string(),
        });
    }
    if !packet.verify_integrity()? {
        return Err(SyncError::Rejected {
            packet_id: packet.packet_id.clone(),
            reason: "payload hash mismatch".to_string(),
        });
    }
    Ok(())
}

/// In-process authority: validates like the server and records accepted packets.
#[derive(Debug, Default)]
pub struct LoopbackAuthority {
    accepted: HashMap<String, SyncPacket>,
    offline: bool,
}

impl LoopbackAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates the server being unreachable.
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    pub fn accepted(&self, packet_id: &str) -> Option<&SyncPacket> {
        self.accepted.get(packet_id)
    }

    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }
}

impl RemoteAuthority for LoopbackAuthority {
    fn submit(&mut self, packet: &SyncPacket) -> Result<(), SyncError> {
        if self.offline {
            return Err(SyncError::Unavailable);
        }
        if self.accepted.contains_key(&packet.packet_id) {
            return Ok(());
        }
        validate_packet(packet)?;
        self.accepted.insert(packet.packet_id.clone(), packet.clone());
        Ok(())
    }
}

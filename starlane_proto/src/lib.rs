//! Persisted form of the per-turn supply network state.
//!
//! Every collection is stored as a sorted vector so that two snapshots of the
//! same state encode to identical bytes and hash identically.

use ahash::RandomState;
use serde::{Deserialize, Serialize};
use std::hash::{BuildHasher, Hasher};
use thiserror::Error;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub tick: u64,
    pub empire_count: u32,
    pub system_count: u32,
    pub hash: u64,
}

impl SnapshotHeader {
    pub fn new(tick: u64, empire_count: usize, system_count: usize) -> Self {
        Self {
            tick,
            empire_count: empire_count as u32,
            system_count: system_count as u32,
            hash: 0,
        }
    }
}

/// Directed starlane hop `(from, to)`.
pub type LaneState = (u32, u32);

/// Supply results recorded for a single empire.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EmpireSupplyState {
    pub empire: u32,
    pub traversals: Vec<LaneState>,
    pub obstructed_traversals: Vec<LaneState>,
    pub allied_traversals: Vec<LaneState>,
    pub supplyable_systems: Vec<u32>,
    pub resource_groups: Vec<Vec<u32>>,
    pub propagated_ranges: Vec<(u32, f32)>,
    pub propagated_distances: Vec<(u32, f32)>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SupplySnapshot {
    pub header: SnapshotHeader,
    pub empires: Vec<EmpireSupplyState>,
    pub propagated_ranges: Vec<(u32, f32)>,
    pub propagated_distances: Vec<(u32, f32)>,
}

impl SupplySnapshot {
    /// Stamp the header with the content hash.
    pub fn finalize(mut self) -> Self {
        self.header.hash = hash_snapshot(&self);
        self
    }

    pub fn empire(&self, empire: u32) -> Option<&EmpireSupplyState> {
        self.empires.iter().find(|state| state.empire == empire)
    }
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to encode supply snapshot: {0}")]
    Binary(#[from] bincode::Error),
    #[error("failed to encode supply snapshot as json: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn hash_snapshot(snapshot: &SupplySnapshot) -> u64 {
    let mut clone = snapshot.clone();
    clone.header.hash = 0;
    let mut hasher = RandomState::with_seeds(0, 0, 0, 0).build_hasher();
    // Plain vectors of integers and floats always serialize.
    if let Ok(encoded) = bincode::serialize(&clone) {
        hasher.write(&encoded);
    }
    hasher.finish()
}

pub fn encode_snapshot(snapshot: &SupplySnapshot) -> Result<Vec<u8>, SnapshotError> {
    Ok(bincode::serialize(snapshot)?)
}

pub fn decode_snapshot(data: &[u8]) -> Result<SupplySnapshot, SnapshotError> {
    Ok(bincode::deserialize(data)?)
}

pub fn encode_snapshot_json(snapshot: &SupplySnapshot) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string(snapshot)?)
}

pub fn decode_snapshot_json(data: &str) -> Result<SupplySnapshot, SnapshotError> {
    Ok(serde_json::from_str(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SupplySnapshot {
        SupplySnapshot {
            header: SnapshotHeader::new(4, 1, 3),
            empires: vec![EmpireSupplyState {
                empire: 7,
                traversals: vec![(0, 1), (1, 2)],
                obstructed_traversals: vec![(2, 3)],
                allied_traversals: vec![(0, 1), (1, 0), (1, 2), (2, 1)],
                supplyable_systems: vec![0, 1, 2],
                resource_groups: vec![vec![0, 1, 2]],
                propagated_ranges: vec![(0, 2.0), (1, 1.0), (2, 0.0)],
                propagated_distances: vec![(0, 0.0), (1, 1.5), (2, 3.0)],
            }],
            propagated_ranges: vec![(0, 2.0), (1, 1.0), (2, 0.0)],
            propagated_distances: vec![(0, 0.0), (1, 1.5), (2, 3.0)],
        }
    }

    #[test]
    fn binary_codec_preserves_every_map() {
        let snapshot = sample().finalize();
        let bytes = encode_snapshot(&snapshot).expect("encode");
        let decoded = decode_snapshot(&bytes).expect("decode");
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn json_codec_preserves_every_map() {
        let snapshot = sample().finalize();
        let json = encode_snapshot_json(&snapshot).expect("encode");
        let decoded = decode_snapshot_json(&json).expect("decode");
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn hash_ignores_previous_hash_and_tracks_content() {
        let first = sample().finalize();
        let again = first.clone().finalize();
        assert_eq!(first.header.hash, again.header.hash);

        let mut changed = sample();
        changed.empires[0].supplyable_systems.push(9);
        assert_ne!(changed.finalize().header.hash, first.header.hash);
    }

    #[test]
    fn truncated_payload_is_an_error() {
        let bytes = encode_snapshot(&sample()).expect("encode");
        assert!(decode_snapshot(&bytes[..bytes.len() / 2]).is_err());
    }

    #[test]
    fn empire_lookup_by_id() {
        let snapshot = sample();
        let state = snapshot.empire(7).expect("empire 7 is present");
        assert_eq!(state.supplyable_systems, vec![0, 1, 2]);
        assert!(snapshot.empire(8).is_none());
    }
}

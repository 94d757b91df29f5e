use std::collections::VecDeque;

use bevy::prelude::*;
use starlane_proto::{decode_snapshot, encode_snapshot, SnapshotError, SupplySnapshot};

use crate::{resources::SimulationTick, supply::SupplyManager};

/// Supply snapshot captured at the end of a turn.
#[derive(Debug, Clone)]
pub struct StoredSupplySnapshot {
    pub tick: u64,
    pub snapshot: SupplySnapshot,
    pub encoded: Vec<u8>,
}

/// Most recent supply snapshots, oldest first.
#[derive(Resource, Debug)]
pub struct SupplySnapshotHistory {
    limit: usize,
    entries: VecDeque<StoredSupplySnapshot>,
}

impl Default for SupplySnapshotHistory {
    fn default() -> Self {
        Self::with_capacity(1)
    }
}

impl SupplySnapshotHistory {
    pub fn with_capacity(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            limit,
            entries: VecDeque::with_capacity(limit),
        }
    }

    pub fn push(&mut self, entry: StoredSupplySnapshot) {
        while self.entries.len() >= self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn latest(&self) -> Option<&StoredSupplySnapshot> {
        self.entries.back()
    }

    pub fn get(&self, tick: u64) -> Option<&StoredSupplySnapshot> {
        self.entries.iter().find(|entry| entry.tick == tick)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StoredSupplySnapshot> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn capture_supply_snapshot(
    tick: Res<SimulationTick>,
    manager: Res<SupplyManager>,
    mut history: ResMut<SupplySnapshotHistory>,
) {
    let snapshot = manager.to_snapshot(tick.0);
    match encode_snapshot(&snapshot) {
        Ok(encoded) => history.push(StoredSupplySnapshot {
            tick: tick.0,
            snapshot,
            encoded,
        }),
        Err(err) => {
            tracing::warn!(
                target: "starlane::snapshot",
                tick = tick.0,
                error = %err,
                "supply.snapshot.encode_failed"
            );
        }
    }
}

/// Replace the world's supply results and tick with an encoded snapshot.
pub fn restore_supply_from_snapshot(world: &mut World, encoded: &[u8]) -> Result<(), SnapshotError> {
    let snapshot = decode_snapshot(encoded)?;
    world.insert_resource(SupplyManager::from_snapshot(&snapshot));
    world.insert_resource(SimulationTick(snapshot.header.tick));
    tracing::info!(
        target: "starlane::snapshot",
        tick = snapshot.header.tick,
        empires = snapshot.header.empire_count,
        "supply.snapshot.restored"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(tick: u64) -> StoredSupplySnapshot {
        StoredSupplySnapshot {
            tick,
            snapshot: SupplySnapshot::default(),
            encoded: Vec::new(),
        }
    }

    #[test]
    fn history_drops_oldest_beyond_limit() {
        let mut history = SupplySnapshotHistory::with_capacity(2);
        for tick in 1..=3 {
            history.push(entry(tick));
        }
        assert_eq!(history.len(), 2);
        assert!(history.get(1).is_none());
        assert_eq!(history.latest().map(|e| e.tick), Some(3));
    }

    #[test]
    fn zero_limit_keeps_latest() {
        let mut history = SupplySnapshotHistory::with_capacity(0);
        history.push(entry(1));
        history.push(entry(2));
        assert_eq!(history.iter().map(|e| e.tick).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn restore_installs_manager_and_tick() {
        let mut world = World::new();
        let snapshot = SupplyManager::default().to_snapshot(12);
        let encoded = encode_snapshot(&snapshot).expect("encode");
        restore_supply_from_snapshot(&mut world, &encoded).expect("restore");
        assert_eq!(world.resource::<SimulationTick>().0, 12);
        assert_eq!(world.resource::<SupplyManager>(), &SupplyManager::default());
    }

    #[test]
    fn restore_rejects_garbage() {
        let mut world = World::new();
        assert!(restore_supply_from_snapshot(&mut world, &[0xff]).is_err());
    }
}

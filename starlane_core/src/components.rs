use std::collections::{BTreeMap, BTreeSet};

use bevy::{math::Vec2, prelude::*};

use crate::ids::{EmpireId, ObjectId, SystemId};

/// A star system: one node of the starlane graph.
#[derive(Component, Debug, Clone)]
pub struct StarSystem {
    pub id: SystemId,
    pub position: Vec2,
    pub lanes: BTreeSet<SystemId>,
}

impl StarSystem {
    pub fn new(id: SystemId, position: Vec2) -> Self {
        Self {
            id,
            position,
            lanes: BTreeSet::new(),
        }
    }
}

/// Current and maximum value of a planet meter.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Meter {
    pub current: f32,
    pub max: f32,
}

impl Meter {
    pub fn new(current: f32, max: f32) -> Self {
        Self { current, max }
    }
}

/// Planet located in a system. Owned planets act as supply sources.
#[derive(Component, Debug, Clone)]
pub struct Planet {
    pub id: ObjectId,
    pub system: SystemId,
    pub owner: Option<EmpireId>,
    pub population: f32,
    pub supply: Meter,
}

impl Planet {
    pub fn is_populated(&self) -> bool {
        self.population > 0.0
    }
}

/// Mobile group of ships. Armed, obstructive fleets that are holding position
/// keep their owner's supply alive in contested systems.
#[derive(Component, Debug, Clone)]
pub struct Fleet {
    pub id: ObjectId,
    pub owner: Option<EmpireId>,
    pub system: Option<SystemId>,
    pub next_system: Option<SystemId>,
    pub armed: bool,
    pub obstructive: bool,
}

impl Fleet {
    /// Whether the fleet is stopped (or about to stop) in its current system.
    pub fn is_stationary(&self) -> bool {
        match self.next_system {
            None => true,
            Some(next) => Some(next) == self.system,
        }
    }
}

/// Per-empire supply inputs computed upstream each turn.
///
/// `unobstructed_systems` is refined in place by the supply update; everything
/// else is read-only to the supply engine.
#[derive(Component, Debug, Clone, Default)]
pub struct EmpireSupply {
    pub empire: EmpireId,
    pub supply_ranges: BTreeMap<SystemId, f32>,
    pub unobstructed_systems: BTreeSet<SystemId>,
    pub known_lanes: BTreeMap<SystemId, BTreeSet<SystemId>>,
    pub known_destroyed_objects: BTreeSet<ObjectId>,
}

impl EmpireSupply {
    pub fn new(empire: EmpireId) -> Self {
        Self {
            empire,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fleet(system: Option<u32>, next: Option<u32>) -> Fleet {
        Fleet {
            id: ObjectId(1),
            owner: Some(EmpireId(0)),
            system: system.map(SystemId),
            next_system: next.map(SystemId),
            armed: true,
            obstructive: true,
        }
    }

    #[test]
    fn stationary_fleets() {
        assert!(fleet(Some(3), None).is_stationary());
        assert!(fleet(Some(3), Some(3)).is_stationary());
        assert!(!fleet(Some(3), Some(4)).is_stationary());
    }

    #[test]
    fn outposts_are_unpopulated() {
        let planet = Planet {
            id: ObjectId(9),
            system: SystemId(2),
            owner: Some(EmpireId(1)),
            population: 0.0,
            supply: Meter::new(1.0, 2.0),
        };
        assert!(!planet.is_populated());
    }
}

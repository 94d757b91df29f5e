use std::collections::{BTreeMap, BTreeSet};

use bevy::math::Vec2;

use crate::components::{EmpireSupply, Fleet, Planet};
use crate::diplomacy::DiplomacyTable;
use crate::ids::{EmpireId, SystemId};

/// Everything a supply update reads, detached from the ECS.
///
/// Empire inputs are mutable because obstruction refinement amends each
/// empire's unobstructed systems in place.
#[derive(Debug, Clone, Default)]
pub struct SupplyContext {
    pub positions: BTreeMap<SystemId, Vec2>,
    pub lanes: BTreeMap<SystemId, BTreeSet<SystemId>>,
    pub planets: Vec<Planet>,
    pub fleets: Vec<Fleet>,
    pub empires: BTreeMap<EmpireId, EmpireSupply>,
    pub diplomacy: DiplomacyTable,
}

impl SupplyContext {
    pub fn add_system(&mut self, system: SystemId, position: Vec2) {
        self.positions.insert(system, position);
    }

    /// Add an undirected starlane to the galaxy.
    pub fn connect(&mut self, a: SystemId, b: SystemId) {
        if a == b {
            return;
        }
        self.lanes.entry(a).or_default().insert(b);
        self.lanes.entry(b).or_default().insert(a);
    }

    pub fn empire_mut(&mut self, empire: EmpireId) -> &mut EmpireSupply {
        self.empires
            .entry(empire)
            .or_insert_with(|| EmpireSupply::new(empire))
    }

    /// Give every empire knowledge of every starlane.
    pub fn reveal_all_lanes(&mut self) {
        for supply in self.empires.values_mut() {
            supply.known_lanes = self.lanes.clone();
        }
    }

    pub fn roster(&self) -> Vec<EmpireId> {
        self.empires.keys().copied().collect()
    }

    /// Euclidean length of the lane between two systems. Unknown systems sit
    /// at the origin.
    pub fn lane_length(&self, a: SystemId, b: SystemId) -> f32 {
        let from = self.positions.get(&a).copied().unwrap_or(Vec2::ZERO);
        let to = self.positions.get(&b).copied().unwrap_or(Vec2::ZERO);
        from.distance(to)
    }

    /// Neighbours of `system` along starlanes known to `empire`.
    pub fn known_lanes_from(
        &self,
        empire: EmpireId,
        system: SystemId,
    ) -> impl Iterator<Item = SystemId> + '_ {
        self.empires
            .get(&empire)
            .and_then(|supply| supply.known_lanes.get(&system))
            .into_iter()
            .flat_map(|lanes| lanes.iter().copied())
    }

    pub fn unobstructed_systems(&self) -> BTreeMap<EmpireId, BTreeSet<SystemId>> {
        self.empires
            .iter()
            .map(|(empire, supply)| (*empire, supply.unobstructed_systems.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lanes_are_undirected_and_skip_loops() {
        let mut ctx = SupplyContext::default();
        ctx.connect(SystemId(0), SystemId(1));
        ctx.connect(SystemId(2), SystemId(2));
        assert!(ctx.lanes[&SystemId(0)].contains(&SystemId(1)));
        assert!(ctx.lanes[&SystemId(1)].contains(&SystemId(0)));
        assert!(!ctx.lanes.contains_key(&SystemId(2)));
    }

    #[test]
    fn known_lanes_are_per_empire() {
        let mut ctx = SupplyContext::default();
        ctx.connect(SystemId(0), SystemId(1));
        ctx.empire_mut(EmpireId(0));
        ctx.reveal_all_lanes();
        ctx.empire_mut(EmpireId(1));

        let seen: Vec<_> = ctx.known_lanes_from(EmpireId(0), SystemId(0)).collect();
        assert_eq!(seen, vec![SystemId(1)]);
        assert_eq!(ctx.known_lanes_from(EmpireId(1), SystemId(0)).count(), 0);
        assert_eq!(ctx.known_lanes_from(EmpireId(7), SystemId(0)).count(), 0);
    }

    #[test]
    fn lane_length_is_euclidean() {
        let mut ctx = SupplyContext::default();
        ctx.add_system(SystemId(0), Vec2::new(0.0, 0.0));
        ctx.add_system(SystemId(1), Vec2::new(3.0, 4.0));
        assert_eq!(ctx.lane_length(SystemId(0), SystemId(1)), 5.0);
    }
}

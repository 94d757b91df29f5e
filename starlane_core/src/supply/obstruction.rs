//! Supply obstruction refinement.
//!
//! A system where a rival projects supply and the empire projects none is
//! obstructed for that empire unless it holds the system with an armed,
//! obstructive fleet that is staying put.

use std::collections::{BTreeMap, BTreeSet};

use crate::components::{EmpireSupply, Fleet};
use crate::ids::{EmpireId, SystemId};

fn positive_range_systems(supply: &EmpireSupply) -> BTreeSet<SystemId> {
    supply
        .supply_ranges
        .iter()
        .filter(|(_, range)| **range > 0.0)
        .map(|(system, _)| *system)
        .collect()
}

/// Whether `fleet` keeps `empire`'s supply alive in the system it occupies.
pub fn enforces_supply(fleet: &Fleet, empire: &EmpireSupply) -> bool {
    fleet.owner == Some(empire.empire)
        && fleet.system.is_some()
        && fleet.armed
        && fleet.obstructive
        && fleet.is_stationary()
        && !empire.known_destroyed_objects.contains(&fleet.id)
}

/// Remove contested systems from each empire's unobstructed set.
///
/// Returns the number of systems removed across all empires.
pub fn refine_obstructions(
    empires: &mut BTreeMap<EmpireId, EmpireSupply>,
    fleets: &[Fleet],
) -> usize {
    let projected: BTreeMap<EmpireId, BTreeSet<SystemId>> = empires
        .iter()
        .map(|(empire, supply)| (*empire, positive_range_systems(supply)))
        .collect();

    let mut removed = 0;
    for (empire, supply) in empires.iter_mut() {
        if supply.supply_ranges.is_empty() {
            continue;
        }
        let own = projected.get(empire).cloned().unwrap_or_default();
        let contested: BTreeSet<SystemId> = projected
            .iter()
            .filter(|(other, _)| *other != empire)
            .flat_map(|(_, systems)| systems.iter().copied())
            .filter(|system| !own.contains(system))
            .collect();

        let enforced: BTreeSet<SystemId> = fleets
            .iter()
            .filter(|fleet| enforces_supply(fleet, supply))
            .filter_map(|fleet| fleet.system)
            .collect();

        for system in contested.difference(&enforced) {
            if supply.unobstructed_systems.remove(system) {
                removed += 1;
                tracing::trace!(
                    target: "starlane::supply",
                    empire = empire.0,
                    system = system.0,
                    "supply.obstruction.added"
                );
            }
        }
    }
    removed
}

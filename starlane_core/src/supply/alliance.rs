//! Sharing of supply traversals between allied empires.

use std::collections::{BTreeMap, BTreeSet};

use crate::diplomacy::DiplomacyTable;
use crate::ids::{EmpireId, Lane, SystemId};

/// Per-empire results of propagation that alliance sharing reads.
#[derive(Debug, Clone, Copy)]
pub struct AllianceInputs<'a> {
    pub roster: &'a [EmpireId],
    pub diplomacy: &'a DiplomacyTable,
    /// Unobstructed systems after refinement, before any contest was lost.
    pub baseline_unobstructed: &'a BTreeMap<EmpireId, BTreeSet<SystemId>>,
    pub traversals: &'a BTreeMap<EmpireId, BTreeSet<Lane>>,
    pub obstructed_traversals: &'a BTreeMap<EmpireId, BTreeSet<Lane>>,
    pub supplyable: &'a BTreeMap<EmpireId, BTreeSet<SystemId>>,
    pub propagated_ranges: &'a BTreeMap<EmpireId, BTreeMap<SystemId, f32>>,
}

#[derive(Debug, Clone, Default)]
pub struct AllianceMerge {
    pub traversals: BTreeMap<EmpireId, BTreeSet<Lane>>,
    pub supplyable: BTreeMap<EmpireId, BTreeSet<SystemId>>,
    pub iterations: u32,
    pub converged: bool,
}

impl AllianceMerge {
    fn add_both_ways(&mut self, empire: EmpireId, (a, b): Lane) -> bool {
        let lanes = self.traversals.entry(empire).or_default();
        let forward = lanes.insert((a, b));
        let backward = lanes.insert((b, a));
        forward || backward
    }
}

fn supplies(inputs: &AllianceInputs<'_>, empire: EmpireId, system: SystemId) -> bool {
    inputs
        .supplyable
        .get(&empire)
        .is_some_and(|systems| systems.contains(&system))
}

fn unobstructed_both(inputs: &AllianceInputs<'_>, empire: EmpireId, (a, b): Lane) -> bool {
    inputs
        .baseline_unobstructed
        .get(&empire)
        .is_some_and(|systems| systems.contains(&a) && systems.contains(&b))
}

/// Lanes an empire could not cross itself, but which lead into an ally's
/// supply and are unobstructed for whichever side adopts them.
fn share_obstructed_borders(inputs: &AllianceInputs<'_>, merge: &mut AllianceMerge) {
    for (empire, obstructed) in inputs.obstructed_traversals {
        let allies = inputs.diplomacy.allies_of(*empire, inputs.roster);
        for lane in obstructed {
            for ally in &allies {
                if !supplies(inputs, *ally, lane.1) {
                    continue;
                }
                if unobstructed_both(inputs, *empire, *lane) {
                    merge.add_both_ways(*empire, *lane);
                }
                if unobstructed_both(inputs, *ally, *lane) {
                    merge.add_both_ways(*ally, *lane);
                }
            }
        }
    }
}

/// Lets an ally use an empire's border lane into a third empire when that
/// third empire is allied with the ally. One hop only.
fn bridge_allied_borders(inputs: &AllianceInputs<'_>, merge: &mut AllianceMerge) {
    for (empire, obstructed) in inputs.obstructed_traversals {
        let allies = inputs.diplomacy.allies_of(*empire, inputs.roster);
        if allies.is_empty() {
            continue;
        }
        for lane in obstructed {
            if !supplies(inputs, *empire, lane.0) {
                continue;
            }
            let Some(holder) = inputs
                .roster
                .iter()
                .copied()
                .find(|other| other != empire && supplies(inputs, *other, lane.1))
            else {
                continue;
            };
            for ally in &allies {
                if *ally != holder && inputs.diplomacy.are_allied(*ally, holder) {
                    merge.add_both_ways(*ally, *lane);
                }
            }
        }
    }
}

/// Hand each empire's lanes to its allies wherever both ends lie inside the
/// ally's own propagated supply, until nothing changes or `max_iterations`
/// passes have run.
fn spread_to_allies(inputs: &AllianceInputs<'_>, merge: &mut AllianceMerge, max_iterations: u32) {
    while merge.iterations < max_iterations {
        merge.iterations += 1;
        let mut changed = false;
        let current = merge.traversals.clone();
        for (empire, lanes) in &current {
            for ally in inputs.diplomacy.allies_of(*empire, inputs.roster) {
                let Some(ally_ranges) = inputs.propagated_ranges.get(&ally) else {
                    continue;
                };
                for lane in lanes {
                    if ally_ranges.contains_key(&lane.0)
                        && ally_ranges.contains_key(&lane.1)
                        && merge.traversals.entry(ally).or_default().insert(*lane)
                    {
                        changed = true;
                    }
                }
            }
        }
        if !changed {
            merge.converged = true;
            return;
        }
    }
}

pub fn merge_allied_supply(inputs: AllianceInputs<'_>, max_iterations: u32) -> AllianceMerge {
    let mut merge = AllianceMerge::default();
    for empire in inputs.roster {
        let own = inputs.traversals.get(empire).cloned().unwrap_or_default();
        merge.traversals.insert(*empire, own);

        let mut supplyable = inputs.supplyable.get(empire).cloned().unwrap_or_default();
        for ally in inputs.diplomacy.allies_of(*empire, inputs.roster) {
            if let Some(ally_systems) = inputs.supplyable.get(&ally) {
                supplyable.extend(ally_systems.iter().copied());
            }
        }
        merge.supplyable.insert(*empire, supplyable);
    }

    share_obstructed_borders(&inputs, &mut merge);
    bridge_allied_borders(&inputs, &mut merge);
    spread_to_allies(&inputs, &mut merge, max_iterations);

    if !merge.converged {
        tracing::warn!(
            target: "starlane::supply",
            iterations = merge.iterations,
            "supply.alliance_merge.not_converged"
        );
    }
    merge
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diplomacy::DiplomaticStatus;

    fn systems(ids: &[u32]) -> BTreeSet<SystemId> {
        ids.iter().copied().map(SystemId).collect()
    }

    fn lanes(pairs: &[(u32, u32)]) -> BTreeSet<Lane> {
        pairs
            .iter()
            .map(|(a, b)| (SystemId(*a), SystemId(*b)))
            .collect()
    }

    fn ranges(ids: &[u32]) -> BTreeMap<SystemId, f32> {
        ids.iter().map(|id| (SystemId(*id), 0.0)).collect()
    }

    struct Fixture {
        roster: Vec<EmpireId>,
        diplomacy: DiplomacyTable,
        baseline: BTreeMap<EmpireId, BTreeSet<SystemId>>,
        traversals: BTreeMap<EmpireId, BTreeSet<Lane>>,
        obstructed: BTreeMap<EmpireId, BTreeSet<Lane>>,
        supplyable: BTreeMap<EmpireId, BTreeSet<SystemId>>,
        ranges: BTreeMap<EmpireId, BTreeMap<SystemId, f32>>,
    }

    impl Fixture {
        fn inputs(&self) -> AllianceInputs<'_> {
            AllianceInputs {
                roster: &self.roster,
                diplomacy: &self.diplomacy,
                baseline_unobstructed: &self.baseline,
                traversals: &self.traversals,
                obstructed_traversals: &self.obstructed,
                supplyable: &self.supplyable,
                propagated_ranges: &self.ranges,
            }
        }
    }

    /// Chain 0-1-2-3: empire 0 supplies {0,1}, empire 1 supplies {2,3}, and
    /// each was blocked crossing 1-2 by the other.
    fn two_allies() -> Fixture {
        let (x, y) = (EmpireId(0), EmpireId(1));
        let mut diplomacy = DiplomacyTable::default();
        diplomacy.set_status(x, y, DiplomaticStatus::Allied);
        Fixture {
            roster: vec![x, y],
            diplomacy,
            baseline: [(x, systems(&[0, 1, 2])), (y, systems(&[1, 2, 3]))].into(),
            traversals: [(x, lanes(&[(0, 1), (1, 0)])), (y, lanes(&[(3, 2), (2, 3)]))].into(),
            obstructed: [(x, lanes(&[(1, 2)])), (y, lanes(&[(2, 1)]))].into(),
            supplyable: [(x, systems(&[0, 1])), (y, systems(&[2, 3]))].into(),
            ranges: [(x, ranges(&[0, 1])), (y, ranges(&[2, 3]))].into(),
        }
    }

    #[test]
    fn allies_adopt_blocked_border_lane() {
        let fixture = two_allies();
        let merge = merge_allied_supply(fixture.inputs(), 50);
        for empire in [EmpireId(0), EmpireId(1)] {
            let merged = &merge.traversals[&empire];
            assert!(merged.contains(&(SystemId(1), SystemId(2))));
            assert!(merged.contains(&(SystemId(2), SystemId(1))));
        }
        assert_eq!(merge.supplyable[&EmpireId(0)], systems(&[0, 1, 2, 3]));
        assert!(merge.converged);
        assert_eq!(merge.iterations, 1);
    }

    #[test]
    fn baseline_obstruction_blocks_sharing() {
        let mut fixture = two_allies();
        fixture.baseline.insert(EmpireId(0), systems(&[0, 1]));
        fixture.baseline.insert(EmpireId(1), systems(&[2, 3]));
        let merge = merge_allied_supply(fixture.inputs(), 50);
        assert_eq!(merge.traversals[&EmpireId(0)], lanes(&[(0, 1), (1, 0)]));
        assert_eq!(merge.traversals[&EmpireId(1)], lanes(&[(3, 2), (2, 3)]));
    }

    #[test]
    fn enemies_share_nothing() {
        let mut fixture = two_allies();
        fixture.diplomacy = DiplomacyTable::default();
        let merge = merge_allied_supply(fixture.inputs(), 50);
        assert_eq!(merge.traversals[&EmpireId(0)], lanes(&[(0, 1), (1, 0)]));
        assert_eq!(merge.supplyable[&EmpireId(0)], systems(&[0, 1]));
    }

    #[test]
    fn ally_of_ally_border_is_bridged_one_hop() {
        // Empire 0 supplies 1 and is blocked into 2, held by empire 2.
        // Empire 1 is allied with both; empire 0 and 2 are not allied.
        let (a, b, c) = (EmpireId(0), EmpireId(1), EmpireId(2));
        let mut diplomacy = DiplomacyTable::default();
        diplomacy.set_status(a, b, DiplomaticStatus::Allied);
        diplomacy.set_status(b, c, DiplomaticStatus::Allied);
        let fixture = Fixture {
            roster: vec![a, b, c],
            diplomacy,
            baseline: [(a, systems(&[1])), (b, systems(&[5])), (c, systems(&[2]))].into(),
            traversals: BTreeMap::new(),
            obstructed: [(a, lanes(&[(1, 2)]))].into(),
            supplyable: [(a, systems(&[1])), (b, systems(&[5])), (c, systems(&[2]))].into(),
            ranges: BTreeMap::new(),
        };
        let merge = merge_allied_supply(fixture.inputs(), 50);
        assert_eq!(merge.traversals[&b], lanes(&[(1, 2), (2, 1)]));
        assert!(merge.traversals[&a].is_empty());
        assert!(merge.traversals[&c].is_empty());
    }

    #[test]
    fn lanes_flow_into_ally_territory_only() {
        let mut fixture = two_allies();
        // Empire 1 also propagated range into system 1.
        fixture.ranges.insert(EmpireId(1), ranges(&[1, 2, 3]));
        let merge = merge_allied_supply(fixture.inputs(), 50);
        let ally = &merge.traversals[&EmpireId(1)];
        assert!(ally.contains(&(SystemId(1), SystemId(2))));
        assert!(!ally.contains(&(SystemId(0), SystemId(1))));
    }

    #[test]
    fn zero_iteration_cap_reports_non_convergence() {
        let fixture = two_allies();
        let merge = merge_allied_supply(fixture.inputs(), 0);
        assert!(!merge.converged);
        assert_eq!(merge.iterations, 0);
    }
}

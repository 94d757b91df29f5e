use std::collections::{BTreeMap, BTreeSet};

use bevy::prelude::Resource;
use starlane_proto::{EmpireSupplyState, SnapshotHeader, SupplySnapshot};

use crate::diplomacy::DiplomacyTable;
use crate::ids::{EmpireId, Lane, SystemId};
use crate::supply::alliance::{merge_allied_supply, AllianceInputs};
use crate::supply::context::SupplyContext;
use crate::supply::groups::{resource_groups, ResourceGroups};
use crate::supply::obstruction::refine_obstructions;
use crate::supply::propagation::{propagate_supply, Propagation};
use crate::supply::scoring::SupplyStrengths;
use crate::supply_config::SupplyConfig;

static NO_LANES: BTreeSet<Lane> = BTreeSet::new();
static NO_SYSTEMS: BTreeSet<SystemId> = BTreeSet::new();
static NO_GROUPS: ResourceGroups = BTreeSet::new();
static NO_VALUES: BTreeMap<SystemId, f32> = BTreeMap::new();

/// Counters describing one supply update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub empires: usize,
    pub obstructions_added: usize,
    pub contested_systems: usize,
    pub purged_claims: usize,
    pub rounds: u32,
    pub alliance_iterations: u32,
    pub alliance_converged: bool,
    pub overlap_anomalies: usize,
}

/// Supply network results for every empire, replaced wholesale on each
/// [`SupplyManager::update`].
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct SupplyManager {
    traversals: BTreeMap<EmpireId, BTreeSet<Lane>>,
    obstructed_traversals: BTreeMap<EmpireId, BTreeSet<Lane>>,
    allied_traversals: BTreeMap<EmpireId, BTreeSet<Lane>>,
    supplyable: BTreeMap<EmpireId, BTreeSet<SystemId>>,
    resource_groups: BTreeMap<EmpireId, ResourceGroups>,
    propagated_ranges: BTreeMap<SystemId, f32>,
    propagated_distances: BTreeMap<SystemId, f32>,
    empire_propagated_ranges: BTreeMap<EmpireId, BTreeMap<SystemId, f32>>,
    empire_propagated_distances: BTreeMap<EmpireId, BTreeMap<SystemId, f32>>,
}

fn merge_max(map: &mut BTreeMap<SystemId, f32>, system: SystemId, value: f32) {
    map.entry(system)
        .and_modify(|existing| *existing = existing.max(value))
        .or_insert(value);
}

impl SupplyManager {
    /// Recompute every empire's supply network from `ctx`.
    ///
    /// Obstruction refinement writes each empire's amended unobstructed set
    /// back into `ctx`; nothing else in `ctx` is touched.
    pub fn update(&mut self, ctx: &mut SupplyContext, config: &SupplyConfig) -> UpdateSummary {
        let strengths = SupplyStrengths::collect(&ctx.planets);
        let obstructions_added = refine_obstructions(&mut ctx.empires, &ctx.fleets);
        let baseline = ctx.unobstructed_systems();
        let propagation = propagate_supply(ctx, &strengths);

        let mut next = SupplyManager::default();
        let overlap_anomalies =
            next.extract(&propagation, &ctx.diplomacy, config.anomalies.warn_on_overlap);

        let roster = ctx.roster();
        let merge = merge_allied_supply(
            AllianceInputs {
                roster: &roster,
                diplomacy: &ctx.diplomacy,
                baseline_unobstructed: &baseline,
                traversals: &next.traversals,
                obstructed_traversals: &next.obstructed_traversals,
                supplyable: &next.supplyable,
                propagated_ranges: &next.empire_propagated_ranges,
            },
            config.alliance.max_iterations,
        );
        for empire in &roster {
            let lanes = merge.traversals.get(empire).unwrap_or(&NO_LANES);
            let systems = merge.supplyable.get(empire).unwrap_or(&NO_SYSTEMS);
            next.resource_groups
                .insert(*empire, resource_groups(lanes, systems));
        }
        next.allied_traversals = merge.traversals;

        let summary = UpdateSummary {
            empires: roster.len(),
            obstructions_added,
            contested_systems: propagation.contested_systems.len(),
            purged_claims: propagation.purged_claims,
            rounds: propagation.rounds,
            alliance_iterations: merge.iterations,
            alliance_converged: merge.converged,
            overlap_anomalies,
        };
        tracing::debug!(
            target: "starlane::supply",
            empires = summary.empires,
            contested = summary.contested_systems,
            purged = summary.purged_claims,
            alliance_iterations = summary.alliance_iterations,
            "supply.update.complete"
        );
        *self = next;
        summary
    }

    /// Copy surviving claims into the result maps. Returns the number of
    /// systems supplied by empires that are not all allied with each other.
    fn extract(
        &mut self,
        propagation: &Propagation,
        diplomacy: &DiplomacyTable,
        warn_on_overlap: bool,
    ) -> usize {
        let mut suppliers: BTreeMap<SystemId, Vec<EmpireId>> = BTreeMap::new();
        for (empire, claims) in &propagation.claims {
            let supplyable = self.supplyable.entry(*empire).or_default();
            let ranges = self.empire_propagated_ranges.entry(*empire).or_default();
            let distances = self.empire_propagated_distances.entry(*empire).or_default();
            for (system, claim) in claims {
                if claim.range < 0.0 {
                    continue;
                }
                supplyable.insert(*system);
                merge_max(ranges, *system, claim.range);
                merge_max(distances, *system, claim.distance);
                merge_max(&mut self.propagated_ranges, *system, claim.range);
                merge_max(&mut self.propagated_distances, *system, claim.distance);
                suppliers.entry(*system).or_default().push(*empire);
            }
        }
        self.traversals = propagation.traversals.clone();
        self.obstructed_traversals = propagation.obstructed_traversals.clone();

        let mut anomalies = 0;
        for (system, empires) in suppliers {
            if empires.len() < 2 || diplomacy.all_mutually_allied(&empires) {
                continue;
            }
            anomalies += 1;
            if warn_on_overlap {
                tracing::warn!(
                    target: "starlane::supply",
                    system = system.0,
                    suppliers = ?empires.iter().map(|e| e.0).collect::<Vec<_>>(),
                    "supply.extract.overlapping_claims"
                );
            }
        }
        anomalies
    }

    pub fn empires(&self) -> impl Iterator<Item = EmpireId> + '_ {
        self.supplyable.keys().copied()
    }

    pub fn traversals(&self, empire: EmpireId) -> &BTreeSet<Lane> {
        self.traversals.get(&empire).unwrap_or(&NO_LANES)
    }

    pub fn obstructed_traversals(&self, empire: EmpireId) -> &BTreeSet<Lane> {
        self.obstructed_traversals.get(&empire).unwrap_or(&NO_LANES)
    }

    /// Traversals after sharing with allies.
    pub fn allied_traversals(&self, empire: EmpireId) -> &BTreeSet<Lane> {
        self.allied_traversals.get(&empire).unwrap_or(&NO_LANES)
    }

    pub fn supplyable_systems(&self, empire: EmpireId) -> &BTreeSet<SystemId> {
        self.supplyable.get(&empire).unwrap_or(&NO_SYSTEMS)
    }

    /// Systems supplied by `empire` or any of its allies, sorted.
    pub fn supplyable_systems_with_allies(
        &self,
        empire: EmpireId,
        diplomacy: &DiplomacyTable,
    ) -> Vec<SystemId> {
        let mut systems = self.supplyable_systems(empire).clone();
        for ally in diplomacy.allies_of(empire, self.supplyable.keys()) {
            systems.extend(self.supplyable_systems(ally).iter().copied());
        }
        systems.into_iter().collect()
    }

    /// Lowest-id empire supplying `system`, if any.
    pub fn empire_supplying(&self, system: SystemId) -> Option<EmpireId> {
        self.supplyable
            .iter()
            .find(|(_, systems)| systems.contains(&system))
            .map(|(empire, _)| *empire)
    }

    pub fn resource_groups(&self, empire: EmpireId) -> &ResourceGroups {
        self.resource_groups.get(&empire).unwrap_or(&NO_GROUPS)
    }

    pub fn propagated_ranges(&self) -> &BTreeMap<SystemId, f32> {
        &self.propagated_ranges
    }

    pub fn propagated_distances(&self) -> &BTreeMap<SystemId, f32> {
        &self.propagated_distances
    }

    pub fn empire_propagated_ranges(&self, empire: EmpireId) -> &BTreeMap<SystemId, f32> {
        self.empire_propagated_ranges
            .get(&empire)
            .unwrap_or(&NO_VALUES)
    }

    pub fn empire_propagated_distances(&self, empire: EmpireId) -> &BTreeMap<SystemId, f32> {
        self.empire_propagated_distances
            .get(&empire)
            .unwrap_or(&NO_VALUES)
    }

    pub fn system_has_fleet_supply(&self, system: SystemId, empire: EmpireId) -> bool {
        self.supplyable_systems(empire).contains(&system)
    }

    pub fn system_has_fleet_supply_with_allies(
        &self,
        system: SystemId,
        empire: EmpireId,
        diplomacy: &DiplomacyTable,
    ) -> bool {
        self.system_has_fleet_supply(system, empire)
            || diplomacy
                .allies_of(empire, self.supplyable.keys())
                .into_iter()
                .any(|ally| self.system_has_fleet_supply(system, ally))
    }

    fn roster(&self) -> BTreeSet<EmpireId> {
        self.traversals
            .keys()
            .chain(self.obstructed_traversals.keys())
            .chain(self.allied_traversals.keys())
            .chain(self.supplyable.keys())
            .chain(self.resource_groups.keys())
            .chain(self.empire_propagated_ranges.keys())
            .chain(self.empire_propagated_distances.keys())
            .copied()
            .collect()
    }

    pub fn to_snapshot(&self, tick: u64) -> SupplySnapshot {
        let lanes = |set: &BTreeSet<Lane>| -> Vec<(u32, u32)> {
            set.iter().map(|(a, b)| (a.0, b.0)).collect()
        };
        let values = |map: &BTreeMap<SystemId, f32>| -> Vec<(u32, f32)> {
            map.iter().map(|(s, v)| (s.0, *v)).collect()
        };

        let roster = self.roster();
        let empires: Vec<EmpireSupplyState> = roster
            .iter()
            .map(|empire| EmpireSupplyState {
                empire: empire.0,
                traversals: lanes(self.traversals(*empire)),
                obstructed_traversals: lanes(self.obstructed_traversals(*empire)),
                allied_traversals: lanes(self.allied_traversals(*empire)),
                supplyable_systems: self
                    .supplyable_systems(*empire)
                    .iter()
                    .map(|s| s.0)
                    .collect(),
                resource_groups: self
                    .resource_groups(*empire)
                    .iter()
                    .map(|group| group.iter().map(|s| s.0).collect())
                    .collect(),
                propagated_ranges: values(self.empire_propagated_ranges(*empire)),
                propagated_distances: values(self.empire_propagated_distances(*empire)),
            })
            .collect();

        SupplySnapshot {
            header: SnapshotHeader::new(tick, empires.len(), self.propagated_ranges.len()),
            empires,
            propagated_ranges: values(&self.propagated_ranges),
            propagated_distances: values(&self.propagated_distances),
        }
        .finalize()
    }

    pub fn from_snapshot(snapshot: &SupplySnapshot) -> Self {
        let lanes = |pairs: &[(u32, u32)]| -> BTreeSet<Lane> {
            pairs
                .iter()
                .map(|(a, b)| (SystemId(*a), SystemId(*b)))
                .collect()
        };
        let values = |pairs: &[(u32, f32)]| -> BTreeMap<SystemId, f32> {
            pairs.iter().map(|(s, v)| (SystemId(*s), *v)).collect()
        };

        let mut manager = SupplyManager {
            propagated_ranges: values(&snapshot.propagated_ranges),
            propagated_distances: values(&snapshot.propagated_distances),
            ..Default::default()
        };
        for state in &snapshot.empires {
            let empire = EmpireId(state.empire);
            manager
                .traversals
                .insert(empire, lanes(&state.traversals));
            manager
                .obstructed_traversals
                .insert(empire, lanes(&state.obstructed_traversals));
            manager
                .allied_traversals
                .insert(empire, lanes(&state.allied_traversals));
            manager.supplyable.insert(
                empire,
                state.supplyable_systems.iter().copied().map(SystemId).collect(),
            );
            manager.resource_groups.insert(
                empire,
                state
                    .resource_groups
                    .iter()
                    .map(|group| group.iter().copied().map(SystemId).collect())
                    .collect(),
            );
            manager
                .empire_propagated_ranges
                .insert(empire, values(&state.propagated_ranges));
            manager
                .empire_propagated_distances
                .insert(empire, values(&state.propagated_distances));
        }
        manager
    }
}

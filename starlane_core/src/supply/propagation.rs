//! Range-descending supply propagation with per-system arbitration.
//!
//! Each empire's claims spread one starlane per round, losing one point of
//! range per hop. Rounds run from the highest integer range level down to
//! zero; a claim spreads in the round matching the integer part of its range.
//! Before every round, systems claimed by more than one empire are arbitrated
//! and the losers' claims, and the lanes they used to reach the system, are
//! dropped. Levels with nothing to spread are skipped. Once every round is
//! done, distances are settled to the shortest path over the lanes each
//! empire actually traversed.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use crate::ids::{EmpireId, Lane, SystemId};
use crate::supply::context::SupplyContext;
use crate::supply::scoring::{resolve_contest, ContestOutcome, SupplyStrengths};

/// An empire's remaining supply range in a system and the path length back
/// to the nearest source it spread from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupplyClaim {
    pub range: f32,
    pub distance: f32,
}

impl SupplyClaim {
    pub fn source(range: f32) -> Self {
        Self {
            range,
            distance: 0.0,
        }
    }
}

pub type ClaimMap = BTreeMap<EmpireId, BTreeMap<SystemId, SupplyClaim>>;

/// A successful hop: the empire, the lane it spread along and the claim it
/// made at the far end.
type Hop = (EmpireId, Lane, SupplyClaim);

fn level_of(range: f32) -> i64 {
    range.floor() as i64
}

struct Frontier {
    distance: f32,
    system: SystemId,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.distance.to_bits() == other.distance.to_bits() && self.system == other.system
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.system.cmp(&self.system))
    }
}

/// Working state of one propagation run, returned once every round is done.
#[derive(Debug, Clone, Default)]
pub struct Propagation {
    pub claims: ClaimMap,
    pub traversals: BTreeMap<EmpireId, BTreeSet<Lane>>,
    pub obstructed_traversals: BTreeMap<EmpireId, BTreeSet<Lane>>,
    /// Unobstructed systems per empire, shrunk as contests are lost.
    pub unobstructed: BTreeMap<EmpireId, BTreeSet<SystemId>>,
    pub contested_systems: BTreeSet<SystemId>,
    pub purged_claims: usize,
    pub rounds: u32,
}

impl Propagation {
    fn seed(ctx: &SupplyContext) -> Self {
        let mut state = Propagation {
            unobstructed: ctx.unobstructed_systems(),
            ..Default::default()
        };
        for (empire, supply) in &ctx.empires {
            state.traversals.entry(*empire).or_default();
            state.obstructed_traversals.entry(*empire).or_default();
            let claims = state.claims.entry(*empire).or_default();
            for (system, range) in &supply.supply_ranges {
                if !supply.unobstructed_systems.contains(system) {
                    continue;
                }
                if !range.is_finite() {
                    tracing::warn!(
                        target: "starlane::supply",
                        empire = empire.0,
                        system = system.0,
                        range = *range,
                        "supply.source_ignored=non_finite_range"
                    );
                    continue;
                }
                if *range >= 0.0 {
                    claims.insert(*system, SupplyClaim::source(*range));
                }
            }
        }
        state
    }

    fn top_level(&self) -> Option<i64> {
        self.claims
            .values()
            .flat_map(|claims| claims.values())
            .map(|claim| level_of(claim.range))
            .max()
    }

    /// Highest positive level below `below` that still holds a claim.
    fn next_level(&self, below: i64) -> Option<i64> {
        self.claims
            .values()
            .flat_map(|claims| claims.values())
            .map(|claim| level_of(claim.range))
            .filter(|level| *level > 0 && *level < below)
            .max()
    }

    fn record_obstructed(&mut self, empire: EmpireId, lane: Lane) {
        let traversed = self
            .traversals
            .get(&empire)
            .is_some_and(|lanes| lanes.contains(&lane));
        if !traversed {
            self.obstructed_traversals
                .entry(empire)
                .or_default()
                .insert(lane);
        }
    }

    /// Drop `empire`'s claim on `system` after losing a contest there.
    fn purge(&mut self, empire: EmpireId, system: SystemId) {
        if let Some(claims) = self.claims.get_mut(&empire) {
            claims.remove(&system);
        }
        if let Some(unobstructed) = self.unobstructed.get_mut(&empire) {
            unobstructed.remove(&system);
        }

        let traversals = self.traversals.entry(empire).or_default();
        let obstructed = self.obstructed_traversals.entry(empire).or_default();
        let touching: Vec<Lane> = traversals
            .iter()
            .filter(|(from, to)| *from == system || *to == system)
            .copied()
            .collect();
        for lane in touching {
            traversals.remove(&lane);
            if lane.1 == system {
                obstructed.insert(lane);
            }
        }
        obstructed.retain(|(from, _)| *from != system);
        self.purged_claims += 1;
    }

    fn arbitrate(&mut self, ctx: &SupplyContext, strengths: &SupplyStrengths) {
        let mut claimants: BTreeMap<SystemId, Vec<EmpireId>> = BTreeMap::new();
        for (empire, claims) in &self.claims {
            for system in claims.keys() {
                claimants.entry(*system).or_default().push(*empire);
            }
        }

        for (system, empires) in claimants {
            if empires.len() < 2 {
                continue;
            }
            self.contested_systems.insert(system);

            let scores: Vec<_> = empires
                .iter()
                .filter_map(|empire| {
                    let claim = self.claims.get(empire)?.get(&system)?;
                    Some((*empire, strengths.score(*empire, system, *claim)))
                })
                .collect();
            let outcome = resolve_contest(&scores, &ctx.diplomacy);

            for (empire, score) in &scores {
                tracing::trace!(
                    target: "starlane::supply",
                    system = system.0,
                    empire = empire.0,
                    claim_value = score.claim_value(),
                    kept = outcome.keeps_claim(*empire),
                    "supply.contest.claim"
                );
            }
            if outcome == ContestOutcome::Deadlock {
                tracing::debug!(
                    target: "starlane::supply",
                    system = system.0,
                    claimants = empires.len(),
                    "supply.contest.deadlock"
                );
            }

            for empire in empires {
                if !outcome.keeps_claim(empire) {
                    self.purge(empire, system);
                }
            }
        }
    }

    /// Spread every claim whose integer range equals `level` one lane outward.
    fn spread(&mut self, ctx: &SupplyContext, level: i64) -> Vec<Hop> {
        let mut next = self.claims.clone();
        let mut hops: Vec<(EmpireId, Lane, Option<SupplyClaim>)> = Vec::new();

        for (empire, claims) in &self.claims {
            let unobstructed = self.unobstructed.get(empire);
            for (system, claim) in claims {
                if level_of(claim.range) != level {
                    continue;
                }
                for dest in ctx.known_lanes_from(*empire, *system) {
                    let lane = (*system, dest);
                    if !unobstructed.is_some_and(|systems| systems.contains(&dest)) {
                        hops.push((*empire, lane, None));
                        continue;
                    }

                    let candidate = claim.range - 1.0;
                    let rival_best = self
                        .claims
                        .iter()
                        .filter(|(other, _)| *other != empire)
                        .filter_map(|(_, other_claims)| other_claims.get(&dest))
                        .map(|other| other.range)
                        .reduce(f32::max);
                    if rival_best.is_some_and(|best| candidate <= best) {
                        hops.push((*empire, lane, None));
                        continue;
                    }

                    let reached = SupplyClaim {
                        range: candidate,
                        distance: claim.distance + ctx.lane_length(*system, dest),
                    };
                    hops.push((*empire, lane, Some(reached)));
                }
            }
        }

        let mut done = Vec::new();
        for (empire, lane, reached) in hops {
            let Some(reached) = reached else {
                self.record_obstructed(empire, lane);
                continue;
            };
            done.push((empire, lane, reached));
            next.entry(empire)
                .or_default()
                .entry(lane.1)
                .and_modify(|existing| {
                    existing.range = existing.range.max(reached.range);
                    existing.distance = existing.distance.min(reached.distance);
                })
                .or_insert(reached);
            self.traversals.entry(empire).or_default().insert(lane);
            if let Some(obstructed) = self.obstructed_traversals.get_mut(&empire) {
                obstructed.remove(&lane);
                obstructed.remove(&(lane.1, lane.0));
            }
        }

        self.claims = next;
        done
    }

    /// Replace each claim's distance with the shortest path from one of the
    /// empire's sources over the lanes it traversed.
    fn settle_distances(&mut self, ctx: &SupplyContext) {
        for (empire, claims) in &mut self.claims {
            let Some(lanes) = self.traversals.get(empire) else {
                continue;
            };
            let mut outbound: BTreeMap<SystemId, Vec<SystemId>> = BTreeMap::new();
            for (from, to) in lanes {
                outbound.entry(*from).or_default().push(*to);
            }

            let sources = ctx.empires.get(empire).map(|supply| &supply.supply_ranges);
            let mut best: BTreeMap<SystemId, f32> = BTreeMap::new();
            let mut heap = BinaryHeap::new();
            for (system, claim) in claims.iter() {
                if claim.distance == 0.0 && sources.is_some_and(|s| s.contains_key(system)) {
                    best.insert(*system, 0.0);
                    heap.push(Frontier {
                        distance: 0.0,
                        system: *system,
                    });
                }
            }

            while let Some(Frontier { distance, system }) = heap.pop() {
                if best.get(&system).is_some_and(|known| distance > *known) {
                    continue;
                }
                for dest in outbound.get(&system).into_iter().flatten() {
                    if !claims.contains_key(dest) {
                        continue;
                    }
                    let reached = distance + ctx.lane_length(system, *dest);
                    if best.get(dest).map_or(true, |known| reached < *known) {
                        best.insert(*dest, reached);
                        heap.push(Frontier {
                            distance: reached,
                            system: *dest,
                        });
                    }
                }
            }

            for (system, distance) in best {
                if let Some(claim) = claims.get_mut(&system) {
                    claim.distance = distance;
                }
            }
        }
    }
}

/// Run arbitration and propagation rounds until every range is spent.
///
/// `ctx` must already carry refined unobstructed sets; they are copied, not
/// modified.
pub fn propagate_supply(ctx: &SupplyContext, strengths: &SupplyStrengths) -> Propagation {
    let mut state = Propagation::seed(ctx);
    let Some(top_level) = state.top_level() else {
        return state;
    };

    let mut level = top_level;
    let mut hops = 0usize;
    loop {
        state.arbitrate(ctx, strengths);
        state.rounds += 1;
        if level <= 0 {
            break;
        }
        hops += state.spread(ctx, level).len();
        level = state.next_level(level).unwrap_or(0);
    }
    state.settle_distances(ctx);

    tracing::debug!(
        target: "starlane::supply",
        rounds = state.rounds,
        top_level,
        hops,
        contested = state.contested_systems.len(),
        purged = state.purged_claims,
        "supply.propagation.done"
    );
    state
}

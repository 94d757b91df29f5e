use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::ids::{Lane, SystemId};

pub type ResourceGroups = BTreeSet<BTreeSet<SystemId>>;

/// Split `supplyable` into systems connected by `traversals`.
///
/// Lanes count in both directions. Lanes touching a system outside
/// `supplyable` are ignored, and a supplyable system with no usable lane
/// forms a group of its own.
pub fn resource_groups(traversals: &BTreeSet<Lane>, supplyable: &BTreeSet<SystemId>) -> ResourceGroups {
    let mut adjacency: BTreeMap<SystemId, BTreeSet<SystemId>> = BTreeMap::new();
    for (a, b) in traversals {
        if a == b || !supplyable.contains(a) || !supplyable.contains(b) {
            continue;
        }
        adjacency.entry(*a).or_default().insert(*b);
        adjacency.entry(*b).or_default().insert(*a);
    }

    let mut groups = ResourceGroups::new();
    let mut visited: BTreeSet<SystemId> = BTreeSet::new();
    for start in supplyable {
        if !visited.insert(*start) {
            continue;
        }
        let mut component = BTreeSet::new();
        let mut queue = VecDeque::from([*start]);
        while let Some(system) = queue.pop_front() {
            component.insert(system);
            for next in adjacency.get(&system).into_iter().flatten() {
                if visited.insert(*next) {
                    queue.push_back(*next);
                }
            }
        }
        groups.insert(component);
    }
    groups
}

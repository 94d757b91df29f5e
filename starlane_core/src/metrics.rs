use std::collections::BTreeMap;

use bevy::prelude::*;

use crate::{ids::EmpireId, resources::SupplyTelemetry, supply::SupplyManager};

#[derive(Resource, Default, Debug, Clone)]
pub struct SupplyMetrics {
    pub turn: u64,
    pub supplied_systems: BTreeMap<EmpireId, usize>,
    pub resource_groups: BTreeMap<EmpireId, usize>,
    pub largest_group: BTreeMap<EmpireId, usize>,
    pub contested_systems: usize,
    pub purged_claims: usize,
}

pub fn collect_supply_metrics(
    manager: Res<SupplyManager>,
    telemetry: Res<SupplyTelemetry>,
    mut metrics: ResMut<SupplyMetrics>,
) {
    metrics.turn += 1;
    metrics.supplied_systems.clear();
    metrics.resource_groups.clear();
    metrics.largest_group.clear();

    for empire in manager.empires() {
        let groups = manager.resource_groups(empire);
        metrics
            .supplied_systems
            .insert(empire, manager.supplyable_systems(empire).len());
        metrics.resource_groups.insert(empire, groups.len());
        metrics.largest_group.insert(
            empire,
            groups.iter().map(|group| group.len()).max().unwrap_or(0),
        );
    }

    if let Some(summary) = telemetry.last {
        metrics.contested_systems = summary.contested_systems;
        metrics.purged_claims = summary.purged_claims;
    } else {
        metrics.contested_systems = 0;
        metrics.purged_claims = 0;
    }
}

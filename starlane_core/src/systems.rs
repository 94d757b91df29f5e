use bevy::{ecs::system::SystemParam, prelude::*};

use crate::{
    components::{EmpireSupply, Fleet, Planet, StarSystem},
    diplomacy::DiplomacyTable,
    ids::EmpireId,
    resources::{SimulationTick, SupplyTelemetry},
    supply::{self, SupplyContext, SupplyManager},
    supply_config::SupplyConfigHandle,
};

#[derive(SystemParam)]
pub struct SupplyUpdateParams<'w, 's> {
    pub config: Res<'w, SupplyConfigHandle>,
    pub diplomacy: Res<'w, DiplomacyTable>,
    pub manager: ResMut<'w, SupplyManager>,
    pub telemetry: ResMut<'w, SupplyTelemetry>,
    pub systems: Query<'w, 's, &'static StarSystem>,
    pub planets: Query<'w, 's, &'static Planet>,
    pub fleets: Query<'w, 's, &'static Fleet>,
    pub empires: Query<'w, 's, &'static mut EmpireSupply>,
}

/// Assemble a [`SupplyContext`] from the world model.
///
/// Planets and fleets are sorted by id so the context does not depend on
/// entity storage order.
pub fn collect_supply_context<'a>(
    systems: impl IntoIterator<Item = &'a StarSystem>,
    planets: impl IntoIterator<Item = &'a Planet>,
    fleets: impl IntoIterator<Item = &'a Fleet>,
    empires: impl IntoIterator<Item = &'a EmpireSupply>,
    diplomacy: &DiplomacyTable,
) -> SupplyContext {
    let mut ctx = SupplyContext {
        diplomacy: diplomacy.clone(),
        ..Default::default()
    };
    for system in systems {
        ctx.add_system(system.id, system.position);
        for neighbour in &system.lanes {
            ctx.connect(system.id, *neighbour);
        }
    }
    ctx.planets = planets.into_iter().cloned().collect();
    ctx.planets.sort_by_key(|planet| planet.id);
    ctx.fleets = fleets.into_iter().cloned().collect();
    ctx.fleets.sort_by_key(|fleet| fleet.id);
    for supply in empires {
        ctx.empires.insert(supply.empire, supply.clone());
    }
    ctx
}

pub fn update_supply_networks(mut params: SupplyUpdateParams) {
    let mut ctx = collect_supply_context(
        params.systems.iter(),
        params.planets.iter(),
        params.fleets.iter(),
        params.empires.iter(),
        &params.diplomacy,
    );
    let config = params.config.get();
    let summary = params.manager.update(&mut ctx, &config);

    for mut supply in params.empires.iter_mut() {
        let Some(refined) = ctx.empires.get(&supply.empire) else {
            continue;
        };
        if supply.unobstructed_systems != refined.unobstructed_systems {
            supply.unobstructed_systems = refined.unobstructed_systems.clone();
        }
    }
    params.telemetry.record(summary);

    if config.report.log_each_turn {
        let report = supply::dump(&params.manager, config.report.empire.map(EmpireId));
        tracing::debug!(target: "starlane::supply", report = %report, "supply.report");
    }
}

pub fn advance_tick(mut tick: ResMut<SimulationTick>) {
    tick.0 = tick.0.wrapping_add(1);
}

//! Supply network simulation for a multi-empire starlane galaxy.
//!
//! Provides deterministic ECS systems that recompute every empire's supply
//! network when [`run_turn`] is invoked. The computation itself lives in
//! [`supply`] and can be driven without an app through [`SupplyManager`].

pub mod components;
pub mod diplomacy;
pub mod ids;
pub mod metrics;
mod resources;
pub mod scenario;
mod snapshot;
pub mod supply;
pub mod supply_config;
pub mod systems;

use bevy::prelude::*;

pub use components::{EmpireSupply, Fleet, Meter, Planet, StarSystem};
pub use diplomacy::{DiplomacyTable, DiplomaticStatus};
pub use ids::{EmpireId, Lane, ObjectId, SystemId};
pub use metrics::SupplyMetrics;
pub use resources::{SimulationTick, SupplyTelemetry};
pub use scenario::{random_lattice, LatticeParams, Scenario, ScenarioError};
pub use snapshot::{
    restore_supply_from_snapshot, StoredSupplySnapshot, SupplySnapshotHistory,
};
pub use supply::{SupplyContext, SupplyManager, UpdateSummary};
pub use supply_config::{
    load_supply_config_from_env, SupplyConfig, SupplyConfigError, SupplyConfigHandle,
    SupplyConfigMetadata,
};

/// Construct a Bevy [`App`] configured with the supply turn pipeline.
pub fn build_headless_app() -> App {
    let mut app = App::new();

    let (config, metadata) = load_supply_config_from_env();
    let snapshot_history = SupplySnapshotHistory::with_capacity(config.snapshots.history_limit);

    app.insert_resource(SupplyConfigHandle::new(config))
        .insert_resource(metadata)
        .insert_resource(SimulationTick::default())
        .insert_resource(DiplomacyTable::default())
        .insert_resource(SupplyManager::default())
        .insert_resource(SupplyTelemetry::default())
        .insert_resource(SupplyMetrics::default())
        .insert_resource(snapshot_history)
        .add_plugins(MinimalPlugins)
        .add_systems(
            Update,
            (
                systems::update_supply_networks,
                metrics::collect_supply_metrics,
                systems::advance_tick,
                snapshot::capture_supply_snapshot,
            )
                .chain(),
        );

    app
}

/// Execute a single supply turn.
///
/// Each call processes the chained systems configured in [`build_headless_app`]
/// (supply update → metrics → tick increment → snapshot).
pub fn run_turn(app: &mut App) {
    app.update();
}

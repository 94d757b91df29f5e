#![allow(dead_code)]

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Once;

use starlane_core::scenario::{DiplomacySpec, EmpireSpec, PlanetSpec, SystemSpec};
use starlane_core::{DiplomaticStatus, Scenario, SystemId};

static INIT: Once = Once::new();

pub fn ensure_test_config() {
    INIT.call_once(|| {
        let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join("test_supply_config.json");

        debug_assert!(
            config_path.exists(),
            "missing test supply config at {}",
            config_path.display()
        );

        std::env::set_var("SUPPLY_CONFIG_PATH", &config_path);
    });
}

/// Systems `0..len` one unit apart along the x axis, joined in order.
pub fn chain(len: u32) -> Scenario {
    Scenario {
        systems: (0..len)
            .map(|id| SystemSpec {
                id,
                position: [id as f32, 0.0],
            })
            .collect(),
        lanes: (1..len).map(|id| (id - 1, id)).collect(),
        ..Default::default()
    }
}

pub fn source(id: u32, system: u32, range: f32) -> EmpireSpec {
    EmpireSpec {
        id,
        supply_ranges: [(system, range)].into(),
        ..Default::default()
    }
}

pub fn colony(id: u32, system: u32, owner: u32, supply: f32) -> PlanetSpec {
    PlanetSpec {
        id,
        system,
        owner: Some(owner),
        population: 1.0,
        supply,
        supply_max: None,
    }
}

pub fn allied(a: u32, b: u32) -> DiplomacySpec {
    DiplomacySpec {
        a,
        b,
        status: DiplomaticStatus::Allied,
    }
}

pub fn systems(ids: &[u32]) -> BTreeSet<SystemId> {
    ids.iter().copied().map(SystemId).collect()
}

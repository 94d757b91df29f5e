//! Galaxy descriptions for tests, benchmarks and the report binary.
//!
//! A [`Scenario`] lists systems, lanes, empires and the objects that feed a
//! supply update. It can build a [`SupplyContext`] directly or spawn the same
//! galaxy into a Bevy world.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs, io,
    path::{Path, PathBuf},
};

use bevy::{math::Vec2, prelude::*};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    components::{EmpireSupply, Fleet, Meter, Planet, StarSystem},
    diplomacy::{DiplomacyTable, DiplomaticStatus},
    ids::{EmpireId, ObjectId, SystemId},
    supply::SupplyContext,
};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{context} references unknown system {system}")]
    UnknownSystem { system: u32, context: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemSpec {
    pub id: u32,
    pub position: [f32; 2],
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmpireSpec {
    pub id: u32,
    pub supply_ranges: BTreeMap<u32, f32>,
    /// Systems the empire may supply; every system when absent.
    pub unobstructed: Option<Vec<u32>>,
    /// Lanes the empire knows about; every lane when absent.
    pub known_lanes: Option<Vec<(u32, u32)>>,
    pub known_destroyed: Vec<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlanetSpec {
    pub id: u32,
    pub system: u32,
    pub owner: Option<u32>,
    pub population: f32,
    pub supply: f32,
    pub supply_max: Option<f32>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FleetSpec {
    pub id: u32,
    pub owner: Option<u32>,
    pub system: Option<u32>,
    #[serde(default)]
    pub next_system: Option<u32>,
    #[serde(default = "default_true")]
    pub armed: bool,
    #[serde(default = "default_true")]
    pub obstructive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiplomacySpec {
    pub a: u32,
    pub b: u32,
    pub status: DiplomaticStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Scenario {
    pub systems: Vec<SystemSpec>,
    pub lanes: Vec<(u32, u32)>,
    pub empires: Vec<EmpireSpec>,
    pub planets: Vec<PlanetSpec>,
    pub fleets: Vec<FleetSpec>,
    pub diplomacy: Vec<DiplomacySpec>,
}

impl Scenario {
    pub fn from_json_str(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ScenarioError> {
        let contents = fs::read_to_string(path).map_err(|source| ScenarioError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    fn check_systems(&self) -> Result<(), ScenarioError> {
        let known: BTreeSet<u32> = self.systems.iter().map(|s| s.id).collect();
        let check = |system: u32, context: &dyn Fn() -> String| {
            if known.contains(&system) {
                Ok(())
            } else {
                Err(ScenarioError::UnknownSystem {
                    system,
                    context: context(),
                })
            }
        };

        for (a, b) in &self.lanes {
            check(*a, &|| format!("lane {a}-{b}"))?;
            check(*b, &|| format!("lane {a}-{b}"))?;
        }
        for empire in &self.empires {
            let label = || format!("empire {}", empire.id);
            for system in empire.supply_ranges.keys() {
                check(*system, &label)?;
            }
            for system in empire.unobstructed.iter().flatten() {
                check(*system, &label)?;
            }
            for (a, b) in empire.known_lanes.iter().flatten() {
                check(*a, &label)?;
                check(*b, &label)?;
            }
        }
        for planet in &self.planets {
            check(planet.system, &|| format!("planet {}", planet.id))?;
        }
        for fleet in &self.fleets {
            for system in fleet.system.iter().chain(fleet.next_system.iter()) {
                check(*system, &|| format!("fleet {}", fleet.id))?;
            }
        }
        Ok(())
    }

    /// Build the plain supply input for this galaxy.
    pub fn to_context(&self) -> Result<SupplyContext, ScenarioError> {
        self.check_systems()?;

        let mut ctx = SupplyContext::default();
        for system in &self.systems {
            ctx.add_system(
                SystemId(system.id),
                Vec2::new(system.position[0], system.position[1]),
            );
        }
        for (a, b) in &self.lanes {
            ctx.connect(SystemId(*a), SystemId(*b));
        }

        let all_systems: BTreeSet<SystemId> = ctx.positions.keys().copied().collect();
        for spec in &self.empires {
            let known_lanes = match &spec.known_lanes {
                Some(lanes) => {
                    let mut known: BTreeMap<SystemId, BTreeSet<SystemId>> = BTreeMap::new();
                    for (a, b) in lanes {
                        if a == b {
                            continue;
                        }
                        known.entry(SystemId(*a)).or_default().insert(SystemId(*b));
                        known.entry(SystemId(*b)).or_default().insert(SystemId(*a));
                    }
                    known
                }
                None => ctx.lanes.clone(),
            };
            let supply = ctx.empire_mut(EmpireId(spec.id));
            supply.supply_ranges = spec
                .supply_ranges
                .iter()
                .map(|(system, range)| (SystemId(*system), *range))
                .collect();
            supply.unobstructed_systems = match &spec.unobstructed {
                Some(systems) => systems.iter().copied().map(SystemId).collect(),
                None => all_systems.clone(),
            };
            supply.known_lanes = known_lanes;
            supply.known_destroyed_objects =
                spec.known_destroyed.iter().copied().map(ObjectId).collect();
        }

        ctx.planets = self
            .planets
            .iter()
            .map(|spec| Planet {
                id: ObjectId(spec.id),
                system: SystemId(spec.system),
                owner: spec.owner.map(EmpireId),
                population: spec.population,
                supply: Meter::new(spec.supply, spec.supply_max.unwrap_or(spec.supply)),
            })
            .collect();
        ctx.fleets = self
            .fleets
            .iter()
            .map(|spec| Fleet {
                id: ObjectId(spec.id),
                owner: spec.owner.map(EmpireId),
                system: spec.system.map(SystemId),
                next_system: spec.next_system.map(SystemId),
                armed: spec.armed,
                obstructive: spec.obstructive,
            })
            .collect();
        for pact in &self.diplomacy {
            ctx.diplomacy
                .set_status(EmpireId(pact.a), EmpireId(pact.b), pact.status);
        }
        Ok(ctx)
    }

    /// Spawn the galaxy as entities and install its diplomacy table.
    pub fn spawn(&self, world: &mut World) -> Result<(), ScenarioError> {
        let ctx = self.to_context()?;
        for (id, position) in &ctx.positions {
            let mut system = StarSystem::new(*id, *position);
            if let Some(lanes) = ctx.lanes.get(id) {
                system.lanes = lanes.clone();
            }
            world.spawn(system);
        }
        for planet in ctx.planets {
            world.spawn(planet);
        }
        for fleet in ctx.fleets {
            world.spawn(fleet);
        }
        for supply in ctx.empires.into_values() {
            world.spawn(supply);
        }
        world.insert_resource(ctx.diplomacy);
        Ok(())
    }
}

/// Shape of a generated grid galaxy.
#[derive(Debug, Clone)]
pub struct LatticeParams {
    pub seed: u64,
    pub width: u32,
    pub height: u32,
    pub empires: u32,
    pub sources_per_empire: u32,
    pub max_range: u32,
    /// Chance that each grid lane exists.
    pub lane_density: f64,
    pub alliance_chance: f64,
    pub fleets_per_empire: u32,
}

impl Default for LatticeParams {
    fn default() -> Self {
        Self {
            seed: 0,
            width: 8,
            height: 8,
            empires: 3,
            sources_per_empire: 2,
            max_range: 3,
            lane_density: 0.85,
            alliance_chance: 0.3,
            fleets_per_empire: 1,
        }
    }
}

impl LatticeParams {
    pub fn new(seed: u64, width: u32, height: u32, empires: u32) -> Self {
        Self {
            seed,
            width,
            height,
            empires,
            ..Default::default()
        }
    }
}

/// Generate a grid galaxy. The same parameters always yield the same scenario.
pub fn random_lattice(params: &LatticeParams) -> Scenario {
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    let mut scenario = Scenario::default();
    let index = |x: u32, y: u32| y * params.width + x;
    let system_count = params.width * params.height;

    for y in 0..params.height {
        for x in 0..params.width {
            let jitter_x = rng.gen_range(-0.2f32..0.2);
            let jitter_y = rng.gen_range(-0.2f32..0.2);
            scenario.systems.push(SystemSpec {
                id: index(x, y),
                position: [x as f32 + jitter_x, y as f32 + jitter_y],
            });
            if x > 0 && rng.gen_bool(params.lane_density) {
                scenario.lanes.push((index(x - 1, y), index(x, y)));
            }
            if y > 0 && rng.gen_bool(params.lane_density) {
                scenario.lanes.push((index(x, y - 1), index(x, y)));
            }
        }
    }
    if system_count == 0 {
        return scenario;
    }

    let mut next_object = 0u32;
    for empire in 0..params.empires {
        let mut spec = EmpireSpec {
            id: empire,
            ..Default::default()
        };
        for _ in 0..params.sources_per_empire {
            let system = rng.gen_range(0..system_count);
            let range = rng.gen_range(0..=params.max_range) as f32;
            spec.supply_ranges.insert(system, range);
            let populated = rng.gen_bool(0.5);
            scenario.planets.push(PlanetSpec {
                id: next_object,
                system,
                owner: Some(empire),
                population: if populated { rng.gen_range(1.0..10.0) } else { 0.0 },
                supply: range,
                supply_max: Some(range + 1.0),
            });
            next_object += 1;
        }
        for _ in 0..params.fleets_per_empire {
            let system = rng.gen_range(0..system_count);
            scenario.fleets.push(FleetSpec {
                id: next_object,
                owner: Some(empire),
                system: Some(system),
                next_system: None,
                armed: rng.gen_bool(0.7),
                obstructive: true,
            });
            next_object += 1;
        }
        scenario.empires.push(spec);
    }

    for a in 0..params.empires {
        for b in (a + 1)..params.empires {
            if rng.gen_bool(params.alliance_chance) {
                scenario.diplomacy.push(DiplomacySpec {
                    a,
                    b,
                    status: DiplomaticStatus::Allied,
                });
            }
        }
    }
    scenario
}

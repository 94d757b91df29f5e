use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use starlane_core::{
    build_headless_app, random_lattice, run_turn, supply, EmpireId, LatticeParams, Scenario,
    SupplyManager, SupplySnapshotHistory,
};
use starlane_proto::encode_snapshot_json;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Run supply turns over a galaxy and print the result", long_about = None)]
struct Args {
    /// Scenario JSON describing the galaxy
    #[arg(long, conflicts_with = "lattice_seed")]
    scenario: Option<PathBuf>,

    /// Generate a grid galaxy from this seed instead of loading a scenario
    #[arg(long)]
    lattice_seed: Option<u64>,

    /// Grid width and height for generated galaxies
    #[arg(long, default_value_t = 8)]
    lattice_size: u32,

    /// Number of empires in generated galaxies
    #[arg(long, default_value_t = 3)]
    lattice_empires: u32,

    /// Number of turns to run
    #[arg(long, default_value_t = 1)]
    turns: u32,

    /// Only report this empire
    #[arg(long)]
    empire: Option<u32>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

fn load_scenario(args: &Args) -> Result<Scenario> {
    match (&args.scenario, args.lattice_seed) {
        (Some(path), _) => Scenario::from_file(path)
            .with_context(|| format!("Failed to load scenario at {}", path.display())),
        (None, Some(seed)) => Ok(random_lattice(&LatticeParams::new(
            seed,
            args.lattice_size,
            args.lattice_size,
            args.lattice_empires,
        ))),
        (None, None) => bail!("either --scenario or --lattice-seed is required"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let scenario = load_scenario(&args)?;

    let mut app = build_headless_app();
    scenario
        .spawn(&mut app.world)
        .context("Scenario does not describe a consistent galaxy")?;
    for _ in 0..args.turns {
        run_turn(&mut app);
    }

    match args.format {
        Format::Text => {
            let manager = app.world.resource::<SupplyManager>();
            print!("{}", supply::dump(manager, args.empire.map(EmpireId)));
        }
        Format::Json => {
            let history = app.world.resource::<SupplySnapshotHistory>();
            let Some(latest) = history.latest() else {
                bail!("no supply snapshot was captured; run at least one turn");
            };
            let mut snapshot = latest.snapshot.clone();
            if let Some(empire) = args.empire {
                let Some(state) = snapshot.empire(empire).cloned() else {
                    bail!("empire {empire} is not in the snapshot");
                };
                snapshot.empires = vec![state];
            }
            let json = encode_snapshot_json(&snapshot).context("Failed to encode snapshot")?;
            println!("{json}");
        }
    }
    Ok(())
}

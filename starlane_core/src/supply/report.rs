//! Human-readable dump of the supply network state.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Write};

use crate::ids::{EmpireId, Lane, SystemId};
use crate::supply::manager::SupplyManager;

fn write_lanes<W: Write>(out: &mut W, label: &str, lanes: &BTreeSet<Lane>) -> fmt::Result {
    write!(out, "  {label}:")?;
    for (from, to) in lanes {
        write!(out, " {from}->{to}")?;
    }
    writeln!(out)
}

fn write_systems<W: Write>(out: &mut W, label: &str, systems: &BTreeSet<SystemId>) -> fmt::Result {
    write!(out, "  {label}:")?;
    for system in systems {
        write!(out, " {system}")?;
    }
    writeln!(out)
}

fn write_values<W: Write>(out: &mut W, label: &str, values: &BTreeMap<SystemId, f32>) -> fmt::Result {
    write!(out, "  {label}:")?;
    for (system, value) in values {
        write!(out, " {system}={value}")?;
    }
    writeln!(out)
}

fn write_empire<W: Write>(out: &mut W, manager: &SupplyManager, empire: EmpireId) -> fmt::Result {
    writeln!(out, "empire {empire}")?;
    write_systems(out, "supplyable", manager.supplyable_systems(empire))?;
    write_lanes(out, "traversals", manager.traversals(empire))?;
    write_lanes(out, "obstructed", manager.obstructed_traversals(empire))?;
    write_lanes(out, "allied traversals", manager.allied_traversals(empire))?;
    write_values(out, "ranges", manager.empire_propagated_ranges(empire))?;
    write_values(out, "distances", manager.empire_propagated_distances(empire))?;
    let groups = manager.resource_groups(empire);
    writeln!(out, "  resource groups: {}", groups.len())?;
    for group in groups {
        write_systems(out, "  group", group)?;
    }
    Ok(())
}

/// Write the report for `empire`, or for every empire followed by the global
/// propagated maps when `empire` is `None`.
pub fn write_report<W: Write>(
    out: &mut W,
    manager: &SupplyManager,
    empire: Option<EmpireId>,
) -> fmt::Result {
    match empire {
        Some(empire) => write_empire(out, manager, empire),
        None => {
            for empire in manager.empires() {
                write_empire(out, manager, empire)?;
            }
            writeln!(out, "galaxy")?;
            write_values(out, "ranges", manager.propagated_ranges())?;
            write_values(out, "distances", manager.propagated_distances())
        }
    }
}

/// Write the report into `out`, logging a formatting failure instead of
/// returning it. Returns whether the report was written in full.
pub fn dump_into<W: Write>(
    out: &mut W,
    manager: &SupplyManager,
    empire: Option<EmpireId>,
) -> bool {
    match write_report(out, manager, empire) {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(
                target: "starlane::supply",
                error = %err,
                "supply.report.failed"
            );
            false
        }
    }
}

/// Render the report into a string.
pub fn dump(manager: &SupplyManager, empire: Option<EmpireId>) -> String {
    let mut out = String::new();
    dump_into(&mut out, manager, empire);
    out
}

use bevy::prelude::*;

use crate::supply::UpdateSummary;

/// Simulation tick counter.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SimulationTick(pub u64);

/// Running record of supply updates.
#[derive(Resource, Debug, Default, Clone)]
pub struct SupplyTelemetry {
    pub last: Option<UpdateSummary>,
    pub updates: u64,
    pub unconverged_updates: u64,
    pub overlap_anomalies: u64,
}

impl SupplyTelemetry {
    pub fn record(&mut self, summary: UpdateSummary) {
        self.updates += 1;
        if !summary.alliance_converged {
            self.unconverged_updates += 1;
        }
        self.overlap_anomalies += summary.overlap_anomalies as u64;
        self.last = Some(summary);
    }
}

//! Supply network computation.
//!
//! A turn's update runs in stages: obstruction refinement, range propagation
//! with per-system arbitration, result extraction, alliance sharing and
//! finally grouping of connected supply into resource groups.

pub mod alliance;
pub mod context;
pub mod groups;
pub mod manager;
pub mod obstruction;
pub mod propagation;
pub mod report;
pub mod scoring;

pub use alliance::{merge_allied_supply, AllianceInputs, AllianceMerge};
pub use context::SupplyContext;
pub use groups::{resource_groups, ResourceGroups};
pub use manager::{SupplyManager, UpdateSummary};
pub use obstruction::{enforces_supply, refine_obstructions};
pub use propagation::{propagate_supply, Propagation, SupplyClaim};
pub use report::{dump, dump_into, write_report};
pub use scoring::{resolve_contest, ClaimScore, ContestOutcome, SettlementTier, SupplyStrengths};

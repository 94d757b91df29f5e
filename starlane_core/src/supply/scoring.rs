//! Strength scores used to arbitrate systems claimed by several empires.
//!
//! The comparison is lexicographic: supply range first, then the strength of
//! the claimant's local presence, then its empire-wide supply, then distance.
//! Later components only matter when every earlier one is exactly equal.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::components::Planet;
use crate::diplomacy::DiplomacyTable;
use crate::ids::{EmpireId, SystemId};
use crate::supply::propagation::SupplyClaim;

const COLONY_BONUS: f32 = 0.5;
const OUTPOST_BONUS: f32 = 0.3;
const LOCAL_CURRENT_WEIGHT: f32 = 1.0 / 1_000.0;
const LOCAL_MAX_WEIGHT: f32 = 1.0 / 100_000.0;
const EMPIRE_TOTAL_WEIGHT: f32 = 1.0 / 100_000_000.0;
const DISTANCE_WEIGHT: f32 = 1.0 / 10_000.0;

/// Kind of settlement an empire holds in a system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum SettlementTier {
    #[default]
    None,
    Outpost,
    Colony,
}

impl SettlementTier {
    fn bonus(self) -> f32 {
        match self {
            SettlementTier::None => 0.0,
            SettlementTier::Outpost => OUTPOST_BONUS,
            SettlementTier::Colony => COLONY_BONUS,
        }
    }
}

/// An empire's supply sources inside one system.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LocalStrength {
    pub tier: SettlementTier,
    pub current_sum: f32,
    pub max_sum: f32,
}

/// Per-empire supply source strengths gathered at the start of an update.
#[derive(Debug, Clone, Default)]
pub struct SupplyStrengths {
    local: BTreeMap<(EmpireId, SystemId), LocalStrength>,
    empire_totals: BTreeMap<EmpireId, f32>,
}

impl SupplyStrengths {
    pub fn collect<'a, I>(planets: I) -> Self
    where
        I: IntoIterator<Item = &'a Planet>,
    {
        let mut strengths = Self::default();
        for planet in planets {
            let Some(owner) = planet.owner else {
                continue;
            };
            let local = strengths.local.entry((owner, planet.system)).or_default();
            let tier = if planet.is_populated() {
                SettlementTier::Colony
            } else {
                SettlementTier::Outpost
            };
            local.tier = local.tier.max(tier);
            local.current_sum += planet.supply.current;
            local.max_sum += planet.supply.max;
            *strengths.empire_totals.entry(owner).or_default() += planet.supply.current;
        }
        strengths
    }

    pub fn local(&self, empire: EmpireId, system: SystemId) -> LocalStrength {
        self.local
            .get(&(empire, system))
            .copied()
            .unwrap_or_default()
    }

    pub fn empire_total(&self, empire: EmpireId) -> f32 {
        self.empire_totals.get(&empire).copied().unwrap_or(0.0)
    }

    pub fn score(&self, empire: EmpireId, system: SystemId, claim: SupplyClaim) -> ClaimScore {
        let local = self.local(empire, system);
        ClaimScore {
            range: claim.range,
            tier: local.tier,
            local_current: local.current_sum,
            local_max: local.max_sum,
            empire_total: self.empire_total(empire),
            distance: claim.distance.max(1.0),
        }
    }
}

/// Comparable strength of one empire's claim on one system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClaimScore {
    pub range: f32,
    pub tier: SettlementTier,
    pub local_current: f32,
    pub local_max: f32,
    pub empire_total: f32,
    pub distance: f32,
}

fn compare_exact(a: f32, b: f32) -> Ordering {
    if a > b {
        Ordering::Greater
    } else if a < b {
        Ordering::Less
    } else {
        Ordering::Equal
    }
}

impl ClaimScore {
    pub fn compare(&self, other: &Self) -> Ordering {
        compare_exact(self.range, other.range)
            .then(self.tier.cmp(&other.tier))
            .then(compare_exact(self.local_current, other.local_current))
            .then(compare_exact(self.local_max, other.local_max))
            .then(compare_exact(self.empire_total, other.empire_total))
            .then(compare_exact(self.distance, other.distance))
    }

    /// Range plus the weighted tie-break bonus, as a single number for logs.
    pub fn claim_value(&self) -> f32 {
        self.range
            + self.tier.bonus()
            + self.local_current * LOCAL_CURRENT_WEIGHT
            + self.local_max * LOCAL_MAX_WEIGHT
            + self.empire_total * EMPIRE_TOTAL_WEIGHT
            + self.distance * DISTANCE_WEIGHT
    }
}

/// Outcome of arbitrating a system claimed by two or more empires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContestOutcome {
    /// `winner` keeps its claim; allied empires tied with it keep theirs too.
    Winner {
        winner: EmpireId,
        allied_co_winners: Vec<EmpireId>,
    },
    /// Tied between empires that are not all allied: every claim is dropped.
    Deadlock,
}

impl ContestOutcome {
    pub fn keeps_claim(&self, empire: EmpireId) -> bool {
        match self {
            ContestOutcome::Winner {
                winner,
                allied_co_winners,
            } => *winner == empire || allied_co_winners.contains(&empire),
            ContestOutcome::Deadlock => false,
        }
    }
}

/// Pick the surviving claimant(s) among `scores`, which must not be empty.
pub fn resolve_contest(scores: &[(EmpireId, ClaimScore)], diplomacy: &DiplomacyTable) -> ContestOutcome {
    let Some(best) = scores
        .iter()
        .map(|(_, score)| *score)
        .reduce(|best, score| {
            if score.compare(&best) == Ordering::Greater {
                score
            } else {
                best
            }
        })
    else {
        return ContestOutcome::Deadlock;
    };

    let mut tied: Vec<EmpireId> = scores
        .iter()
        .filter(|(_, score)| score.compare(&best) == Ordering::Equal)
        .map(|(empire, _)| *empire)
        .collect();
    tied.sort();

    if tied.len() > 1 && !diplomacy.all_mutually_allied(&tied) {
        return ContestOutcome::Deadlock;
    }
    let winner = tied.remove(0);
    ContestOutcome::Winner {
        winner,
        allied_co_winners: tied,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Meter;
    use crate::diplomacy::DiplomaticStatus;
    use crate::ids::ObjectId;

    fn score(range: f32) -> ClaimScore {
        ClaimScore {
            range,
            tier: SettlementTier::None,
            local_current: 0.0,
            local_max: 0.0,
            empire_total: 0.0,
            distance: 1.0,
        }
    }

    fn planet(id: u32, system: u32, owner: u32, population: f32, current: f32) -> Planet {
        Planet {
            id: ObjectId(id),
            system: SystemId(system),
            owner: Some(EmpireId(owner)),
            population,
            supply: Meter::new(current, current + 1.0),
        }
    }

    #[test]
    fn range_dominates_every_bonus() {
        let mut weak = score(2.0);
        weak.tier = SettlementTier::Colony;
        weak.local_current = 900.0;
        weak.empire_total = 1.0e6;
        assert_eq!(score(3.0).compare(&weak), Ordering::Greater);
    }

    #[test]
    fn tiers_then_meters_then_distance() {
        let mut colony = score(2.0);
        colony.tier = SettlementTier::Colony;
        let mut outpost = score(2.0);
        outpost.tier = SettlementTier::Outpost;
        outpost.local_current = 50.0;
        assert_eq!(colony.compare(&outpost), Ordering::Greater);

        let mut richer = score(2.0);
        richer.local_current = 1.0;
        let mut wider = score(2.0);
        wider.local_max = 10.0;
        assert_eq!(richer.compare(&wider), Ordering::Greater);

        let mut farther = score(2.0);
        farther.distance = 3.0;
        assert_eq!(farther.compare(&score(2.0)), Ordering::Greater);
        assert_eq!(score(2.0).compare(&score(2.0)), Ordering::Equal);
    }

    #[test]
    fn claim_value_orders_like_the_comparator_for_integer_ranges() {
        let mut colony = score(1.0);
        colony.tier = SettlementTier::Colony;
        let mut outpost = score(1.0);
        outpost.tier = SettlementTier::Outpost;
        assert!(colony.claim_value() > outpost.claim_value());
        assert!(score(2.0).claim_value() > colony.claim_value());
    }

    #[test]
    fn strengths_aggregate_planets_per_system() {
        let planets = vec![
            planet(1, 4, 0, 0.0, 1.0),
            planet(2, 4, 0, 5.0, 2.0),
            planet(3, 5, 0, 0.0, 3.0),
            planet(4, 4, 1, 0.0, 1.0),
        ];
        let strengths = SupplyStrengths::collect(&planets);
        let local = strengths.local(EmpireId(0), SystemId(4));
        assert_eq!(local.tier, SettlementTier::Colony);
        assert_eq!(local.current_sum, 3.0);
        assert_eq!(local.max_sum, 5.0);
        assert_eq!(strengths.empire_total(EmpireId(0)), 6.0);
        assert_eq!(
            strengths.local(EmpireId(1), SystemId(4)).tier,
            SettlementTier::Outpost
        );
        assert_eq!(strengths.local(EmpireId(2), SystemId(4)), LocalStrength::default());
    }

    #[test]
    fn single_best_claim_wins() {
        let diplomacy = DiplomacyTable::default();
        let outcome = resolve_contest(
            &[(EmpireId(2), score(3.0)), (EmpireId(1), score(2.0))],
            &diplomacy,
        );
        assert_eq!(
            outcome,
            ContestOutcome::Winner {
                winner: EmpireId(2),
                allied_co_winners: vec![]
            }
        );
        assert!(!outcome.keeps_claim(EmpireId(1)));
    }

    #[test]
    fn unallied_tie_is_a_deadlock() {
        let diplomacy = DiplomacyTable::default();
        let outcome = resolve_contest(
            &[(EmpireId(0), score(2.0)), (EmpireId(1), score(2.0))],
            &diplomacy,
        );
        assert_eq!(outcome, ContestOutcome::Deadlock);
    }

    #[test]
    fn allied_tie_keeps_every_tied_ally_and_books_lowest_id() {
        let mut diplomacy = DiplomacyTable::default();
        diplomacy.set_status(EmpireId(3), EmpireId(5), DiplomaticStatus::Allied);
        let outcome = resolve_contest(
            &[
                (EmpireId(5), score(2.0)),
                (EmpireId(3), score(2.0)),
                (EmpireId(9), score(1.0)),
            ],
            &diplomacy,
        );
        assert_eq!(
            outcome,
            ContestOutcome::Winner {
                winner: EmpireId(3),
                allied_co_winners: vec![EmpireId(5)]
            }
        );
        assert!(outcome.keeps_claim(EmpireId(5)));
        assert!(!outcome.keeps_claim(EmpireId(9)));
    }
}

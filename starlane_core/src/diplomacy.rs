//! Pairwise diplomatic status between empires.

use std::collections::BTreeMap;

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::ids::EmpireId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiplomaticStatus {
    #[default]
    War,
    Peace,
    Allied,
}

/// Symmetric status table. Pairs that were never set are at war.
#[derive(Resource, Debug, Clone, Default)]
pub struct DiplomacyTable {
    statuses: BTreeMap<(EmpireId, EmpireId), DiplomaticStatus>,
}

fn pair_key(a: EmpireId, b: EmpireId) -> (EmpireId, EmpireId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl DiplomacyTable {
    pub fn set_status(&mut self, a: EmpireId, b: EmpireId, status: DiplomaticStatus) {
        if a == b {
            return;
        }
        self.statuses.insert(pair_key(a, b), status);
    }

    pub fn status(&self, a: EmpireId, b: EmpireId) -> DiplomaticStatus {
        self.statuses
            .get(&pair_key(a, b))
            .copied()
            .unwrap_or_default()
    }

    /// An empire is never its own ally.
    pub fn are_allied(&self, a: EmpireId, b: EmpireId) -> bool {
        a != b && self.status(a, b) == DiplomaticStatus::Allied
    }

    /// Allies of `empire` among `roster`, in ascending id order when the
    /// roster is ordered.
    pub fn allies_of<'a, I>(&self, empire: EmpireId, roster: I) -> Vec<EmpireId>
    where
        I: IntoIterator<Item = &'a EmpireId>,
    {
        roster
            .into_iter()
            .copied()
            .filter(|other| self.are_allied(empire, *other))
            .collect()
    }

    /// True when every pair drawn from `empires` is allied.
    pub fn all_mutually_allied(&self, empires: &[EmpireId]) -> bool {
        empires.iter().enumerate().all(|(idx, a)| {
            empires[idx + 1..]
                .iter()
                .all(|b| self.are_allied(*a, *b))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (EmpireId, EmpireId, DiplomaticStatus)> + '_ {
        self.statuses
            .iter()
            .map(|((a, b), status)| (*a, *b, *status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_pairs_default_to_war() {
        let table = DiplomacyTable::default();
        assert_eq!(table.status(EmpireId(1), EmpireId(2)), DiplomaticStatus::War);
        assert!(!table.are_allied(EmpireId(1), EmpireId(2)));
    }

    #[test]
    fn status_is_symmetric() {
        let mut table = DiplomacyTable::default();
        table.set_status(EmpireId(4), EmpireId(2), DiplomaticStatus::Allied);
        assert!(table.are_allied(EmpireId(2), EmpireId(4)));
        assert!(table.are_allied(EmpireId(4), EmpireId(2)));
    }

    #[test]
    fn empire_is_not_its_own_ally() {
        let mut table = DiplomacyTable::default();
        table.set_status(EmpireId(1), EmpireId(1), DiplomaticStatus::Allied);
        assert!(!table.are_allied(EmpireId(1), EmpireId(1)));
        let roster = [EmpireId(1)];
        assert!(table.allies_of(EmpireId(1), roster.iter()).is_empty());
    }

    #[test]
    fn mutual_alliance_requires_every_pair() {
        let mut table = DiplomacyTable::default();
        let (a, b, c) = (EmpireId(0), EmpireId(1), EmpireId(2));
        table.set_status(a, b, DiplomaticStatus::Allied);
        table.set_status(b, c, DiplomaticStatus::Allied);
        assert!(table.all_mutually_allied(&[a, b]));
        assert!(!table.all_mutually_allied(&[a, b, c]));
        table.set_status(a, c, DiplomaticStatus::Allied);
        assert!(table.all_mutually_allied(&[a, b, c]));
        assert!(table.all_mutually_allied(&[c]));
    }

    #[test]
    fn iter_lists_each_pair_once_in_key_order() {
        let mut table = DiplomacyTable::default();
        table.set_status(EmpireId(3), EmpireId(1), DiplomaticStatus::Peace);
        table.set_status(EmpireId(0), EmpireId(2), DiplomaticStatus::Allied);
        table.set_status(EmpireId(1), EmpireId(3), DiplomaticStatus::Allied);
        let pairs: Vec<_> = table.iter().collect();
        assert_eq!(
            pairs,
            vec![
                (EmpireId(0), EmpireId(2), DiplomaticStatus::Allied),
                (EmpireId(1), EmpireId(3), DiplomaticStatus::Allied),
            ]
        );
    }
}

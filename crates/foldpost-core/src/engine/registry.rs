use super::error::EngineError;
use crate::core::catalog::Rank;
use crate::core::io::error_matrix::ErrorMatrix;
use crate::core::models::structure::Structure;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// The parallel families of structures kept for each rank.
///
/// `Original` holds structures as loaded; the other groups only ever receive
/// clones derived from another group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PoseGroup {
    Original,
    Relaxed,
    Phosphorylated,
}

impl PoseGroup {
    pub const ALL: [PoseGroup; 3] = [
        PoseGroup::Original,
        PoseGroup::Relaxed,
        PoseGroup::Phosphorylated,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PoseGroup::Original => "original",
            PoseGroup::Relaxed => "relaxed",
            PoseGroup::Phosphorylated => "phospho",
        }
    }
}

impl fmt::Display for PoseGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PoseGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PoseGroup::ALL
            .into_iter()
            .find(|g| g.name() == s)
            .ok_or_else(|| format!("unknown pose group '{s}'"))
    }
}

/// Error matrices keyed by rank, iterated in insertion (catalog) order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorTable {
    order: Vec<Rank>,
    matrices: HashMap<Rank, ErrorMatrix>,
}

impl ErrorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a matrix; a rank seen before keeps its position.
    pub fn insert(&mut self, rank: Rank, matrix: ErrorMatrix) {
        if self.matrices.insert(rank, matrix).is_none() {
            self.order.push(rank);
        }
    }

    pub fn get(&self, rank: Rank) -> Option<&ErrorMatrix> {
        self.matrices.get(&rank)
    }

    pub fn ranks(&self) -> &[Rank] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Rank, &ErrorMatrix)> {
        self.order.iter().map(|r| (*r, &self.matrices[r]))
    }
}

/// One step of a group walk.
#[derive(Debug, Clone, Copy)]
pub struct PoseEntry<'a> {
    pub rank: Rank,
    pub structure: &'a Structure,
    pub errors: &'a ErrorMatrix,
}

/// Structures of every group, keyed by rank.
#[derive(Debug, Clone, Default)]
pub struct PoseRegistry {
    groups: BTreeMap<PoseGroup, BTreeMap<Rank, Structure>>,
}

impl PoseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn group(&self, group: PoseGroup) -> Option<&BTreeMap<Rank, Structure>> {
        self.groups.get(&group)
    }

    /// Records a freshly loaded structure.
    pub fn insert_original(&mut self, rank: Rank, structure: Structure) {
        self.groups
            .entry(PoseGroup::Original)
            .or_default()
            .insert(rank, structure);
    }

    /// Puts a structure back into a group when reloading a dump.
    pub(crate) fn restore(&mut self, group: PoseGroup, rank: Rank, structure: Structure) {
        self.groups.entry(group).or_default().insert(rank, structure);
    }

    /// Clones `from[rank]` into `to[rank]` unless the target already exists.
    ///
    /// Returns whether a clone was made.
    pub fn derive(&mut self, from: PoseGroup, to: PoseGroup, rank: Rank) -> Result<bool, EngineError> {
        if self.contains(to, rank) {
            return Ok(false);
        }
        let copy = self.get(from, rank)?.clone();
        self.groups.entry(to).or_default().insert(rank, copy);
        Ok(true)
    }

    /// Clones `from[rank]` into `to[rank]`, replacing any existing entry.
    pub fn rederive(&mut self, from: PoseGroup, to: PoseGroup, rank: Rank) -> Result<(), EngineError> {
        let copy = self.get(from, rank)?.clone();
        self.groups.entry(to).or_default().insert(rank, copy);
        Ok(())
    }

    pub fn get(&self, group: PoseGroup, rank: Rank) -> Result<&Structure, EngineError> {
        self.group(group)
            .and_then(|g| g.get(&rank))
            .ok_or(EngineError::KeyNotFound { group, rank })
    }

    pub fn get_mut(&mut self, group: PoseGroup, rank: Rank) -> Result<&mut Structure, EngineError> {
        self.groups
            .get_mut(&group)
            .and_then(|g| g.get_mut(&rank))
            .ok_or(EngineError::KeyNotFound { group, rank })
    }

    pub fn contains(&self, group: PoseGroup, rank: Rank) -> bool {
        self.group(group).is_some_and(|g| g.contains_key(&rank))
    }

    pub fn len(&self, group: PoseGroup) -> usize {
        self.group(group).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self, group: PoseGroup) -> bool {
        self.len(group) == 0
    }

    pub fn ranks(&self, group: PoseGroup) -> Vec<Rank> {
        self.group(group)
            .map(|g| g.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Groups holding at least one structure.
    pub fn loaded_groups(&self) -> Vec<PoseGroup> {
        PoseGroup::ALL
            .into_iter()
            .filter(|g| !self.is_empty(*g))
            .collect()
    }

    /// Lazily pairs each rank of the error table with its structure in `group`.
    ///
    /// Fails with [`EngineError::GroupNotLoaded`] when the group is empty. Each
    /// step looks the rank up in the group, so a rank present in the error
    /// table but missing from the group yields [`EngineError::KeyNotFound`] at
    /// that step.
    pub fn iter<'a>(
        &'a self,
        group: PoseGroup,
        errors: &'a ErrorTable,
    ) -> Result<GroupIter<'a>, EngineError> {
        if self.is_empty(group) {
            return Err(EngineError::GroupNotLoaded(group));
        }
        Ok(GroupIter {
            registry: self,
            group,
            errors,
            ranks: errors.ranks().iter(),
        })
    }

    /// Same sequence as [`PoseRegistry::iter`], detached from the registry borrow.
    ///
    /// Callers look each rank up themselves, which lets them mutate the registry
    /// between steps.
    pub fn walk(&self, group: PoseGroup, errors: &ErrorTable) -> Result<GroupWalk, EngineError> {
        if self.is_empty(group) {
            return Err(EngineError::GroupNotLoaded(group));
        }
        Ok(GroupWalk {
            group,
            ranks: errors.ranks().to_vec().into_iter(),
        })
    }
}

pub struct GroupIter<'a> {
    registry: &'a PoseRegistry,
    group: PoseGroup,
    errors: &'a ErrorTable,
    ranks: std::slice::Iter<'a, Rank>,
}

impl<'a> Iterator for GroupIter<'a> {
    type Item = Result<PoseEntry<'a>, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        let rank = *self.ranks.next()?;
        let registry: &'a PoseRegistry = self.registry;
        let table: &'a ErrorTable = self.errors;
        let entry = match (registry.get(self.group, rank), table.get(rank)) {
            (Ok(structure), Some(errors)) => Ok(PoseEntry {
                rank,
                structure,
                errors,
            }),
            (Err(e), _) => Err(e),
            (Ok(_), None) => Err(EngineError::State(format!("no error matrix for rank {rank}"))),
        };
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ranks.size_hint()
    }
}

/// Ranks of a group walk, owned; see [`PoseRegistry::walk`].
#[derive(Debug, Clone)]
pub struct GroupWalk {
    group: PoseGroup,
    ranks: std::vec::IntoIter<Rank>,
}

impl GroupWalk {
    pub fn group(&self) -> PoseGroup {
        self.group
    }
}

impl Iterator for GroupWalk {
    type Item = Rank;

    fn next(&mut self) -> Option<Rank> {
        self.ranks.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ranks.size_hint()
    }
}

impl ExactSizeIterator for GroupWalk {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{error_rows, two_chain_structure};

    fn errors_for(ranks: &[Rank]) -> ErrorTable {
        let mut table = ErrorTable::new();
        for &rank in ranks {
            table.insert(rank, ErrorMatrix::from_rows(&error_rows(3, 2)).unwrap());
        }
        table
    }

    fn registry_with(ranks: &[Rank]) -> PoseRegistry {
        let mut registry = PoseRegistry::new();
        for &rank in ranks {
            registry.insert_original(rank, two_chain_structure(3, 2));
        }
        registry
    }

    #[test]
    fn group_names_round_trip() {
        for group in PoseGroup::ALL {
            assert_eq!(group.to_string().parse::<PoseGroup>().unwrap(), group);
        }
        assert_eq!(PoseGroup::Phosphorylated.to_string(), "phospho");
        assert!("unknown".parse::<PoseGroup>().is_err());
    }

    #[test]
    fn get_reports_missing_rank_and_group() {
        let registry = registry_with(&[1]);
        assert!(registry.get(PoseGroup::Original, 1).is_ok());
        assert!(matches!(
            registry.get(PoseGroup::Original, 2),
            Err(EngineError::KeyNotFound {
                group: PoseGroup::Original,
                rank: 2
            })
        ));
        assert!(matches!(
            registry.get(PoseGroup::Relaxed, 1),
            Err(EngineError::KeyNotFound { .. })
        ));
    }

    #[test]
    fn iter_over_empty_group_fails_immediately() {
        let registry = registry_with(&[1]);
        let errors = errors_for(&[1]);
        assert!(matches!(
            registry.iter(PoseGroup::Relaxed, &errors),
            Err(EngineError::GroupNotLoaded(PoseGroup::Relaxed))
        ));
        assert!(matches!(
            registry.walk(PoseGroup::Phosphorylated, &errors),
            Err(EngineError::GroupNotLoaded(PoseGroup::Phosphorylated))
        ));
    }

    #[test]
    fn iter_follows_error_table_order() {
        let registry = registry_with(&[1, 2, 3]);
        let errors = errors_for(&[3, 1, 2]);
        let ranks: Vec<Rank> = registry
            .iter(PoseGroup::Original, &errors)
            .unwrap()
            .map(|e| e.unwrap().rank)
            .collect();
        assert_eq!(ranks, vec![3, 1, 2]);
    }

    #[test]
    fn iter_fails_mid_sequence_for_rank_missing_from_group() {
        let registry = registry_with(&[1, 3]);
        let errors = errors_for(&[1, 2, 3]);
        let results: Vec<_> = registry.iter(PoseGroup::Original, &errors).unwrap().collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(EngineError::KeyNotFound { rank: 2, .. })
        ));
        assert!(results[2].is_ok());
    }

    #[test]
    fn iter_is_restartable_and_sees_new_entries() {
        let mut registry = registry_with(&[1, 2]);
        let errors = errors_for(&[1, 2]);
        registry.derive(PoseGroup::Original, PoseGroup::Relaxed, 1).unwrap();
        let first: Vec<_> = registry.iter(PoseGroup::Relaxed, &errors).unwrap().collect();
        assert!(first[1].is_err());

        registry.derive(PoseGroup::Original, PoseGroup::Relaxed, 2).unwrap();
        let second: Vec<_> = registry.iter(PoseGroup::Relaxed, &errors).unwrap().collect();
        assert!(second.iter().all(Result::is_ok));
    }

    #[test]
    fn derive_clones_at_most_once() {
        let mut registry = registry_with(&[1]);
        assert!(registry.derive(PoseGroup::Original, PoseGroup::Relaxed, 1).unwrap());
        registry
            .get_mut(PoseGroup::Relaxed, 1)
            .unwrap()
            .translate_chain(1, &nalgebra::Vector3::new(1.0, 0.0, 0.0));
        assert!(!registry.derive(PoseGroup::Original, PoseGroup::Relaxed, 1).unwrap());

        let original = registry.get(PoseGroup::Original, 1).unwrap();
        let relaxed = registry.get(PoseGroup::Relaxed, 1).unwrap();
        assert_ne!(original, relaxed);
    }

    #[test]
    fn derive_from_missing_source_fails() {
        let mut registry = PoseRegistry::new();
        assert!(matches!(
            registry.derive(PoseGroup::Original, PoseGroup::Relaxed, 1),
            Err(EngineError::KeyNotFound { .. })
        ));
        assert!(registry.is_empty(PoseGroup::Relaxed));
    }

    #[test]
    fn walk_detaches_from_registry() {
        let mut registry = registry_with(&[1, 2]);
        let errors = errors_for(&[2, 1]);
        let walk = registry.walk(PoseGroup::Original, &errors).unwrap();
        assert_eq!(walk.len(), 2);
        for rank in walk {
            registry.derive(PoseGroup::Original, PoseGroup::Relaxed, rank).unwrap();
        }
        assert_eq!(registry.ranks(PoseGroup::Relaxed), vec![1, 2]);
        assert_eq!(
            registry.loaded_groups(),
            vec![PoseGroup::Original, PoseGroup::Relaxed]
        );
    }
}

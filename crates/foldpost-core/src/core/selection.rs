//! Composable residue selectors.
//!
//! A selector maps a structure to a set of 1-based internal residue indices.
//! Selectors compose with [`ResidueSelector::and`], [`ResidueSelector::or`] and
//! [`ResidueSelector::invert`]:
//!
//! ```ignore
//! // Residues of chain 1 touching any other chain.
//! let interface = ChainSelector::new(1)
//!     .and(CloseContactSelector::new(ChainSelector::new(1).invert(), 3.0));
//! let residues = interface.select(&structure);
//! ```

use crate::core::models::structure::Structure;
use crate::core::utils::geometry::{any_within, build_tree};
use nalgebra::Point3;
use std::collections::BTreeSet;

pub type ResidueSet = BTreeSet<usize>;

pub trait ResidueSelector {
    fn select(&self, structure: &Structure) -> ResidueSet;

    fn and<S: ResidueSelector>(self, other: S) -> AndSelector<Self, S>
    where
        Self: Sized,
    {
        AndSelector(self, other)
    }

    fn or<S: ResidueSelector>(self, other: S) -> OrSelector<Self, S>
    where
        Self: Sized,
    {
        OrSelector(self, other)
    }

    fn invert(self) -> NotSelector<Self>
    where
        Self: Sized,
    {
        NotSelector(self)
    }
}

fn all_residues(structure: &Structure) -> ResidueSet {
    (1..=structure.total_residue()).collect()
}

/// Every residue of one chain, by 1-based chain number.
#[derive(Debug, Clone, Copy)]
pub struct ChainSelector {
    chain: usize,
}

impl ChainSelector {
    pub fn new(chain: usize) -> Self {
        Self { chain }
    }
}

impl ResidueSelector for ChainSelector {
    fn select(&self, structure: &Structure) -> ResidueSet {
        structure
            .residues()
            .filter(|(index, _)| structure.chain_of(*index) == Some(self.chain))
            .map(|(index, _)| index)
            .collect()
    }
}

/// A fixed set of residue indices; indices outside the structure are dropped.
#[derive(Debug, Clone, Default)]
pub struct IndexSelector {
    indices: ResidueSet,
}

impl IndexSelector {
    pub fn new(indices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            indices: indices.into_iter().collect(),
        }
    }
}

impl ResidueSelector for IndexSelector {
    fn select(&self, structure: &Structure) -> ResidueSet {
        self.indices
            .iter()
            .copied()
            .filter(|&i| i >= 1 && i <= structure.total_residue())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct NotSelector<S>(S);

impl<S: ResidueSelector> ResidueSelector for NotSelector<S> {
    fn select(&self, structure: &Structure) -> ResidueSet {
        let excluded = self.0.select(structure);
        all_residues(structure)
            .into_iter()
            .filter(|i| !excluded.contains(i))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct AndSelector<A, B>(A, B);

impl<A: ResidueSelector, B: ResidueSelector> ResidueSelector for AndSelector<A, B> {
    fn select(&self, structure: &Structure) -> ResidueSet {
        let left = self.0.select(structure);
        let right = self.1.select(structure);
        left.intersection(&right).copied().collect()
    }
}

#[derive(Debug, Clone)]
pub struct OrSelector<A, B>(A, B);

impl<A: ResidueSelector, B: ResidueSelector> ResidueSelector for OrSelector<A, B> {
    fn select(&self, structure: &Structure) -> ResidueSet {
        let mut left = self.0.select(structure);
        left.extend(self.1.select(structure));
        left
    }
}

/// Residues with a heavy atom within `threshold` of a heavy atom of the target set.
///
/// Target residues always select themselves; intersect with the complement of
/// the target to keep only the residues touching it.
#[derive(Debug, Clone)]
pub struct CloseContactSelector<S> {
    target: S,
    threshold: f64,
}

impl<S: ResidueSelector> CloseContactSelector<S> {
    pub fn new(target: S, threshold: f64) -> Self {
        Self { target, threshold }
    }
}

impl<S: ResidueSelector> ResidueSelector for CloseContactSelector<S> {
    fn select(&self, structure: &Structure) -> ResidueSet {
        let target = self.target.select(structure);
        let points: Vec<Point3<f64>> = target
            .iter()
            .filter_map(|&i| structure.residue(i))
            .flat_map(|r| r.heavy_atoms().map(|a| a.position))
            .collect();
        if points.is_empty() {
            return ResidueSet::new();
        }
        let tree = build_tree(&points);

        structure
            .residues()
            .filter(|(_, residue)| {
                residue
                    .heavy_atoms()
                    .any(|atom| any_within(&tree, &atom.position, self.threshold))
            })
            .map(|(index, _)| index)
            .collect()
    }
}

/// Residues whose neighbour atom (CB, or CA for glycine) lies within `radius`
/// of the neighbour atom of a focus residue.
#[derive(Debug, Clone)]
pub struct NeighborhoodSelector<S> {
    focus: S,
    radius: f64,
    include_focus: bool,
}

impl<S: ResidueSelector> NeighborhoodSelector<S> {
    pub fn new(focus: S, radius: f64, include_focus: bool) -> Self {
        Self {
            focus,
            radius,
            include_focus,
        }
    }
}

impl<S: ResidueSelector> ResidueSelector for NeighborhoodSelector<S> {
    fn select(&self, structure: &Structure) -> ResidueSet {
        let focus = self.focus.select(structure);
        let points: Vec<Point3<f64>> = focus
            .iter()
            .filter_map(|&i| structure.residue(i))
            .filter_map(|r| r.neighbour_atom().map(|a| a.position))
            .collect();
        if points.is_empty() {
            return ResidueSet::new();
        }
        let tree = build_tree(&points);

        structure
            .residues()
            .filter(|(index, residue)| {
                if focus.contains(index) {
                    return self.include_focus;
                }
                residue
                    .neighbour_atom()
                    .is_some_and(|atom| any_within(&tree, &atom.position, self.radius))
            })
            .map(|(index, _)| index)
            .collect()
    }
}

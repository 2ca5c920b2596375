use super::potentials::{flat_bottom_distance, harmonic, harmonic_derivative};
use crate::core::io::error_matrix::ErrorMatrix;
use crate::core::models::structure::Structure;
use nalgebra::Point3;
use tracing::debug;

const ANCHOR_ATOM: &str = "CA";
const MIN_STANDARD_DEVIATION: f64 = 0.1;

/// Atom addressed by 1-based internal residue index and atom name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AtomRef {
    pub residue: usize,
    pub atom: String,
}

impl AtomRef {
    pub fn new(residue: usize, atom: &str) -> Self {
        Self {
            residue,
            atom: atom.to_string(),
        }
    }

    pub fn position(&self, structure: &Structure) -> Option<Point3<f64>> {
        structure
            .residue(self.residue)
            .and_then(|r| r.atom(&self.atom))
            .map(|a| a.position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstraintFunction {
    Harmonic { x0: f64, sd: f64 },
    /// Harmonic outside a flat well of half-width `tolerance` around `x0`.
    FlatHarmonic { x0: f64, sd: f64, tolerance: f64 },
}

impl ConstraintFunction {
    pub fn evaluate(&self, dist: f64) -> f64 {
        match *self {
            ConstraintFunction::Harmonic { x0, sd } => harmonic(dist, x0, sd),
            ConstraintFunction::FlatHarmonic { x0, sd, tolerance } => {
                harmonic(flat_bottom_distance(dist, x0, tolerance), x0, sd)
            }
        }
    }

    pub fn derivative(&self, dist: f64) -> f64 {
        match *self {
            ConstraintFunction::Harmonic { x0, sd } => harmonic_derivative(dist, x0, sd),
            ConstraintFunction::FlatHarmonic { x0, sd, tolerance } => {
                let shifted = flat_bottom_distance(dist, x0, tolerance);
                if shifted == x0 {
                    0.0
                } else {
                    harmonic_derivative(shifted, x0, sd)
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AtomPairConstraint {
    pub first: AtomRef,
    pub second: AtomRef,
    pub function: ConstraintFunction,
}

impl AtomPairConstraint {
    fn joins(&self, a: &AtomRef, b: &AtomRef) -> bool {
        (&self.first == a && &self.second == b) || (&self.first == b && &self.second == a)
    }

    /// Current distance between the two atoms, `None` if either is missing.
    pub fn distance(&self, structure: &Structure) -> Option<f64> {
        let a = self.first.position(structure)?;
        let b = self.second.position(structure)?;
        Some((a - b).norm())
    }

    pub fn score(&self, structure: &Structure) -> f64 {
        self.distance(structure)
            .map(|d| self.function.evaluate(d))
            .unwrap_or(0.0)
    }
}

/// Restraints attached to a structure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintSet {
    constraints: Vec<AtomPairConstraint>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AtomPairConstraint> {
        self.constraints.iter()
    }

    pub fn contains(&self, a: &AtomRef, b: &AtomRef) -> bool {
        self.constraints.iter().any(|c| c.joins(a, b))
    }

    /// Adds a constraint unless the same atom pair is already restrained.
    pub fn add(&mut self, constraint: AtomPairConstraint) -> bool {
        if self.contains(&constraint.first, &constraint.second) {
            return false;
        }
        self.constraints.push(constraint);
        true
    }

    pub fn clear(&mut self) {
        self.constraints.clear();
    }

    /// Unweighted restraint energy of the structure.
    pub fn score(&self, structure: &Structure) -> f64 {
        self.constraints.iter().map(|c| c.score(structure)).sum()
    }
}

/// Parameters of [`derive_constraints`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintOptions {
    /// Pairs whose expected error reaches this value are not restrained.
    pub cutoff: f64,
    /// Half-width of a flat well around the current distance; `None` for plain harmonic.
    pub tolerance: Option<f64>,
    /// Divides the standard deviation; larger weights make restraints stiffer.
    pub weight: f64,
    /// Minimum sequence separation of restrained pairs.
    pub adjacency_threshold: usize,
}

impl Default for ConstraintOptions {
    fn default() -> Self {
        Self {
            cutoff: 12.0,
            tolerance: None,
            weight: 1.0,
            adjacency_threshold: 5,
        }
    }
}

fn pair_error(errors: &ErrorMatrix, i: usize, j: usize) -> Option<f64> {
    Some(errors.get(i, j)?.min(errors.get(j, i)?))
}

fn make_function(x0: f64, error: f64, weight: f64, tolerance: Option<f64>) -> ConstraintFunction {
    let sd = error.max(MIN_STANDARD_DEVIATION) / weight;
    match tolerance {
        Some(tolerance) if tolerance > 0.0 => ConstraintFunction::FlatHarmonic { x0, sd, tolerance },
        _ => ConstraintFunction::Harmonic { x0, sd },
    }
}

fn restrain_pairs<F>(
    structure: &mut Structure,
    errors: &ErrorMatrix,
    cutoff: f64,
    mut accept: F,
    mut shape: impl FnMut(f64, f64) -> ConstraintFunction,
) -> usize
where
    F: FnMut(&Structure, usize, usize) -> bool,
{
    let n = structure.total_residue().min(errors.size());
    let mut pending = Vec::new();
    for i in 1..=n {
        for j in (i + 1)..=n {
            if !accept(&*structure, i, j) {
                continue;
            }
            let Some(error) = pair_error(errors, i, j) else {
                continue;
            };
            if error >= cutoff {
                continue;
            }
            let first = AtomRef::new(i, ANCHOR_ATOM);
            let second = AtomRef::new(j, ANCHOR_ATOM);
            let (Some(a), Some(b)) = (first.position(structure), second.position(structure)) else {
                continue;
            };
            pending.push(AtomPairConstraint {
                first,
                second,
                function: shape((a - b).norm(), error),
            });
        }
    }

    let set = structure.constraints_mut();
    pending.into_iter().map(|c| set.add(c)).filter(|&added| added).count()
}

/// Restrains alpha-carbon pairs with a low expected error to their current distance.
///
/// Pairs closer in sequence than the adjacency threshold are skipped; each pair
/// is restrained once. Returns the number of constraints added.
pub fn derive_constraints(
    structure: &mut Structure,
    errors: &ErrorMatrix,
    options: &ConstraintOptions,
) -> usize {
    let added = restrain_pairs(
        structure,
        errors,
        options.cutoff,
        |_, i, j| j - i >= options.adjacency_threshold,
        |x0, error| make_function(x0, error, options.weight, options.tolerance),
    );
    debug!(added, cutoff = options.cutoff, "Derived error-matrix constraints");
    added
}

/// Restrains inter-chain alpha-carbon pairs whose expected error is below `cutoff`.
pub fn derive_interchain_constraints(
    structure: &mut Structure,
    errors: &ErrorMatrix,
    cutoff: f64,
) -> usize {
    let added = restrain_pairs(
        structure,
        errors,
        cutoff,
        |s, i, j| s.chain_of(i) != s.chain_of(j),
        |x0, error| make_function(x0, error, 1.0, None),
    );
    debug!(added, cutoff, "Derived inter-chain constraints");
    added
}

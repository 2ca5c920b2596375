//! # Scoring Module
//!
//! Weighted energy evaluation for refinement and scoring.
//!
//! - [`potentials`] - Pairwise functional forms (Lennard-Jones, harmonic restraints)
//! - [`term`] - Per-term energy aggregation
//! - [`scorefunction`] - Score types and their weights, passed explicitly into every call
//! - [`constraints`] - Atom-pair restraints derived from pairwise error matrices
//!
//! A [`scorefunction::ScoreFunction`] carries no hidden state: changing a weight
//! produces a new value, so a refinement pass always sees exactly the weights it
//! was handed.

pub mod constraints;
pub(crate) mod potentials;
pub mod scorefunction;
pub mod term;

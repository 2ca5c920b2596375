//! # Workflows Module
//!
//! High-level operations over a whole prediction run.
//!
//! ## Overview
//!
//! The [`Analyser`] owns the model catalog, the pose registry and the per-rank error
//! matrices of one prediction folder. Every workflow is a method on it that walks the
//! ranks of one pose group, reports progress and appends its per-rank results to the
//! catalog as rank-aligned columns.
//!
//! ## Architecture
//!
//! - **Setup** ([`analyser`]) - Catalogs a folder, joins the run's scores and loads
//!   structures and error matrices.
//! - **Refinement** ([`refine`]) - Side-chain relaxation, error-matrix restraints and
//!   restrained full relaxation with an unrestrained energy per rank.
//! - **Interface Analysis** ([`interface`]) - Interface residues, median interface
//!   confidence and interface energetics.
//! - **Modification** ([`modify`]) - Applies residue modifications to relaxed
//!   structures and refines their surroundings.
//! - **Persistence** ([`persist`]) - Saves and reloads catalog, error matrices and
//!   every pose group.

pub mod analyser;
pub mod interface;
pub mod modify;
pub mod persist;
pub mod refine;

pub use analyser::Analyser;

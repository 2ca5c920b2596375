//! # foldpost
//!
//! Post-processing and analysis of multi-model structure predictions.
//!
//! A prediction run leaves a folder of ranked models, a settings file with per-model
//! confidence scores and, next to every model, a pairwise error matrix. This library
//! turns such a folder into a rank-keyed catalog, keeps several parallel groups of
//! structures for the same ranks (as predicted, refined, chemically modified) and
//! replays refinement, constraint and analysis steps consistently across them.
//!
//! ## Architecture
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Structure`, `Catalog`),
//!   file formats, residue selectors, movement masks, score functions and
//!   distance-error constraints, modification annotations.
//!
//! - **[`engine`]: The Bookkeeping Core.** The multi-group pose registry and its lazy
//!   rank walk, the error taxonomy, configuration, progress reporting and the
//!   physics collaborator trait with a bundled reference implementation.
//!
//! - **[`workflows`]: The Public API.** The [`workflows::analyser::Analyser`] and the
//!   refinement, interface, modification and persistence procedures built on it.

pub mod core;
pub mod engine;
pub mod workflows;

#[cfg(test)]
pub(crate) mod test_utils;

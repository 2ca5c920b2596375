//! # Core Module
//!
//! Stateless building blocks shared by the engine and the workflows.
//!
//! - **Structure Representation** ([`models`]) - Atoms, residues, chains and whole structures
//! - **File I/O** ([`io`]) - PDB structures and sibling error-matrix files
//! - **Model Catalog** ([`catalog`]) - Result-folder scanning, settings enrichment, rank-aligned columns
//! - **Residue Selection** ([`selection`]) - Composable residue selectors
//! - **Movement Masks** ([`movemap`]) - Degrees of freedom a refinement pass may touch
//! - **Scoring** ([`scoring`]) - Potentials, score functions and distance-error constraints
//! - **Modifications** ([`ptm`]) - Residue modification annotations and their patches
//! - **Utilities** ([`utils`]) - Geometry helpers and surface area

pub mod catalog;
pub mod io;
pub mod models;
pub mod movemap;
pub mod ptm;
pub mod scoring;
pub mod selection;
pub mod utils;

//! Small helpers shared across the core layer: residue and atom name tables
//! ([`identifiers`]) and spatial queries ([`geometry`]).

pub mod geometry;
pub mod identifiers;

//! # Engine Module
//!
//! Stateful orchestration primitives shared by the workflows.
//!
//! ## Overview
//!
//! The engine layer sits between the stateless data models in [`crate::core`] and
//! the public operations in [`crate::workflows`]. It owns everything that is
//! created once per analysis and then threaded through every step: the pose
//! registry, the error taxonomy, the validated configuration and the progress
//! channel, plus the physics collaborator that scores, refines and mutates
//! structures.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Refinement, constraint, interface and modification parameters
//! - **Error Handling** ([`error`]) - Load, format, state and lookup failures
//! - **Progress Monitoring** ([`progress`]) - Callback events for phases and per-rank tasks
//! - **Pose Registry** ([`registry`]) - Structures per (group, rank) with the lazy group walk
//! - **Physics Collaborator** ([`traits`], [`reference`]) - The [`traits::Engine`] trait and its bundled implementation
//!
//! ## Key Capabilities
//!
//! - **Derived groups** cloned from their source entry at most once per rank
//! - **Fail-fast iteration** over empty groups and ranks missing mid-sequence
//! - **Explicit score functions** passed into every physics call, so no weight is shared between calls

pub mod config;
pub mod error;
pub mod progress;
pub mod reference;
pub mod registry;
pub mod traits;

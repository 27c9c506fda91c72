//! # Workflows Module
//!
//! The public entry point of the library: [`dataset::ParticleDataset`] owns
//! the particle container and its dependent topology containers and runs
//! the [`engine`](crate::engine) tasks on them.
//!
//! ## Key Capabilities
//!
//! - **Copy-on-write sharing** of containers between dataset clones
//! - **Deduplicating bond merges** with injected default appearance
//! - **Cascading particle deletion** across bonds, angles, dihedrals and impropers
//! - **Identifier sorting** with topology renumbering
//! - **Read-only queries** for adjacency, bond geometry, picking and cross-dataset remapping

pub mod dataset;

//! # partopo
//!
//! Index-linked topology management for columnar particle datasets.
//!
//! Particles live in a flat columnar container. Bonds, angles, dihedrals and
//! impropers are further containers whose `Topology` column stores particle
//! row indices, much like foreign keys. This library keeps those references
//! valid while particles and bonds are merged, deleted and reordered.
//!
//! ## Architectural Philosophy
//!
//! - **[`core`]: The Foundation.** Property columns, containers, topology
//!   tuples, the simulation cell, and read-only adjacency and geometry queries.
//!
//! - **[`engine`]: The Logic Core.** Bond merging, cascading deletion, stable
//!   sorting and periodic image generation over exclusive containers, plus
//!   configuration, errors and progress reporting.
//!
//! - **[`workflows`]: The Public API.** The [`workflows::dataset::ParticleDataset`]
//!   facade that shares containers copy-on-write and coordinates the engine.
//!
//! ```ignore
//! use partopo::core::models::topology::Bond;
//! use partopo::engine::appearance::StandardAppearance;
//! use partopo::engine::config::MergeOptions;
//! use partopo::engine::progress::ProgressReporter;
//!
//! let summary = dataset.merge_bonds(
//!     &[Bond::new(0, 1), Bond::new(1, 0)],
//!     &[],
//!     &MergeOptions::default(),
//!     &StandardAppearance::default(),
//!     &ProgressReporter::new(),
//! )?;
//! assert_eq!(summary.appended, 1);
//! ```

pub mod core;
pub mod engine;
pub mod workflows;

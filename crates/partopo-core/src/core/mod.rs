//! # Core Module
//!
//! Stateless data models and read-only queries for particle datasets.
//!
//! ## Architecture
//!
//! - **Data Representation** ([`models`]) - Property columns, row containers, topology tuples and the simulation cell
//! - **Connectivity Queries** ([`topology`]) - Adjacency lists over bond topology and bond geometry helpers
//!
//! Nothing in this module mutates more than the single container it is
//! called on. Keeping several containers consistent with each other is the
//! job of the [`engine`](crate::engine).

pub mod models;
pub mod topology;

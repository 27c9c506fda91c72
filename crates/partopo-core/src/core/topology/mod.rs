//! # Topology Module
//!
//! Read-only queries over bond topology columns.
//!
//! - [`adjacency`] - Per-particle half-bond lists with periodic-aware bond lookup
//! - [`geometry`] - Bond vectors, centers, minimum-image shifts and pick-id decoding
//!
//! An [`adjacency::AdjacencyIndex`] borrows the topology it indexes. Build a
//! fresh one after every mutation of the bonds container.
//!
//! ```ignore
//! use partopo::core::topology::adjacency::AdjacencyIndex;
//!
//! let index = AdjacencyIndex::new(topology, Some(shifts), particle_count);
//! for bond in index.oriented_neighbors_of(0) {
//!     println!("0 -> {} across {:?}", bond.index2, bond.shift);
//! }
//! ```

pub mod adjacency;
pub mod geometry;

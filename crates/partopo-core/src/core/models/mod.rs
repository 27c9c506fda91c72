//! # Core Models Module
//!
//! Columnar data structures that hold particle datasets.
//!
//! ## Key Components
//!
//! - [`property`] - Typed property columns and the standard property catalogue
//! - [`container`] - The flat row store ([`container::PropertyContainer`]) and container kinds
//! - [`topology`] - Index tuples stored in topology columns and the [`topology::Bond`] value type
//! - [`cell`] - Periodic simulation cell geometry
//!
//! Rows are identified only by position. Topology columns of bonds, angles,
//! dihedrals and impropers hold particle row indices, so any operation that
//! reorders or removes particle rows must rewrite them.
//!
//! ```ignore
//! use partopo::core::models::container::{ContainerKind, PropertyContainer};
//! use partopo::core::models::property::{Property, PropertyData, StandardProperty};
//!
//! let mut particles = PropertyContainer::new(ContainerKind::Particles);
//! particles.add_property(Property::new(
//!     StandardProperty::Identifier,
//!     PropertyData::Int64(vec![1, 2, 3]),
//! ))?;
//! ```

pub mod cell;
pub mod container;
pub mod property;
pub mod topology;

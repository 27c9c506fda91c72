//! Mutation algorithms over a particle dataset's containers.
//!
//! Each task operates on already-exclusive containers and validates its inputs
//! before mutating anything. Copy-on-write of shared containers happens in the
//! [`workflows`](crate::workflows) layer.

pub mod delete_particles;
pub mod merge_bonds;
pub mod periodic_images;
pub mod sort_particles;

use crate::core::models::container::{ContainerError, ContainerKind, PropertyContainer};
use crate::core::models::property::StandardProperty;
use crate::engine::error::EngineError;

pub(crate) fn ensure_kind(
    container: &PropertyContainer,
    expected: ContainerKind,
) -> Result<(), EngineError> {
    if container.kind() != expected {
        return Err(EngineError::WrongContainerKind {
            expected,
            actual: container.kind(),
        });
    }
    Ok(())
}

/// Checks that a dependent container is a topology kind whose columns are
/// consistent and whose `Topology` column (required unless the container is
/// empty) has the layout matching its arity.
pub(crate) fn ensure_topology_layout(container: &PropertyContainer) -> Result<(), EngineError> {
    let kind = container.kind();
    let Some(expected) = kind.standard_layout(StandardProperty::Topology) else {
        return Err(EngineError::WrongContainerKind {
            expected: ContainerKind::Bonds,
            actual: kind,
        });
    };
    container.verify_integrity()?;

    let topology = match container.standard(StandardProperty::Topology) {
        Some(data) => data,
        None if container.is_empty() => return Ok(()),
        None => {
            return Err(ContainerError::MissingProperty {
                container: kind,
                property: StandardProperty::Topology.to_string(),
            }
            .into());
        }
    };
    if topology.data_type() != expected {
        return Err(ContainerError::TypeMismatch {
            property: StandardProperty::Topology.to_string(),
            expected,
            actual: topology.data_type(),
        }
        .into());
    }
    Ok(())
}

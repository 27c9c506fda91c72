use nalgebra::{Point3, Vector3};
use tracing::{debug, info, instrument};

use super::{ensure_kind, ensure_topology_layout};
use crate::core::models::cell::SimulationCell;
use crate::core::models::container::{ContainerKind, PropertyContainer};
use crate::core::models::property::StandardProperty;
use crate::core::topology::geometry::minimum_image_shift;
use crate::engine::error::EngineError;

/// Recomputes the periodic image of every bond with the minimum image
/// convention and stores it in the bonds' `Periodic Image` column.
///
/// Bonds referencing a nonexistent particle get a zero shift. Nothing is
/// written when the cell has no periodic dimension or the particles carry
/// no positions. Returns the number of bonds whose shift is non-zero.
#[instrument(skip_all, name = "periodic_images_task")]
pub fn run(
    particles: &PropertyContainer,
    bonds: &mut PropertyContainer,
    cell: &SimulationCell,
) -> Result<usize, EngineError> {
    ensure_kind(particles, ContainerKind::Particles)?;
    ensure_kind(bonds, ContainerKind::Bonds)?;
    ensure_topology_layout(bonds)?;

    if !cell.has_pbc() {
        debug!("Cell is not periodic; periodic images left unchanged.");
        return Ok(0);
    }
    let Some(positions) = particles
        .standard(StandardProperty::Position)
        .and_then(|data| data.as_vec3())
    else {
        debug!("Particles have no positions; periodic images left unchanged.");
        return Ok(0);
    };
    let reciprocal = cell.reciprocal().ok_or(EngineError::DegenerateCell)?;

    let shifts: Vec<Vector3<i32>> = match bonds
        .standard(StandardProperty::Topology)
        .and_then(|data| data.as_pairs())
    {
        Some(topology) => topology
            .iter()
            .map(|row| {
                let endpoint = |index: i64| {
                    usize::try_from(index)
                        .ok()
                        .and_then(|i| positions.get(i))
                        .map(|p| Point3::from(*p))
                };
                match (endpoint(row[0]), endpoint(row[1])) {
                    (Some(p1), Some(p2)) => minimum_image_shift(&reciprocal, cell.pbc, &p1, &p2),
                    _ => Vector3::zeros(),
                }
            })
            .collect(),
        None => return Ok(0),
    };

    let crossing = shifts.iter().filter(|s| **s != Vector3::zeros()).count();
    if let Some(column) = bonds
        .create_standard_property(StandardProperty::PeriodicImage)?
        .as_vec3i_mut()
    {
        column.copy_from_slice(&shifts);
    }

    info!(
        bonds = shifts.len(),
        crossing, "Generated bond periodic images."
    );
    Ok(crossing)
}

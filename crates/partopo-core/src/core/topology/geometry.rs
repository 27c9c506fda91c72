use crate::core::models::cell::SimulationCell;
use crate::core::models::topology::Bond;
use nalgebra::{Matrix3, Point3, Vector3};

/// Periodic shift that makes `p2 + cell * shift` the image of `p2` closest
/// to `p1`. Non-periodic dimensions get a zero component.
pub fn minimum_image_shift(
    reciprocal: &Matrix3<f64>,
    pbc: [bool; 3],
    p1: &Point3<f64>,
    p2: &Point3<f64>,
) -> Vector3<i32> {
    let reduced = reciprocal * (p1 - p2);
    Vector3::from_fn(|d, _| if pbc[d] { reduced[d].round() as i32 } else { 0 })
}

/// Vector from the first to the second endpoint of `bond`, including the
/// periodic shift when a cell is given. `None` if an index is out of range.
pub fn bond_vector(
    positions: &[Vector3<f64>],
    cell: Option<&SimulationCell>,
    bond: &Bond,
) -> Option<Vector3<f64>> {
    let p1 = positions.get(bond.index1)?;
    let p2 = positions.get(bond.index2)?;
    let mut delta = p2 - p1;
    if let Some(cell) = cell {
        delta += cell.shift_vector(&bond.shift);
    }
    Some(delta)
}

/// Midpoint of a bond as drawn from its first endpoint.
pub fn bond_center(
    positions: &[Vector3<f64>],
    cell: Option<&SimulationCell>,
    bond: &Bond,
) -> Option<Point3<f64>> {
    let delta = bond_vector(positions, cell, bond)?;
    Some(Point3::from(positions[bond.index1] + delta * 0.5))
}

/// Bond row encoded by a rendering sub-object id. Each bond is drawn as two
/// half-bond primitives, so ids `2i` and `2i + 1` both belong to bond `i`.
pub fn bond_index_from_pick_id(pick_id: u32, bond_count: usize) -> Option<usize> {
    let bond_index = pick_id as usize / 2;
    (bond_index < bond_count).then_some(bond_index)
}

use nalgebra::{Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Periodic simulation cell spanned by the three column vectors of `matrix`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationCell {
    pub matrix: Matrix3<f64>,
    pub origin: Point3<f64>,
    pub pbc: [bool; 3],
}

impl SimulationCell {
    pub fn new(matrix: Matrix3<f64>, pbc: [bool; 3]) -> Self {
        Self {
            matrix,
            origin: Point3::origin(),
            pbc,
        }
    }

    /// Axis-aligned box with the given edge lengths.
    pub fn orthorhombic(lengths: Vector3<f64>, pbc: [bool; 3]) -> Self {
        Self::new(Matrix3::from_diagonal(&lengths), pbc)
    }

    pub fn has_pbc(&self) -> bool {
        self.pbc.iter().any(|&p| p)
    }

    /// Maps Cartesian vectors into reduced cell coordinates; `None` for a
    /// degenerate cell.
    pub fn reciprocal(&self) -> Option<Matrix3<f64>> {
        self.matrix.try_inverse()
    }

    /// Cartesian displacement of `shift` whole cell vectors.
    pub fn shift_vector(&self, shift: &Vector3<i32>) -> Vector3<f64> {
        self.matrix * shift.cast::<f64>()
    }

    pub fn volume(&self) -> f64 {
        self.matrix.determinant().abs()
    }
}

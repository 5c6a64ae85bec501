//! Dual (reciprocal) binners for skewed histogram axes.
//!
//! Three projection binners with directions `v_x, v_y, v_z` bin a point `p`
//! by the scalars `v_i · p`. The dual directions `v*_j` satisfy
//! `v_i · v*_j = δ_ij`, so the point whose projections are `(a, b, c)` is
//! exactly `a·v*_x + b·v*_y + c·v*_z`. Placing the axis directions as the
//! columns of a matrix `M`, the duals are the rows of `M⁻¹`.

use crate::error::{Error, Result};
use crate::projection::ProjectionBinner;
use crate::vector::Vector3;

/// Relative determinant below which a basis is treated as singular.
pub const SINGULAR_TOLERANCE: f64 = 1.0e-10;

/// The three dual binners of a set of axis binners.
///
/// Each dual keeps the scalar binner of its axis and carries the reciprocal
/// direction.
#[derive(Debug, Clone)]
pub struct DualBinnerSet {
    x: ProjectionBinner,
    y: ProjectionBinner,
    z: ProjectionBinner,
}

impl DualBinnerSet {
    /// Computes the duals of three axis binners.
    ///
    /// # Errors
    /// Returns [`Error::SingularBasis`] if the directions are linearly
    /// dependent, i.e. the determinant divided by the product of the
    /// direction lengths is below [`SINGULAR_TOLERANCE`] in magnitude.
    pub fn new(x: &ProjectionBinner, y: &ProjectionBinner, z: &ProjectionBinner) -> Result<Self> {
        let (vx, vy, vz) = (x.direction(), y.direction(), z.direction());

        let yz = vy.cross(&vz);
        let zx = vz.cross(&vx);
        let xy = vx.cross(&vy);
        let det = vx.dot(&yz);

        let scale = vx.length() * vy.length() * vz.length();
        let relative = det / scale;
        if !relative.is_finite() || relative.abs() < SINGULAR_TOLERANCE {
            return Err(Error::SingularBasis {
                determinant: relative,
            });
        }

        let inv = 1.0 / det;
        Ok(Self {
            x: x.with_direction(yz * inv),
            y: y.with_direction(zx * inv),
            z: z.with_direction(xy * inv),
        })
    }

    /// Dual of the column (x) axis.
    #[must_use]
    pub fn x(&self) -> &ProjectionBinner {
        &self.x
    }

    /// Dual of the row (y) axis.
    #[must_use]
    pub fn y(&self) -> &ProjectionBinner {
        &self.y
    }

    /// Dual of the page (z) axis.
    #[must_use]
    pub fn z(&self) -> &ProjectionBinner {
        &self.z
    }

    /// Physical center of the cell at `(col, row, page)`.
    ///
    /// # Panics
    /// Panics if an index is outside its axis binner.
    #[inline]
    #[must_use]
    pub fn center_point(&self, col: usize, row: usize, page: usize) -> Vector3 {
        center_point(col, row, page, &self.x, &self.y, &self.z)
    }
}

/// Sums `colCenter·xDual + rowCenter·yDual + pageCenter·zDual`.
///
/// The centers are the bin-center scalars of each dual's binner at the given
/// index.
///
/// # Panics
/// Panics if an index is outside its axis binner.
#[inline]
#[must_use]
pub fn center_point(
    col: usize,
    row: usize,
    page: usize,
    x_dual: &ProjectionBinner,
    y_dual: &ProjectionBinner,
    z_dual: &ProjectionBinner,
) -> Vector3 {
    x_dual.direction() * x_dual.center(col)
        + y_dual.direction() * y_dual.center(row)
        + z_dual.direction() * z_dual.center(page)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::binner::{Binner, UniformBinner};
    use approx::assert_relative_eq;

    fn axis(min: f64, max: f64, n: usize, dir: Vector3) -> ProjectionBinner {
        ProjectionBinner::from_binner(UniformBinner::new(min, max, n).unwrap(), dir).unwrap()
    }

    #[test]
    fn test_orthonormal_dual_equals_primal() {
        let x = axis(0.0, 4.0, 2, Vector3::X);
        let y = axis(-1.0, 1.0, 4, Vector3::Y);
        let z = axis(2.0, 3.0, 5, Vector3::Z);

        let duals = DualBinnerSet::new(&x, &y, &z).unwrap();
        assert_eq!(duals.x().direction(), Vector3::X);
        assert_eq!(duals.y().direction(), Vector3::Y);
        assert_eq!(duals.z().direction(), Vector3::Z);
        assert_eq!(duals.x().binner().boundaries(), x.binner().boundaries());
        assert_eq!(duals.z().num_bins(), 5);
    }

    #[test]
    fn test_skewed_dual_is_reciprocal() {
        let x = axis(0.0, 1.0, 1, Vector3::new(1.0, 0.0, 0.0));
        let y = axis(0.0, 1.0, 1, Vector3::new(1.0, 1.0, 0.0));
        let z = axis(0.0, 1.0, 1, Vector3::new(0.5, -0.25, 2.0));
        let duals = DualBinnerSet::new(&x, &y, &z).unwrap();

        let primal = [x.direction(), y.direction(), z.direction()];
        let dual = [duals.x().direction(), duals.y().direction(), duals.z().direction()];
        for (i, p) in primal.iter().enumerate() {
            for (j, d) in dual.iter().enumerate() {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(p.dot(d), expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_center_point_projects_back_to_centers() {
        let x = axis(0.0, 6.0, 3, Vector3::new(2.0, 0.0, 0.0));
        let y = axis(-2.0, 2.0, 4, Vector3::new(0.3, 1.0, 0.0));
        let z = axis(1.0, 5.0, 2, Vector3::new(0.0, 0.7, 1.0));
        let duals = DualBinnerSet::new(&x, &y, &z).unwrap();

        let p = duals.center_point(2, 1, 0);
        assert_relative_eq!(x.coordinate(p.x, p.y, p.z), 5.0, epsilon = 1e-12);
        assert_relative_eq!(y.coordinate(p.x, p.y, p.z), -0.5, epsilon = 1e-12);
        assert_relative_eq!(z.coordinate(p.x, p.y, p.z), 2.0, epsilon = 1e-12);
        assert_eq!(x.index(p.x, p.y, p.z), Some(2));
    }

    #[test]
    fn test_singular_basis_rejected() {
        let x = axis(0.0, 1.0, 1, Vector3::new(1.0, 2.0, 3.0));
        let y = axis(0.0, 1.0, 1, Vector3::new(0.0, 1.0, 0.0));
        let z = axis(0.0, 1.0, 1, Vector3::new(2.0, 5.0, 6.0));

        let err = DualBinnerSet::new(&x, &y, &z).unwrap_err();
        assert!(matches!(err, Error::SingularBasis { .. }));
    }

    #[test]
    fn test_nearly_singular_basis_rejected() {
        let x = axis(0.0, 1.0, 1, Vector3::new(1.0, 0.0, 0.0));
        let y = axis(0.0, 1.0, 1, Vector3::new(0.0, 1.0, 0.0));
        let z = axis(0.0, 1.0, 1, Vector3::new(1.0, 1.0, 1.0e-14));
        assert!(DualBinnerSet::new(&x, &y, &z).is_err());
    }
}

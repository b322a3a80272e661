//! Corner and sub-cell indexing for the unit cell.
//!
//! The cell occupies `[0, 1]^D` in local coordinates. Corners and sub-cells
//! are enumerated with the first axis toggling fastest:
//!
//! ```text
//!     2 ----------- 3
//!     |             |
//!  y  |             |
//!  ^  |             |
//!  |  0 ----------- 1
//!  +--> x
//! ```
//!
//! Corner `k` sits at `x_a = (k >> a) & 1`. Sub-cell `(i_0, .., i_{D-1})` has
//! flat index `i_0 + m·i_1 + m²·i_2`, where `m` is the number of sub-cells
//! per axis.

use nalgebra::{DVector, SVector};

use crate::clip::Bounds;
use crate::error::{CellError, CellResult};

/// Number of corners of a `dim`-dimensional cell.
#[must_use]
pub const fn corner_count(dim: usize) -> usize {
    1 << dim
}

/// Whether corner `corner` sits on the upper side of `axis`.
#[must_use]
pub const fn corner_bit(corner: usize, axis: usize) -> bool {
    (corner >> axis) & 1 == 1
}

/// Position of a corner in cell-local coordinates.
#[must_use]
pub fn corner_position<const D: usize>(corner: usize) -> SVector<f64, D> {
    SVector::from_fn(|axis, _| if corner_bit(corner, axis) { 1.0 } else { 0.0 })
}

/// Value of the bilinear (2D) or trilinear (3D) shape function of a corner.
#[must_use]
pub fn shape_value<const D: usize>(corner: usize, point: &SVector<f64, D>) -> f64 {
    (0..D)
        .map(|axis| linear_factor(corner_bit(corner, axis), point[axis]))
        .product()
}

/// Gradient of the shape function of a corner.
#[must_use]
pub fn shape_gradient<const D: usize>(corner: usize, point: &SVector<f64, D>) -> SVector<f64, D> {
    SVector::from_fn(|axis, _| {
        let slope = if corner_bit(corner, axis) { 1.0 } else { -1.0 };
        (0..D)
            .filter(|&other| other != axis)
            .map(|other| linear_factor(corner_bit(corner, other), point[other]))
            .product::<f64>()
            * slope
    })
}

#[inline]
fn linear_factor(upper: bool, t: f64) -> f64 {
    if upper { t } else { 1.0 - t }
}

/// Regular `m^D` lattice of sub-cells covering the unit cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleGrid<const D: usize> {
    edge_sample_num: usize,
    count: usize,
}

impl<const D: usize> SampleGrid<D> {
    /// Create a lattice with `edge_sample_num` sub-cells per axis.
    ///
    /// # Errors
    ///
    /// Returns [`CellError::InvalidSampleCount`] if `edge_sample_num` is zero
    /// or the total sub-cell count overflows `usize`.
    pub fn new(edge_sample_num: usize) -> CellResult<Self> {
        let count = u32::try_from(D)
            .ok()
            .and_then(|dim| edge_sample_num.checked_pow(dim))
            .filter(|&count| count > 0)
            .ok_or(CellError::InvalidSampleCount(edge_sample_num))?;

        Ok(Self {
            edge_sample_num,
            count,
        })
    }

    /// Number of sub-cells per axis.
    #[must_use]
    pub const fn edge_sample_num(&self) -> usize {
        self.edge_sample_num
    }

    /// Total number of sub-cells.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Number of sub-cells along each axis.
    #[must_use]
    pub const fn nums(&self) -> [usize; D] {
        [self.edge_sample_num; D]
    }

    /// Edge length of a sub-cell.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn spacing(&self) -> f64 {
        1.0 / self.edge_sample_num as f64
    }

    /// Volume of a single sub-cell.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn sample_volume(&self) -> f64 {
        1.0 / self.count as f64
    }

    /// Flatten a multi-index, or `None` if any component is out of range.
    #[must_use]
    pub fn flat_index(&self, index: &[usize; D]) -> Option<usize> {
        let mut flat = 0;
        for &i in index.iter().rev() {
            if i >= self.edge_sample_num {
                return None;
            }
            flat = flat * self.edge_sample_num + i;
        }
        Some(flat)
    }

    /// Expand a flat index into its multi-index.
    #[must_use]
    pub fn multi_index(&self, mut flat: usize) -> [usize; D] {
        let mut index = [0; D];
        for i in &mut index {
            *i = flat % self.edge_sample_num;
            flat /= self.edge_sample_num;
        }
        index
    }

    /// Axis-aligned bounds of a sub-cell.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn bounds(&self, flat: usize) -> Bounds {
        let h = self.spacing();
        let index = self.multi_index(flat);
        let lo = DVector::from_iterator(D, index.iter().map(|&i| i as f64 * h));
        let hi = DVector::from_iterator(D, index.iter().map(|&i| (i + 1) as f64 * h));
        Bounds::new(lo, hi)
    }

    /// Center of a sub-cell, used as its quadrature point.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn center(&self, flat: usize) -> SVector<f64, D> {
        let h = self.spacing();
        let index = self.multi_index(flat);
        SVector::from_fn(|axis, _| (index[axis] as f64 + 0.5) * h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector2;

    #[test]
    fn test_corner_positions() {
        assert_eq!(corner_count(2), 4);
        assert_eq!(corner_count(3), 8);
        assert_eq!(corner_position::<2>(1), Vector2::new(1.0, 0.0));
        assert_eq!(corner_position::<2>(2), Vector2::new(0.0, 1.0));
        assert_eq!(corner_position::<3>(6)[2], 1.0);
    }

    #[test]
    fn test_shape_functions_interpolate_corners() {
        for corner in 0..8 {
            let at = corner_position::<3>(corner);
            for other in 0..8 {
                let expected = if corner == other { 1.0 } else { 0.0 };
                assert_relative_eq!(shape_value(other, &at), expected);
            }
        }
    }

    #[test]
    fn test_shape_functions_partition_unity() {
        let point = Vector2::new(0.3, 0.8);
        let sum: f64 = (0..4).map(|k| shape_value(k, &point)).sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-14);

        let gradient_sum = (0..4).fold(Vector2::zeros(), |acc, k| acc + shape_gradient(k, &point));
        assert_relative_eq!(gradient_sum.norm(), 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_shape_gradient_matches_difference() {
        let point = nalgebra::Vector3::new(0.2, 0.45, 0.7);
        let eps = 1e-6;
        for corner in 0..8 {
            let gradient = shape_gradient(corner, &point);
            for axis in 0..3 {
                let mut plus = point;
                let mut minus = point;
                plus[axis] += eps;
                minus[axis] -= eps;
                let fd = (shape_value(corner, &plus) - shape_value(corner, &minus)) / (2.0 * eps);
                assert_relative_eq!(gradient[axis], fd, epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn test_sample_grid_indexing() {
        let grid = SampleGrid::<3>::new(4).unwrap();
        assert_eq!(grid.count(), 64);
        assert_eq!(grid.nums(), [4, 4, 4]);

        for flat in 0..grid.count() {
            let index = grid.multi_index(flat);
            assert_eq!(grid.flat_index(&index), Some(flat));
        }
        assert_eq!(grid.flat_index(&[1, 0, 0]), Some(1));
        assert_eq!(grid.flat_index(&[0, 1, 0]), Some(4));
        assert_eq!(grid.flat_index(&[4, 0, 0]), None);
    }

    #[test]
    fn test_sample_grid_geometry() {
        let grid = SampleGrid::<2>::new(4).unwrap();
        assert_relative_eq!(grid.spacing(), 0.25);
        assert_relative_eq!(grid.sample_volume(), 0.0625);

        let bounds = grid.bounds(5);
        assert_eq!(bounds.lo().as_slice(), &[0.25, 0.25]);
        assert_eq!(bounds.hi().as_slice(), &[0.5, 0.5]);
        assert_eq!(grid.center(5), Vector2::new(0.375, 0.375));
    }

    #[test]
    fn test_sample_grid_rejects_zero() {
        assert_eq!(
            SampleGrid::<2>::new(0),
            Err(CellError::InvalidSampleCount(0))
        );
    }
}

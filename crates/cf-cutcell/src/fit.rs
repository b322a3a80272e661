//! Least-squares boundary fit.
//!
//! The corner samples are fitted by a linear function `L(x) = c·x + b` in the
//! least-squares sense. Normalizing gives the plane
//!
//! ```text
//! normal = c / |c|,    offset = b / |c|
//! ```
//!
//! so that `normal·x + offset ≥ 0` exactly where `L(x) ≥ 0`. Because the
//! corner positions are fixed, the fit is a constant linear operator (the
//! pseudo-inverse of the corner design matrix) applied
//! to the samples, and its derivative with respect to sample `k` is column `k`
//! of that operator. The normalization is then differentiated in closed form.
//!
//! # Degenerate fits
//!
//! When `|c| ≤ 1e-10 · max|sample|` (for example all samples equal) the plane
//! is not determined. The fitter then returns the first coordinate axis as the
//! normal with offset `+2` if the mean sample is non-negative and `-2`
//! otherwise, which makes the whole cell occupied or empty respectively. All
//! derivatives of a degenerate fit are zero.

use nalgebra::{Const, DMatrix, DVector, Dyn, OMatrix, SMatrix, SVector};
use tracing::debug;

use crate::lattice::{corner_bit, corner_count};

/// Relative size of the fitted gradient below which the fit is degenerate.
const FIT_RELATIVE_TOLERANCE: f64 = 1e-10;

/// Offset magnitude of the fallback plane. Any value above 1 keeps the unit
/// cell entirely on one side of `x_0 + offset = 0`.
const FALLBACK_OFFSET: f64 = 2.0;

/// Derivative of the normal with respect to each corner sample, one column
/// per corner.
pub type NormalGradients<const D: usize> = OMatrix<f64, Const<D>, Dyn>;

/// A fitted boundary plane and its derivatives.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFit<const D: usize> {
    /// Unit normal pointing into the occupied phase.
    pub normal: SVector<f64, D>,
    /// Plane offset; the occupied phase is `normal·x + offset ≥ 0`.
    pub offset: f64,
    /// `normal_gradients[(i, k)] = ∂normal_i / ∂sample_k`.
    pub normal_gradients: NormalGradients<D>,
    /// `offset_gradients[k] = ∂offset / ∂sample_k`.
    pub offset_gradients: DVector<f64>,
    /// Whether the fallback plane was used.
    pub degenerate: bool,
}

/// Least-squares plane fitter for the corners of the unit cell.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFitter<const D: usize> {
    /// `(D + 1) × 2^D` pseudo-inverse of the corner design matrix. Rows
    /// `0..D` produce the linear coefficients, row `D` the constant term.
    operator: DMatrix<f64>,
}

impl<const D: usize> Default for BoundaryFitter<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const D: usize> BoundaryFitter<D> {
    /// Build the fitter for the unit cell.
    ///
    /// With corners centered as `y_k = x_k - ½`, the normal equations of the
    /// corner design are diagonal (`Σ y_k y_kᵀ = 2^D/4 · I`, `Σ y_k = 0`), so
    /// the pseudo-inverse is written out directly. Its entries are dyadic
    /// rationals, which keeps symmetric inputs exactly symmetric.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new() -> Self {
        let corners = corner_count(D);
        let inv_count = 1.0 / corners as f64;
        let centered = |corner: usize, axis: usize| {
            if corner_bit(corner, axis) { 0.5 } else { -0.5 }
        };

        let operator = DMatrix::from_fn(D + 1, corners, |row, corner| {
            if row < D {
                4.0 * inv_count * centered(corner, row)
            } else {
                // b = mean - c·(½, .., ½)
                let spread: f64 = (0..D).map(|axis| centered(corner, axis)).sum();
                inv_count - 2.0 * inv_count * spread
            }
        });
        Self { operator }
    }

    /// Fit a plane to the corner samples.
    ///
    /// `samples` must hold one value per corner; the caller validates length.
    /// The plane does not change when every sample is multiplied by a
    /// positive factor, so the samples are divided by their largest magnitude
    /// first. That keeps `|c|` representable for any finite input.
    #[must_use]
    pub fn fit(&self, samples: &[f64]) -> BoundaryFit<D> {
        let corners = corner_count(D);
        debug_assert_eq!(samples.len(), corners);

        let scale = samples.iter().fold(0.0_f64, |max, s| max.max(s.abs()));
        if scale == 0.0 {
            return Self::fallback(0.0, corners);
        }
        let values = DVector::from_iterator(corners, samples.iter().map(|s| s / scale));
        let coefficients = &self.operator * &values;
        let linear = SVector::<f64, D>::from_fn(|axis, _| coefficients[axis]);
        let constant = coefficients[D];

        let length = linear.norm();
        if length <= FIT_RELATIVE_TOLERANCE {
            return Self::fallback(values.mean(), corners);
        }

        // Gradients are taken with respect to the unscaled samples.
        let inv_length = length.recip();
        let normal = linear * inv_length;
        let offset = constant * inv_length;
        let d_scale = inv_length / scale;
        let projector = (SMatrix::<f64, D, D>::identity() - normal * normal.transpose()) * d_scale;

        let mut normal_gradients = NormalGradients::<D>::zeros_generic(Const::<D>, Dyn(corners));
        let mut offset_gradients = DVector::zeros(corners);
        for corner in 0..corners {
            let d_linear = SVector::<f64, D>::from_fn(|axis, _| self.operator[(axis, corner)]);
            let d_constant = self.operator[(D, corner)];
            normal_gradients.set_column(corner, &(projector * d_linear));
            offset_gradients[corner] = (d_constant - offset * normal.dot(&d_linear)) * d_scale;
        }

        BoundaryFit {
            normal,
            offset,
            normal_gradients,
            offset_gradients,
            degenerate: false,
        }
    }

    fn fallback(mean: f64, corners: usize) -> BoundaryFit<D> {
        let offset = if mean >= 0.0 {
            FALLBACK_OFFSET
        } else {
            -FALLBACK_OFFSET
        };
        debug!(mean, offset, "degenerate boundary fit, using axis-aligned fallback plane");

        BoundaryFit {
            normal: SVector::from_fn(|axis, _| if axis == 0 { 1.0 } else { 0.0 }),
            offset,
            normal_gradients: NormalGradients::<D>::zeros_generic(Const::<D>, Dyn(corners)),
            offset_gradients: DVector::zeros(corners),
            degenerate: true,
        }
    }
}

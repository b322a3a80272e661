//! Occupied volume and boundary measure of every sub-cell.
//!
//! All sub-cells share the single plane produced by the boundary fit. The
//! derivative of a sub-cell quantity `q` with respect to corner sample `k`
//! is obtained by the chain rule
//!
//! ```text
//! ∂q/∂s_k = ∂q/∂normal · ∂normal/∂s_k + ∂q/∂offset · ∂offset/∂s_k
//! ```
//!
//! where the plane sensitivities come from [`crate::clip`]: the occupied
//! volume changes by the boundary measure times the plane's normal velocity,
//! and the boundary measure changes through the rims where the plane meets
//! the sub-cell faces.

use nalgebra::{DMatrix, DVector};

use crate::clip::{Bounds, HalfSpace, clip, cut, cut_sensitivity};
use crate::fit::BoundaryFit;

/// Geometry of one sub-cell and its sensitivity to the plane parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SubcellGeometry {
    /// Volume on the occupied side of the plane.
    pub area: f64,
    /// Measure of the plane inside the sub-cell.
    pub boundary_area: f64,
    /// `∂area/∂normal`.
    pub area_wrt_normal: DVector<f64>,
    /// `∂area/∂offset`.
    pub area_wrt_offset: f64,
    /// `∂boundary_area/∂normal`.
    pub boundary_wrt_normal: DVector<f64>,
    /// `∂boundary_area/∂offset`.
    pub boundary_wrt_offset: f64,
}

/// Clip one sub-cell against the plane and differentiate the result.
#[must_use]
pub fn subcell_geometry(bounds: &Bounds, plane: &HalfSpace) -> SubcellGeometry {
    let region = clip(bounds, plane);
    let boundary = cut(bounds, plane);
    let (boundary_wrt_normal, boundary_wrt_offset) = cut_sensitivity(bounds, plane);

    // d|B ∩ H| = ∫_cut (δn·x + δo) / |n|
    let norm = plane.norm();
    let (area_wrt_normal, area_wrt_offset) = if norm > 0.0 {
        (&boundary.moment / norm, boundary.measure / norm)
    } else {
        (DVector::zeros(bounds.dim()), 0.0)
    };

    SubcellGeometry {
        area: region.measure,
        boundary_area: boundary.measure,
        area_wrt_normal,
        area_wrt_offset,
        boundary_wrt_normal,
        boundary_wrt_offset,
    }
}

/// Per-sub-cell areas and boundary areas with their corner gradients.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleGeometry {
    /// Occupied volume of each sub-cell.
    pub areas: Vec<f64>,
    /// Boundary measure inside each sub-cell.
    pub boundary_areas: Vec<f64>,
    /// Total occupied fraction of the cell.
    pub area: f64,
    /// Total boundary measure inside the cell.
    pub boundary_area: f64,
    /// `areas_gradients[(s, k)] = ∂areas[s] / ∂sample_k`.
    pub areas_gradients: DMatrix<f64>,
    /// `boundary_areas_gradients[(s, k)] = ∂boundary_areas[s] / ∂sample_k`.
    pub boundary_areas_gradients: DMatrix<f64>,
    /// `∂area / ∂sample_k`.
    pub area_gradients: DVector<f64>,
    /// `∂boundary_area / ∂sample_k`.
    pub boundary_area_gradients: DVector<f64>,
}

/// Integrate occupied volume and boundary measure over all sub-cells.
#[must_use]
pub fn integrate<const D: usize>(samples: &[Bounds], fit: &BoundaryFit<D>) -> SampleGeometry {
    let corners = fit.offset_gradients.len();
    let plane = HalfSpace::from_slice(fit.normal.as_slice(), fit.offset);

    let mut areas = Vec::with_capacity(samples.len());
    let mut boundary_areas = Vec::with_capacity(samples.len());
    let mut areas_gradients = DMatrix::zeros(samples.len(), corners);
    let mut boundary_areas_gradients = DMatrix::zeros(samples.len(), corners);

    for (index, bounds) in samples.iter().enumerate() {
        let geometry = subcell_geometry(bounds, &plane);
        areas.push(geometry.area);
        boundary_areas.push(geometry.boundary_area);

        let area_row = chain(
            fit,
            &geometry.area_wrt_normal,
            geometry.area_wrt_offset,
        );
        let boundary_row = chain(
            fit,
            &geometry.boundary_wrt_normal,
            geometry.boundary_wrt_offset,
        );
        areas_gradients.set_row(index, &area_row.transpose());
        boundary_areas_gradients.set_row(index, &boundary_row.transpose());
    }

    let area = areas.iter().sum::<f64>().clamp(0.0, 1.0);
    let boundary_area = boundary_areas.iter().sum();
    let area_gradients = column_sums(&areas_gradients);
    let boundary_area_gradients = column_sums(&boundary_areas_gradients);

    SampleGeometry {
        areas,
        boundary_areas,
        area,
        boundary_area,
        areas_gradients,
        boundary_areas_gradients,
        area_gradients,
        boundary_area_gradients,
    }
}

/// Map plane sensitivities to per-corner derivatives.
fn chain<const D: usize>(
    fit: &BoundaryFit<D>,
    wrt_normal: &DVector<f64>,
    wrt_offset: f64,
) -> DVector<f64> {
    let mut row = DVector::zeros(fit.offset_gradients.len());
    for (corner, value) in row.iter_mut().enumerate() {
        *value = fit.normal_gradients.column(corner).dot(wrt_normal)
            + wrt_offset * fit.offset_gradients[corner];
    }
    row
}

fn column_sums(matrix: &DMatrix<f64>) -> DVector<f64> {
    DVector::from_iterator(
        matrix.ncols(),
        matrix.column_iter().map(|column| column.sum()),
    )
}

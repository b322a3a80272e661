//! Shape functions integrated over the embedded boundary.
//!
//! `dirichlet[k] = Σ_s boundary_s · φ_k(center_s)`, so that for a corner
//! field `u` the product `u · dirichlet` approximates the integral of the
//! interpolated field over the boundary inside the cell.

use nalgebra::{DMatrix, DVector};

use crate::sample::SampleGeometry;

/// Dirichlet vector of a cell and its derivative.
#[derive(Debug, Clone, PartialEq)]
pub struct DirichletAssembly {
    /// One entry per corner.
    pub vector: DVector<f64>,
    /// `gradients[(k, c)] = ∂vector[k]/∂sample_c`.
    pub gradients: DMatrix<f64>,
}

/// Integrate the shape functions over the boundary.
///
/// `shape_values[(s, k)]` is corner `k`'s shape function evaluated at the
/// quadrature point of sub-cell `s`.
#[must_use]
pub fn assemble(shape_values: &DMatrix<f64>, geometry: &SampleGeometry) -> DirichletAssembly {
    let boundary = DVector::from_column_slice(&geometry.boundary_areas);
    DirichletAssembly {
        vector: shape_values.tr_mul(&boundary),
        gradients: shape_values.tr_mul(&geometry.boundary_areas_gradients),
    }
}

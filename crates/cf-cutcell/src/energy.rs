//! Linear-elastic energy of the occupied region.
//!
//! Corner velocities `u` (corner-major, `u[k·D + i]` is component `i` at
//! corner `k`) are interpolated with the bilinear/trilinear shape functions.
//! Their gradient at a point is `F = G·u`, with `F` flattened row-major
//! (`F[i·D + j] = ∂u_i/∂x_j`). The energy density of small-strain linear
//! elasticity is
//!
//! ```text
//! ψ = μ ε:ε + λ/2 tr(ε)²,    ε = (F + Fᵀ) / 2
//! ```
//!
//! which is the quadratic form `½ Fᵀ C F` with
//! `C = μ(I + T) + λ vec(I) vec(I)ᵀ`, where `T` transposes a flattened matrix.
//!
//! Each sub-cell contributes its stiffness `Gᵀ C G`, evaluated at the
//! sub-cell center, weighted by its occupied volume. Only the weights depend
//! on the corner samples, so the derivative of the energy matrix is the same
//! sum weighted by the volume gradients. Stiffness densities are evaluated
//! during assembly and only for sub-cells that carry a nonzero weight or
//! weight gradient.

use nalgebra::{DMatrix, SVector};

use crate::lattice::{corner_count, shape_gradient};
use crate::sample::SampleGeometry;

/// Map from corner velocities to the flattened velocity gradient at `point`.
///
/// The result has `D·D` rows and `D·2^D` columns.
#[must_use]
pub fn velocity_to_deformation_gradient<const D: usize>(point: &SVector<f64, D>) -> DMatrix<f64> {
    let corners = corner_count(D);
    let mut map = DMatrix::zeros(D * D, D * corners);
    for corner in 0..corners {
        let gradient = shape_gradient(corner, point);
        for i in 0..D {
            for j in 0..D {
                map[(i * D + j, corner * D + i)] = gradient[j];
            }
        }
    }
    map
}

/// Isotropic elasticity tensor acting on row-major flattened `dim × dim`
/// matrices.
#[must_use]
pub fn elasticity_tensor(dim: usize, lame_lambda: f64, lame_mu: f64) -> DMatrix<f64> {
    let mut tensor = DMatrix::zeros(dim * dim, dim * dim);
    for i in 0..dim {
        for j in 0..dim {
            let row = i * dim + j;
            tensor[(row, row)] += lame_mu;
            tensor[(row, j * dim + i)] += lame_mu;
        }
    }
    for i in 0..dim {
        for j in 0..dim {
            tensor[(i * dim + i, j * dim + j)] += lame_lambda;
        }
    }
    tensor
}

/// Stiffness density `Gᵀ C G` at a point of the cell.
#[must_use]
pub fn stiffness_at<const D: usize>(
    point: &SVector<f64, D>,
    lame_lambda: f64,
    lame_mu: f64,
) -> DMatrix<f64> {
    stiffness_with(point, &elasticity_tensor(D, lame_lambda, lame_mu))
}

fn stiffness_with<const D: usize>(point: &SVector<f64, D>, tensor: &DMatrix<f64>) -> DMatrix<f64> {
    let map = velocity_to_deformation_gradient(point);
    let stiffness = map.tr_mul(&(tensor * &map));
    (&stiffness + stiffness.transpose()) * 0.5
}

/// Energy matrix of a cell and its derivative with respect to each corner
/// sample.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyAssembly {
    /// Symmetric `(D·2^D)²` matrix; `½ uᵀ M u` is the elastic energy.
    pub matrix: DMatrix<f64>,
    /// `gradients[k] = ∂M/∂sample_k`.
    pub gradients: Vec<DMatrix<f64>>,
}

/// Sum the stiffness densities at the sub-cell centers weighted by occupied
/// volume.
///
/// `centers` holds one quadrature point per sub-cell, in sub-cell order.
#[must_use]
pub fn assemble<const D: usize>(
    centers: &[SVector<f64, D>],
    lame_lambda: f64,
    lame_mu: f64,
    geometry: &SampleGeometry,
) -> EnergyAssembly {
    debug_assert_eq!(centers.len(), geometry.areas.len());

    let dofs = D * corner_count(D);
    let corners = geometry.areas_gradients.ncols();
    let tensor = elasticity_tensor(D, lame_lambda, lame_mu);
    let mut matrix = DMatrix::zeros(dofs, dofs);
    let mut gradients = vec![DMatrix::zeros(dofs, dofs); corners];

    for (sample, center) in centers.iter().enumerate() {
        let weight = geometry.areas[sample];
        let d_weights = geometry.areas_gradients.row(sample);
        if weight == 0.0 && d_weights.iter().all(|d| *d == 0.0) {
            continue;
        }

        let block = stiffness_with(center, &tensor);
        if weight != 0.0 {
            matrix += &block * weight;
        }
        for (gradient, d_weight) in gradients.iter_mut().zip(d_weights.iter()) {
            if *d_weight != 0.0 {
                *gradient += &block * *d_weight;
            }
        }
    }

    EnergyAssembly { matrix, gradients }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::lattice::corner_position;
    use approx::assert_relative_eq;
    use nalgebra::{DVector, Vector2, Vector3};

    fn corner_velocities<const D: usize>(
        field: impl Fn(&SVector<f64, D>) -> SVector<f64, D>,
    ) -> DVector<f64> {
        let corners = corner_count(D);
        let mut u = DVector::zeros(D * corners);
        for corner in 0..corners {
            let value = field(&corner_position::<D>(corner));
            for i in 0..D {
                u[corner * D + i] = value[i];
            }
        }
        u
    }

    #[test]
    fn test_deformation_gradient_of_affine_field() {
        let a = nalgebra::Matrix2::new(0.3, -1.2, 0.7, 2.0);
        let u = corner_velocities::<2>(|x| a * x + Vector2::new(5.0, -1.0));
        let map = velocity_to_deformation_gradient(&Vector2::new(0.2, 0.9));
        let gradient = map * u;

        assert_relative_eq!(gradient[0], 0.3, epsilon = 1e-12);
        assert_relative_eq!(gradient[1], -1.2, epsilon = 1e-12);
        assert_relative_eq!(gradient[2], 0.7, epsilon = 1e-12);
        assert_relative_eq!(gradient[3], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_stiffness_is_symmetric() {
        let stiffness = stiffness_at(&Vector3::new(0.1, 0.6, 0.35), 0.8, 0.4);
        assert_eq!(stiffness.nrows(), 24);
        assert_relative_eq!(stiffness, stiffness.transpose(), epsilon = 1e-14);
    }

    #[test]
    fn test_rigid_motion_has_no_energy() {
        let stiffness = stiffness_at(&Vector3::new(0.25, 0.75, 0.5), 1.3, 0.7);

        let translation = corner_velocities::<3>(|_| Vector3::new(0.4, -2.0, 1.0));
        assert_relative_eq!((&stiffness * &translation).norm(), 0.0, epsilon = 1e-12);

        let spin = Vector3::new(0.3, -0.5, 1.1);
        let rotation = corner_velocities::<3>(|x| spin.cross(x));
        assert_relative_eq!((&stiffness * &rotation).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_uniform_expansion_energy_density() {
        let (lame_lambda, lame_mu) = (0.9, 0.6);
        let stiffness = stiffness_at(&Vector2::new(0.4, 0.3), lame_lambda, lame_mu);
        let u = corner_velocities::<2>(|x| *x);

        // F = I: ψ = μD + λD²/2.
        let energy = 0.5 * u.dot(&(&stiffness * &u));
        assert_relative_eq!(energy, 2.0 * lame_mu + 2.0 * lame_lambda, epsilon = 1e-12);
    }

    #[test]
    fn test_simple_shear_energy_density() {
        let lame_mu = 0.6;
        let stiffness = stiffness_at(&Vector2::new(0.5, 0.5), 5.0, lame_mu);
        let u = corner_velocities::<2>(|x| Vector2::new(x[1], 0.0));

        // ε has off-diagonal entries ½, so ε:ε = ½ and tr(ε) = 0.
        let energy = 0.5 * u.dot(&(&stiffness * &u));
        assert_relative_eq!(energy, 0.5 * lame_mu, epsilon = 1e-12);
    }

    #[test]
    fn test_assemble_weights_blocks() {
        let centers = [Vector2::new(0.25, 0.5), Vector2::new(0.75, 0.5)];
        let blocks: Vec<_> = centers.iter().map(|c| stiffness_at(c, 1.0, 1.0)).collect();
        let geometry = SampleGeometry {
            areas: vec![0.5, 0.25],
            boundary_areas: vec![0.0, 0.0],
            area: 0.75,
            boundary_area: 0.0,
            areas_gradients: DMatrix::from_row_slice(2, 4, &[
                0.1, 0.0, 0.0, 0.0, //
                0.0, 0.0, 0.0, -0.2,
            ]),
            boundary_areas_gradients: DMatrix::zeros(2, 4),
            area_gradients: DVector::zeros(4),
            boundary_area_gradients: DVector::zeros(4),
        };

        let assembly = assemble(&centers, 1.0, 1.0, &geometry);
        let expected = &blocks[0] * 0.5 + &blocks[1] * 0.25;
        assert_relative_eq!(assembly.matrix, expected, epsilon = 1e-14);
        assert_eq!(assembly.gradients.len(), 4);
        assert_relative_eq!(assembly.gradients[0], &blocks[0] * 0.1, epsilon = 1e-14);
        assert_relative_eq!(assembly.gradients[3], &blocks[1] * -0.2, epsilon = 1e-14);
        assert!(assembly.gradients[1].iter().all(|g| *g == 0.0));
    }

    #[test]
    fn test_assemble_skips_unoccupied_samples() {
        let centers = [Vector2::new(0.25, 0.5), Vector2::new(0.75, 0.5)];
        let geometry = SampleGeometry {
            areas: vec![0.0, 0.5],
            boundary_areas: vec![0.0, 0.0],
            area: 0.5,
            boundary_area: 0.0,
            areas_gradients: DMatrix::zeros(2, 4),
            boundary_areas_gradients: DMatrix::zeros(2, 4),
            area_gradients: DVector::zeros(4),
            boundary_area_gradients: DVector::zeros(4),
        };

        let assembly = assemble(&centers, 0.7, 0.3, &geometry);
        let expected = stiffness_at(&centers[1], 0.7, 0.3) * 0.5;
        assert_relative_eq!(assembly.matrix, expected, epsilon = 1e-14);
        assert!(assembly.gradients.iter().all(|g| g.iter().all(|m| *m == 0.0)));
    }
}

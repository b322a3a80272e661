//! Sample-independent precomputation shared by cells of one configuration.
//!
//! Much of a cell depends only on the [`CellConfig`]: the fit operator, the
//! sub-cell boxes and quadrature points, and the shape function table. A
//! [`CellTemplate`] computes these once and then builds any number of
//! [`Cell`]s from corner samples. Stiffness densities are evaluated per build
//! and only where the cell is occupied, so memory stays linear in the number
//! of sub-cells.

use nalgebra::{DMatrix, SVector};
use tracing::{debug, trace};

use crate::cell::Cell;
use crate::clip::Bounds;
use crate::config::CellConfig;
use crate::dirichlet;
use crate::energy::{self, stiffness_at};
use crate::error::{CellError, CellResult};
use crate::fit::BoundaryFitter;
use crate::lattice::{SampleGrid, corner_count, shape_value};
use crate::sample;

/// Precomputed data for building cells with a fixed configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CellTemplate<const D: usize> {
    config: CellConfig,
    grid: SampleGrid<D>,
    fitter: BoundaryFitter<D>,
    bounds: Vec<Bounds>,
    /// Quadrature point of each sub-cell.
    centers: Vec<SVector<f64, D>>,
    /// `shape_values[(s, k)] = φ_k(center_s)`.
    shape_values: DMatrix<f64>,
}

impl<const D: usize> CellTemplate<D> {
    /// Validate `config` and precompute the sample-independent data.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or `D` is not 2 or 3.
    pub fn new(config: &CellConfig) -> CellResult<Self> {
        if D != 2 && D != 3 {
            return Err(CellError::UnsupportedDimension(D));
        }
        config.validate()?;

        let grid = SampleGrid::<D>::new(config.edge_sample_num)?;
        let lame_lambda = config.material.lame_lambda();
        let lame_mu = config.material.lame_mu();

        let bounds: Vec<Bounds> = (0..grid.count()).map(|s| grid.bounds(s)).collect();
        let centers: Vec<SVector<f64, D>> = (0..grid.count()).map(|s| grid.center(s)).collect();
        let shape_values = DMatrix::from_fn(grid.count(), corner_count(D), |s, corner| {
            shape_value(corner, &centers[s])
        });

        debug!(
            dim = D,
            edge_sample_num = config.edge_sample_num,
            samples = grid.count(),
            lame_lambda,
            lame_mu,
            "prepared cut-cell template"
        );

        Ok(Self {
            config: *config,
            grid,
            fitter: BoundaryFitter::new(),
            bounds,
            centers,
            shape_values,
        })
    }

    /// The configuration this template was prepared for.
    #[must_use]
    pub const fn config(&self) -> &CellConfig {
        &self.config
    }

    /// The sub-cell lattice.
    #[must_use]
    pub const fn grid(&self) -> &SampleGrid<D> {
        &self.grid
    }

    /// Energy matrix of a cell that is occupied everywhere.
    #[must_use]
    pub fn uncut_energy_matrix(&self) -> DMatrix<f64> {
        let weight = self.grid.sample_volume();
        let dofs = D * corner_count(D);
        let material = &self.config.material;
        self.centers.iter().fold(DMatrix::zeros(dofs, dofs), |total, center| {
            total + stiffness_at(center, material.lame_lambda(), material.lame_mu()) * weight
        })
    }

    /// Build a cell from its corner samples.
    ///
    /// # Errors
    ///
    /// Returns [`CellError::CornerCountMismatch`] if `sdf_at_corners` does not
    /// hold `2^D` values, or [`CellError::NonFiniteSample`] if any value is
    /// NaN or infinite.
    pub fn build(&self, sdf_at_corners: &[f64]) -> CellResult<Cell<D>> {
        let corners = corner_count(D);
        if sdf_at_corners.len() != corners {
            return Err(CellError::corner_count(corners, sdf_at_corners.len()));
        }
        if let Some((index, &value)) = sdf_at_corners
            .iter()
            .enumerate()
            .find(|(_, value)| !value.is_finite())
        {
            return Err(CellError::NonFiniteSample { index, value });
        }

        let fit = self.fitter.fit(sdf_at_corners);
        let geometry = sample::integrate(&self.bounds, &fit);
        let material = &self.config.material;
        let energy = energy::assemble(
            &self.centers,
            material.lame_lambda(),
            material.lame_mu(),
            &geometry,
        );
        let dirichlet = dirichlet::assemble(&self.shape_values, &geometry);

        let cell = Cell::from_parts(
            self.config,
            self.grid,
            sdf_at_corners.to_vec(),
            fit,
            geometry,
            energy,
            dirichlet,
        );
        trace!(
            area = cell.area(),
            boundary_area = cell.boundary_area(),
            kind = ?cell.kind(),
            degenerate = cell.is_degenerate(),
            "built cut cell"
        );
        Ok(cell)
    }
}

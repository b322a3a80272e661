//! The cut cell: fitted boundary, integrated geometry, energy and boundary
//! terms, all with derivatives with respect to the corner samples.

use nalgebra::{DMatrix, DVector, DVectorView, SVector};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::CellConfig;
use crate::dirichlet::DirichletAssembly;
use crate::energy::EnergyAssembly;
use crate::error::{CellError, CellResult};
use crate::fit::{BoundaryFit, NormalGradients};
use crate::flat::FlatCell;
use crate::lattice::{SampleGrid, corner_count};
use crate::sample::SampleGeometry;
use crate::template::CellTemplate;

/// Two-dimensional cut cell.
pub type Cell2 = Cell<2>;

/// Three-dimensional cut cell.
pub type Cell3 = Cell<3>;

/// Classification of a cell by its occupied fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CellKind {
    /// `area <= threshold`.
    Solid,
    /// `area >= 1 - threshold`.
    Fluid,
    /// Neither solid nor fluid.
    Mixed,
}

/// A grid cell cut by the zero level set of a signed-distance field.
///
/// The cell occupies `[0, 1]^D` in local coordinates and is built from the
/// signed-distance values at its `2^D` corners. All outputs and their
/// gradients are computed once at construction; the value is immutable
/// afterwards.
///
/// # Example
///
/// ```
/// use cf_cutcell::{Cell2, CellConfig};
///
/// let cell = Cell2::new(&CellConfig::default(), &[-1.0, 1.0, -1.0, 1.0])?;
/// assert!((cell.area() - 0.5).abs() < 1e-12);
/// assert!(cell.is_mixed_cell());
/// # Ok::<(), cf_cutcell::CellError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Cell<const D: usize> {
    config: CellConfig,
    grid: SampleGrid<D>,
    sdf_at_corners: Vec<f64>,
    fit: BoundaryFit<D>,
    geometry: SampleGeometry,
    energy: EnergyAssembly,
    dirichlet: DirichletAssembly,
}

impl<const D: usize> Cell<D> {
    /// Build a cell from a configuration and its corner samples.
    ///
    /// Use a [`CellTemplate`] instead when building many cells with the same
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, `D` is not 2 or 3,
    /// or `sdf_at_corners` does not hold `2^D` finite values.
    pub fn new(config: &CellConfig, sdf_at_corners: &[f64]) -> CellResult<Self> {
        CellTemplate::new(config)?.build(sdf_at_corners)
    }

    pub(crate) const fn from_parts(
        config: CellConfig,
        grid: SampleGrid<D>,
        sdf_at_corners: Vec<f64>,
        fit: BoundaryFit<D>,
        geometry: SampleGeometry,
        energy: EnergyAssembly,
        dirichlet: DirichletAssembly,
    ) -> Self {
        Self {
            config,
            grid,
            sdf_at_corners,
            fit,
            geometry,
            energy,
            dirichlet,
        }
    }

    /// Replace all state with a cell built from new inputs.
    ///
    /// On error the cell is left unchanged.
    ///
    /// # Errors
    ///
    /// Same as [`Cell::new`].
    pub fn reinitialize(&mut self, config: &CellConfig, sdf_at_corners: &[f64]) -> CellResult<()> {
        *self = Self::new(config, sdf_at_corners)?;
        Ok(())
    }

    // Shape

    /// Number of corners, `2^D`.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub const fn corner_count(&self) -> usize {
        corner_count(D)
    }

    /// Number of corners along each axis.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub const fn corner_nums(&self) -> [usize; D] {
        [2; D]
    }

    /// Position of a corner in cell-local coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`CellError::CornerOutOfRange`] if `corner` is not a corner.
    pub fn corner_position(&self, corner: usize) -> CellResult<SVector<f64, D>> {
        self.check_corner(corner)?;
        Ok(crate::lattice::corner_position(corner))
    }

    /// Total number of sub-cells.
    #[must_use]
    pub const fn sample_count(&self) -> usize {
        self.grid.count()
    }

    /// Number of sub-cells along each axis.
    #[must_use]
    pub const fn sample_nums(&self) -> [usize; D] {
        self.grid.nums()
    }

    /// Number of sub-cells along each axis.
    #[must_use]
    pub const fn edge_sample_num(&self) -> usize {
        self.grid.edge_sample_num()
    }

    // Configuration

    /// The configuration the cell was built with.
    #[must_use]
    pub const fn config(&self) -> &CellConfig {
        &self.config
    }

    /// Young's modulus.
    #[must_use]
    pub const fn youngs_modulus(&self) -> f64 {
        self.config.material.youngs_modulus
    }

    /// Poisson's ratio.
    #[must_use]
    pub const fn poissons_ratio(&self) -> f64 {
        self.config.material.poissons_ratio
    }

    /// First Lamé parameter.
    #[must_use]
    pub fn lame_lambda(&self) -> f64 {
        self.config.material.lame_lambda()
    }

    /// Second Lamé parameter.
    #[must_use]
    pub fn lame_mu(&self) -> f64 {
        self.config.material.lame_mu()
    }

    /// Classification threshold.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.config.threshold
    }

    /// The signed-distance values the cell was built from.
    #[must_use]
    pub fn sdf_at_corners(&self) -> &[f64] {
        &self.sdf_at_corners
    }

    // Boundary

    /// Unit normal of the fitted boundary, pointing into the occupied region.
    #[must_use]
    pub const fn normal(&self) -> &SVector<f64, D> {
        &self.fit.normal
    }

    /// Offset of the fitted boundary; the occupied region is
    /// `normal·x + offset ≥ 0`.
    #[must_use]
    pub const fn offset(&self) -> f64 {
        self.fit.offset
    }

    /// Whether the samples did not determine a boundary and the fallback
    /// plane was used.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        self.fit.degenerate
    }

    // Geometry

    /// Occupied volume of a sub-cell.
    ///
    /// # Errors
    ///
    /// Returns [`CellError::SampleOutOfRange`] for an invalid index.
    pub fn sample_area(&self, sample: usize) -> CellResult<f64> {
        self.check_sample(sample)?;
        Ok(self.geometry.areas[sample])
    }

    /// Occupied volume of the sub-cell at a multi-index.
    ///
    /// # Errors
    ///
    /// Returns [`CellError::SampleOutOfRange`] if any component is out of
    /// range.
    pub fn sample_area_at(&self, index: &[usize; D]) -> CellResult<f64> {
        Ok(self.geometry.areas[self.flat_sample(index)?])
    }

    /// Occupied volume of every sub-cell.
    #[must_use]
    pub fn sample_areas(&self) -> &[f64] {
        &self.geometry.areas
    }

    /// Boundary measure inside a sub-cell.
    ///
    /// # Errors
    ///
    /// Returns [`CellError::SampleOutOfRange`] for an invalid index.
    pub fn sample_boundary_area(&self, sample: usize) -> CellResult<f64> {
        self.check_sample(sample)?;
        Ok(self.geometry.boundary_areas[sample])
    }

    /// Boundary measure inside the sub-cell at a multi-index.
    ///
    /// # Errors
    ///
    /// Returns [`CellError::SampleOutOfRange`] if any component is out of
    /// range.
    pub fn sample_boundary_area_at(&self, index: &[usize; D]) -> CellResult<f64> {
        Ok(self.geometry.boundary_areas[self.flat_sample(index)?])
    }

    /// Boundary measure inside every sub-cell.
    #[must_use]
    pub fn sample_boundary_areas(&self) -> &[f64] {
        &self.geometry.boundary_areas
    }

    /// Occupied fraction of the cell, in `[0, 1]`.
    #[must_use]
    pub const fn area(&self) -> f64 {
        self.geometry.area
    }

    /// Boundary measure inside the cell.
    #[must_use]
    pub const fn boundary_area(&self) -> f64 {
        self.geometry.boundary_area
    }

    // Assembled terms

    /// Symmetric `(D·2^D)²` matrix `M`; the elastic energy of corner
    /// velocities `u` is `½ uᵀ M u`.
    #[must_use]
    pub const fn energy_matrix(&self) -> &DMatrix<f64> {
        &self.energy.matrix
    }

    /// Shape functions integrated over the boundary, one entry per corner.
    #[must_use]
    pub const fn dirichlet_vector(&self) -> &DVector<f64> {
        &self.dirichlet.vector
    }

    /// Elastic energy `½ uᵀ M u` of corner velocities laid out as
    /// `u[corner·D + axis]`.
    ///
    /// # Errors
    ///
    /// Returns [`CellError::VelocityLengthMismatch`] if `velocities` does not
    /// hold `D·2^D` values.
    pub fn energy(&self, velocities: &[f64]) -> CellResult<f64> {
        let expected = self.energy.matrix.nrows();
        if velocities.len() != expected {
            return Err(CellError::VelocityLengthMismatch {
                expected,
                actual: velocities.len(),
            });
        }
        let u = DVectorView::from_slice(velocities, expected);
        Ok(0.5 * u.dot(&(&self.energy.matrix * u)))
    }

    // Gradients with respect to the corner samples

    /// `normal_gradients()[(i, k)] = ∂normal_i/∂sdf_k`.
    #[must_use]
    pub const fn normal_gradients(&self) -> &NormalGradients<D> {
        &self.fit.normal_gradients
    }

    /// `offset_gradients()[k] = ∂offset/∂sdf_k`.
    #[must_use]
    pub const fn offset_gradients(&self) -> &DVector<f64> {
        &self.fit.offset_gradients
    }

    /// `sample_areas_gradients()[(s, k)] = ∂sample_area_s/∂sdf_k`.
    #[must_use]
    pub const fn sample_areas_gradients(&self) -> &DMatrix<f64> {
        &self.geometry.areas_gradients
    }

    /// `sample_boundary_areas_gradients()[(s, k)] = ∂sample_boundary_area_s/∂sdf_k`.
    #[must_use]
    pub const fn sample_boundary_areas_gradients(&self) -> &DMatrix<f64> {
        &self.geometry.boundary_areas_gradients
    }

    /// `area_gradients()[k] = ∂area/∂sdf_k`.
    #[must_use]
    pub const fn area_gradients(&self) -> &DVector<f64> {
        &self.geometry.area_gradients
    }

    /// `boundary_area_gradients()[k] = ∂boundary_area/∂sdf_k`.
    #[must_use]
    pub const fn boundary_area_gradients(&self) -> &DVector<f64> {
        &self.geometry.boundary_area_gradients
    }

    /// `energy_matrix_gradients()[k] = ∂M/∂sdf_k`.
    #[must_use]
    pub fn energy_matrix_gradients(&self) -> &[DMatrix<f64>] {
        &self.energy.gradients
    }

    /// `dirichlet_vector_gradients()[(i, k)] = ∂dirichlet_i/∂sdf_k`.
    #[must_use]
    pub const fn dirichlet_vector_gradients(&self) -> &DMatrix<f64> {
        &self.dirichlet.gradients
    }

    // Classification

    /// Whether the occupied fraction is at most the threshold.
    #[must_use]
    pub fn is_solid_cell(&self) -> bool {
        self.area() <= self.threshold()
    }

    /// Whether the occupied fraction is at least one minus the threshold.
    #[must_use]
    pub fn is_fluid_cell(&self) -> bool {
        self.area() >= 1.0 - self.threshold()
    }

    /// Whether the cell is neither solid nor fluid.
    #[must_use]
    pub fn is_mixed_cell(&self) -> bool {
        !self.is_solid_cell() && !self.is_fluid_cell()
    }

    /// Classification of the cell.
    #[must_use]
    pub fn kind(&self) -> CellKind {
        if self.is_solid_cell() {
            CellKind::Solid
        } else if self.is_fluid_cell() {
            CellKind::Fluid
        } else {
            CellKind::Mixed
        }
    }

    /// View with plain-container accessors.
    #[must_use]
    pub const fn flat(&self) -> FlatCell<'_, D> {
        FlatCell::new(self)
    }

    pub(crate) const fn check_corner(&self, corner: usize) -> CellResult<()> {
        if corner < self.corner_count() {
            Ok(())
        } else {
            Err(CellError::corner_out_of_range(corner, self.corner_count()))
        }
    }

    const fn check_sample(&self, sample: usize) -> CellResult<()> {
        if sample < self.grid.count() {
            Ok(())
        } else {
            Err(CellError::sample_out_of_range(sample, self.grid.count()))
        }
    }

    fn flat_sample(&self, index: &[usize; D]) -> CellResult<usize> {
        self.grid.flat_index(index).ok_or_else(|| {
            let bad = index
                .iter()
                .copied()
                .find(|&i| i >= self.grid.edge_sample_num())
                .unwrap_or_default();
            CellError::sample_out_of_range(bad, self.grid.edge_sample_num())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector2;

    fn vertical() -> Cell2 {
        Cell2::new(&CellConfig::default(), &[-1.0, 1.0, -1.0, 1.0]).unwrap()
    }

    #[test]
    fn test_cell_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Cell2>();
        assert_send_sync::<Cell3>();
    }

    #[test]
    fn test_shape_accessors() {
        let cell = vertical();
        assert_eq!(cell.corner_count(), 4);
        assert_eq!(cell.corner_nums(), [2, 2]);
        assert_eq!(cell.sample_count(), 16);
        assert_eq!(cell.sample_nums(), [4, 4]);
        assert_eq!(cell.edge_sample_num(), 4);
        assert_eq!(cell.corner_position(3).unwrap(), Vector2::new(1.0, 1.0));
        assert_eq!(
            cell.corner_position(4),
            Err(CellError::corner_out_of_range(4, 4))
        );
        assert_eq!(cell.sdf_at_corners(), &[-1.0, 1.0, -1.0, 1.0]);
    }

    #[test]
    fn test_material_accessors() {
        let config = CellConfig::new(2.0, 0.25, 0.01, 3);
        let cell = Cell2::new(&config, &[0.1, 0.2, 0.3, 0.4]).unwrap();
        assert_eq!(cell.youngs_modulus(), 2.0);
        assert_eq!(cell.poissons_ratio(), 0.25);
        assert_eq!(cell.threshold(), 0.01);
        assert_relative_eq!(cell.lame_mu(), 0.8, epsilon = 1e-12);
        assert_relative_eq!(cell.lame_lambda(), 0.8, epsilon = 1e-12);
        assert_eq!(cell.config(), &config);
    }

    #[test]
    fn test_sample_access() {
        let cell = vertical();
        assert_eq!(cell.sample_area_at(&[2, 1]).unwrap(), cell.sample_area(6).unwrap());
        assert_relative_eq!(cell.sample_area_at(&[3, 0]).unwrap(), 0.0625, epsilon = 1e-12);
        assert_relative_eq!(cell.sample_boundary_area_at(&[2, 3]).unwrap(), 0.25, epsilon = 1e-12);
        assert_eq!(
            cell.sample_area(16),
            Err(CellError::sample_out_of_range(16, 16))
        );
        assert_eq!(
            cell.sample_boundary_area_at(&[0, 7]),
            Err(CellError::sample_out_of_range(7, 4))
        );
    }

    #[test]
    fn test_energy_helper() {
        let cell = vertical();
        let u = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let energy = cell.energy(&u).unwrap();

        // F = I over the occupied half.
        let expected = 0.5 * (2.0 * cell.lame_mu() + 2.0 * cell.lame_lambda());
        assert_relative_eq!(energy, expected, epsilon = 1e-12);

        assert_eq!(
            cell.energy(&[0.0; 3]),
            Err(CellError::VelocityLengthMismatch {
                expected: 8,
                actual: 3
            })
        );
    }

    #[test]
    fn test_kind() {
        assert_eq!(vertical().kind(), CellKind::Mixed);

        let config = CellConfig::default();
        assert_eq!(Cell2::new(&config, &[1.0; 4]).unwrap().kind(), CellKind::Fluid);
        assert_eq!(Cell2::new(&config, &[-1.0; 4]).unwrap().kind(), CellKind::Solid);
    }

    #[test]
    fn test_reinitialize_keeps_state_on_error() {
        let mut cell = vertical();
        let before = cell.clone();
        assert!(cell.reinitialize(&CellConfig::default(), &[1.0; 3]).is_err());
        assert_eq!(cell, before);

        cell.reinitialize(&CellConfig::coarse(), &[1.0; 4]).unwrap();
        assert_eq!(cell.sample_count(), 4);
        assert!(cell.is_fluid_cell());
    }
}

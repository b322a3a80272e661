//! Plain-container view of a cell for foreign-language bindings.
//!
//! Every accessor returns owned `Vec<f64>` or `Vec<Vec<f64>>` values, with
//! matrices as a list of rows. Gradients are exposed one corner at a time.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use nalgebra::DMatrix;

use crate::cell::Cell;
use crate::error::CellResult;

/// Derivatives of every cell output with respect to one corner sample.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CornerGradient {
    /// Corner the derivatives are taken with respect to.
    pub corner: usize,
    /// `∂normal/∂sdf_corner`.
    pub normal: Vec<f64>,
    /// `∂offset/∂sdf_corner`.
    pub offset: f64,
    /// `∂sample_areas/∂sdf_corner`.
    pub sample_areas: Vec<f64>,
    /// `∂sample_boundary_areas/∂sdf_corner`.
    pub sample_boundary_areas: Vec<f64>,
    /// `∂area/∂sdf_corner`.
    pub area: f64,
    /// `∂boundary_area/∂sdf_corner`.
    pub boundary_area: f64,
    /// `∂energy_matrix/∂sdf_corner`, as rows.
    pub energy_matrix: Vec<Vec<f64>>,
    /// `∂dirichlet_vector/∂sdf_corner`.
    pub dirichlet_vector: Vec<f64>,
}

/// Borrowed view of a [`Cell`] with plain-container accessors.
#[derive(Debug, Clone, Copy)]
pub struct FlatCell<'a, const D: usize> {
    cell: &'a Cell<D>,
}

impl<'a, const D: usize> FlatCell<'a, D> {
    pub(crate) const fn new(cell: &'a Cell<D>) -> Self {
        Self { cell }
    }

    /// The underlying cell.
    #[must_use]
    pub const fn cell(&self) -> &'a Cell<D> {
        self.cell
    }

    /// Unit normal.
    #[must_use]
    pub fn normal(&self) -> Vec<f64> {
        self.cell.normal().as_slice().to_vec()
    }

    /// Plane offset.
    #[must_use]
    pub const fn offset(&self) -> f64 {
        self.cell.offset()
    }

    /// Occupied volume of every sub-cell.
    #[must_use]
    pub fn sample_areas(&self) -> Vec<f64> {
        self.cell.sample_areas().to_vec()
    }

    /// Boundary measure inside every sub-cell.
    #[must_use]
    pub fn sample_boundary_areas(&self) -> Vec<f64> {
        self.cell.sample_boundary_areas().to_vec()
    }

    /// Occupied fraction.
    #[must_use]
    pub const fn area(&self) -> f64 {
        self.cell.area()
    }

    /// Boundary measure inside the cell.
    #[must_use]
    pub const fn boundary_area(&self) -> f64 {
        self.cell.boundary_area()
    }

    /// Energy matrix as rows.
    #[must_use]
    pub fn energy_matrix(&self) -> Vec<Vec<f64>> {
        rows(self.cell.energy_matrix())
    }

    /// Dirichlet vector.
    #[must_use]
    pub fn dirichlet_vector(&self) -> Vec<f64> {
        self.cell.dirichlet_vector().as_slice().to_vec()
    }

    /// `∂normal/∂sdf_corner`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CellError::CornerOutOfRange`] for an invalid corner.
    pub fn normal_gradient(&self, corner: usize) -> CellResult<Vec<f64>> {
        self.cell.check_corner(corner)?;
        Ok(self.cell.normal_gradients().column(corner).iter().copied().collect())
    }

    /// `∂offset/∂sdf_corner`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CellError::CornerOutOfRange`] for an invalid corner.
    pub fn offset_gradient(&self, corner: usize) -> CellResult<f64> {
        self.cell.check_corner(corner)?;
        Ok(self.cell.offset_gradients()[corner])
    }

    /// `∂sample_areas/∂sdf_corner`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CellError::CornerOutOfRange`] for an invalid corner.
    pub fn sample_areas_gradient(&self, corner: usize) -> CellResult<Vec<f64>> {
        self.cell.check_corner(corner)?;
        Ok(column(self.cell.sample_areas_gradients(), corner))
    }

    /// `∂sample_boundary_areas/∂sdf_corner`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CellError::CornerOutOfRange`] for an invalid corner.
    pub fn sample_boundary_areas_gradient(&self, corner: usize) -> CellResult<Vec<f64>> {
        self.cell.check_corner(corner)?;
        Ok(column(self.cell.sample_boundary_areas_gradients(), corner))
    }

    /// `∂area/∂sdf_corner`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CellError::CornerOutOfRange`] for an invalid corner.
    pub fn area_gradient(&self, corner: usize) -> CellResult<f64> {
        self.cell.check_corner(corner)?;
        Ok(self.cell.area_gradients()[corner])
    }

    /// `∂boundary_area/∂sdf_corner`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CellError::CornerOutOfRange`] for an invalid corner.
    pub fn boundary_area_gradient(&self, corner: usize) -> CellResult<f64> {
        self.cell.check_corner(corner)?;
        Ok(self.cell.boundary_area_gradients()[corner])
    }

    /// `∂energy_matrix/∂sdf_corner` as rows.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CellError::CornerOutOfRange`] for an invalid corner.
    pub fn energy_matrix_gradient(&self, corner: usize) -> CellResult<Vec<Vec<f64>>> {
        self.cell.check_corner(corner)?;
        Ok(rows(&self.cell.energy_matrix_gradients()[corner]))
    }

    /// `∂dirichlet_vector/∂sdf_corner`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CellError::CornerOutOfRange`] for an invalid corner.
    pub fn dirichlet_vector_gradient(&self, corner: usize) -> CellResult<Vec<f64>> {
        self.cell.check_corner(corner)?;
        Ok(column(self.cell.dirichlet_vector_gradients(), corner))
    }

    /// All derivatives with respect to one corner sample.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CellError::CornerOutOfRange`] for an invalid corner.
    pub fn gradient(&self, corner: usize) -> CellResult<CornerGradient> {
        Ok(CornerGradient {
            corner,
            normal: self.normal_gradient(corner)?,
            offset: self.offset_gradient(corner)?,
            sample_areas: self.sample_areas_gradient(corner)?,
            sample_boundary_areas: self.sample_boundary_areas_gradient(corner)?,
            area: self.area_gradient(corner)?,
            boundary_area: self.boundary_area_gradient(corner)?,
            energy_matrix: self.energy_matrix_gradient(corner)?,
            dirichlet_vector: self.dirichlet_vector_gradient(corner)?,
        })
    }
}

fn rows(matrix: &DMatrix<f64>) -> Vec<Vec<f64>> {
    matrix
        .row_iter()
        .map(|row| row.iter().copied().collect())
        .collect()
}

fn column(matrix: &DMatrix<f64>, index: usize) -> Vec<f64> {
    matrix.column(index).iter().copied().collect()
}

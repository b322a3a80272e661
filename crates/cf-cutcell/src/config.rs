//! Configuration for cut-cell construction.
//!
//! A [`CellConfig`] holds everything a cell needs besides its corner samples:
//! the elastic material, the classification threshold and the number of
//! sub-cells per axis used for integration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{CellError, CellResult};
use crate::material::ElasticMaterial;

/// Parameters shared by every cell built from the same configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellConfig {
    /// Elastic material of the occupied region.
    pub material: ElasticMaterial,
    /// Classification tolerance on the occupied fraction.
    ///
    /// A cell is solid when `area <= threshold` and fluid when
    /// `area >= 1 - threshold`.
    pub threshold: f64,
    /// Number of sub-cells along each axis.
    pub edge_sample_num: usize,
}

impl Default for CellConfig {
    fn default() -> Self {
        Self {
            material: ElasticMaterial::default(),
            threshold: 1e-3,
            edge_sample_num: 4,
        }
    }
}

impl CellConfig {
    /// Create a configuration from raw parameters.
    #[must_use]
    pub const fn new(
        youngs_modulus: f64,
        poissons_ratio: f64,
        threshold: f64,
        edge_sample_num: usize,
    ) -> Self {
        Self {
            material: ElasticMaterial::new(youngs_modulus, poissons_ratio),
            threshold,
            edge_sample_num,
        }
    }

    /// Configuration with two sub-cells per axis, for fast previews.
    #[must_use]
    pub fn coarse() -> Self {
        Self {
            edge_sample_num: 2,
            ..Default::default()
        }
    }

    /// Configuration with eight sub-cells per axis.
    #[must_use]
    pub fn fine() -> Self {
        Self {
            edge_sample_num: 8,
            ..Default::default()
        }
    }

    /// Set the material.
    #[must_use]
    pub const fn with_material(mut self, material: ElasticMaterial) -> Self {
        self.material = material;
        self
    }

    /// Set the classification threshold.
    #[must_use]
    pub const fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the number of sub-cells per axis.
    #[must_use]
    pub const fn with_edge_sample_num(mut self, edge_sample_num: usize) -> Self {
        self.edge_sample_num = edge_sample_num;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the material is invalid, the threshold is not in
    /// `[0, 0.5)`, or `edge_sample_num` is zero.
    pub fn validate(&self) -> CellResult<()> {
        self.material.validate()?;

        if !(self.threshold >= 0.0 && self.threshold < 0.5) {
            return Err(CellError::InvalidThreshold(self.threshold));
        }

        if self.edge_sample_num == 0 {
            return Err(CellError::InvalidSampleCount(self.edge_sample_num));
        }

        Ok(())
    }
}

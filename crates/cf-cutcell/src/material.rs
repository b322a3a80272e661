//! Linear elastic material parameters.
//!
//! The occupied part of a cut cell is modelled as an isotropic linear elastic
//! continuum. Users specify the engineering constants and the kernel works
//! with the Lamé parameters derived from them:
//!
//! - **Young's modulus (E)**: stiffness under uniaxial stretch
//! - **Poisson's ratio (ν)**: lateral contraction, `-1 < ν < 0.5`
//! - **λ** = E·ν / ((1 + ν)(1 − 2ν))
//! - **μ** = E / (2(1 + ν))
//!
//! The energy density of a small strain ε is `μ ε:ε + λ/2 (tr ε)²`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{CellError, CellResult};

/// Isotropic linear elastic material.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ElasticMaterial {
    /// Young's modulus. Must be finite and non-negative.
    pub youngs_modulus: f64,

    /// Poisson's ratio (dimensionless, strictly between -1 and 0.5).
    pub poissons_ratio: f64,
}

impl Default for ElasticMaterial {
    fn default() -> Self {
        Self::new(1.0, 0.3)
    }
}

impl ElasticMaterial {
    /// Create a material from Young's modulus and Poisson's ratio.
    ///
    /// Values are stored as given; call [`validate`](Self::validate) before
    /// deriving Lamé parameters from untrusted input.
    #[must_use]
    pub const fn new(youngs_modulus: f64, poissons_ratio: f64) -> Self {
        Self {
            youngs_modulus,
            poissons_ratio,
        }
    }

    /// Compute the shear modulus G = E / (2(1 + ν)).
    #[must_use]
    pub fn shear_modulus(&self) -> f64 {
        self.youngs_modulus / (2.0 * (1.0 + self.poissons_ratio))
    }

    /// Compute the first Lamé parameter λ.
    #[must_use]
    pub fn lame_lambda(&self) -> f64 {
        let nu = self.poissons_ratio;
        self.youngs_modulus * nu / ((1.0 + nu) * 2.0f64.mul_add(-nu, 1.0))
    }

    /// Compute the second Lamé parameter μ (same as shear modulus).
    #[must_use]
    pub fn lame_mu(&self) -> f64 {
        self.shear_modulus()
    }

    /// Validate that the material parameters are physically valid.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Young's modulus is negative or not finite
    /// - Poisson's ratio is outside (-1, 0.5)
    pub fn validate(&self) -> CellResult<()> {
        if !self.youngs_modulus.is_finite() || self.youngs_modulus < 0.0 {
            return Err(CellError::invalid_material(format!(
                "Young's modulus must be finite and non-negative, got {}",
                self.youngs_modulus
            )));
        }

        if !(self.poissons_ratio > -1.0 && self.poissons_ratio < 0.5) {
            return Err(CellError::invalid_material(format!(
                "Poisson's ratio must be in range (-1, 0.5), got {}",
                self.poissons_ratio
            )));
        }

        Ok(())
    }
}

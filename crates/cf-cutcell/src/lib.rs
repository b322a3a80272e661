//! Differentiable cut-cell kernel for embedded-boundary simulation.
//!
//! A cut cell is one axis-aligned grid cell crossed by the zero level set of
//! a signed-distance field. From the signed distances at its corners this
//! crate computes a linear approximation of the boundary, the occupied volume
//! and boundary measure of the cell, a linear-elastic energy matrix and a
//! boundary-integral ("Dirichlet") vector, together with the exact derivative
//! of every output with respect to every corner value.
//!
//! # Features
//!
//! - **Boundary fit**: least-squares plane through the corner samples with a
//!   deterministic fallback when the samples do not determine one
//! - **Geometry**: exact box/half-space clipping of `edge_sample_num^D`
//!   sub-cells, with per-sub-cell volume and boundary measure
//! - **Energy**: one-point quadrature of small-strain linear elasticity over
//!   the occupied region
//! - **Dirichlet vector**: shape functions integrated over the boundary
//! - **Gradients**: closed-form derivatives of all of the above
//! - **Bindings**: [`FlatCell`] exposes everything as plain `Vec`s
//!
//! Cells are generic over the dimension `D` (2 or 3). Corners are numbered
//! with the first axis toggling fastest, so corner `k` sits at
//! `x_a = (k >> a) & 1` in the unit cell `[0, 1]^D`.
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It can be used in:
//! - Simulation back ends
//! - Shape optimization loops
//! - Python or C++ bindings
//!
//! # Example
//!
//! ```
//! use cf_cutcell::{Cell2, CellConfig, CellKind};
//!
//! // Boundary along x = 0.5, occupied on the right.
//! let cell = Cell2::new(&CellConfig::default(), &[-1.0, 1.0, -1.0, 1.0])?;
//!
//! assert_eq!(cell.kind(), CellKind::Mixed);
//! assert!((cell.normal()[0] - 1.0).abs() < 1e-12);
//! assert!((cell.area() - 0.5).abs() < 1e-12);
//! assert!((cell.boundary_area() - 1.0).abs() < 1e-12);
//!
//! // Derivative of the occupied area with respect to corner 0.
//! let d_area = cell.flat().area_gradient(0)?;
//! assert!(d_area > 0.0);
//! # Ok::<(), cf_cutcell::CellError>(())
//! ```
//!
//! # Building many cells
//!
//! The fit operator, sub-cell boxes, quadrature points and shape values
//! depend only on the [`CellConfig`]. A [`CellTemplate`] prepares them once:
//!
//! ```
//! use cf_cutcell::{CellConfig, CellTemplate};
//!
//! let template = CellTemplate::<3>::new(&CellConfig::coarse())?;
//! let inside = template.build(&[1.0; 8])?;
//! let outside = template.build(&[-1.0; 8])?;
//! assert!(inside.is_fluid_cell());
//! assert!(outside.is_solid_cell());
//! # Ok::<(), cf_cutcell::CellError>(())
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod clip;
pub mod lattice;

mod cell;
mod config;
mod dirichlet;
mod energy;
mod error;
mod fit;
mod flat;
mod material;
mod sample;
mod template;

pub use cell::{Cell, Cell2, Cell3, CellKind};
pub use config::CellConfig;
pub use dirichlet::DirichletAssembly;
pub use energy::{EnergyAssembly, elasticity_tensor, stiffness_at, velocity_to_deformation_gradient};
pub use error::{CellError, CellResult};
pub use fit::{BoundaryFit, BoundaryFitter, NormalGradients};
pub use flat::{CornerGradient, FlatCell};
pub use material::ElasticMaterial;
pub use sample::{SampleGeometry, SubcellGeometry, integrate, subcell_geometry};
pub use template::CellTemplate;

// Re-export nalgebra types for convenience
pub use nalgebra::{DMatrix, DVector, SVector};

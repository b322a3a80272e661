//! Property-based tests for cut cells.
//!
//! These tests use proptest to generate random corner samples and verify
//! invariants that hold for every cell.
//!
//! Run with: cargo test -p cf-cutcell -- proptest

use cf_cutcell::{Cell2, Cell3, CellConfig, CellKind};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

/// Corner samples in a bounded range.
fn arb_samples(corners: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-2.0..2.0f64, corners)
}

/// Corner samples multiplied by a power of ten across most of the `f64` range.
fn arb_scaled_samples(corners: usize) -> impl Strategy<Value = (Vec<f64>, f64)> {
    (arb_samples(corners), -250i32..250).prop_map(|(samples, exponent)| {
        let scale = 10f64.powi(exponent);
        (samples.iter().map(|s| s * scale).collect(), scale)
    })
}

/// A valid configuration with a small lattice.
fn arb_config() -> impl Strategy<Value = CellConfig> {
    (0.1..10.0f64, -0.5..0.45f64, 0.0..0.49f64, 1usize..5)
        .prop_map(|(e, nu, threshold, edge)| CellConfig::new(e, nu, threshold, edge))
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn proptest_normal_is_unit(samples in arb_samples(4), config in arb_config()) {
        let cell = Cell2::new(&config, &samples).unwrap();
        prop_assert!((cell.normal().norm() - 1.0).abs() < 1e-12);
        for corner in 0..4 {
            let tangent = cell.normal().dot(&cell.normal_gradients().column(corner));
            prop_assert!(tangent.abs() < 1e-9);
        }
    }

    #[test]
    fn proptest_area_is_sum_of_samples(samples in arb_samples(8), config in arb_config()) {
        let cell = Cell3::new(&config, &samples).unwrap();
        let sum: f64 = cell.sample_areas().iter().sum();
        let volume = 1.0 / cell.sample_count() as f64;

        prop_assert!((0.0..=1.0).contains(&cell.area()));
        prop_assert!((cell.area() - sum).abs() < 1e-12);
        for area in cell.sample_areas() {
            prop_assert!(*area >= 0.0 && *area <= volume * (1.0 + 1e-12));
        }
        for boundary in cell.sample_boundary_areas() {
            prop_assert!(*boundary >= 0.0);
        }

        let gradient_sum = cell.sample_areas_gradients().row_sum();
        for corner in 0..8 {
            prop_assert!((gradient_sum[corner] - cell.area_gradients()[corner]).abs() < 1e-10);
        }
    }

    #[test]
    fn proptest_geometry_holds_at_any_magnitude((scaled, scale) in arb_scaled_samples(8)) {
        let config = CellConfig::coarse();
        let cell = Cell3::new(&config, &scaled).unwrap();
        prop_assert!((cell.normal().norm() - 1.0).abs() < 1e-12);
        prop_assert!((0.0..=1.0).contains(&cell.area()));
        let sum: f64 = cell.sample_areas().iter().sum();
        prop_assert!((cell.area() - sum).abs() < 1e-12);
        for area in cell.sample_areas() {
            prop_assert!(*area >= 0.0 && *area <= (1.0 / cell.sample_count() as f64) + 1e-12);
        }

        // The plane depends only on the shape of the samples, not their size.
        let unscaled: Vec<f64> = scaled.iter().map(|s| s / scale).collect();
        let base = Cell3::new(&config, &unscaled).unwrap();
        prop_assert_eq!(cell.is_degenerate(), base.is_degenerate());
        prop_assert!((cell.normal() - base.normal()).norm() < 1e-9);
        prop_assert!((cell.offset() - base.offset()).abs() < 1e-9);
        prop_assert!((cell.area() - base.area()).abs() < 1e-9);
        prop_assert!((cell.boundary_area() - base.boundary_area()).abs() < 1e-9);
    }

    #[test]
    fn proptest_classification_is_exclusive(samples in arb_samples(4), config in arb_config()) {
        let cell = Cell2::new(&config, &samples).unwrap();
        let flags = [cell.is_solid_cell(), cell.is_fluid_cell(), cell.is_mixed_cell()];
        prop_assert_eq!(flags.iter().filter(|f| **f).count(), 1);

        let expected = match flags {
            [true, _, _] => CellKind::Solid,
            [_, true, _] => CellKind::Fluid,
            _ => CellKind::Mixed,
        };
        prop_assert_eq!(cell.kind(), expected);
    }

    #[test]
    fn proptest_energy_matrix_is_symmetric_psd(
        samples in arb_samples(4),
        velocities in prop::collection::vec(-1.0..1.0f64, 8),
    ) {
        let cell = Cell2::new(&CellConfig::default(), &samples).unwrap();
        let matrix = cell.energy_matrix();
        for i in 0..8 {
            for j in 0..8 {
                prop_assert!((matrix[(i, j)] - matrix[(j, i)]).abs() < 1e-12);
            }
        }
        prop_assert!(cell.energy(&velocities).unwrap() >= -1e-12);
    }

    #[test]
    fn proptest_dirichlet_sums_to_boundary(samples in arb_samples(8)) {
        let cell = Cell3::new(&CellConfig::coarse(), &samples).unwrap();
        prop_assert!((cell.dirichlet_vector().sum() - cell.boundary_area()).abs() < 1e-12);
        for corner in 0..8 {
            let column_sum = cell.dirichlet_vector_gradients().column(corner).sum();
            prop_assert!((column_sum - cell.boundary_area_gradients()[corner]).abs() < 1e-10);
        }
    }

    #[test]
    fn proptest_uniform_samples_are_degenerate(value in -5.0..5.0f64) {
        let cell = Cell2::new(&CellConfig::default(), &[value; 4]).unwrap();
        prop_assert!(cell.is_degenerate());
        prop_assert!(cell.boundary_area().abs() < 1e-12);
        if value >= 0.0 {
            prop_assert!((cell.area() - 1.0).abs() < 1e-12);
        } else {
            prop_assert!(cell.area().abs() < 1e-12);
        }
    }
}

//! Exact clipping of axis-aligned boxes by a half-space.
//!
//! All routines work in any dimension by recursing on box faces. For a box
//! `B` and the half-space `H = {x : n·x + o ≥ 0}`:
//!
//! - [`clip`] returns the volume and first moment of `B ∩ H`.
//! - [`cut`] returns the `(d-1)`-measure and first moment of `B ∩ ∂H`.
//! - [`cut_sensitivity`] returns the derivative of the [`cut`] measure with
//!   respect to `n` and `o`.
//!
//! # Volume
//!
//! With `p` the point of the plane closest to the box center, the divergence
//! theorem applied to `x - p` gives
//!
//! ```text
//! d · |B ∩ H| = Σ_faces ((x_F - p)·ν_F) |F ∩ H|
//! ```
//!
//! The cap term vanishes because `x - p` is tangent to the plane, so a plane
//! lying on a face is never counted twice. Face measures are the same problem
//! one dimension down. First moments follow from the field `(x - p) x_j`.
//!
//! # Cut
//!
//! The cut is projected along the dominant normal axis `k`. Its shadow is the
//! slab `lo_k ≤ x_k(y) < hi_k` inside the face box, which is a difference of
//! two clipped volumes one dimension down. The half-open slab means a plane on
//! a face shared by two boxes belongs to the box above it.

// Dimensions are tiny (at most 3), so the usize -> f64 casts are exact.
#![allow(clippy::cast_precision_loss)]

use nalgebra::DVector;

/// Squared normal length below which a plane is treated as constant.
const MIN_NORMAL_NORM_SQUARED: f64 = 1e-24;

/// Faces whose normal is this close to the plane normal are skipped when
/// differentiating the cut measure.
const MIN_FACE_SINE: f64 = 1e-9;

/// An axis-aligned box given by its lower and upper corners.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    lo: DVector<f64>,
    hi: DVector<f64>,
}

impl Bounds {
    /// Create a box from its corners.
    ///
    /// Both corners must have the same length and `lo ≤ hi` on every axis.
    #[must_use]
    pub fn new(lo: DVector<f64>, hi: DVector<f64>) -> Self {
        debug_assert_eq!(lo.len(), hi.len());
        Self { lo, hi }
    }

    /// Create a box from corner slices.
    #[must_use]
    pub fn from_slices(lo: &[f64], hi: &[f64]) -> Self {
        Self::new(DVector::from_column_slice(lo), DVector::from_column_slice(hi))
    }

    /// The unit box `[0, 1]^dim`.
    #[must_use]
    pub fn unit(dim: usize) -> Self {
        Self::new(DVector::zeros(dim), DVector::repeat(dim, 1.0))
    }

    /// Number of axes.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.lo.len()
    }

    /// Lower corner.
    #[must_use]
    pub const fn lo(&self) -> &DVector<f64> {
        &self.lo
    }

    /// Upper corner.
    #[must_use]
    pub const fn hi(&self) -> &DVector<f64> {
        &self.hi
    }

    /// Center of the box.
    #[must_use]
    pub fn center(&self) -> DVector<f64> {
        (&self.lo + &self.hi) * 0.5
    }

    /// Volume of the box. A zero-dimensional box has unit measure.
    #[must_use]
    pub fn volume(&self) -> f64 {
        (&self.hi - &self.lo).iter().product()
    }

    /// The box with `axis` removed.
    fn face(&self, axis: usize) -> Self {
        Self {
            lo: self.lo.clone().remove_row(axis),
            hi: self.hi.clone().remove_row(axis),
        }
    }
}

/// The half-space `normal·x + offset ≥ 0`.
///
/// The normal does not need unit length.
#[derive(Debug, Clone, PartialEq)]
pub struct HalfSpace {
    normal: DVector<f64>,
    offset: f64,
}

impl HalfSpace {
    /// Create a half-space from its normal and offset.
    #[must_use]
    pub const fn new(normal: DVector<f64>, offset: f64) -> Self {
        Self { normal, offset }
    }

    /// Create a half-space from a normal slice.
    #[must_use]
    pub fn from_slice(normal: &[f64], offset: f64) -> Self {
        Self::new(DVector::from_column_slice(normal), offset)
    }

    /// Plane normal.
    #[must_use]
    pub const fn normal(&self) -> &DVector<f64> {
        &self.normal
    }

    /// Plane offset.
    #[must_use]
    pub const fn offset(&self) -> f64 {
        self.offset
    }

    /// Evaluate `normal·x + offset`.
    #[must_use]
    pub fn evaluate(&self, point: &DVector<f64>) -> f64 {
        self.normal.dot(point) + self.offset
    }

    /// Euclidean length of the normal.
    #[must_use]
    pub fn norm(&self) -> f64 {
        self.normal.norm()
    }

    /// Minimum and maximum of `normal·x + offset` over a box.
    fn range_over(&self, bounds: &Bounds) -> (f64, f64) {
        let mut lowest = self.offset;
        let mut highest = self.offset;
        for ((n, lo), hi) in self.normal.iter().zip(bounds.lo.iter()).zip(bounds.hi.iter()) {
            let (a, b) = (n * lo, n * hi);
            lowest += a.min(b);
            highest += a.max(b);
        }
        (lowest, highest)
    }

    /// The half-space restricted to the hyperplane `x_axis = value`.
    fn restrict(&self, axis: usize, value: f64) -> Self {
        Self {
            normal: self.normal.clone().remove_row(axis),
            offset: self.normal[axis].mul_add(value, self.offset),
        }
    }

    /// Axis with the largest normal component, if the normal is not zero.
    fn dominant_axis(&self) -> Option<usize> {
        if self.normal.is_empty() {
            return None;
        }
        let axis = self.normal.iamax();
        let along = self.normal[axis];
        (along * along > MIN_NORMAL_NORM_SQUARED).then_some(axis)
    }
}

/// Measure and first moment of a set.
#[derive(Debug, Clone, PartialEq)]
pub struct Measure {
    /// Volume, area or length of the set, depending on its dimension.
    pub measure: f64,
    /// Integral of the position over the set.
    pub moment: DVector<f64>,
}

impl Measure {
    fn empty(dim: usize) -> Self {
        Self {
            measure: 0.0,
            moment: DVector::zeros(dim),
        }
    }

    fn full(bounds: &Bounds) -> Self {
        let measure = bounds.volume();
        Self {
            measure,
            moment: bounds.center() * measure,
        }
    }

    /// Centroid of the set, or `None` if it has zero measure.
    #[must_use]
    pub fn centroid(&self) -> Option<DVector<f64>> {
        (self.measure > 0.0).then(|| &self.moment / self.measure)
    }
}

/// Volume and first moment of the part of `bounds` inside `plane`.
#[must_use]
pub fn clip(bounds: &Bounds, plane: &HalfSpace) -> Measure {
    let dim = bounds.dim();
    let (lowest, highest) = plane.range_over(bounds);
    if lowest >= 0.0 {
        return Measure::full(bounds);
    }
    if highest < 0.0 {
        return Measure::empty(dim);
    }

    let norm_squared = plane.normal.norm_squared();
    if norm_squared <= MIN_NORMAL_NORM_SQUARED {
        return if plane.offset >= 0.0 {
            Measure::full(bounds)
        } else {
            Measure::empty(dim)
        };
    }

    let center = bounds.center();
    let shift = plane.evaluate(&center) / norm_squared;
    let anchor = center - &plane.normal * shift;

    let mut volume = 0.0;
    let mut moment = DVector::zeros(dim);
    for axis in 0..dim {
        for (value, outward) in [(bounds.lo[axis], -1.0), (bounds.hi[axis], 1.0)] {
            let lever = outward * (value - anchor[axis]);
            let piece = clip(&bounds.face(axis), &plane.restrict(axis, value));
            volume += lever * piece.measure;
            let lifted = piece.moment.insert_row(axis, value * piece.measure);
            moment.axpy(lever, &lifted, 1.0);
        }
    }

    let volume = (volume / dim as f64).clamp(0.0, bounds.volume());
    let scale = 1.0 / (dim + 1) as f64;
    moment.axpy(volume, &anchor, 1.0);
    moment *= scale;

    Measure {
        measure: volume,
        moment,
    }
}

/// Measure and first moment of the plane `∂plane` inside `bounds`.
#[must_use]
pub fn cut(bounds: &Bounds, plane: &HalfSpace) -> Measure {
    let dim = bounds.dim();
    let (lowest, highest) = plane.range_over(bounds);
    if dim == 0 || lowest > 0.0 || highest < 0.0 {
        return Measure::empty(dim);
    }
    let Some(axis) = plane.dominant_axis() else {
        return Measure::empty(dim);
    };

    // On the plane, x_axis = slope·y + intercept over the remaining axes y.
    let along = plane.normal[axis];
    let slope = plane.normal.clone().remove_row(axis) / -along;
    let intercept = -plane.offset / along;

    let face = bounds.face(axis);
    let above_lo = clip(
        &face,
        &HalfSpace::new(slope.clone(), intercept - bounds.lo[axis]),
    );
    let above_hi = clip(
        &face,
        &HalfSpace::new(slope.clone(), intercept - bounds.hi[axis]),
    );

    let projected = above_lo.measure - above_hi.measure;
    if projected <= 0.0 {
        return Measure::empty(dim);
    }
    let projected_moment = above_lo.moment - above_hi.moment;
    let height = intercept.mul_add(projected, slope.dot(&projected_moment));

    let stretch = plane.norm() / along.abs();
    Measure {
        measure: stretch * projected,
        moment: projected_moment.insert_row(axis, height) * stretch,
    }
}

/// Derivative of the [`cut`] measure with respect to the plane parameters.
///
/// Returns `(∂measure/∂normal, ∂measure/∂offset)`. Moving the plane slides
/// the rim of the cut along each box face it crosses; a face whose outward
/// normal makes cosine `c` with the plane normal contributes
/// `c / sqrt(1 - c²)` times the integral of the plane's normal velocity over
/// that rim.
#[must_use]
pub fn cut_sensitivity(bounds: &Bounds, plane: &HalfSpace) -> (DVector<f64>, f64) {
    let dim = bounds.dim();
    let mut wrt_normal = DVector::zeros(dim);
    let mut wrt_offset = 0.0;

    let norm_squared = plane.normal.norm_squared();
    if dim < 2 || norm_squared <= MIN_NORMAL_NORM_SQUARED {
        return (wrt_normal, wrt_offset);
    }
    let norm = norm_squared.sqrt();

    for axis in 0..dim {
        let cosine = plane.normal[axis] / norm;
        let sine = cosine.mul_add(-cosine, 1.0).max(0.0).sqrt();
        if sine <= MIN_FACE_SINE {
            continue;
        }
        for (value, outward) in [(bounds.lo[axis], -1.0), (bounds.hi[axis], 1.0)] {
            let rim = cut(&bounds.face(axis), &plane.restrict(axis, value));
            if rim.measure <= 0.0 {
                continue;
            }
            let weight = outward * cosine / (sine * norm);
            wrt_offset += weight * rim.measure;
            let lifted = rim.moment.insert_row(axis, value * rim.measure);
            wrt_normal.axpy(weight, &lifted, 1.0);
        }
    }

    (wrt_normal, wrt_offset)
}

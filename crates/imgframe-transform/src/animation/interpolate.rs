//! Interpolation for animatable values.
//!
//! Matrices are blended coefficient by coefficient. That is exact for the
//! translate/uniform-scale matrices produced by pan and zoom; for rotations
//! the intermediate frames shrink slightly, which is accepted for the short
//! durations used here.

use crate::matrix::AffineMatrix;

/// Types that can be blended between two values.
pub trait Interpolate: Sized {
    /// Blend from `self` towards `to` by factor `k`.
    ///
    /// `k = 0.0` gives `self`, `k = 1.0` gives (up to rounding) `to`.
    fn interpolate(&self, to: &Self, k: f64) -> Self;
}

#[inline]
fn lerp(from: f64, to: f64, k: f64) -> f64 {
    from + (to - from) * k
}

impl Interpolate for f64 {
    fn interpolate(&self, to: &Self, k: f64) -> Self {
        lerp(*self, *to, k)
    }
}

impl Interpolate for AffineMatrix {
    fn interpolate(&self, to: &Self, k: f64) -> Self {
        Self {
            a: lerp(self.a, to.a, k),
            b: lerp(self.b, to.b, k),
            c: lerp(self.c, to.c, k),
            d: lerp(self.d, to.d, k),
            e: lerp(self.e, to.e, k),
            f: lerp(self.f, to.f, k),
        }
    }
}

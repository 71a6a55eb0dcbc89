//! 2D affine matrices and their decomposition.
//!
//! `AffineMatrix` stores the six coefficients of a 2D affine transform in the
//! same order the rendering surface expects them:
//!
//! ```text
//! | a  c  e |
//! | b  d  f |
//! | 0  0  1 |
//! ```
//!
//! so that `x' = a*x + c*y + e` and `y' = b*x + d*y + f`.
//!
//! # Usage
//!
//! ```
//! use imgframe_transform::matrix::{AffineMatrix, decompose};
//!
//! // Zoom 2x around the point (100, 100), then pan right by 20px.
//! let m = AffineMatrix::identity()
//!     .zoom_about(100.0, 100.0, 2.0)
//!     .pre_multiply(&AffineMatrix::translate(20.0, 0.0));
//!
//! let d = decompose(&m);
//! assert_eq!(d.scale, 2.0);
//! assert_eq!(d.translate_x, -80.0);
//! ```

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// A 2D affine transformation matrix.
///
/// No validation is performed on the coefficients: non-finite values are
/// stored and propagated as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineMatrix {
    /// Scale X / rotation cosine term.
    pub a: f64,
    /// Rotation sine term (y component of the transformed x axis).
    pub b: f64,
    /// x component of the transformed y axis.
    pub c: f64,
    /// Scale Y / rotation cosine term.
    pub d: f64,
    /// Translate X.
    pub e: f64,
    /// Translate Y.
    pub f: f64,
}

impl Default for AffineMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineMatrix {
    /// The identity transform `(1, 0, 0, 1, 0, 0)`.
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// Create a matrix from its six coefficients.
    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Create an identity transform (no change).
    pub const fn identity() -> Self {
        Self::IDENTITY
    }

    /// Create a matrix from `[a, b, c, d, e, f]`.
    pub const fn from_coefficients(m: [f64; 6]) -> Self {
        Self::new(m[0], m[1], m[2], m[3], m[4], m[5])
    }

    /// The coefficients as `[a, b, c, d, e, f]`.
    pub const fn coefficients(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    /// Create a translation transform.
    pub const fn translate(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Create a non-uniform scale transform.
    pub const fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Create a uniform scale transform.
    pub const fn scale_uniform(s: f64) -> Self {
        Self::scale(s, s)
    }

    /// Create a rotation transform from radians.
    pub fn rotate(angle_rad: f64) -> Self {
        let (sin, cos) = angle_rad.sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    /// Create a rotation transform from degrees.
    pub fn rotate_deg(angle_deg: f64) -> Self {
        Self::rotate(angle_deg * PI / 180.0)
    }

    /// Compose this transform with another (`self * other`).
    ///
    /// The resulting transform applies `other` first, then `self`.
    pub fn then(&self, other: &Self) -> Self {
        Self {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    /// Pre-multiply: `other * self`, i.e. apply `self` first, then `other`.
    pub fn pre_multiply(&self, other: &Self) -> Self {
        other.then(self)
    }

    /// Scale by `factor` about the point `(px, py)` expressed in the output
    /// space of this matrix. The point stays fixed on screen, which is what a
    /// pinch or wheel zoom expects.
    pub fn zoom_about(&self, px: f64, py: f64, factor: f64) -> Self {
        Self::translate(px, py)
            .then(&Self::scale_uniform(factor))
            .then(&Self::translate(-px, -py))
            .then(self)
    }

    /// Apply this transform to a point.
    pub fn apply_point(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Apply this transform to a vector (ignores translation).
    pub fn apply_vector(&self, x: f64, y: f64) -> (f64, f64) {
        (self.a * x + self.c * y, self.b * x + self.d * y)
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    pub fn is_invertible(&self) -> bool {
        self.determinant().abs() > f64::EPSILON
    }

    /// Compute the inverse transform.
    ///
    /// Returns `None` if the transform is not invertible.
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det.abs() <= f64::EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        Some(Self {
            a: self.d * inv_det,
            b: -self.b * inv_det,
            c: -self.c * inv_det,
            d: self.a * inv_det,
            e: (self.c * self.f - self.d * self.e) * inv_det,
            f: (self.b * self.e - self.a * self.f) * inv_det,
        })
    }

    /// Check if this is approximately an identity transform.
    pub fn is_identity(&self, epsilon: f64) -> bool {
        (self.a - 1.0).abs() < epsilon
            && self.b.abs() < epsilon
            && self.c.abs() < epsilon
            && (self.d - 1.0).abs() < epsilon
            && self.e.abs() < epsilon
            && self.f.abs() < epsilon
    }

    /// Decompose into translation, uniform scale and rotation.
    ///
    /// See [`decompose`].
    pub fn decompose(&self) -> DecomposedTransform {
        decompose(self)
    }
}

impl From<[f64; 6]> for AffineMatrix {
    fn from(m: [f64; 6]) -> Self {
        Self::from_coefficients(m)
    }
}

impl From<AffineMatrix> for [f64; 6] {
    fn from(m: AffineMatrix) -> Self {
        m.coefficients()
    }
}

/// Translation, uniform scale and rotation extracted from an [`AffineMatrix`].
///
/// Only meaningful for matrices without shear or independent x/y scale; for
/// anything else it is an approximation driven by the `(a, b)` column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecomposedTransform {
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale: f64,
    /// Rotation in degrees, in `(-180, 180]`.
    pub rotation_deg: f64,
}

impl Default for DecomposedTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl DecomposedTransform {
    pub const fn identity() -> Self {
        Self {
            translate_x: 0.0,
            translate_y: 0.0,
            scale: 1.0,
            rotation_deg: 0.0,
        }
    }

    /// Rebuild a matrix as translate * rotate * scale.
    pub fn to_matrix(&self) -> AffineMatrix {
        let (sin, cos) = (self.rotation_deg * PI / 180.0).sin_cos();
        AffineMatrix {
            a: cos * self.scale,
            b: sin * self.scale,
            c: -sin * self.scale,
            d: cos * self.scale,
            e: self.translate_x,
            f: self.translate_y,
        }
    }
}

/// Decompose a matrix into translation, uniform scale and rotation.
///
/// Scale is `hypot(a, b)`, replaced by exactly `1.0` when that is zero so a
/// degenerate matrix never reports a zero scale. Rotation is `atan2(b, a)`
/// in degrees; translation is `(e, f)`. `c` and `d` are ignored.
pub fn decompose(m: &AffineMatrix) -> DecomposedTransform {
    let hypot = m.a.hypot(m.b);
    let scale = if hypot == 0.0 { 1.0 } else { hypot };

    DecomposedTransform {
        translate_x: m.e,
        translate_y: m.f,
        scale,
        rotation_deg: m.b.atan2(m.a) * 180.0 / PI,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-10;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_identity() {
        let t = AffineMatrix::identity();
        assert!(t.is_identity(EPSILON));
        assert_eq!(t.coefficients(), [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

        let (x, y) = t.apply_point(100.0, 200.0);
        assert!(approx_eq(x, 100.0));
        assert!(approx_eq(y, 200.0));
    }

    #[test]
    fn test_apply_point_uses_column_layout() {
        let m = AffineMatrix::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        // x' = a*x + c*y + e, y' = b*x + d*y + f
        assert_eq!(m.apply_point(1.0, 1.0), (9.0, 12.0));
        assert_eq!(m.apply_vector(1.0, 1.0), (4.0, 6.0));
    }

    #[test]
    fn test_composition_order() {
        let t = AffineMatrix::translate(10.0, 20.0).then(&AffineMatrix::scale(2.0, 2.0));
        assert_eq!(t.apply_point(0.0, 0.0), (10.0, 20.0));

        let t2 = AffineMatrix::scale(2.0, 2.0).then(&AffineMatrix::translate(10.0, 20.0));
        assert_eq!(t2.apply_point(0.0, 0.0), (20.0, 40.0));

        let t3 = AffineMatrix::translate(10.0, 20.0).pre_multiply(&AffineMatrix::scale(2.0, 2.0));
        assert_eq!(t3, t2);
    }

    #[test]
    fn test_zoom_about_keeps_anchor_fixed() {
        let base = AffineMatrix::translate(30.0, -10.0).then(&AffineMatrix::scale_uniform(1.5));
        let zoomed = base.zoom_about(120.0, 80.0, 3.0);

        // Whatever image point was under the anchor is still under it.
        let inv = base.inverse().unwrap();
        let (ix, iy) = inv.apply_point(120.0, 80.0);
        let (x, y) = zoomed.apply_point(ix, iy);
        assert!((x - 120.0).abs() < 1e-9);
        assert!((y - 80.0).abs() < 1e-9);
        assert!(approx_eq(zoomed.decompose().scale, 4.5));
    }

    #[test]
    fn test_inverse() {
        let t = AffineMatrix::translate(50.0, 100.0)
            .then(&AffineMatrix::scale(2.0, 3.0))
            .then(&AffineMatrix::rotate_deg(45.0));

        let inv = t.inverse().unwrap();
        assert!(t.then(&inv).is_identity(1e-10));
        assert!(AffineMatrix::scale(0.0, 1.0).inverse().is_none());
        assert!(!AffineMatrix::new(0.0, 0.0, 0.0, 0.0, 5.0, 5.0).is_invertible());
    }

    #[test]
    fn test_determinant() {
        assert!(approx_eq(AffineMatrix::identity().determinant(), 1.0));
        assert!(approx_eq(AffineMatrix::scale(2.0, 3.0).determinant(), 6.0));
        assert!(approx_eq(AffineMatrix::rotate_deg(45.0).determinant(), 1.0));
    }

    #[test]
    fn test_decompose_identity() {
        let d = decompose(&AffineMatrix::identity());
        assert_eq!(d.translate_x, 0.0);
        assert_eq!(d.translate_y, 0.0);
        assert_eq!(d.scale, 1.0);
        assert_eq!(d.rotation_deg, 0.0);
    }

    #[test]
    fn test_decompose_zero_scale_guard() {
        let d = decompose(&AffineMatrix::new(0.0, 0.0, 3.0, 4.0, 7.0, 8.0));
        assert_eq!(d.scale, 1.0);
        assert_eq!(d.rotation_deg, 0.0);
        assert_eq!((d.translate_x, d.translate_y), (7.0, 8.0));
    }

    #[test]
    fn test_decompose_scale_rotate_translate() {
        let m = AffineMatrix::translate(12.0, -4.0)
            .then(&AffineMatrix::rotate_deg(30.0))
            .then(&AffineMatrix::scale_uniform(2.5));
        let d = m.decompose();
        assert!(approx_eq(d.translate_x, 12.0));
        assert!(approx_eq(d.translate_y, -4.0));
        assert!(approx_eq(d.scale, 2.5));
        assert!((d.rotation_deg - 30.0).abs() < 1e-9);

        let rebuilt = d.to_matrix();
        for (x, y) in rebuilt.coefficients().iter().zip(m.coefficients()) {
            assert!((x - y).abs() < 1e-9);
        }
    }

    #[test]
    fn test_decompose_ignores_shear() {
        // Only the (a, b) column drives scale and rotation.
        let d = decompose(&AffineMatrix::new(3.0, 4.0, 100.0, -100.0, 0.0, 0.0));
        assert_eq!(d.scale, 5.0);
        assert!(approx_eq(d.rotation_deg, 4.0f64.atan2(3.0).to_degrees()));
    }

    #[test]
    fn test_decompose_accepts_non_finite() {
        let d = decompose(&AffineMatrix::new(f64::NAN, 0.0, 0.0, 1.0, f64::INFINITY, 0.0));
        assert!(d.scale.is_nan());
        assert!(d.translate_x.is_infinite());
    }

    #[test]
    fn test_serde_field_names() {
        let json = serde_json::to_string(&AffineMatrix::translate(5.0, 6.0)).unwrap();
        assert_eq!(json, r#"{"a":1.0,"b":0.0,"c":0.0,"d":1.0,"e":5.0,"f":6.0}"#);
    }
}

//! Style descriptors consumed by the rendering surface.
//!
//! A [`StyleDescriptor`] is a pure function of an [`AffineMatrix`]: a CSS-like
//! `matrix(a, b, c, d, e, f)` transform string plus a transform origin pinned
//! to the top-left corner (`"0 0"`), so the matrix alone decides placement.

use std::fmt;

use crate::matrix::AffineMatrix;

/// Transform origin applied alongside every descriptor.
pub const TRANSFORM_ORIGIN: &str = "0 0";

/// Transform and transform-origin strings for one matrix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StyleDescriptor {
    pub transform: String,
    pub transform_origin: String,
}

impl StyleDescriptor {
    pub fn from_matrix(m: &AffineMatrix) -> Self {
        let [a, b, c, d, e, f] = m.coefficients().map(format_number);
        Self {
            transform: format!("matrix({a}, {b}, {c}, {d}, {e}, {f})"),
            transform_origin: TRANSFORM_ORIGIN.to_string(),
        }
    }
}

impl From<&AffineMatrix> for StyleDescriptor {
    fn from(m: &AffineMatrix) -> Self {
        Self::from_matrix(m)
    }
}

impl fmt::Display for StyleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "transform: {}; transform-origin: {}",
            self.transform, self.transform_origin
        )
    }
}

/// Something that displays the transformed image.
///
/// The store pushes a fresh descriptor after every matrix write. Surfaces
/// may read the store from `apply_style` but must not write to it.
pub trait RenderSurface {
    fn apply_style(&mut self, style: &StyleDescriptor);
}

impl<F: FnMut(&StyleDescriptor)> RenderSurface for F {
    fn apply_style(&mut self, style: &StyleDescriptor) {
        self(style)
    }
}

/// Shortest round-trip decimal, with CSS spellings for non-finite values.
fn format_number(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v == f64::INFINITY {
        "Infinity".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if v == 0.0 {
        // Folds -0 into 0.
        "0".to_string()
    } else {
        v.to_string()
    }
}

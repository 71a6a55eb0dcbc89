//! Easing functions for animation timing.
//!
//! - `EaseInOut`: the piecewise quadratic used for transform animations
//!   (`2t²` for `t < 0.5`, `1 − (−2t + 2)² / 2` otherwise)
//! - `Linear`
//! - `CubicBezier`: custom CSS-style bezier curves
//!
//! # Usage
//!
//! ```
//! use imgframe_transform::animation::easing::EasingFunction;
//!
//! let ease = EasingFunction::EaseInOut;
//! assert_eq!(ease.evaluate(0.25), 0.125);
//!
//! let custom: EasingFunction = "cubic-bezier(0.4, 0, 0.2, 1)".parse().unwrap();
//! assert!(custom.evaluate(0.5) > 0.5);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Easing function for animation timing.
///
/// Maps a linear progress value in `[0, 1]` to a blend factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EasingFunction {
    /// No easing.
    Linear,

    /// Slow start and end, fast middle. Exactly `0` at `t = 0`, `0.5` at
    /// `t = 0.5` and `1` at `t = 1`.
    EaseInOut,

    /// Custom cubic bezier curve through `(x1, y1)` and `(x2, y2)`.
    /// x values must be in [0, 1].
    CubicBezier { x1: f64, y1: f64, x2: f64, y2: f64 },
}

impl Default for EasingFunction {
    fn default() -> Self {
        Self::EaseInOut
    }
}

impl EasingFunction {
    /// Evaluate the easing function at progress `t` (clamped to `[0, 1]`).
    pub fn evaluate(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Self::Linear => t,
            Self::EaseInOut => ease_in_out(t),
            Self::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(*x1, *y1, *x2, *y2, t),
        }
    }

    /// Create a custom cubic bezier easing function.
    ///
    /// # Panics
    /// Panics if x1 or x2 are outside [0, 1].
    pub fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&x1) && (0.0..=1.0).contains(&x2),
            "Bezier x values must be in [0, 1]"
        );
        Self::CubicBezier { x1, y1, x2, y2 }
    }
}

impl fmt::Display for EasingFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => f.write_str("linear"),
            Self::EaseInOut => f.write_str("ease-in-out"),
            Self::CubicBezier { x1, y1, x2, y2 } => {
                write!(f, "cubic-bezier({x1}, {y1}, {x2}, {y2})")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown easing function `{0}` (expected linear, ease-in-out or cubic-bezier(x1, y1, x2, y2))")]
pub struct ParseEasingError(pub String);

impl FromStr for EasingFunction {
    type Err = ParseEasingError;

    /// Accepts `linear`, `ease-in-out` (or `ease_in_out`) and
    /// `cubic-bezier(x1, y1, x2, y2)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().replace('_', "-").as_str() {
            "linear" => return Ok(Self::Linear),
            "ease-in-out" => return Ok(Self::EaseInOut),
            _ => {}
        }

        let err = || ParseEasingError(s.to_string());
        let args = trimmed
            .strip_prefix("cubic-bezier(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(err)?;
        let values = args
            .split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| err())?;
        match values[..] {
            [x1, y1, x2, y2] if (0.0..=1.0).contains(&x1) && (0.0..=1.0).contains(&x2) => {
                Ok(Self::CubicBezier { x1, y1, x2, y2 })
            }
            _ => Err(err()),
        }
    }
}

#[inline]
fn ease_in_out(t: f64) -> f64 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u / 2.0
    }
}

/// Evaluate a cubic bezier curve at time t.
///
/// Newton-Raphson finds the curve parameter whose x matches `progress`, then
/// the y coordinate at that parameter is returned.
fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, progress: f64) -> f64 {
    if progress <= 0.0 {
        return 0.0;
    }
    if progress >= 1.0 {
        return 1.0;
    }

    let t = solve_bezier_x(x1, x2, progress);
    bezier_component(y1, y2, t)
}

fn solve_bezier_x(x1: f64, x2: f64, target_x: f64) -> f64 {
    let mut t = target_x;

    for _ in 0..8 {
        let x = bezier_component(x1, x2, t) - target_x;
        if x.abs() < 1e-9 {
            break;
        }

        let dx = bezier_derivative(x1, x2, t);
        if dx.abs() < 1e-9 {
            break;
        }

        t = (t - x / dx).clamp(0.0, 1.0);
    }

    t
}

/// One coordinate of the curve: 3(1-t)²t·p1 + 3(1-t)t²·p2 + t³
#[inline]
fn bezier_component(p1: f64, p2: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    3.0 * mt * mt * t * p1 + 3.0 * mt * t * t * p2 + t * t * t
}

/// 3(1-t)²·p1 + 6(1-t)t·(p2-p1) + 3t²·(1-p2)
#[inline]
fn bezier_derivative(p1: f64, p2: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    3.0 * mt * mt * p1 + 6.0 * mt * t * (p2 - p1) + 3.0 * t * t * (1.0 - p2)
}

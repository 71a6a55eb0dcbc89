//! Frame-driven animation of the transform matrix.
//!
//! # Architecture
//!
//! ```text
//! Animator
//!   ├── TransformStore    (generation token, matrix writes)
//!   ├── FrameScheduler    (one callback per frame)
//!   ├── EasingFunction    (t -> k)
//!   └── EventQueue        (Started / Frame / Completed / Superseded)
//! ```

pub mod easing;
pub mod engine;
pub mod events;
pub mod frame;
pub mod interpolate;
pub mod types;

pub use easing::{EasingFunction, ParseEasingError};
pub use engine::{Animator, DEFAULT_DURATION_MS};
pub use events::{AnimationEvent, EventQueue, blend_factors};
pub use frame::{FrameCallback, FrameScheduler, IntervalFrameClock, ManualFrameClock};
pub use interpolate::Interpolate;
pub use types::{AnimationId, AnimationOutcome};

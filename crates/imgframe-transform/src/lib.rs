//! Affine transform control for an interactively framed image.
//!
//! - [`store`]: the current matrix, the `is_animating` flag and the derived
//!   style descriptor
//! - [`animation`]: eased, frame-driven tweening between two matrices
//! - [`readiness`]: a future that resolves once an image has loaded
//!
//! Everything here is single-threaded: handles are `Rc`-based and futures are
//! meant for a local executor.
//!
//! ```
//! use futures::executor::LocalPool;
//! use futures::task::LocalSpawnExt;
//! use imgframe_transform::animation::{Animator, ManualFrameClock};
//! use imgframe_transform::{AffineMatrix, TransformStore};
//!
//! let mut pool = LocalPool::new();
//! let clock = ManualFrameClock::new();
//! let store = TransformStore::new();
//! let animator = Animator::new(store.clone(), clock.clone());
//!
//! let target = AffineMatrix::new(2.0, 0.0, 0.0, 2.0, 50.0, 50.0);
//! let done = animator.animate_with_duration(AffineMatrix::identity(), target, 100.0);
//! pool.spawner().spawn_local(async move { done.await; }).unwrap();
//!
//! pool.run_until_stalled();
//! for ts in [0.0, 50.0, 100.0] {
//!     clock.tick(ts);
//!     pool.run_until_stalled();
//! }
//! assert_eq!(store.matrix(), target);
//! assert_eq!(store.style_descriptor().transform, "matrix(2, 0, 0, 2, 50, 50)");
//! ```

pub mod animation;
pub mod matrix;
pub mod readiness;
pub mod store;
pub mod style;

pub use animation::{AnimationOutcome, Animator, EasingFunction, FrameScheduler};
pub use matrix::{AffineMatrix, DecomposedTransform, decompose};
pub use readiness::{ImageElement, ImageResource, ResourceEvent, wait_for_ready};
pub use store::{TransformState, TransformStore};
pub use style::{RenderSurface, StyleDescriptor};

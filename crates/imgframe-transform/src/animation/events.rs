//! Animation lifecycle events.
//!
//! The animator records one event per lifecycle step so hosts (and tests) can
//! see what happened after the fact:
//!
//! ```ignore
//! let done = animator.animate(from, to);
//! pollster::block_on(done);
//!
//! for event in animator.drain_events() {
//!     if let AnimationEvent::Frame { t, k, .. } = event {
//!         println!("t={t:.3} k={k:.3}");
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::types::AnimationId;
use crate::matrix::AffineMatrix;

/// Oldest events are dropped past this many undrained entries.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnimationEvent {
    /// `animate` was called.
    Started {
        animation_id: AnimationId,
        from: AffineMatrix,
        to: AffineMatrix,
        duration_ms: f64,
    },
    /// A frame was committed to the store.
    Frame {
        animation_id: AnimationId,
        /// Time fraction in `[0, 1]`.
        t: f64,
        /// Eased blend factor.
        k: f64,
    },
    /// The target matrix was committed.
    Completed { animation_id: AnimationId },
    /// A newer animation took over; nothing was written for this frame.
    Superseded { animation_id: AnimationId },
}

impl AnimationEvent {
    pub fn animation_id(&self) -> AnimationId {
        match self {
            Self::Started { animation_id, .. }
            | Self::Frame { animation_id, .. }
            | Self::Completed { animation_id }
            | Self::Superseded { animation_id } => *animation_id,
        }
    }

    /// Check if this event ends an animation run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Superseded { .. })
    }
}

/// Bounded FIFO of animation events.
#[derive(Debug)]
pub struct EventQueue {
    events: VecDeque<AnimationEvent>,
    capacity: usize,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, event: AnimationEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn pop(&mut self) -> Option<AnimationEvent> {
        self.events.pop_front()
    }

    /// Remove and return every pending event, oldest first.
    pub fn drain(&mut self) -> Vec<AnimationEvent> {
        self.events.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Events recorded for one animation run.
    pub fn events_for(&self, animation_id: AnimationId) -> Vec<&AnimationEvent> {
        self.events
            .iter()
            .filter(|e| e.animation_id() == animation_id)
            .collect()
    }
}

/// The `k` values of every `Frame` event in `events`, in order.
pub fn blend_factors<'a>(events: impl IntoIterator<Item = &'a AnimationEvent>) -> Vec<f64> {
    events
        .into_iter()
        .filter_map(|e| match e {
            AnimationEvent::Frame { k, .. } => Some(*k),
            _ => None,
        })
        .collect()
}

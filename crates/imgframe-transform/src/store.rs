//! Transform state store.
//!
//! The store owns the current [`AffineMatrix`] and the `is_animating` flag for
//! one editing session. It is a cheap-to-clone handle over shared state so the
//! caller and in-flight animations can all write to it; there is no internal
//! synchronization, it is meant for a single thread running cooperative tasks.
//!
//! Writes are last-writer-wins. Animations additionally go through a
//! generation token: [`TransformStore::begin_animation`] hands out a fresh
//! [`AnimationId`] and only that id may commit frames, so starting a new
//! animation silently retires the previous one.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::animation::types::AnimationId;
use crate::matrix::{AffineMatrix, DecomposedTransform, decompose};
use crate::style::{RenderSurface, StyleDescriptor};

/// Snapshot of the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformState {
    pub matrix: AffineMatrix,
    pub is_animating: bool,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            matrix: AffineMatrix::identity(),
            is_animating: false,
        }
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    state: TransformState,
    /// Invalidated on every matrix write, rebuilt on the next read.
    style: Option<StyleDescriptor>,
    /// Last generation handed out.
    generation: u64,
    active: Option<AnimationId>,
}

/// Shared handle to the transform state of one editing session.
#[derive(Clone, Default)]
pub struct TransformStore {
    inner: Rc<RefCell<StoreInner>>,
    surfaces: Rc<RefCell<Vec<Box<dyn RenderSurface>>>>,
}

impl fmt::Debug for TransformStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformStore")
            .field("inner", &self.inner.borrow())
            .field("surfaces", &self.surfaces.borrow().len())
            .finish()
    }
}

impl TransformStore {
    /// Create a store holding the identity matrix, not animating.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_matrix(matrix: AffineMatrix) -> Self {
        let store = Self::new();
        store.inner.borrow_mut().state.matrix = matrix;
        store
    }

    /// Current matrix, whoever wrote it last.
    pub fn matrix(&self) -> AffineMatrix {
        self.inner.borrow().state.matrix
    }

    pub fn is_animating(&self) -> bool {
        self.inner.borrow().state.is_animating
    }

    pub fn state(&self) -> TransformState {
        self.inner.borrow().state
    }

    /// Replace the current matrix and push the new style to attached surfaces.
    ///
    /// This does not stop a running animation; its next frame will overwrite
    /// the value written here.
    pub fn set_matrix(&self, matrix: AffineMatrix) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.state.matrix = matrix;
            inner.style = None;
        }
        self.notify_surfaces();
    }

    /// Decompose an arbitrary matrix. Pure; does not touch the store.
    pub fn decompose(&self, matrix: &AffineMatrix) -> DecomposedTransform {
        decompose(matrix)
    }

    /// Decomposition of the current matrix.
    pub fn decomposed(&self) -> DecomposedTransform {
        decompose(&self.matrix())
    }

    /// Style descriptor for the current matrix.
    pub fn style_descriptor(&self) -> StyleDescriptor {
        let mut inner = self.inner.borrow_mut();
        let matrix = inner.state.matrix;
        inner
            .style
            .get_or_insert_with(|| StyleDescriptor::from_matrix(&matrix))
            .clone()
    }

    /// Register a surface. It immediately receives the current style, then
    /// one style per subsequent write.
    pub fn attach_surface(&self, mut surface: Box<dyn RenderSurface>) {
        surface.apply_style(&self.style_descriptor());
        self.surfaces.borrow_mut().push(surface);
    }

    /// Start a new animation generation and raise `is_animating`.
    ///
    /// Any previously active generation loses the right to commit.
    pub fn begin_animation(&self) -> AnimationId {
        let mut inner = self.inner.borrow_mut();
        inner.generation += 1;
        let id = AnimationId(inner.generation);
        if let Some(previous) = inner.active.replace(id) {
            log::debug!("animation {previous} superseded by {id}");
        }
        inner.state.is_animating = true;
        id
    }

    /// Write a frame on behalf of animation `id`.
    ///
    /// Returns `false` without writing when `id` is no longer the active
    /// generation.
    pub fn commit_frame(&self, id: AnimationId, matrix: AffineMatrix) -> bool {
        if self.inner.borrow().active != Some(id) {
            return false;
        }
        self.set_matrix(matrix);
        true
    }

    /// End animation `id`, lowering `is_animating` if it is still the active
    /// generation. Returns whether it was.
    pub fn finish_animation(&self, id: AnimationId) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.active != Some(id) {
            return false;
        }
        inner.active = None;
        inner.state.is_animating = false;
        true
    }

    pub fn active_animation(&self) -> Option<AnimationId> {
        self.inner.borrow().active
    }

    fn notify_surfaces(&self) {
        if self.surfaces.borrow().is_empty() {
            return;
        }
        let style = self.style_descriptor();
        for surface in self.surfaces.borrow_mut().iter_mut() {
            surface.apply_style(&style);
        }
    }
}

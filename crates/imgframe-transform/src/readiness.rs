//! Resource readiness gate.
//!
//! [`wait_for_ready`] turns the load/error listener dance of an image
//! resource into a single future, so transform code can wait for natural
//! dimensions without caring how the image is being fetched or decoded.
//!
//! Load failure and load success both simply resolve the future: the caller
//! is unblocked either way and a failure is only logged.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::rc::{Rc, Weak};

use futures::channel::oneshot;
use futures::future::{self, FutureExt, LocalBoxFuture};

/// Events an image resource can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceEvent {
    Load,
    Error,
}

impl fmt::Display for ResourceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Load => "load",
            Self::Error => "error",
        })
    }
}

/// Handle returned when registering a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub u64);

/// One-shot listener.
pub type Listener = Box<dyn FnOnce()>;

/// An image whose pixels may still be loading.
///
/// Methods take `&self`; implementations use interior mutability, and must
/// tolerate listeners adding or removing listeners while an event is being
/// dispatched.
pub trait ImageResource {
    /// Loading has finished, successfully or not.
    fn is_complete(&self) -> bool;

    fn natural_width(&self) -> u32;

    fn natural_height(&self) -> u32;

    /// Register a listener that runs at most once, the next time `event`
    /// fires.
    fn add_event_listener(&self, event: ResourceEvent, listener: Listener) -> ListenerId;

    /// Unregister a listener. Unknown ids are ignored.
    fn remove_event_listener(&self, event: ResourceEvent, id: ListenerId);

    /// Loaded with a usable, non-empty size.
    fn is_ready(&self) -> bool {
        self.is_complete() && self.natural_width() > 0 && self.natural_height() > 0
    }
}

/// A signal that can be fired any number of times but resolves its receiver
/// only once.
pub struct OnceSignal {
    fired: Cell<bool>,
    sender: RefCell<Option<oneshot::Sender<()>>>,
}

impl OnceSignal {
    pub fn new() -> (Rc<Self>, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        let signal = Rc::new(Self {
            fired: Cell::new(false),
            sender: RefCell::new(Some(tx)),
        });
        (signal, rx)
    }

    /// Fire the signal. Returns `true` only for the first call.
    pub fn fire(&self) -> bool {
        if self.fired.replace(true) {
            return false;
        }
        if let Some(tx) = self.sender.borrow_mut().take() {
            let _ = tx.send(());
        }
        true
    }

    pub fn has_fired(&self) -> bool {
        self.fired.get()
    }
}

impl fmt::Debug for OnceSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnceSignal")
            .field("fired", &self.fired.get())
            .finish()
    }
}

/// Wait until `resource` has finished loading.
///
/// - `None` resolves immediately.
/// - A resource that is already complete with a non-zero natural size
///   resolves immediately without registering anything.
/// - Otherwise one `load` and one `error` listener are registered right
///   away; whichever fires first removes both and resolves the future.
///
/// There is no timeout. If the resource is dropped without firing, the
/// future resolves as well.
pub fn wait_for_ready<R>(resource: Option<Rc<R>>) -> LocalBoxFuture<'static, ()>
where
    R: ImageResource + 'static,
{
    let Some(resource) = resource else {
        return future::ready(()).boxed_local();
    };
    if resource.is_ready() {
        return future::ready(()).boxed_local();
    }

    let (signal, done) = OnceSignal::new();
    let registered: Rc<Cell<Option<(ListenerId, ListenerId)>>> = Rc::new(Cell::new(None));

    let listener = |event: ResourceEvent| -> Listener {
        let signal = signal.clone();
        let registered = registered.clone();
        let resource = Rc::downgrade(&resource);
        Box::new(move || {
            if !signal.fire() {
                return;
            }
            if event == ResourceEvent::Error {
                log::warn!("image resource failed to load; continuing without it");
            }
            if let (Some(resource), Some(ids)) = (resource.upgrade(), registered.get()) {
                remove_both(&*resource, ids);
            }
        })
    };

    let load_id = resource.add_event_listener(ResourceEvent::Load, listener(ResourceEvent::Load));
    let error_id =
        resource.add_event_listener(ResourceEvent::Error, listener(ResourceEvent::Error));
    registered.set(Some((load_id, error_id)));

    // A resource may dispatch synchronously from inside registration.
    if signal.has_fired() {
        remove_both(&*resource, (load_id, error_id));
    }

    let guard = ListenerGuard {
        resource: Rc::downgrade(&resource),
        signal: Rc::downgrade(&signal),
        ids: (load_id, error_id),
    };
    async move {
        let _guard = guard;
        let _ = done.await;
    }
    .boxed_local()
}

/// Owned by a pending wait; unregisters both listeners if the wait is
/// dropped before the resource fires.
struct ListenerGuard<R: ImageResource> {
    resource: Weak<R>,
    // Must not keep the sender alive past the resource.
    signal: Weak<OnceSignal>,
    ids: (ListenerId, ListenerId),
}

impl<R: ImageResource> Drop for ListenerGuard<R> {
    fn drop(&mut self) {
        let pending = self.signal.upgrade().is_some_and(|signal| !signal.has_fired());
        if !pending {
            return;
        }
        if let Some(resource) = self.resource.upgrade() {
            remove_both(&*resource, self.ids);
        }
    }
}

fn remove_both<R: ImageResource + ?Sized>(
    resource: &R,
    (load_id, error_id): (ListenerId, ListenerId),
) {
    resource.remove_event_listener(ResourceEvent::Load, load_id);
    resource.remove_event_listener(ResourceEvent::Error, error_id);
}

/// Loading state of an [`ImageElement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Pending,
    Loaded,
    Failed,
}

/// In-memory image resource.
///
/// Starts out pending; `load_bytes`, `load_path`, `mark_loaded` or
/// `mark_failed` complete it and dispatch the matching event. Listeners are
/// one-shot and are unregistered before they run.
#[derive(Default)]
pub struct ImageElement {
    state: Cell<LoadState>,
    natural_size: Cell<(u32, u32)>,
    listeners: RefCell<Vec<(ListenerId, ResourceEvent, Listener)>>,
    next_id: Cell<u64>,
    added: Cell<usize>,
    removed: Cell<usize>,
}

impl fmt::Debug for ImageElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageElement")
            .field("state", &self.state.get())
            .field("natural_size", &self.natural_size.get())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl ImageElement {
    pub fn new() -> Self {
        Self::default()
    }

    /// An element that finished loading before anyone looked at it.
    pub fn loaded(width: u32, height: u32) -> Self {
        let element = Self::new();
        element.state.set(LoadState::Loaded);
        element.natural_size.set((width, height));
        element
    }

    pub fn state(&self) -> LoadState {
        self.state.get()
    }

    pub fn natural_size(&self) -> (u32, u32) {
        self.natural_size.get()
    }

    /// Listeners currently registered.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Total `add_event_listener` calls so far.
    pub fn listeners_added(&self) -> usize {
        self.added.get()
    }

    /// Total `remove_event_listener` calls that removed something.
    pub fn listeners_removed(&self) -> usize {
        self.removed.get()
    }

    /// Read the image header from `bytes` and complete loading.
    pub fn load_bytes(&self, bytes: &[u8]) -> image::ImageResult<(u32, u32)> {
        let dimensions = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(image::ImageError::from)
            .and_then(|reader| reader.into_dimensions());
        self.finish(dimensions)
    }

    /// Read the image header from a file and complete loading.
    pub fn load_path(&self, path: impl AsRef<Path>) -> image::ImageResult<(u32, u32)> {
        let path = path.as_ref();
        let dimensions = image::ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(image::ImageError::from)
            .and_then(|reader| reader.into_dimensions());
        if let Err(err) = &dimensions {
            log::warn!("failed to read image {}: {err}", path.display());
        }
        self.finish(dimensions)
    }

    /// Complete loading with a known size and dispatch `load`.
    pub fn mark_loaded(&self, width: u32, height: u32) {
        self.state.set(LoadState::Loaded);
        self.natural_size.set((width, height));
        self.dispatch(ResourceEvent::Load);
    }

    /// Complete loading as broken and dispatch `error`.
    pub fn mark_failed(&self) {
        self.state.set(LoadState::Failed);
        self.natural_size.set((0, 0));
        self.dispatch(ResourceEvent::Error);
    }

    /// Run every listener registered for `event`, unregistering each first.
    pub fn dispatch(&self, event: ResourceEvent) {
        let ids: Vec<ListenerId> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(_, e, _)| *e == event)
            .map(|(id, _, _)| *id)
            .collect();

        for id in ids {
            let listener = {
                let mut listeners = self.listeners.borrow_mut();
                listeners
                    .iter()
                    .position(|(lid, _, _)| *lid == id)
                    .map(|index| listeners.remove(index).2)
            };
            // Skipped when an earlier listener unregistered it.
            if let Some(listener) = listener {
                listener();
            }
        }
    }

    fn finish(&self, dimensions: image::ImageResult<(u32, u32)>) -> image::ImageResult<(u32, u32)> {
        match &dimensions {
            Ok((width, height)) => self.mark_loaded(*width, *height),
            Err(_) => self.mark_failed(),
        }
        dimensions
    }
}

impl ImageResource for ImageElement {
    fn is_complete(&self) -> bool {
        self.state.get() != LoadState::Pending
    }

    fn natural_width(&self) -> u32 {
        self.natural_size.get().0
    }

    fn natural_height(&self) -> u32 {
        self.natural_size.get().1
    }

    fn add_event_listener(&self, event: ResourceEvent, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.added.set(self.added.get() + 1);
        self.listeners.borrow_mut().push((id, event, listener));
        id
    }

    fn remove_event_listener(&self, event: ResourceEvent, id: ListenerId) {
        let mut listeners = self.listeners.borrow_mut();
        if let Some(index) = listeners
            .iter()
            .position(|(lid, e, _)| *lid == id && *e == event)
        {
            listeners.remove(index);
            self.removed.set(self.removed.get() + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::LocalPool;
    use futures::task::LocalSpawnExt;

    fn spawn_wait(pool: &LocalPool, element: &Rc<ImageElement>) -> Rc<Cell<usize>> {
        let resolved = Rc::new(Cell::new(0));
        let sink = resolved.clone();
        let wait = wait_for_ready(Some(element.clone()));
        pool.spawner()
            .spawn_local(async move {
                wait.await;
                sink.set(sink.get() + 1);
            })
            .unwrap();
        resolved
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::new(width, height);
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_absent_resource_resolves_immediately() {
        assert_eq!(wait_for_ready::<ImageElement>(None).now_or_never(), Some(()));
    }

    #[test]
    fn test_already_loaded_registers_nothing() {
        let element = Rc::new(ImageElement::loaded(640, 480));
        assert_eq!(wait_for_ready(Some(element.clone())).now_or_never(), Some(()));
        assert_eq!(element.listeners_added(), 0);
        assert_eq!(element.listeners_removed(), 0);
    }

    #[test]
    fn test_complete_but_empty_waits() {
        let element = Rc::new(ImageElement::loaded(0, 0));
        let mut wait = wait_for_ready(Some(element.clone()));
        assert!(wait.as_mut().now_or_never().is_none());
        assert_eq!(element.listener_count(), 2);

        element.mark_loaded(10, 10);
        assert_eq!(wait.now_or_never(), Some(()));
    }

    #[test]
    fn test_load_resolves_and_unregisters() {
        let mut pool = LocalPool::new();
        let element = Rc::new(ImageElement::new());
        let resolved = spawn_wait(&pool, &element);
        assert_eq!(element.listener_count(), 2);

        pool.run_until_stalled();
        assert_eq!(resolved.get(), 0);

        element.mark_loaded(32, 16);
        pool.run_until_stalled();
        assert_eq!(resolved.get(), 1);
        assert_eq!(element.listener_count(), 0);
    }

    #[test]
    fn test_error_resolves_like_load() {
        let mut pool = LocalPool::new();
        let element = Rc::new(ImageElement::new());
        let resolved = spawn_wait(&pool, &element);

        element.mark_failed();
        pool.run_until_stalled();
        assert_eq!(resolved.get(), 1);
        assert_eq!(element.listener_count(), 0);
        assert_eq!(element.state(), LoadState::Failed);
    }

    #[test]
    fn test_load_then_error_resolves_once() {
        let mut pool = LocalPool::new();
        let element = Rc::new(ImageElement::new());
        let resolved = spawn_wait(&pool, &element);

        element.dispatch(ResourceEvent::Load);
        assert_eq!(element.listener_count(), 0);
        element.dispatch(ResourceEvent::Error);
        pool.run_until_stalled();

        assert_eq!(resolved.get(), 1);
        assert_eq!(element.listeners_added(), 2);
        // The load listener was consumed by dispatch; the error one was
        // unregistered by the gate.
        assert_eq!(element.listeners_removed(), 1);
    }

    #[test]
    fn test_abandoned_wait_unregisters_listeners() {
        let element = Rc::new(ImageElement::new());
        let mut wait = wait_for_ready(Some(element.clone()));
        assert!(wait.as_mut().now_or_never().is_none());
        assert_eq!(element.listener_count(), 2);

        drop(wait);
        assert_eq!(element.listener_count(), 0);
        assert_eq!(element.listeners_removed(), 2);

        element.mark_loaded(8, 8);
        assert_eq!(element.state(), LoadState::Loaded);
    }

    #[test]
    fn test_dropping_a_finished_wait_removes_nothing_more() {
        let element = Rc::new(ImageElement::new());
        let mut wait = wait_for_ready(Some(element.clone()));
        assert!(wait.as_mut().now_or_never().is_none());

        element.mark_loaded(8, 8);
        let removed = element.listeners_removed();
        drop(wait);
        assert_eq!(element.listeners_removed(), removed);
        assert_eq!(element.listener_count(), 0);
    }

    #[test]
    fn test_dropped_resource_unblocks() {
        let element = Rc::new(ImageElement::new());
        let mut wait = wait_for_ready(Some(element.clone()));
        assert!(wait.as_mut().now_or_never().is_none());
        drop(element);
        assert_eq!(wait.now_or_never(), Some(()));
    }

    #[test]
    fn test_once_signal_fires_once() {
        let (signal, mut rx) = OnceSignal::new();
        assert!(!signal.has_fired());
        assert!(signal.fire());
        assert!(!signal.fire());
        assert!(signal.has_fired());
        assert_eq!(rx.try_recv(), Ok(Some(())));
    }

    #[test]
    fn test_load_bytes_reads_dimensions() {
        let element = Rc::new(ImageElement::new());
        let mut wait = wait_for_ready(Some(element.clone()));
        assert!(wait.as_mut().now_or_never().is_none());

        let size = element.load_bytes(&png_bytes(3, 2)).unwrap();
        assert_eq!(size, (3, 2));
        assert!(element.is_ready());
        assert_eq!(wait.now_or_never(), Some(()));
    }

    #[test]
    fn test_load_bytes_garbage_fails() {
        let element = ImageElement::new();
        assert!(element.load_bytes(b"definitely not an image").is_err());
        assert_eq!(element.state(), LoadState::Failed);
        assert!(element.is_complete());
        assert!(!element.is_ready());
    }

    #[test]
    fn test_load_path_missing_file_fails() {
        let element = ImageElement::new();
        assert!(element.load_path("/nonexistent/imgframe/test.png").is_err());
        assert_eq!(element.state(), LoadState::Failed);
    }
}

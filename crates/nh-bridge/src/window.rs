//! Host window and input queue references handed to the guest
//!
//! The host thread owns the window and input queue. The guest only ever
//! sees weak references, valid between `WindowCreated` and `WindowClosed`.

use crossbeam::queue::ArrayQueue;
use parking_lot::Mutex;
use raw_window_handle::{DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Host-owned window as seen by the guest and the overlay
pub trait HostWindow: HasWindowHandle + HasDisplayHandle + Send + Sync {
    /// Inner size in physical pixels
    fn size(&self) -> (u32, u32);

    /// Ask the host loop to close the window
    fn request_close(&self);

    fn is_fullscreen(&self) -> bool;

    fn set_fullscreen(&self, fullscreen: bool);
}

/// Non-owning reference to the host window
#[derive(Clone)]
pub struct HostWindowRef {
    inner: Weak<dyn HostWindow>,
}

impl HostWindowRef {
    pub fn new<W: HostWindow + 'static>(window: &Arc<W>) -> Self {
        let window: Arc<dyn HostWindow> = window.clone();
        Self {
            inner: Arc::downgrade(&window),
        }
    }

    /// Borrow the window if the host still owns it
    pub fn upgrade(&self) -> Option<Arc<dyn HostWindow>> {
        self.inner.upgrade()
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl PartialEq for HostWindowRef {
    fn eq(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for HostWindowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostWindowRef")
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Raw input forwarded from the host window to the guest
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key {
        /// Host scancode
        code: u32,
        pressed: bool,
        repeat: bool,
    },
    PointerMoved { x: f64, y: f64 },
    PointerButton { button: u16, pressed: bool },
    Scroll { dx: f32, dy: f32 },
    Focus(bool),
}

/// Bounded queue of raw input events (host pushes, guest polls)
pub struct InputQueue {
    events: ArrayQueue<InputEvent>,
    dropped: AtomicU64,
}

impl InputQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: ArrayQueue::new(capacity.max(1)),
            dropped: AtomicU64::new(0),
        }
    }

    /// Push an event, dropping it if the guest is not keeping up
    pub fn push(&self, event: InputEvent) -> bool {
        if self.events.push(event).is_err() {
            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            if dropped.is_power_of_two() {
                tracing::warn!("Input queue full, {} events dropped so far", dropped);
            }
            return false;
        }
        true
    }

    pub fn pop(&self) -> Option<InputEvent> {
        self.events.pop()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Non-owning reference to the host input queue
#[derive(Clone)]
pub struct InputQueueRef {
    inner: Weak<InputQueue>,
}

impl InputQueueRef {
    pub fn new(queue: &Arc<InputQueue>) -> Self {
        Self {
            inner: Arc::downgrade(queue),
        }
    }

    pub fn upgrade(&self) -> Option<Arc<InputQueue>> {
        self.inner.upgrade()
    }
}

impl PartialEq for InputQueueRef {
    fn eq(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for InputQueueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputQueueRef")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

/// Window stand-in without a native surface, for tests and headless hosts
#[derive(Debug, Default)]
pub struct HeadlessWindow {
    size: Mutex<(u32, u32)>,
    fullscreen: AtomicBool,
    close_requested: AtomicBool,
}

impl HeadlessWindow {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Mutex::new((width, height)),
            ..Default::default()
        }
    }

    pub fn resize(&self, width: u32, height: u32) {
        *self.size.lock() = (width, height);
    }

    pub fn close_requested(&self) -> bool {
        self.close_requested.load(Ordering::Acquire)
    }
}

impl HasWindowHandle for HeadlessWindow {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        Err(HandleError::Unavailable)
    }
}

impl HasDisplayHandle for HeadlessWindow {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        Err(HandleError::Unavailable)
    }
}

impl HostWindow for HeadlessWindow {
    fn size(&self) -> (u32, u32) {
        *self.size.lock()
    }

    fn request_close(&self) {
        self.close_requested.store(true, Ordering::Release);
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen.load(Ordering::Acquire)
    }

    fn set_fullscreen(&self, fullscreen: bool) {
        self.fullscreen.store(fullscreen, Ordering::Release);
    }
}

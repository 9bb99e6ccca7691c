//! Event relay - host thread to guest thread event queue
//!
//! The host thread publishes window, text and controller events; the guest
//! thread drains them from inside its looper. One mutex guards the queue and
//! is only held while pushing or while swapping the queue out in `drain`.

use crate::window::{HostWindowRef, InputQueueRef};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::thread::ThreadId;

/// Default number of discrete events buffered before the guest runs
pub const DEFAULT_RELAY_CAPACITY: usize = 256;

/// Event forwarded from the host window to the guest
#[derive(Debug, Clone, PartialEq)]
pub enum PendingEvent {
    /// Window and input queue became available
    WindowCreated {
        window: HostWindowRef,
        input: InputQueueRef,
    },
    /// Window is going away; the guest must drop its references
    WindowClosed,
    WindowResized { width: u32, height: u32 },
    /// Text box contents committed by the host text input
    TextSubmitted(String),
    ReturnKeyPressed,
    ControllerConnectionChanged { device_id: i32, connected: bool },
}

/// Discriminant of a [`PendingEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    WindowCreated,
    WindowClosed,
    WindowResized,
    TextSubmitted,
    ReturnKeyPressed,
    ControllerConnectionChanged,
}

impl PendingEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::WindowCreated { .. } => EventKind::WindowCreated,
            Self::WindowClosed => EventKind::WindowClosed,
            Self::WindowResized { .. } => EventKind::WindowResized,
            Self::TextSubmitted(_) => EventKind::TextSubmitted,
            Self::ReturnKeyPressed => EventKind::ReturnKeyPressed,
            Self::ControllerConnectionChanged { .. } => EventKind::ControllerConnectionChanged,
        }
    }

    /// Window lifecycle events are never coalesced across and never rejected
    pub fn is_window_lifecycle(&self) -> bool {
        matches!(self, Self::WindowCreated { .. } | Self::WindowClosed)
    }

    /// State events where only the latest buffered value matters
    pub fn is_state_event(&self) -> bool {
        matches!(self, Self::WindowClosed | Self::WindowResized { .. })
    }
}

/// Delivery mode of the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayMode {
    /// Guest looper not running yet; state events coalesce
    Buffering,
    /// Guest looper running; every event is queued
    Live,
    /// Guest looper stopped; late events are dropped
    Closed,
}

/// Relay counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub published: u64,
    pub coalesced: u64,
    pub dropped: u64,
    pub pending: usize,
}

struct RelayQueue {
    events: VecDeque<PendingEvent>,
    mode: RelayMode,
}

/// Host-to-guest event queue
pub struct EventRelay {
    queue: Mutex<RelayQueue>,
    capacity: usize,
    consumer: ConsumerGuard,
    published: AtomicU64,
    coalesced: AtomicU64,
    dropped: AtomicU64,
}

impl EventRelay {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(RelayQueue {
                events: VecDeque::with_capacity(capacity.min(DEFAULT_RELAY_CAPACITY)),
                mode: RelayMode::Buffering,
            }),
            capacity: capacity.max(1),
            consumer: ConsumerGuard::new(),
            published: AtomicU64::new(0),
            coalesced: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Queue an event for the guest (host thread).
    ///
    /// Returns false if the event was dropped.
    pub fn publish(&self, event: PendingEvent) -> bool {
        let mut queue = self.queue.lock();

        if queue.mode == RelayMode::Closed {
            drop(queue);
            self.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Relay closed, dropping late {:?} event", event.kind());
            return false;
        }

        if queue.mode == RelayMode::Buffering && event.is_state_event() {
            if let Some(index) = coalesce_slot(&queue.events, event.kind()) {
                queue.events.remove(index);
                self.coalesced.fetch_add(1, Ordering::Relaxed);
            }
        }

        // Only the pre-Running buffer is bounded; window and state events always get in
        if queue.mode == RelayMode::Buffering
            && queue.events.len() >= self.capacity
            && !event.is_window_lifecycle()
            && !event.is_state_event()
        {
            drop(queue);
            self.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                "Relay full ({} events), dropping {:?} event",
                self.capacity,
                event.kind()
            );
            return false;
        }

        tracing::trace!("Relay publish {:?}", event.kind());
        queue.events.push_back(event);
        self.published.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Take every event queued since the last drain (guest thread).
    ///
    /// The returned iterator owns the events; the relay lock is released
    /// before it is handed out.
    pub fn drain(&self) -> RelayDrain {
        self.consumer.assert_or_claim();
        let events = std::mem::take(&mut self.queue.lock().events);
        RelayDrain {
            inner: events.into_iter(),
        }
    }

    /// Check if there are pending events
    pub fn has_pending(&self) -> bool {
        !self.queue.lock().events.is_empty()
    }

    pub fn mode(&self) -> RelayMode {
        self.queue.lock().mode
    }

    /// Switch delivery mode. `Closed` is final.
    pub fn set_mode(&self, mode: RelayMode) {
        let mut queue = self.queue.lock();
        if queue.mode == RelayMode::Closed || queue.mode == mode {
            return;
        }
        tracing::debug!("Relay mode {:?} -> {:?}", queue.mode, mode);
        queue.mode = mode;
    }

    /// Close the relay and discard anything still queued.
    /// Returns the number of discarded events.
    pub fn close(&self) -> usize {
        let discarded = {
            let mut queue = self.queue.lock();
            queue.mode = RelayMode::Closed;
            let discarded = queue.events.len();
            queue.events.clear();
            discarded
        };
        if discarded > 0 {
            self.dropped.fetch_add(discarded as u64, Ordering::Relaxed);
            tracing::debug!("Relay closed with {} undelivered events", discarded);
        }
        discarded
    }

    pub fn stats(&self) -> RelayStats {
        RelayStats {
            published: self.published.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            pending: self.queue.lock().events.len(),
        }
    }
}

impl Default for EventRelay {
    fn default() -> Self {
        Self::new(DEFAULT_RELAY_CAPACITY)
    }
}

/// Find a buffered event of `kind` that a new one may replace: the most
/// recent one, provided no window lifecycle event was queued after it.
fn coalesce_slot(events: &VecDeque<PendingEvent>, kind: EventKind) -> Option<usize> {
    for (index, event) in events.iter().enumerate().rev() {
        if event.kind() == kind {
            return Some(index);
        }
        if event.is_window_lifecycle() {
            return None;
        }
    }
    None
}

/// Events taken by one [`EventRelay::drain`] call, in publish order
pub struct RelayDrain {
    inner: std::collections::vec_deque::IntoIter<PendingEvent>,
}

impl Iterator for RelayDrain {
    type Item = PendingEvent;

    fn next(&mut self) -> Option<PendingEvent> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for RelayDrain {}

/// Single-consumer guard: the first draining thread becomes the owner,
/// other threads trip a debug assertion.
struct ConsumerGuard {
    owner: OnceLock<ThreadId>,
}

impl ConsumerGuard {
    fn new() -> Self {
        Self {
            owner: OnceLock::new(),
        }
    }

    fn assert_or_claim(&self) {
        let current = std::thread::current().id();
        let owner = *self.owner.get_or_init(|| current);
        debug_assert_eq!(
            owner, current,
            "EventRelay single-consumer violation: drained from a second thread"
        );
    }
}

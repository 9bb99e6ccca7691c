//! Lifecycle bridge
//!
//! Coordinates the guest thread with the host event loop:
//! - starting the guest entry point on its own thread
//! - relaying host window events to the guest
//! - the exactly-once exit sequence, from either side

use crate::guest::{EntryPointResolver, GuestRuntimeHandle};
use crate::lifecycle::LifecycleState;
use crate::relay::{EventRelay, PendingEvent, RelayDrain, RelayMode, RelayStats, DEFAULT_RELAY_CAPACITY};
use crate::runner::{GuestThread, GuestThreadRunner};
use crate::shutdown::ShutdownSync;
use crate::window::{HostWindowRef, InputQueueRef};
use nh_core::BridgeError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

type TeardownHook = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct TeardownHooks {
    hooks: Vec<TeardownHook>,
    done: bool,
}

/// Bridge between the host event loop and one guest runtime.
///
/// Shared by `Arc` between the host thread and the guest thread.
pub struct LifecycleBridge {
    /// Lifecycle state and exit signal
    sync: ShutdownSync,
    /// Host to guest events
    relay: EventRelay,
    /// Guest looper is pumping events
    looper_running: AtomicBool,
    /// Resource release hooks, run once on exit
    teardown: Mutex<TeardownHooks>,
    /// Guest thread, once spawned
    guest_thread: Mutex<Option<GuestThread>>,
}

impl LifecycleBridge {
    pub fn new() -> Arc<Self> {
        Self::with_relay_capacity(DEFAULT_RELAY_CAPACITY)
    }

    pub fn with_relay_capacity(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            sync: ShutdownSync::new(),
            relay: EventRelay::new(capacity),
            looper_running: AtomicBool::new(false),
            teardown: Mutex::new(TeardownHooks::default()),
            guest_thread: Mutex::new(None),
        })
    }

    /// Start the guest on its own thread. Returns without waiting for it.
    pub fn start(self: &Arc<Self>, entry: GuestRuntimeHandle) -> Result<(), BridgeError> {
        let thread = self
            .sync
            .start_with(|| GuestThreadRunner::spawn(self, entry))?;
        *self.guest_thread.lock() = Some(thread);
        Ok(())
    }

    /// Resolve `symbol` and start it.
    ///
    /// A failed resolution leaves the bridge `Idle`.
    pub fn start_resolved(
        self: &Arc<Self>,
        resolver: &dyn EntryPointResolver,
        symbol: &str,
    ) -> Result<(), BridgeError> {
        if self.state() != LifecycleState::Idle {
            return Err(BridgeError::AlreadyStarted);
        }

        let entry = resolver.resolve(symbol).map_err(|e| {
            tracing::error!("Failed to resolve guest entry point '{}': {}", symbol, e);
            e
        })?;
        self.start(entry)
    }

    /// Ask the guest to stop. Idempotent, callable from any thread.
    pub fn request_exit(&self) {
        self.sync.request_exit();
    }

    pub fn exit_requested(&self) -> bool {
        self.sync.exit_requested()
    }

    /// Block until the guest thread has returned and released its resources.
    pub fn wait_for_exit(&self) {
        tracing::info!("Waiting for guest to exit");
        self.sync.wait_for_exit();
    }

    /// Bounded [`wait_for_exit`](Self::wait_for_exit). Returns whether the guest exited.
    pub fn wait_for_exit_timeout(&self, timeout: Duration) -> bool {
        tracing::info!("Waiting up to {:?} for guest to exit", timeout);
        self.sync.wait_for_exit_timeout(timeout)
    }

    pub fn state(&self) -> LifecycleState {
        self.sync.state()
    }

    /// Record whether the guest looper is pumping events.
    ///
    /// The first `true` moves the bridge to `Running` and makes the relay live.
    /// `false` after the looper ran, or once an exit was requested, closes the
    /// relay to late events.
    pub fn set_looper_running(&self, running: bool) {
        if running {
            if !self.state().is_active() {
                tracing::warn!("Looper reported running while guest is {}", self.state());
                return;
            }
            self.looper_running.store(true, Ordering::Release);
            self.sync.mark_running();
            self.relay.set_mode(RelayMode::Live);
        } else {
            let was_running = self.looper_running.swap(false, Ordering::AcqRel);
            if was_running || self.exit_requested() {
                self.relay.set_mode(RelayMode::Closed);
            }
        }
    }

    pub fn is_looper_running(&self) -> bool {
        self.looper_running.load(Ordering::Acquire)
    }

    /// Take pending relay events. Guest thread only.
    pub fn drain(&self) -> RelayDrain {
        self.relay.drain()
    }

    pub fn relay_stats(&self) -> RelayStats {
        self.relay.stats()
    }

    pub fn guest_thread(&self) -> Option<GuestThread> {
        self.guest_thread.lock().clone()
    }

    /// Register a hook run once when the guest's resources are released.
    /// Runs immediately if that already happened.
    pub fn on_teardown(&self, hook: impl FnOnce() + Send + 'static) {
        let mut teardown = self.teardown.lock();
        if teardown.done {
            drop(teardown);
            hook();
            return;
        }
        teardown.hooks.push(Box::new(hook));
    }

    // Host window callbacks

    pub fn on_window_created(&self, window: HostWindowRef, input: InputQueueRef) {
        tracing::info!("Window created");
        self.relay.publish(PendingEvent::WindowCreated { window, input });
    }

    pub fn on_window_closed(&self) {
        tracing::info!("Window closed");
        self.relay.publish(PendingEvent::WindowClosed);
    }

    pub fn on_window_resized(&self, width: u32, height: u32) {
        tracing::debug!("Window resized to {}x{}", width, height);
        self.relay.publish(PendingEvent::WindowResized { width, height });
    }

    pub fn on_text_submitted(&self, text: impl Into<String>) {
        self.relay.publish(PendingEvent::TextSubmitted(text.into()));
    }

    pub fn on_return_key_pressed(&self) {
        self.relay.publish(PendingEvent::ReturnKeyPressed);
    }

    pub fn on_controller_connection_changed(&self, device_id: i32, connected: bool) {
        tracing::info!(
            "Controller {} {}",
            device_id,
            if connected { "connected" } else { "disconnected" }
        );
        self.relay
            .publish(PendingEvent::ControllerConnectionChanged { device_id, connected });
    }

    /// Called by the guest thread's exit guard after the entry point returned.
    pub(crate) fn finish_guest(&self) {
        self.sync.request_exit();
        self.looper_running.store(false, Ordering::Release);
        self.teardown();
        self.sync.mark_exited();
    }

    fn teardown(&self) {
        self.sync.run_teardown_once(|| {
            let discarded = self.relay.close();
            let hooks = {
                let mut teardown = self.teardown.lock();
                teardown.done = true;
                std::mem::take(&mut teardown.hooks)
            };
            tracing::info!(
                "Releasing guest resources ({} hooks, {} undelivered events)",
                hooks.len(),
                discarded
            );
            for hook in hooks {
                hook();
            }
        });
    }
}

impl Drop for LifecycleBridge {
    fn drop(&mut self) {
        self.teardown();
    }
}

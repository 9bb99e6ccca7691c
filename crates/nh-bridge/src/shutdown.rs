//! Shutdown synchronizer
//!
//! Owns the lifecycle state together with the exit signal. All transitions
//! happen under one mutex and every transition wakes the condvar, so a waiter
//! that re-checks its predicate after each wakeup cannot miss the exit.

use crate::lifecycle::LifecycleState;
use nh_core::BridgeError;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

pub struct ShutdownSync {
    /// Current lifecycle state
    state: Mutex<LifecycleState>,
    /// Signaled on every state transition
    condvar: Condvar,
    /// Exit signal flag, set once and never cleared
    exit_flag: AtomicBool,
    /// One-shot teardown guard
    torn_down: AtomicBool,
}

impl ShutdownSync {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LifecycleState::Idle),
            condvar: Condvar::new(),
            exit_flag: AtomicBool::new(false),
            torn_down: AtomicBool::new(false),
        }
    }

    /// Get the current state
    pub fn state(&self) -> LifecycleState {
        *self.state.lock()
    }

    /// Whether an exit has been requested (lock-free, for guest polling)
    pub fn exit_requested(&self) -> bool {
        self.exit_flag.load(Ordering::Acquire)
    }

    /// Run `spawn` and move `Idle -> Starting` if it succeeds.
    ///
    /// The state lock is held across `spawn`, so a freshly spawned thread
    /// blocks on its first transition until the bridge is in `Starting`.
    /// `spawn` must not call back into this synchronizer.
    pub fn start_with<T>(
        &self,
        spawn: impl FnOnce() -> Result<T, BridgeError>,
    ) -> Result<T, BridgeError> {
        let mut state = self.state.lock();
        if *state != LifecycleState::Idle {
            return Err(BridgeError::AlreadyStarted);
        }

        let spawned = spawn()?;
        *state = LifecycleState::Starting;
        self.condvar.notify_all();
        tracing::info!("Guest lifecycle: idle -> starting");
        Ok(spawned)
    }

    /// `Starting -> Running`. Returns false in any other state.
    pub fn mark_running(&self) -> bool {
        let mut state = self.state.lock();
        if *state != LifecycleState::Starting {
            return false;
        }
        *state = LifecycleState::Running;
        self.condvar.notify_all();
        tracing::info!("Guest lifecycle: starting -> running");
        true
    }

    /// Request exit. Only the first call from `Starting`/`Running` transitions.
    pub fn request_exit(&self) -> bool {
        let mut state = self.state.lock();
        match *state {
            LifecycleState::Starting | LifecycleState::Running => {
                let from = *state;
                *state = LifecycleState::ExitRequested;
                self.exit_flag.store(true, Ordering::Release);
                self.condvar.notify_all();
                tracing::info!("Guest lifecycle: {} -> exit-requested", from);
                true
            }
            LifecycleState::Idle => {
                tracing::debug!("Exit requested before the guest was started, ignoring");
                false
            }
            LifecycleState::ExitRequested | LifecycleState::Exited => false,
        }
    }

    /// Final transition once the guest thread has returned.
    ///
    /// Passes through `ExitRequested` first if nobody requested the exit.
    pub fn mark_exited(&self) -> bool {
        let mut state = self.state.lock();
        match *state {
            LifecycleState::Starting | LifecycleState::Running => {
                tracing::info!("Guest lifecycle: {} -> exit-requested (guest returned)", *state);
                *state = LifecycleState::ExitRequested;
                self.exit_flag.store(true, Ordering::Release);
            }
            LifecycleState::ExitRequested => {}
            LifecycleState::Idle | LifecycleState::Exited => return false,
        }

        *state = LifecycleState::Exited;
        self.condvar.notify_all();
        tracing::info!("Guest lifecycle: exit-requested -> exited");
        true
    }

    /// Block until the state reaches `Exited`.
    ///
    /// Returns immediately if the guest was never started.
    pub fn wait_for_exit(&self) {
        let mut state = self.state.lock();
        if *state == LifecycleState::Idle {
            tracing::warn!("wait_for_exit called before the guest was started");
            return;
        }
        while *state != LifecycleState::Exited {
            self.condvar.wait(&mut state);
        }
    }

    /// Like [`wait_for_exit`](Self::wait_for_exit) with a deadline.
    /// Returns whether `Exited` was reached.
    pub fn wait_for_exit_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        if *state == LifecycleState::Idle {
            return false;
        }
        while *state != LifecycleState::Exited {
            if self.condvar.wait_until(&mut state, deadline).timed_out() {
                return *state == LifecycleState::Exited;
            }
        }
        true
    }

    /// Run `teardown` unless it already ran. Returns whether it ran now.
    pub fn run_teardown_once(&self, teardown: impl FnOnce()) -> bool {
        if self
            .torn_down
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        teardown();
        true
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }
}

impl Default for ShutdownSync {
    fn default() -> Self {
        Self::new()
    }
}

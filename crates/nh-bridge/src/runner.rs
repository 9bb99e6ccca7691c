//! Guest thread runner
//!
//! Spawns the detached thread that executes the guest entry point. The thread
//! body carries an exit guard, so the bridge reaches `Exited` on every path out
//! of the entry point, including a panic unwinding through it.

use crate::bridge::LifecycleBridge;
use crate::guest::{GuestContext, GuestRuntimeHandle};
use nh_core::BridgeError;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, Thread, ThreadId};

/// Name given to the guest thread
pub const GUEST_THREAD_NAME: &str = "guest-main";

/// Handle to the running guest thread. It cannot be joined; completion
/// is observed through the bridge's `Exited` state.
#[derive(Debug, Clone)]
pub struct GuestThread {
    symbol: String,
    thread: Thread,
}

impl GuestThread {
    pub fn id(&self) -> ThreadId {
        self.thread.id()
    }

    pub fn name(&self) -> Option<&str> {
        self.thread.name()
    }

    /// Entry point symbol the thread is running
    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

pub struct GuestThreadRunner;

impl GuestThreadRunner {
    /// Launch the guest thread and detach it.
    pub fn spawn(
        bridge: &Arc<LifecycleBridge>,
        entry: GuestRuntimeHandle,
    ) -> Result<GuestThread, BridgeError> {
        let symbol = entry.symbol().to_string();
        let ctx = GuestContext::new(Arc::clone(bridge));
        let guard_bridge = Arc::clone(bridge);

        // Guard lives inside the thread; a failed spawn must not finish the lifecycle.
        let handle = thread::Builder::new()
            .name(GUEST_THREAD_NAME.to_string())
            .spawn(move || {
                let _guard = ExitGuard {
                    bridge: guard_bridge,
                };
                run_entry(entry, ctx);
            })
            .map_err(BridgeError::ThreadSpawn)?;

        let thread = handle.thread().clone();
        // Detach; the exit guard reports completion.
        drop(handle);

        tracing::info!("Spawned guest thread for entry point '{}'", symbol);
        Ok(GuestThread { symbol, thread })
    }
}

fn run_entry(entry: GuestRuntimeHandle, ctx: GuestContext) {
    let symbol = entry.symbol().to_string();
    tracing::info!("Invoking guest entry point '{}'", symbol);

    match panic::catch_unwind(AssertUnwindSafe(move || entry.invoke(ctx))) {
        Ok(()) => tracing::info!("Guest entry point '{}' returned", symbol),
        Err(payload) => {
            let err = BridgeError::GuestThreadPanic(panic_message(payload.as_ref()));
            tracing::error!("Guest entry point '{}' terminated abnormally: {}", symbol, err);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Finishes the guest lifecycle when the thread body is left.
struct ExitGuard {
    bridge: Arc<LifecycleBridge>,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.bridge.finish_guest();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned boom"));
        assert_eq!(panic_message(payload.as_ref()), "owned boom");

        let payload: Box<dyn Any + Send> = Box::new(42u32);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }
}

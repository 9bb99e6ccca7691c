//! Guest lifecycle bridge for nativehost
//!
//! Hosts an activity-model guest runtime on a dedicated thread and ties its
//! lifecycle to the host window loop:
//! - Lifecycle bridge (start / request exit / wait for exit)
//! - Guest thread runner
//! - Event relay (host window events to the guest)
//! - Shutdown synchronizer

pub mod bridge;
pub mod guest;
pub mod lifecycle;
pub mod relay;
pub mod runner;
pub mod shutdown;
pub mod window;

pub use bridge::LifecycleBridge;
pub use guest::{EntryPointResolver, GuestContext, GuestRuntimeHandle, SymbolTable};
pub use lifecycle::LifecycleState;
pub use relay::{EventKind, EventRelay, PendingEvent, RelayDrain, RelayMode, RelayStats};
pub use runner::{GuestThread, GuestThreadRunner, GUEST_THREAD_NAME};
pub use shutdown::ShutdownSync;
pub use window::{HeadlessWindow, HostWindow, HostWindowRef, InputEvent, InputQueue, InputQueueRef};

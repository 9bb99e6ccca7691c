//! Desktop host for nativehost
//!
//! Owns the native window and its event loop, and exposes it to the guest
//! through the lifecycle bridge.

pub mod app;
pub mod overlay;
pub mod window;

pub use app::{run_host, HostCommand};
pub use overlay::{FpsCounter, OverlayCommand, OverlayOutcome, OverlayState, MENUBAR_REVEAL_DELAY};
pub use window::WinitHostWindow;

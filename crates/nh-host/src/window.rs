//! winit window exposed to the guest as a [`HostWindow`]

use nh_bridge::HostWindow;
use raw_window_handle::{DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle};
use std::sync::atomic::{AtomicBool, Ordering};
use winit::window::{Fullscreen, Window};

pub struct WinitHostWindow {
    window: Window,
    close_requested: AtomicBool,
}

impl WinitHostWindow {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            close_requested: AtomicBool::new(false),
        }
    }

    /// Close was requested through [`HostWindow::request_close`]
    pub fn close_requested(&self) -> bool {
        self.close_requested.load(Ordering::Acquire)
    }

    pub fn winit(&self) -> &Window {
        &self.window
    }
}

impl HasWindowHandle for WinitHostWindow {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        self.window.window_handle()
    }
}

impl HasDisplayHandle for WinitHostWindow {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        self.window.display_handle()
    }
}

impl HostWindow for WinitHostWindow {
    fn size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    fn request_close(&self) {
        self.close_requested.store(true, Ordering::Release);
        // Wake the event loop so the request is seen
        self.window.request_redraw();
    }

    fn is_fullscreen(&self) -> bool {
        self.window.fullscreen().is_some()
    }

    fn set_fullscreen(&self, fullscreen: bool) {
        tracing::info!("Fullscreen {}", if fullscreen { "on" } else { "off" });
        self.window
            .set_fullscreen(fullscreen.then_some(Fullscreen::Borderless(None)));
    }
}

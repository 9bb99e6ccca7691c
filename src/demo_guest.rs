//! Built-in guest used when no external runtime is linked
//!
//! Runs a paced looper that tracks the current window, polls raw input and
//! asks to exit once its window is closed.

use nh_bridge::{GuestContext, HostWindow, HostWindowRef, InputQueueRef, PendingEvent, SymbolTable};
use std::thread;
use std::time::Duration;

const FRAME: Duration = Duration::from_millis(16);

pub fn register(table: &mut SymbolTable, symbol: &str) {
    table.register(symbol, run);
}

#[derive(Default)]
struct Surface {
    window: Option<HostWindowRef>,
    input: Option<InputQueueRef>,
}

fn run(ctx: GuestContext) {
    tracing::info!(
        "Demo guest started on {}",
        ctx.thread_name().as_deref().unwrap_or("<unnamed>")
    );
    ctx.set_looper_running(true);

    let mut surface = Surface::default();
    let mut frames: u64 = 0;

    while !ctx.exit_requested() {
        for event in ctx.drain() {
            handle_event(&ctx, &mut surface, event);
        }

        if let Some(input) = surface.input.as_ref().and_then(InputQueueRef::upgrade) {
            while let Some(event) = input.pop() {
                tracing::trace!("Input {:?}", event);
            }
        }

        frames += 1;
        thread::sleep(FRAME);
    }

    ctx.set_looper_running(false);
    tracing::info!("Demo guest finished after {} frames", frames);
}

fn handle_event(ctx: &GuestContext, surface: &mut Surface, event: PendingEvent) {
    match event {
        PendingEvent::WindowCreated { window, input } => {
            if let Some(size) = window.upgrade().map(|w| w.size()) {
                tracing::info!("Guest attached to window {}x{}", size.0, size.1);
            }
            surface.window = Some(window);
            surface.input = Some(input);
        }
        PendingEvent::WindowResized { width, height } => {
            tracing::debug!("Guest surface resized to {}x{}", width, height);
        }
        PendingEvent::WindowClosed => {
            surface.window = None;
            surface.input = None;
            ctx.request_exit();
        }
        PendingEvent::TextSubmitted(text) => tracing::info!("Text submitted: {:?}", text),
        PendingEvent::ReturnKeyPressed => tracing::debug!("Return pressed"),
        PendingEvent::ControllerConnectionChanged { device_id, connected } => {
            tracing::info!(
                "Controller {} {}",
                device_id,
                if connected { "connected" } else { "disconnected" }
            );
        }
    }
}

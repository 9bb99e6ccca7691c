//! winit event loop driving the host window
//!
//! The host thread owns the window and forwards its lifecycle and input to the
//! guest through the [`LifecycleBridge`]. The loop ends when the window closes
//! or the guest finishes.

use crate::overlay::{next_hud_location, OverlayCommand, OverlayOutcome, OverlayState};
use crate::window::WinitHostWindow;
use nh_bridge::{HostWindow, HostWindowRef, InputEvent, InputQueue, InputQueueRef, LifecycleBridge};
use nh_core::{Config, HostError, WindowError};
use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, Ime, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, ModifiersState, NamedKey},
    platform::scancode::PhysicalKeyExtScancode,
    window::{Fullscreen, Window, WindowId},
};

/// Events injected into the host loop from other threads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    /// Guest thread finished and the bridge was torn down
    GuestExited,
}

struct HostApp {
    bridge: Arc<LifecycleBridge>,
    config: Config,
    window: Option<Arc<WinitHostWindow>>,
    input: Arc<InputQueue>,
    overlay: OverlayState,
    menubar_shown: bool,
    modifiers: ModifiersState,
}

impl HostApp {
    fn new(config: Config, bridge: Arc<LifecycleBridge>) -> Self {
        let input = Arc::new(InputQueue::new(config.relay.input_queue_capacity));
        let overlay = OverlayState::new(config.overlay.clone(), true);
        Self {
            bridge,
            config,
            window: None,
            input,
            overlay,
            menubar_shown: false,
            modifiers: ModifiersState::empty(),
        }
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), WindowError> {
        let settings = &self.config.window;
        let mut attributes = Window::default_attributes()
            .with_title(settings.title.clone())
            .with_inner_size(LogicalSize::new(settings.width as f64, settings.height as f64));
        if settings.start_fullscreen {
            attributes = attributes.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let window = event_loop
            .create_window(attributes)
            .map_err(|e| WindowError::Create(e.to_string()))?;
        window.set_ime_allowed(true);

        let window = Arc::new(WinitHostWindow::new(window));
        let (width, height) = window.size();
        tracing::info!("Window created ({}x{})", width, height);

        self.bridge
            .on_window_created(HostWindowRef::new(&window), InputQueueRef::new(&self.input));
        self.window = Some(window);
        Ok(())
    }

    fn close_window(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.take() {
            tracing::info!("Closing window");
            self.bridge.on_window_closed();
            drop(window);
        }
        self.bridge.request_exit();
        event_loop.exit();
    }

    fn handle_overlay(&mut self, command: OverlayCommand, event_loop: &ActiveEventLoop) {
        let Some(window) = self.window.clone() else {
            return;
        };
        match self.overlay.apply(command, window.as_ref()) {
            OverlayOutcome::CloseRequested => self.close_window(event_loop),
            OverlayOutcome::SettingsChanged => self.save_overlay_settings(),
            OverlayOutcome::None => {}
        }
    }

    fn save_overlay_settings(&mut self) {
        self.config.overlay = self.overlay.settings().clone();
        if let Err(e) = self.config.save() {
            tracing::warn!("Failed to save overlay settings: {}", e);
        }
    }

    fn handle_key(&mut self, event: &KeyEvent, event_loop: &ActiveEventLoop) {
        let pressed = event.state == ElementState::Pressed;

        if pressed && !event.repeat {
            match &event.logical_key {
                Key::Named(NamedKey::Enter) => self.bridge.on_return_key_pressed(),
                Key::Named(NamedKey::F11) => {
                    self.handle_overlay(OverlayCommand::ToggleFullscreen, event_loop)
                }
                Key::Named(NamedKey::F3) => {
                    let next = next_hud_location(self.overlay.settings().fps_hud_location);
                    self.handle_overlay(OverlayCommand::SetFpsHud(next), event_loop)
                }
                Key::Named(NamedKey::F10) => {
                    let remember = self.modifiers.shift_key();
                    self.handle_overlay(OverlayCommand::HideMenubar { remember }, event_loop)
                }
                Key::Character(c) if self.modifiers.control_key() && c.as_str() == "q" => {
                    self.handle_overlay(OverlayCommand::Close, event_loop)
                }
                _ => {}
            }
        }

        let code = event.physical_key.to_scancode().unwrap_or(0);
        self.push_input(InputEvent::Key {
            code,
            pressed,
            repeat: event.repeat,
        });
    }

    fn present_frame(&mut self) {
        let Some(fullscreen) = self.window.as_ref().map(|window| window.is_fullscreen()) else {
            return;
        };
        let now = Instant::now();

        if let Some(fps) = self.overlay.frame(now) {
            tracing::trace!("{:.1} fps (HUD {:?})", fps, self.overlay.hud_location());
        }

        // Cursor is never captured by the host itself
        let visible = self.overlay.menubar_visible(now, fullscreen, false);
        if visible != self.menubar_shown {
            tracing::debug!("Menubar {}", if visible { "shown" } else { "hidden" });
            self.menubar_shown = visible;
        }
    }

    fn push_input(&self, event: InputEvent) {
        if !self.input.push(event) {
            tracing::trace!("Input queue full, dropped event");
        }
    }
}

fn button_index(button: MouseButton) -> u16 {
    match button {
        MouseButton::Left => 0,
        MouseButton::Right => 1,
        MouseButton::Middle => 2,
        MouseButton::Back => 3,
        MouseButton::Forward => 4,
        MouseButton::Other(n) => n,
    }
}

impl ApplicationHandler<HostCommand> for HostApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.create_window(event_loop) {
            tracing::error!("{}", e);
            self.bridge.request_exit();
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.close_window(event_loop),
            WindowEvent::Resized(size) => {
                tracing::debug!("Window resized to {}x{}", size.width, size.height);
                self.bridge.on_window_resized(size.width, size.height);
            }
            WindowEvent::Ime(Ime::Commit(text)) => self.bridge.on_text_submitted(text),
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(&event, event_loop),
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
                self.overlay.set_alt_held(self.modifiers.alt_key());
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.overlay.pointer_moved(position.y, Instant::now());
                self.push_input(InputEvent::PointerMoved {
                    x: position.x,
                    y: position.y,
                });
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.push_input(InputEvent::PointerButton {
                    button: button_index(button),
                    pressed: state == ElementState::Pressed,
                });
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let (dx, dy) = match delta {
                    MouseScrollDelta::LineDelta(x, y) => (x, y),
                    MouseScrollDelta::PixelDelta(p) => (p.x as f32, p.y as f32),
                };
                self.push_input(InputEvent::Scroll { dx, dy });
            }
            WindowEvent::Focused(focused) => {
                if !focused {
                    self.overlay.set_menu_focused(false);
                    self.overlay.set_alt_held(false);
                }
                self.push_input(InputEvent::Focus(focused));
            }
            WindowEvent::RedrawRequested => self.present_frame(),
            _ => {}
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: HostCommand) {
        match event {
            HostCommand::GuestExited => {
                tracing::info!("Guest exited, leaving host loop");
                self.close_window(event_loop);
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let close_requested = self
            .window
            .as_ref()
            .is_some_and(|window| window.close_requested());
        if close_requested || self.bridge.state().is_terminal() {
            self.close_window(event_loop);
            return;
        }

        if let Some(window) = &self.window {
            if self.overlay.needs_frames(window.is_fullscreen()) {
                window.winit().request_redraw();
            }
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.take() {
            self.bridge.on_window_closed();
            drop(window);
        }
    }
}

/// Run the host window loop on the calling thread until the window closes or
/// the guest exits
pub fn run_host(config: &Config, bridge: Arc<LifecycleBridge>) -> Result<(), HostError> {
    let event_loop = EventLoop::<HostCommand>::with_user_event()
        .build()
        .map_err(|e| WindowError::EventLoop(e.to_string()))?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let proxy = event_loop.create_proxy();
    bridge.on_teardown(move || {
        // Loop may already be gone
        let _ = proxy.send_event(HostCommand::GuestExited);
    });

    let mut app = HostApp::new(config.clone(), bridge);
    event_loop
        .run_app(&mut app)
        .map_err(|e| WindowError::EventLoop(e.to_string()))?;

    tracing::info!("Host loop finished");
    Ok(())
}

//! Overlay model
//!
//! Menubar visibility, FPS HUD placement and the commands the overlay issues
//! to the host window. Drawing is left to the graphics layer, which also
//! reports menu focus through [`OverlayState::set_menu_focused`].

use nh_bridge::HostWindow;
use nh_core::{HudLocation, OverlaySettings};
use std::time::{Duration, Instant};

/// How long the cursor must rest on the top edge to reveal the menubar in fullscreen
pub const MENUBAR_REVEAL_DELAY: Duration = Duration::from_millis(500);

/// Command issued from the overlay on the host thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayCommand {
    /// Close the window, which ends the guest
    Close,
    ToggleFullscreen,
    /// Hide the menubar until exit; `remember` persists the choice
    HideMenubar { remember: bool },
    SetFpsHud(HudLocation),
}

/// What the host must do after an overlay command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayOutcome {
    None,
    /// Settings changed and should be saved
    SettingsChanged,
    /// Window close was requested
    CloseRequested,
}

/// Overlay state owned by the host thread
pub struct OverlayState {
    settings: OverlaySettings,
    /// Overlay default when the setting is unset
    gpu_capable: bool,
    /// Menubar not hidden for this session
    show_menubar: bool,
    menu_focused: bool,
    alt_held: bool,
    /// Cursor has been on the top edge since
    pointer_on_top_since: Option<Instant>,
    fps: FpsCounter,
}

impl OverlayState {
    pub fn new(settings: OverlaySettings, gpu_capable: bool) -> Self {
        if settings.enable_overlay.is_none() && !gpu_capable {
            tracing::warn!("Disabling overlay, graphics context is not capable enough");
        }
        Self {
            settings,
            gpu_capable,
            show_menubar: true,
            menu_focused: false,
            alt_held: false,
            pointer_on_top_since: None,
            fps: FpsCounter::new(),
        }
    }

    pub fn settings(&self) -> &OverlaySettings {
        &self.settings
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.enable_overlay.unwrap_or(self.gpu_capable)
    }

    pub fn pointer_moved(&mut self, y: f64, now: Instant) {
        if y <= 0.0 {
            self.pointer_on_top_since.get_or_insert(now);
        } else {
            self.pointer_on_top_since = None;
        }
    }

    pub fn set_alt_held(&mut self, held: bool) {
        self.alt_held = held;
    }

    pub fn set_menu_focused(&mut self, focused: bool) {
        self.menu_focused = focused;
    }

    /// Whether the menubar is shown this frame
    pub fn menubar_visible(&self, now: Instant, fullscreen: bool, cursor_captured: bool) -> bool {
        if !self.is_enabled() || !self.settings.enable_menubar || !self.show_menubar {
            return false;
        }

        let revealed = self
            .pointer_on_top_since
            .is_some_and(|since| now.duration_since(since) >= MENUBAR_REVEAL_DELAY);
        let auto_show = (!fullscreen || revealed || self.menu_focused) && !cursor_captured;
        auto_show || self.alt_held
    }

    /// Whether the host should keep presenting frames: the FPS HUD is shown,
    /// or a fullscreen menubar reveal is pending on the top edge
    pub fn needs_frames(&self, fullscreen: bool) -> bool {
        if !self.is_enabled() {
            return false;
        }
        self.hud_location() != HudLocation::None
            || (fullscreen && self.pointer_on_top_since.is_some())
    }

    pub fn hud_location(&self) -> HudLocation {
        if self.is_enabled() {
            self.settings.fps_hud_location
        } else {
            HudLocation::None
        }
    }

    pub fn apply(&mut self, command: OverlayCommand, window: &dyn HostWindow) -> OverlayOutcome {
        tracing::debug!("Overlay command {:?}", command);
        match command {
            OverlayCommand::Close => {
                window.request_close();
                OverlayOutcome::CloseRequested
            }
            OverlayCommand::ToggleFullscreen => {
                window.set_fullscreen(!window.is_fullscreen());
                OverlayOutcome::None
            }
            OverlayCommand::HideMenubar { remember } => {
                self.show_menubar = false;
                self.menu_focused = false;
                if remember && self.settings.enable_menubar {
                    self.settings.enable_menubar = false;
                    OverlayOutcome::SettingsChanged
                } else {
                    OverlayOutcome::None
                }
            }
            OverlayCommand::SetFpsHud(location) => {
                if self.settings.fps_hud_location == location {
                    return OverlayOutcome::None;
                }
                self.settings.fps_hud_location = location;
                OverlayOutcome::SettingsChanged
            }
        }
    }

    /// Count a presented frame; returns the new rate once per second
    pub fn frame(&mut self, now: Instant) -> Option<f32> {
        self.fps.tick(now)
    }

    pub fn fps(&self) -> f32 {
        self.fps.fps()
    }
}

/// Next HUD corner, cycling through `None`
pub fn next_hud_location(location: HudLocation) -> HudLocation {
    match location {
        HudLocation::None => HudLocation::TopLeft,
        HudLocation::TopLeft => HudLocation::TopRight,
        HudLocation::TopRight => HudLocation::BottomLeft,
        HudLocation::BottomLeft => HudLocation::BottomRight,
        HudLocation::BottomRight => HudLocation::None,
    }
}

/// Frames-per-second over one second windows
#[derive(Debug, Default)]
pub struct FpsCounter {
    window_start: Option<Instant>,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self, now: Instant) -> Option<f32> {
        let start = *self.window_start.get_or_insert(now);
        self.frames += 1;

        let elapsed = now.duration_since(start);
        if elapsed < Duration::from_secs(1) {
            return None;
        }

        self.fps = self.frames as f32 / elapsed.as_secs_f32();
        self.frames = 0;
        self.window_start = Some(now);
        Some(self.fps)
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

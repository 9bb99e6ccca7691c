//! Configuration system for nativehost

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub window: WindowConfig,
    pub paths: PathConfig,
    pub relay: RelayConfig,
    pub overlay: OverlaySettings,
    pub debug: DebugConfig,
}

/// General host settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Symbol the guest entry point is resolved under
    pub entry_point: String,
    /// Give up waiting for the guest thread after this long (unbounded when unset)
    pub shutdown_timeout_ms: Option<u64>,
}

/// Host window settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub start_fullscreen: bool,
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    pub game_dir: PathBuf,
    pub data_dir: PathBuf,
    pub cache_dir: PathBuf,
}

/// Event relay sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Maximum number of buffered relay events
    pub capacity: usize,
    /// Maximum number of pending raw input events
    pub input_queue_capacity: usize,
}

/// Overlay settings, persisted when the overlay changes them
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OverlaySettings {
    /// Force the overlay on or off; follows GPU capability when unset
    pub enable_overlay: Option<bool>,
    pub enable_menubar: bool,
    pub fps_hud_location: HudLocation,
}

/// Corner the FPS HUD is drawn in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum HudLocation {
    #[default]
    None,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Debug settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub log_level: LogLevel,
    pub log_to_file: bool,
    pub log_path: PathBuf,
}

/// Logging level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Filter directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

// Default implementations

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            entry_point: "ANativeActivity_onCreate".to_string(),
            shutdown_timeout_ms: None,
        }
    }
}

impl GeneralConfig {
    pub fn shutdown_timeout(&self) -> Option<Duration> {
        self.shutdown_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "nativehost".to_string(),
            width: 720,
            height: 480,
            start_fullscreen: false,
        }
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        let base = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nativehost");

        Self {
            game_dir: base.join("game"),
            data_dir: base.join("data"),
            cache_dir: dirs::cache_dir()
                .unwrap_or_else(|| base.clone())
                .join("nativehost"),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            input_queue_capacity: 1024,
        }
    }
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            enable_overlay: None,
            enable_menubar: true,
            fps_hud_location: HudLocation::None,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            log_to_file: false,
            log_path: PathBuf::from("nativehost.log"),
        }
    }
}

impl Config {
    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::debug!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nativehost")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.entry_point, "ANativeActivity_onCreate");
        assert_eq!(config.general.shutdown_timeout(), None);
        assert_eq!(config.window.width, 720);
        assert_eq!(config.window.height, 480);
        assert_eq!(config.relay.capacity, 256);
        assert!(config.overlay.enable_menubar);
        assert_eq!(config.overlay.fps_hud_location, HudLocation::None);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: Config = toml::from_str(
            "[general]\nshutdown_timeout_ms = 2500\n\n[overlay]\nfps_hud_location = \"TopRight\"\n",
        )
        .unwrap();
        assert_eq!(parsed.general.entry_point, "ANativeActivity_onCreate");
        assert_eq!(parsed.general.shutdown_timeout(), Some(Duration::from_millis(2500)));
        assert_eq!(parsed.overlay.fps_hud_location, HudLocation::TopRight);
        assert!(parsed.overlay.enable_menubar);
        assert_eq!(parsed.window.height, 480);
    }

    #[test]
    fn test_load_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.window.width, 720);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.overlay.enable_menubar = false;
        config.debug.log_level = LogLevel::Trace;
        config.save_to(&path).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert!(!reloaded.overlay.enable_menubar);
        assert_eq!(reloaded.debug.log_level, LogLevel::Trace);
    }

    #[test]
    fn test_invalid_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[window]\nwidth = \"wide\"\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
    }
}

//! Core types for nativehost
//!
//! This crate provides the error types, configuration
//! and logging setup shared by the bridge and the host loop.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{Config, HudLocation, LogLevel, OverlaySettings};
pub use error::{BridgeError, ConfigError, HostError, Result, WindowError};

//! Error types for nativehost

use thiserror::Error;

/// Top-level error type for the host process
#[derive(Error, Debug)]
pub enum HostError {
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Window error: {0}")]
    Window(#[from] WindowError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging error: {0}")]
    Logging(String),
}

/// Guest lifecycle errors
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Guest already started")]
    AlreadyStarted,

    #[error("Entry point unavailable: {0}")]
    EntryPointUnavailable(String),

    /// Never returned to callers; a panicking guest collapses to the exited state.
    #[error("Guest thread panicked: {0}")]
    GuestThreadPanic(String),

    #[error("Failed to spawn guest thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),
}

/// Configuration file errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Host window errors
#[derive(Error, Debug)]
pub enum WindowError {
    #[error("Event loop error: {0}")]
    EventLoop(String),

    #[error("Window creation failed: {0}")]
    Create(String),
}

/// Result type alias for host operations
pub type Result<T> = std::result::Result<T, HostError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BridgeError::EntryPointUnavailable("ANativeActivity_onCreate".to_string());
        assert_eq!(
            format!("{}", err),
            "Entry point unavailable: ANativeActivity_onCreate"
        );
        assert_eq!(format!("{}", BridgeError::AlreadyStarted), "Guest already started");
    }

    #[test]
    fn test_error_conversion() {
        let host_err: HostError = BridgeError::AlreadyStarted.into();
        assert!(matches!(host_err, HostError::Bridge(BridgeError::AlreadyStarted)));

        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let host_err: HostError = ConfigError::from(io).into();
        assert!(matches!(host_err, HostError::Config(ConfigError::Io(_))));
    }
}

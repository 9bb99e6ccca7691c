//! Logging setup

use crate::config::DebugConfig;
use crate::error::HostError;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init(debug: &DebugConfig) -> Result<(), HostError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(debug.log_level.as_directive()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true);

    let result = if debug.log_to_file {
        let file = std::fs::File::create(&debug.log_path)?;
        builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| HostError::Logging(e.to_string()))
}

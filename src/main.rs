//! nativehost - desktop host for an activity-model guest runtime
//!
//! Main entry point: loads configuration, starts the guest on its own thread
//! and runs the window loop on the main thread.

mod demo_guest;

use nh_bridge::{LifecycleBridge, SymbolTable};
use nh_core::{logging, Config};

fn main() -> anyhow::Result<()> {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config, using defaults: {e}");
            Config::default()
        }
    };

    logging::init(&config.debug)?;
    tracing::info!("Starting nativehost");
    tracing::debug!(
        "Paths: game={}, data={}, cache={}",
        config.paths.game_dir.display(),
        config.paths.data_dir.display(),
        config.paths.cache_dir.display()
    );

    let mut symbols = SymbolTable::new();
    demo_guest::register(&mut symbols, &config.general.entry_point);

    let bridge = LifecycleBridge::with_relay_capacity(config.relay.capacity);
    bridge.start_resolved(&symbols, &config.general.entry_point)?;

    nh_host::run_host(&config, bridge.clone())?;

    // Window loop is gone; nothing more will be pumped for the guest
    bridge.set_looper_running(false);
    bridge.request_exit();

    match config.general.shutdown_timeout() {
        Some(timeout) => {
            if !bridge.wait_for_exit_timeout(timeout) {
                tracing::warn!(
                    "Guest did not exit within {} ms, leaving it behind",
                    timeout.as_millis()
                );
            }
        }
        None => bridge.wait_for_exit(),
    }

    tracing::info!("nativehost exited ({})", bridge.state());
    Ok(())
}

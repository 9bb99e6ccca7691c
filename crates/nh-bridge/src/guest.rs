//! Guest entry points and the host table handed to them

use crate::bridge::LifecycleBridge;
use crate::lifecycle::LifecycleState;
use crate::relay::RelayDrain;
use nh_core::BridgeError;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type GuestMain = Box<dyn FnOnce(GuestContext) + Send + 'static>;
type SharedGuestMain = Arc<dyn Fn(GuestContext) + Send + Sync + 'static>;

/// Loaded guest entry point.
///
/// Consumed by the guest thread when it is invoked, so it cannot outlive
/// the guest run.
pub struct GuestRuntimeHandle {
    symbol: String,
    main: GuestMain,
}

impl GuestRuntimeHandle {
    pub fn new(symbol: impl Into<String>, main: impl FnOnce(GuestContext) + Send + 'static) -> Self {
        Self {
            symbol: symbol.into(),
            main: Box::new(main),
        }
    }

    /// Symbol the entry point was resolved from
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub(crate) fn invoke(self, ctx: GuestContext) {
        (self.main)(ctx)
    }
}

impl fmt::Debug for GuestRuntimeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuestRuntimeHandle")
            .field("symbol", &self.symbol)
            .finish_non_exhaustive()
    }
}

/// Host table passed to the guest entry point.
///
/// Everything the guest may do to the bridge goes through here.
#[derive(Clone)]
pub struct GuestContext {
    bridge: Arc<LifecycleBridge>,
}

impl GuestContext {
    pub(crate) fn new(bridge: Arc<LifecycleBridge>) -> Self {
        Self { bridge }
    }

    /// Take all relay events published since the last call
    pub fn drain(&self) -> RelayDrain {
        self.bridge.drain()
    }

    pub fn exit_requested(&self) -> bool {
        self.bridge.exit_requested()
    }

    pub fn request_exit(&self) {
        self.bridge.request_exit();
    }

    /// Report whether the guest looper is pumping events
    pub fn set_looper_running(&self, running: bool) {
        self.bridge.set_looper_running(running);
    }

    pub fn state(&self) -> LifecycleState {
        self.bridge.state()
    }

    /// Name of the calling thread, `guest-main` inside the entry point
    pub fn thread_name(&self) -> Option<String> {
        std::thread::current().name().map(str::to_string)
    }
}

impl fmt::Debug for GuestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuestContext")
            .field("state", &self.bridge.state())
            .finish()
    }
}

/// Resolves guest entry points by symbol name
pub trait EntryPointResolver {
    fn resolve(&self, symbol: &str) -> Result<GuestRuntimeHandle, BridgeError>;
}

/// In-process symbol table of guest entry points
#[derive(Default)]
pub struct SymbolTable {
    entries: HashMap<String, SharedGuestMain>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entry point, replacing any previous one under `symbol`
    pub fn register(
        &mut self,
        symbol: impl Into<String>,
        main: impl Fn(GuestContext) + Send + Sync + 'static,
    ) {
        let symbol = symbol.into();
        tracing::debug!("Registered guest entry point '{}'", symbol);
        self.entries.insert(symbol, Arc::new(main));
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.entries.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl EntryPointResolver for SymbolTable {
    fn resolve(&self, symbol: &str) -> Result<GuestRuntimeHandle, BridgeError> {
        let main = self
            .entries
            .get(symbol)
            .cloned()
            .ok_or_else(|| BridgeError::EntryPointUnavailable(symbol.to_string()))?;
        Ok(GuestRuntimeHandle::new(symbol, move |ctx| main(ctx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_registered_symbol() {
        let mut table = SymbolTable::new();
        table.register("ANativeActivity_onCreate", |_ctx| {});

        let handle = table.resolve("ANativeActivity_onCreate").unwrap();
        assert_eq!(handle.symbol(), "ANativeActivity_onCreate");
        assert!(table.contains("ANativeActivity_onCreate"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_resolve_missing_symbol() {
        let table = SymbolTable::new();
        let err = table.resolve("missing").unwrap_err();
        assert!(matches!(err, BridgeError::EntryPointUnavailable(ref s) if s == "missing"));
        assert!(table.is_empty());
    }
}

//! The call dispatcher: the single entry point through which host code
//! reaches foreign functions.

use std::sync::Arc;

use crate::config::BridgeConfig;
use crate::engine::{ForeignEngine, RawResult};
use crate::error::{BridgeError, BridgeResult};

use super::marshal::{self, BridgeValue};
use super::proxy::ForeignHandleProxy;
use super::registry::{ReleaseMode, SweepStats, WeakHandleRegistry};

/// The bridge to one embedded engine instance.
///
/// Owns the engine, the weak-handle registry, and the release policy. An
/// explicit object rather than process-global state, so hosts can run several
/// independent bridges and tests can construct throwaway ones. Clones share
/// the same underlying bridge.
pub struct Bridge<E: ForeignEngine> {
    inner: Arc<BridgeInner<E>>,
}

pub(crate) struct BridgeInner<E: ForeignEngine> {
    pub(crate) engine: E,
    pub(crate) registry: WeakHandleRegistry<E>,
    pub(crate) release_mode: ReleaseMode,
}

impl<E: ForeignEngine> Bridge<E> {
    pub fn new(engine: E) -> Self {
        Self::with_mode(engine, ReleaseMode::default())
    }

    pub fn with_mode(engine: E, release_mode: ReleaseMode) -> Self {
        Self {
            inner: Arc::new(BridgeInner {
                engine,
                registry: WeakHandleRegistry::new(),
                release_mode,
            }),
        }
    }

    pub fn from_config(engine: E, config: &BridgeConfig) -> Self {
        Self::with_mode(engine, config.sweep.release_mode)
    }

    /// Invoke the named foreign function.
    ///
    /// The host-facing hyphenated name is translated to the engine's
    /// underscore convention. Each argument is classified by the marshaller;
    /// handle results come back as registered proxies, encoded results are
    /// decoded to host-native values. Engine faults propagate unmodified,
    /// with no retry and no local recovery.
    pub fn invoke(&self, name: &str, args: &[BridgeValue<E>]) -> BridgeResult<BridgeValue<E>> {
        BridgeInner::invoke(&self.inner, name, args)
    }

    /// Run one sweep pass over the weak-handle registry.
    pub fn sweep(&self) -> SweepStats {
        self.inner.sweep()
    }

    /// Number of registry entries, live or not yet swept.
    pub fn tracked_handles(&self) -> usize {
        self.inner.registry.len()
    }

    pub fn release_mode(&self) -> ReleaseMode {
        self.inner.release_mode
    }

    pub fn engine(&self) -> &E {
        &self.inner.engine
    }

    pub(crate) fn inner(&self) -> &Arc<BridgeInner<E>> {
        &self.inner
    }
}

impl<E: ForeignEngine> Clone for Bridge<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: ForeignEngine> BridgeInner<E> {
    pub(crate) fn invoke(
        inner: &Arc<Self>,
        name: &str,
        args: &[BridgeValue<E>],
    ) -> BridgeResult<BridgeValue<E>> {
        let engine_name = name.replace('-', "_");
        let mut marshalled = Vec::with_capacity(args.len());
        for arg in args {
            marshalled.push(marshal::classify(arg)?);
        }
        tracing::debug!(
            target: "bridge",
            name = %engine_name,
            args = marshalled.len(),
            "dispatching foreign call"
        );

        match inner.engine.invoke(&engine_name, &marshalled)? {
            RawResult::Handle(handle) => {
                let proxy = ForeignHandleProxy::new(handle, Arc::clone(inner));
                inner.registry.register(&proxy);
                Ok(BridgeValue::Handle(proxy))
            }
            RawResult::Encoded(text) => serde_json::from_str(&text)
                .map(BridgeValue::Native)
                .map_err(|e| BridgeError::Decode(e.to_string())),
        }
    }

    pub(crate) fn sweep(&self) -> SweepStats {
        self.registry.sweep(&self.engine, self.release_mode)
    }
}

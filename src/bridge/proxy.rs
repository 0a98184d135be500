//! Host-visible wrapper around one foreign handle.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::engine::{ForeignEngine, ForeignHandle};
use crate::error::{BridgeError, BridgeResult};

use super::dispatch::BridgeInner;
use super::marshal::BridgeValue;
use super::registry::ReleaseMode;

/// Proxy for exactly one engine-owned object.
///
/// Clones share the same identity: one underlying handle and one registry
/// entry. The handle is released when the last clone drops (deterministic
/// mode) or on the sweep pass that discovers the proxy dead (sweep-only
/// mode). Nothing the proxy exposes deallocates the handle directly.
pub struct ForeignHandleProxy<E: ForeignEngine> {
    shared: Arc<ProxyShared<E>>,
}

pub(crate) struct ProxyShared<E: ForeignEngine> {
    handle: ForeignHandle,
    bridge: Arc<BridgeInner<E>>,
}

impl<E: ForeignEngine> ForeignHandleProxy<E> {
    pub(crate) fn new(handle: ForeignHandle, bridge: Arc<BridgeInner<E>>) -> Self {
        Self {
            shared: Arc::new(ProxyShared { handle, bridge }),
        }
    }

    /// The opaque handle this proxy wraps.
    pub fn handle(&self) -> ForeignHandle {
        self.shared.handle
    }

    /// Convert the foreign value to a host-native one.
    ///
    /// Issues a fresh serialization request to the engine on every call.
    /// Nothing is cached, so the result always reflects the handle's current
    /// foreign-side state.
    pub fn to_native(&self) -> BridgeResult<serde_json::Value> {
        let text = self.shared.bridge.engine.serialize(self.shared.handle)?;
        serde_json::from_str(&text).map_err(|e| BridgeError::Decode(e.to_string()))
    }

    /// Forward a method call to the engine by name, with this proxy prepended
    /// as the first argument. The name goes through the same hyphen
    /// translation as a top-level invocation.
    pub fn call(&self, method: &str, args: &[BridgeValue<E>]) -> BridgeResult<BridgeValue<E>> {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(BridgeValue::Handle(self.clone()));
        full.extend(args.iter().cloned());
        BridgeInner::invoke(&self.shared.bridge, method, &full)
    }

    pub(crate) fn downgrade(&self) -> Weak<ProxyShared<E>> {
        Arc::downgrade(&self.shared)
    }
}

impl<E: ForeignEngine> Clone for ForeignHandleProxy<E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<E: ForeignEngine> fmt::Debug for ForeignHandleProxy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ForeignHandleProxy")
            .field(&self.shared.handle.raw())
            .finish()
    }
}

impl<E: ForeignEngine> Drop for ProxyShared<E> {
    fn drop(&mut self) {
        // Last strong reference is gone. Under deterministic release the
        // finalize contract runs right here; the registry entry is pruned by
        // the next sweep without finalizing again.
        if self.bridge.release_mode == ReleaseMode::Deterministic {
            self.bridge.engine.finalize(&[self.handle]);
            tracing::trace!(target: "bridge", handle = self.handle.raw(), "handle finalized on drop");
        }
    }
}

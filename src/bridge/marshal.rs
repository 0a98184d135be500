//! Argument marshalling across the host/engine boundary.
//!
//! Classification is binary: a value is either a foreign handle, passed
//! through with identical identity, or a plain host value, serialized to the
//! interchange form. Composite host values that happen to contain proxies get
//! no structural treatment.

use crate::engine::{Arg, ForeignEngine};
use crate::error::{BridgeError, BridgeResult};

use super::proxy::ForeignHandleProxy;

/// A value on the host side of the boundary: either a plain JSON-compatible
/// value or a proxy to an engine-owned object.
pub enum BridgeValue<E: ForeignEngine> {
    Native(serde_json::Value),
    Handle(ForeignHandleProxy<E>),
}

impl<E: ForeignEngine> BridgeValue<E> {
    pub fn as_native(&self) -> Option<&serde_json::Value> {
        match self {
            BridgeValue::Native(value) => Some(value),
            BridgeValue::Handle(_) => None,
        }
    }

    pub fn as_handle(&self) -> Option<&ForeignHandleProxy<E>> {
        match self {
            BridgeValue::Handle(proxy) => Some(proxy),
            BridgeValue::Native(_) => None,
        }
    }

    pub fn into_native(self) -> Option<serde_json::Value> {
        match self {
            BridgeValue::Native(value) => Some(value),
            BridgeValue::Handle(_) => None,
        }
    }

    pub fn into_handle(self) -> Option<ForeignHandleProxy<E>> {
        match self {
            BridgeValue::Handle(proxy) => Some(proxy),
            BridgeValue::Native(_) => None,
        }
    }
}

impl<E: ForeignEngine> std::fmt::Debug for BridgeValue<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BridgeValue::Native(value) => f.debug_tuple("Native").field(value).finish(),
            BridgeValue::Handle(proxy) => f.debug_tuple("Handle").field(proxy).finish(),
        }
    }
}

impl<E: ForeignEngine> Clone for BridgeValue<E> {
    fn clone(&self) -> Self {
        match self {
            BridgeValue::Native(value) => BridgeValue::Native(value.clone()),
            BridgeValue::Handle(proxy) => BridgeValue::Handle(proxy.clone()),
        }
    }
}

impl<E: ForeignEngine> From<serde_json::Value> for BridgeValue<E> {
    fn from(value: serde_json::Value) -> Self {
        BridgeValue::Native(value)
    }
}

impl<E: ForeignEngine> From<ForeignHandleProxy<E>> for BridgeValue<E> {
    fn from(proxy: ForeignHandleProxy<E>) -> Self {
        BridgeValue::Handle(proxy)
    }
}

/// Classify one call argument.
///
/// Proxies are never re-encoded; the engine receives the same opaque handle
/// the proxy wraps. Everything else is encoded to interchange JSON, and a
/// non-encodable value is a fatal [`BridgeError::Encode`].
pub fn classify<E: ForeignEngine>(value: &BridgeValue<E>) -> BridgeResult<Arg> {
    match value {
        BridgeValue::Handle(proxy) => Ok(Arg::Handle(proxy.handle())),
        BridgeValue::Native(native) => serde_json::to_string(native)
            .map(Arg::Encoded)
            .map_err(|e| BridgeError::Encode(e.to_string())),
    }
}

/// Foreign-engine contract and boundary types.
///
/// The bridge never inspects foreign data directly; everything it knows about
/// the engine goes through [`ForeignEngine`]. Values crossing the boundary are
/// either opaque handles or interchange-encoded JSON text, never both.
use crate::error::BridgeResult;

pub mod quickjs;

pub use quickjs::QuickJsEngine;

/// Opaque identifier for an object owned by the foreign engine.
///
/// The host cannot inspect the value behind a handle except by calling back
/// into the engine (`serialize`). Handles are only minted by the engine as
/// call results and only released through the `finalize` contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ForeignHandle(u64);

impl ForeignHandle {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// A call argument after classification: either the identical opaque handle,
/// or the interchange encoding of a plain value. This union is the whole
/// type-bridging policy. Composite host values containing embedded handles
/// get no structural treatment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Handle(ForeignHandle),
    Encoded(String),
}

/// What the engine hands back from an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawResult {
    /// Opaque handle to an engine-owned object.
    Handle(ForeignHandle),
    /// Interchange-encoded plain value.
    Encoded(String),
}

/// Contract required from the embedded interpreter.
///
/// Invocations are synchronous and blocking; control does not return to the
/// host until the engine does. There is no timeout, so a call that never
/// returns blocks the host indefinitely.
pub trait ForeignEngine {
    /// Execute the named foreign function. The name is already in
    /// engine-facing (underscore) form.
    fn invoke(&self, name: &str, args: &[Arg]) -> BridgeResult<RawResult>;

    /// Produce the interchange encoding of the value behind a handle.
    fn serialize(&self, handle: ForeignHandle) -> BridgeResult<String>;

    /// Release engine-side resources for the given handles. Infallible from
    /// the host's point of view; a handle the engine no longer knows is
    /// ignored.
    fn finalize(&self, handles: &[ForeignHandle]);
}

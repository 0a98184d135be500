//! Host↔engine bridging: dispatch, marshalling, handle proxies, and the
//! weak-handle registry with its finalization sweep.

pub mod dispatch;
pub mod marshal;
pub mod proxy;
pub mod registry;
pub mod sweeper;

pub use dispatch::Bridge;
pub use marshal::{classify, BridgeValue};
pub use proxy::ForeignHandleProxy;
pub use registry::{ReleaseMode, SweepStats};
pub use sweeper::{FinalizationSweeper, SweepTimer, DEFAULT_SWEEP_INTERVAL};

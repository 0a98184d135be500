//! # script_bridge
//!
//! A bridge between a Rust host and an embedded interpreter engine.
//!
//! Host code invokes named foreign functions through a single entry point,
//! [`Bridge::invoke`]. Each argument crosses the boundary in one of two ways:
//! proxies to engine-owned objects pass through as opaque handles with
//! identical identity, and everything else is serialized to interchange
//! JSON. Results come back the same way: a handle result is wrapped in a
//! [`ForeignHandleProxy`] and tracked by a weak-handle registry, while an
//! encoded result is decoded to a host-native value.
//!
//! Foreign-side resources are released through the engine's finalize
//! contract, either deterministically when the last proxy clone drops
//! (default) or by the periodic sweep over the registry (compatibility mode).
//!
//! ## Example
//!
//! ```ignore
//! use script_bridge::{Bridge, QuickJsEngine};
//! use serde_json::json;
//!
//! let engine = QuickJsEngine::new()?;
//! engine.eval("function make_list(...xs) { return xs; }")?;
//!
//! let bridge = Bridge::new(engine);
//! let list = bridge
//!     .invoke("make-list", &[json!(1).into(), json!(2).into()])?
//!     .into_handle()
//!     .unwrap();
//! assert_eq!(list.to_native()?, json!([1, 2]));
//! ```
//!
//! ## Modules
//!
//! - [`bridge`]: dispatch, marshalling, proxies, registry and sweeper
//! - [`engine`]: the foreign-engine contract and the QuickJS adapter
//! - [`config`]: TOML/JSON configuration with env overrides
//! - [`error`]: the fault taxonomy

/// Call dispatch, marshalling, handle proxies and finalization sweeping
pub mod bridge;
/// Configuration loading and validation
pub mod config;
/// Foreign-engine contract and adapters
pub mod engine;
/// Error types
pub mod error;

pub use bridge::{
    Bridge, BridgeValue, FinalizationSweeper, ForeignHandleProxy, ReleaseMode, SweepStats,
    SweepTimer, DEFAULT_SWEEP_INTERVAL,
};
pub use config::{BridgeConfig, LoggingConfig, SweepConfig};
pub use engine::{Arg, ForeignEngine, ForeignHandle, QuickJsEngine, RawResult};
pub use error::{BridgeError, BridgeResult};

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise the configured level applies.
/// Safe to call more than once. Later calls are no-ops.
pub fn init_logging(config: &LoggingConfig) {
    if !config.log_to_console {
        return;
    }
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.level.as_filter()));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

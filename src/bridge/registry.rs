//! Weak-handle registry and the sweep pass.
//!
//! Every proxy the dispatcher hands out is observed here through a weak
//! reference. The raw handle is stored beside the weak reference so the
//! handle can still be finalized after the proxy is gone. The registry is
//! mutated from exactly two places: the dispatcher appends, the sweep
//! replaces.

use std::sync::{Mutex, Weak};

use serde::{Deserialize, Serialize};

use crate::engine::{ForeignEngine, ForeignHandle};

use super::proxy::{ForeignHandleProxy, ProxyShared};

/// When foreign-side resources are released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReleaseMode {
    /// The last strong reference dropping finalizes the handle immediately;
    /// the sweep only prunes dead registry entries.
    #[default]
    Deterministic,
    /// Compatibility mode: nothing happens at drop, the sweep pass both
    /// prunes dead entries and finalizes their handles.
    SweepOnly,
}

impl std::str::FromStr for ReleaseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deterministic" => Ok(ReleaseMode::Deterministic),
            "sweep-only" => Ok(ReleaseMode::SweepOnly),
            other => Err(format!("unknown release mode: {other}")),
        }
    }
}

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    /// Entries whose proxy was still reachable and were carried over.
    pub surviving: usize,
    /// Entries whose proxy had been reclaimed and were dropped.
    pub reclaimed: usize,
}

struct WeakHandleEntry<E: ForeignEngine> {
    handle: ForeignHandle,
    proxy: Weak<ProxyShared<E>>,
}

pub(crate) struct WeakHandleRegistry<E: ForeignEngine> {
    entries: Mutex<Vec<WeakHandleEntry<E>>>,
}

impl<E: ForeignEngine> WeakHandleRegistry<E> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Track a freshly created proxy. Called exactly once per proxy, by the
    /// dispatcher, right after the engine returned a handle result.
    pub(crate) fn register(&self, proxy: &ForeignHandleProxy<E>) {
        self.entries.lock().unwrap().push(WeakHandleEntry {
            handle: proxy.handle(),
            proxy: proxy.downgrade(),
        });
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Single sweep pass.
    ///
    /// A failed weak upgrade is not an error. It is the expected "already
    /// reclaimed" case. Dead entries are dropped and, in sweep-only mode,
    /// their handles go to the finalize contract as one batch; in
    /// deterministic mode the proxy's drop already finalized them.
    pub(crate) fn sweep(&self, engine: &E, mode: ReleaseMode) -> SweepStats {
        let mut dead = Vec::new();
        let stats = {
            let mut entries = self.entries.lock().unwrap();
            let mut surviving = Vec::with_capacity(entries.len());
            for entry in entries.drain(..) {
                if entry.proxy.upgrade().is_some() {
                    surviving.push(entry);
                } else {
                    dead.push(entry.handle);
                }
            }
            let stats = SweepStats {
                surviving: surviving.len(),
                reclaimed: dead.len(),
            };
            *entries = surviving;
            stats
        };

        // Finalize outside the lock; the engine may call back into the bridge.
        if mode == ReleaseMode::SweepOnly && !dead.is_empty() {
            engine.finalize(&dead);
        }
        tracing::debug!(
            target: "bridge.sweep",
            surviving = stats.surviving,
            reclaimed = stats.reclaimed,
            "sweep pass complete"
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::dispatch::Bridge;
    use crate::bridge::testutil::RecordingEngine;

    #[test]
    fn sweep_prunes_dead_entries_and_finalizes_them_in_sweep_only_mode() {
        let bridge = Bridge::with_mode(RecordingEngine::new(), ReleaseMode::SweepOnly);
        let kept = bridge
            .invoke("make_obj", &[])
            .unwrap()
            .into_handle()
            .unwrap();
        let dropped = bridge
            .invoke("make_obj", &[])
            .unwrap()
            .into_handle()
            .unwrap();
        let dropped_handle = dropped.handle();
        assert_eq!(bridge.tracked_handles(), 2);

        drop(dropped);
        let stats = bridge.sweep();
        assert_eq!(stats, SweepStats { surviving: 1, reclaimed: 1 });
        assert_eq!(bridge.tracked_handles(), 1);
        assert_eq!(bridge.engine().finalized(), vec![dropped_handle]);

        // A reclaimed entry is never observed again.
        let stats = bridge.sweep();
        assert_eq!(stats, SweepStats { surviving: 1, reclaimed: 0 });
        assert_eq!(bridge.engine().finalized(), vec![dropped_handle]);

        drop(kept);
        let stats = bridge.sweep();
        assert_eq!(stats, SweepStats { surviving: 0, reclaimed: 1 });
        assert_eq!(bridge.engine().finalized().len(), 2);
    }

    #[test]
    fn deterministic_sweep_prunes_without_double_finalize() {
        let bridge = Bridge::new(RecordingEngine::new());
        let proxy = bridge
            .invoke("make_obj", &[])
            .unwrap()
            .into_handle()
            .unwrap();
        let handle = proxy.handle();

        drop(proxy);
        assert_eq!(bridge.engine().finalized(), vec![handle]);

        let stats = bridge.sweep();
        assert_eq!(stats, SweepStats { surviving: 0, reclaimed: 1 });
        assert_eq!(bridge.engine().finalized(), vec![handle]);
    }

    #[test]
    fn surviving_entries_are_never_finalized() {
        let bridge = Bridge::with_mode(RecordingEngine::new(), ReleaseMode::SweepOnly);
        let proxy = bridge
            .invoke("make_obj", &[])
            .unwrap()
            .into_handle()
            .unwrap();

        bridge.sweep();
        bridge.sweep();
        assert!(bridge.engine().finalized().is_empty());
        drop(proxy);
    }
}

//! Periodic finalization sweeping.
//!
//! Two flavors: [`FinalizationSweeper`] runs sweeps on its own thread for
//! engines that are `Send + Sync`, with an explicit shutdown handle;
//! [`SweepTimer`] is the cooperative variant for single-threaded engines,
//! where the host polls [`SweepTimer::due`] from its own loop and calls
//! [`Bridge::sweep`] itself. Either way sweeps fire at a fixed interval and
//! never overlap.

use std::sync::{Arc, Weak};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, select, tick, Receiver, Sender};

use crate::engine::ForeignEngine;

use super::dispatch::{Bridge, BridgeInner};

/// The interval the original bridge swept at.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10);

/// Background sweeper thread.
///
/// Holds only a weak reference to the bridge, so an abandoned bridge stops
/// its sweeper instead of being kept alive by it. Dropping the sweeper shuts
/// it down.
pub struct FinalizationSweeper {
    shutdown_tx: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl FinalizationSweeper {
    pub fn spawn<E>(bridge: &Bridge<E>, interval: Duration) -> Self
    where
        E: ForeignEngine + Send + Sync + 'static,
    {
        let inner: Weak<BridgeInner<E>> = Arc::downgrade(bridge.inner());
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let ticker = tick(interval);

        let thread = std::thread::spawn(move || loop {
            select! {
                recv(ticker) -> _ => match inner.upgrade() {
                    Some(inner) => {
                        inner.sweep();
                    }
                    None => break,
                },
                recv(shutdown_rx) -> _ => break,
            }
        });

        tracing::debug!(target: "bridge.sweep", interval_ms = interval.as_millis() as u64, "sweeper started");
        Self {
            shutdown_tx,
            thread: Some(thread),
        }
    }

    /// Stop the sweeper and wait for the thread to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.shutdown_tx.send(());
            let _ = thread.join();
            tracing::debug!(target: "bridge.sweep", "sweeper stopped");
        }
    }
}

impl Drop for FinalizationSweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Cooperative sweep schedule for hosts that cannot hand the engine to
/// another thread. `due()` reports at most one elapsed tick per interval.
pub struct SweepTimer {
    ticker: Receiver<Instant>,
}

impl SweepTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            ticker: tick(interval),
        }
    }

    pub fn due(&self) -> bool {
        self.ticker.try_recv().is_ok()
    }
}

impl Default for SweepTimer {
    fn default() -> Self {
        Self::new(DEFAULT_SWEEP_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::registry::ReleaseMode;
    use crate::bridge::testutil::RecordingEngine;

    #[test]
    fn no_sweep_fires_before_the_interval_elapses() {
        let bridge = Bridge::with_mode(RecordingEngine::new(), ReleaseMode::SweepOnly);
        let proxy = bridge
            .invoke("make_obj", &[])
            .unwrap()
            .into_handle()
            .unwrap();
        drop(proxy);

        let sweeper = FinalizationSweeper::spawn(&bridge, Duration::from_millis(200));
        std::thread::sleep(Duration::from_millis(50));
        assert!(bridge.engine().finalized().is_empty());
        assert_eq!(bridge.tracked_handles(), 1);

        std::thread::sleep(Duration::from_millis(300));
        assert_eq!(bridge.engine().finalized().len(), 1);
        assert_eq!(bridge.tracked_handles(), 0);
        sweeper.shutdown();
    }

    #[test]
    fn shutdown_stops_sweeping() {
        let bridge = Bridge::with_mode(RecordingEngine::new(), ReleaseMode::SweepOnly);
        let sweeper = FinalizationSweeper::spawn(&bridge, Duration::from_millis(50));
        sweeper.shutdown();

        let proxy = bridge
            .invoke("make_obj", &[])
            .unwrap()
            .into_handle()
            .unwrap();
        drop(proxy);
        std::thread::sleep(Duration::from_millis(150));
        assert!(bridge.engine().finalized().is_empty());
        assert_eq!(bridge.tracked_handles(), 1);
    }

    #[test]
    fn sweep_timer_reports_elapsed_intervals() {
        let timer = SweepTimer::new(Duration::from_millis(80));
        assert!(!timer.due());

        std::thread::sleep(Duration::from_millis(120));
        assert!(timer.due());
        // Only one tick per elapsed interval.
        assert!(!timer.due());
    }
}

//! Periodic driver - runs a tick on a fixed interval until stopped
//!
//! Ticks run inline in the driver task, so a tick never overlaps its
//! predecessor. Interval ticks that come due while a tick is still running
//! are skipped, not queued. Stopping prevents new ticks but lets an
//! in-flight tick finish.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Work done on every interval
#[async_trait]
pub trait Tick: Send + Sync + 'static {
    /// Driver name for logs
    fn name(&self) -> &'static str;

    async fn tick(&self);

    /// Called when the driver starts and after it stops
    fn set_running(&self, _running: bool) {}
}

/// Counters shared between a driver and its task
#[derive(Debug, Default)]
pub struct DriverStats {
    pub completed_ticks: AtomicU64,
    pub skipped_ticks: AtomicU64,
}

/// Handle to a spawned periodic task
pub struct PeriodicDriver {
    name: &'static str,
    stop_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
    stats: Arc<DriverStats>,
}

impl PeriodicDriver {
    /// Spawn `tick` every `period`; the first tick runs immediately
    pub fn spawn(tick: Arc<dyn Tick>, period: Duration) -> Self {
        let name = tick.name();
        let (stop_tx, stop_rx) = watch::channel(false);
        let stats = Arc::new(DriverStats::default());
        let handle = tokio::spawn(run(tick, period, stop_rx, stats.clone()));
        Self {
            name,
            stop_tx,
            handle: Some(handle),
            stats,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn completed_ticks(&self) -> u64 {
        self.stats.completed_ticks.load(Ordering::SeqCst)
    }

    pub fn skipped_ticks(&self) -> u64 {
        self.stats.skipped_ticks.load(Ordering::SeqCst)
    }

    /// Prevent any further tick from starting; does not wait
    pub fn signal_stop(&self) {
        debug!(driver = self.name, "PeriodicDriver::signal_stop: called");
        let _ = self.stop_tx.send(true);
    }

    /// Wait for the driver task to exit, including any in-flight tick
    ///
    /// Only returns once [`signal_stop`](Self::signal_stop) has been called.
    pub async fn join(&mut self) {
        if let Some(handle) = self.handle.take()
            && let Err(e) = handle.await
        {
            warn!(driver = self.name, error = %e, "Driver task ended abnormally");
        }
    }

    /// Signal the driver to stop and wait for any in-flight tick to finish
    pub async fn stop(&mut self) {
        self.signal_stop();
        self.join().await;
    }
}

impl Drop for PeriodicDriver {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(true);
    }
}

async fn run(tick: Arc<dyn Tick>, period: Duration, mut stop_rx: watch::Receiver<bool>, stats: Arc<DriverStats>) {
    let name = tick.name();
    info!(driver = name, period_secs = period.as_secs_f64(), "Driver started");
    tick.set_running(true);

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let started = Instant::now();
                tick.tick().await;
                stats.completed_ticks.fetch_add(1, Ordering::SeqCst);

                let missed = (started.elapsed().as_nanos() / period.as_nanos().max(1)) as u64;
                if missed > 0 {
                    debug!(driver = name, missed, "Tick overran its interval, skipping missed ticks");
                    stats.skipped_ticks.fetch_add(missed, Ordering::SeqCst);
                    ticker.reset();
                }
            }
        }
    }

    tick.set_running(false);
    info!(driver = name, "Driver stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize};

    #[derive(Default)]
    struct Counter {
        ticks: AtomicUsize,
        in_flight: AtomicUsize,
        overlapped: AtomicBool,
        running: AtomicBool,
        work: Duration,
    }

    #[async_trait]
    impl Tick for Counter {
        fn name(&self) -> &'static str {
            "counter"
        }

        async fn tick(&self) {
            if self.in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
                self.overlapped.store(true, Ordering::SeqCst);
            }
            tokio::time::sleep(self.work).await;
            self.ticks.fetch_add(1, Ordering::SeqCst);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }

        fn set_running(&self, running: bool) {
            self.running.store(running, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_on_interval() {
        let counter = Arc::new(Counter::default());
        let mut driver = PeriodicDriver::spawn(counter.clone(), Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(35)).await;
        assert!(counter.running.load(Ordering::SeqCst));
        driver.stop().await;

        // t = 0, 10, 20, 30
        assert_eq!(counter.ticks.load(Ordering::SeqCst), 4);
        assert_eq!(driver.completed_ticks(), 4);
        assert!(!counter.running.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_tick_skips_instead_of_queueing() {
        let counter = Arc::new(Counter {
            work: Duration::from_secs(25),
            ..Default::default()
        });
        let mut driver = PeriodicDriver::spawn(counter.clone(), Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(60)).await;
        driver.stop().await;

        assert!(!counter.overlapped.load(Ordering::SeqCst));
        assert!(driver.skipped_ticks() >= 2);
        // A queued backlog would have run one tick per elapsed interval
        assert!(counter.ticks.load(Ordering::SeqCst) < 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_waits_for_in_flight_tick() {
        let counter = Arc::new(Counter {
            work: Duration::from_secs(5),
            ..Default::default()
        });
        let mut driver = PeriodicDriver::spawn(counter.clone(), Duration::from_secs(60));

        // Let the first tick start
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(counter.in_flight.load(Ordering::SeqCst), 1);

        driver.stop().await;
        assert_eq!(counter.in_flight.load(Ordering::SeqCst), 0);
        assert_eq!(counter.ticks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_signal_stop_blocks_new_ticks_before_join() {
        let counter = Arc::new(Counter {
            work: Duration::from_secs(5),
            ..Default::default()
        });
        let mut driver = PeriodicDriver::spawn(counter.clone(), Duration::from_secs(1));

        tokio::time::sleep(Duration::from_secs(1)).await;
        driver.signal_stop();

        // Long past several intervals, with nobody joining yet
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(counter.ticks.load(Ordering::SeqCst), 1);
        assert_eq!(counter.in_flight.load(Ordering::SeqCst), 0);

        driver.join().await;
        assert_eq!(counter.ticks.load(Ordering::SeqCst), 1);
        assert!(!counter.running.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_tick_after_stop() {
        let counter = Arc::new(Counter::default());
        let mut driver = PeriodicDriver::spawn(counter.clone(), Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(1)).await;
        driver.stop().await;
        let ticks = counter.ticks.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(counter.ticks.load(Ordering::SeqCst), ticks);
    }
}

//! Fixed-interval background refresh.
//!
//! Each tick runs as its own task so a slow request does not hold back the
//! timer, but a tick is skipped while the previous one is still in flight.
//! A failed tick is logged and the next one runs as usual.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::StudioResult;

#[derive(Debug, Clone)]
pub struct Poller {
    name: &'static str,
    period: Duration,
    in_flight: Arc<AtomicBool>,
}

/// Clears the in-flight flag when the tick task ends, even on panic.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Poller {
    pub fn new(name: &'static str, period: Duration) -> Self {
        Self {
            name,
            period,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Start one tick unless the previous one is still running.
    ///
    /// Returns whether a tick was started.
    pub fn try_tick<F, Fut>(&self, tick: &F) -> bool
    where
        F: Fn() -> Fut,
        Fut: Future<Output = StudioResult<()>> + Send + 'static,
    {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(poller = self.name, "Previous tick still in flight, skipping");
            return false;
        }

        let guard = InFlight(Arc::clone(&self.in_flight));
        let name = self.name;
        let fut = tick();
        tokio::spawn(async move {
            let _guard = guard;
            match fut.await {
                Ok(()) => {}
                Err(e) if e.is_stale() => debug!(poller = name, error = %e, "Stale poll result"),
                Err(e) => warn!(poller = name, error = %e, "Poll failed"),
            }
        });
        true
    }

    /// Tick immediately and then every period until `cancel` fires.
    pub async fn run<F, Fut>(&self, cancel: CancellationToken, tick: F)
    where
        F: Fn() -> Fut,
        Fut: Future<Output = StudioResult<()>> + Send + 'static,
    {
        info!(poller = self.name, "Starting poller (interval: {:?})", self.period);

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(poller = self.name, "Poller stopped");
                    return;
                }
                _ = ticker.tick() => {
                    self.try_tick(&tick);
                }
            }
        }
    }
}

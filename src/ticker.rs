//! Cancellable periodic task.
//!
//! [`TickerTask`] runs a unit of work once per interval on the tokio runtime and sends
//! each result into the application's event channel. The first execution happens one
//! full interval after `start`, never immediately. Cancellation is cooperative: an
//! execution that is already running is allowed to finish, but its result is dropped
//! if the task was stopped in the meantime.

use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Lower bound for any schedule; a zero period would spin.
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(100);
/// Upper bound; keeps the first deadline representable as an `Instant`.
pub const MAX_TICK_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

pub struct TickerTask {
    interval: Duration,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl TickerTask {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.clamp(MIN_TICK_INTERVAL, MAX_TICK_INTERVAL),
            cancel: CancellationToken::new(),
            handle: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Schedule `work` every interval. Any schedule previously started by this ticker
    /// is stopped first, so at most one loop is ever alive per `TickerTask`.
    ///
    /// `work` receives the task's cancellation token so long-running executions can
    /// bail out early; returning `None` sends nothing for that tick.
    pub fn start<M, F, Fut>(&mut self, tx: mpsc::UnboundedSender<M>, mut work: F)
    where
        M: Send + 'static,
        F: FnMut(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Option<M>> + Send + 'static,
    {
        self.stop();
        let cancel = CancellationToken::new();
        self.cancel = cancel.clone();
        let period = self.interval;

        self.handle = Some(tokio::spawn(async move {
            let now = Instant::now();
            let first = now.checked_add(period).unwrap_or(now);
            let mut ticks = time::interval_at(first, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = ticks.tick() => {}
                }

                let result = work(cancel.clone()).await;
                if cancel.is_cancelled() {
                    break;
                }
                if let Some(msg) = result {
                    if tx.send(msg).is_err() {
                        tracing::warn!("ticker: channel closed");
                        break;
                    }
                }
            }
        }));
    }

    /// Signal cancellation. No execution starts after this returns; the loop itself
    /// is not aborted, it exits at its next cancellation check.
    pub fn stop(&mut self) {
        self.cancel.cancel();
        self.handle = None;
    }
}

impl Drop for TickerTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

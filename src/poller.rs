//! Log tailing with an interval chosen from the remaining API quota.
//!
//! [`PollPolicy`] maps "requests left" to a period: fast while the quota is healthy,
//! a linear ramp through the warning band, and a long fixed interval once the quota
//! is nearly gone. The mapping is monotonic (less quota never polls faster) and never
//! returns zero.
//!
//! [`LogPoller`] owns the one [`TickerTask`] used for tailing. The quota is sampled
//! once when a session starts; a long session keeps its interval until the selection
//! changes.

use crate::events::AppEvent;
use crate::gh::client::{ActionsClient, Repository};
use crate::ticker::{TickerTask, MAX_TICK_INTERVAL, MIN_TICK_INTERVAL};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub const QUOTA_SAFE_THRESHOLD: u32 = 1000;
pub const QUOTA_EXHAUSTED_THRESHOLD: u32 = 100;
pub const FAST_INTERVAL: Duration = Duration::from_secs(2);
pub const WARNING_MIN_INTERVAL: Duration = Duration::from_secs(5);
pub const WARNING_MAX_INTERVAL: Duration = Duration::from_secs(30);
pub const EXHAUSTED_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// At or above this many remaining requests the fast interval applies.
    pub safe_threshold: u32,
    /// Below this many remaining requests the exhausted interval applies.
    pub exhausted_threshold: u32,
    pub fast: Duration,
    pub warning_min: Duration,
    pub warning_max: Duration,
    pub exhausted: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            safe_threshold: QUOTA_SAFE_THRESHOLD,
            exhausted_threshold: QUOTA_EXHAUSTED_THRESHOLD,
            fast: FAST_INTERVAL,
            warning_min: WARNING_MIN_INTERVAL,
            warning_max: WARNING_MAX_INTERVAL,
            exhausted: EXHAUSTED_INTERVAL,
        }
    }
}

impl PollPolicy {
    pub fn with_fast_interval(fast: Duration) -> Self {
        Self {
            fast,
            ..Self::default()
        }
    }

    pub fn interval(&self, remaining: u32) -> Duration {
        // Normalize so the bands stay ordered and bounded whatever the configuration.
        let fast = self.fast.clamp(MIN_TICK_INTERVAL, MAX_TICK_INTERVAL);
        let warning_min = self.warning_min.clamp(fast, MAX_TICK_INTERVAL);
        let warning_max = self.warning_max.clamp(warning_min, MAX_TICK_INTERVAL);
        let exhausted = self.exhausted.clamp(warning_max, MAX_TICK_INTERVAL);
        let safe = self.safe_threshold.max(self.exhausted_threshold);

        if remaining >= safe {
            return fast;
        }
        if remaining < self.exhausted_threshold {
            return exhausted;
        }
        // remaining in [exhausted_threshold, safe): ramp from warning_min up to warning_max
        let band = safe - self.exhausted_threshold;
        let depth = safe - remaining;
        warning_min + (warning_max - warning_min) * depth / band
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSession {
    pub job_id: u64,
    pub seq: u64,
    pub interval: Duration,
}

pub struct LogPoller {
    client: Arc<dyn ActionsClient>,
    repo: Repository,
    tx: mpsc::UnboundedSender<AppEvent>,
    policy: PollPolicy,
    ticker: Option<TickerTask>,
    session: Option<PollSession>,
}

impl LogPoller {
    pub fn new(
        client: Arc<dyn ActionsClient>,
        repo: Repository,
        tx: mpsc::UnboundedSender<AppEvent>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            client,
            repo,
            tx,
            policy,
            ticker: None,
            session: None,
        }
    }

    /// Begin tailing `job_id`, replacing any session already running.
    pub fn start(&mut self, job_id: u64, seq: u64) {
        self.stop();

        let remaining = self.client.remaining_quota();
        let interval = self.policy.interval(remaining);
        tracing::info!(job_id, seq, remaining, ?interval, "log polling started");

        let client = self.client.clone();
        let repo = self.repo.clone();
        let mut ticker = TickerTask::new(interval);
        ticker.start(self.tx.clone(), move |cancel| {
            let client = client.clone();
            let repo = repo.clone();
            async move {
                let result = client.fetch_logs(&repo, job_id).await;
                if cancel.is_cancelled() {
                    return None;
                }
                Some(AppEvent::LogsLoaded {
                    job_id,
                    seq,
                    polled: true,
                    result: result.map_err(|e| e.to_string()),
                })
            }
        });

        self.ticker = Some(ticker);
        self.session = Some(PollSession {
            job_id,
            seq,
            interval,
        });
    }

    pub fn stop(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.stop();
        }
        if let Some(session) = self.session.take() {
            tracing::debug!(job_id = session.job_id, "log polling stopped");
        }
    }

    pub fn session(&self) -> Option<PollSession> {
        self.session
    }

    pub fn is_running(&self) -> bool {
        self.ticker.as_ref().is_some_and(TickerTask::is_running)
    }
}

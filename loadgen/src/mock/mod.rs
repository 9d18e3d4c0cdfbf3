use std::{fmt, time::Duration};

use parking_lot::Mutex;
use partly_open_lib::{WorkExecutor, WorkId};
use rama::error::BoxError;
use rand::{Rng as _, SeedableRng as _, rngs::SmallRng};
use tokio_util::sync::CancellationToken;

/// Parameters of the simulated unit of work.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedWorkConfig {
    /// Base latency of a unit of work.
    pub latency: Duration,
    /// Random multiplier on the latency, in the range `[0.0, 1.0]`.
    pub latency_jitter: f64,
    /// Ratio of units of work that fail, in the range `[0.0, 1.0]`.
    pub error_rate: f64,
}

/// [`WorkExecutor`] which doesn't do any actual work,
/// but sleeps for a (jittered) latency and fails at the configured rate.
#[derive(Debug)]
pub struct SimulatedExecutor {
    latency: Duration,
    latency_jitter: f64,
    error_rate: f64,
    rng: Mutex<SmallRng>,
}

impl SimulatedExecutor {
    pub fn new(cfg: SimulatedWorkConfig) -> Self {
        Self::new_with_rng(cfg, SmallRng::from_os_rng())
    }

    pub fn new_with_seed(cfg: SimulatedWorkConfig, seed: u64) -> Self {
        Self::new_with_rng(cfg, SmallRng::seed_from_u64(seed))
    }

    fn new_with_rng(cfg: SimulatedWorkConfig, rng: SmallRng) -> Self {
        Self {
            latency: cfg.latency,
            latency_jitter: clamp_ratio(cfg.latency_jitter),
            error_rate: clamp_ratio(cfg.error_rate),
            rng: Mutex::new(rng),
        }
    }

    /// Draw the latency and outcome of the next unit of work.
    fn plan(&self) -> (Duration, bool) {
        let mut rng = self.rng.lock();

        let latency = if self.latency_jitter <= 0.0 {
            self.latency
        } else {
            let lo = 1.0 - self.latency_jitter;
            let hi = 1.0 + self.latency_jitter;
            let m = rng.random_range(lo..=hi);
            Duration::from_secs_f64((self.latency.as_secs_f64() * m).max(0.0))
        };

        let fail = rng.random_bool(self.error_rate);
        (latency, fail)
    }
}

/// Clamp into `[0.0, 1.0]`, treating NaN as zero.
fn clamp_ratio(ratio: f64) -> f64 {
    if ratio.is_nan() {
        0.0
    } else {
        ratio.clamp(0.0, 1.0)
    }
}

impl WorkExecutor for SimulatedExecutor {
    async fn do_work(&self, cancel: &CancellationToken, work_id: WorkId) -> Result<(), BoxError> {
        let (latency, fail) = self.plan();

        tokio::select! {
            _ = cancel.cancelled() => {
                return Err(SimulatedFailure::Aborted(work_id).into());
            }
            _ = tokio::time::sleep(latency) => {}
        }

        if fail {
            return Err(SimulatedFailure::Failed(work_id).into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulatedFailure {
    /// The unit of work was configured to fail.
    Failed(WorkId),
    /// The run got cancelled while the unit of work was in flight.
    Aborted(WorkId),
}

impl fmt::Display for SimulatedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulatedFailure::Failed(id) => write!(
                f,
                "simulated failure of request #{} for worker #{}",
                id.request_id, id.worker_id
            ),
            SimulatedFailure::Aborted(id) => write!(
                f,
                "request #{} for worker #{} aborted: run cancelled",
                id.request_id, id.worker_id
            ),
        }
    }
}

impl std::error::Error for SimulatedFailure {}

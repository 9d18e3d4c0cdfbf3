//! Arrival driver of the partly open load generator.
//!
//! Workers arrive one by one, spaced by the nominal inter-arrival interval
//! with optional symmetric jitter. Each arrived worker runs its own session
//! concurrently with the driver and with all other sessions. The driver waits
//! for all sessions before returning the first error observed by any of them.

use std::{sync::Arc, time::Duration};

use rama::{
    error::BoxError,
    telemetry::tracing::{self, Instrument as _},
};
use rand::{Rng as _, SeedableRng as _, rngs::SmallRng};
use tokio::{task::JoinSet, time::sleep};
use tokio_util::sync::CancellationToken;

use crate::{
    config::{ArrivalTiming, InvalidConfig, LoadGeneratorConfig},
    work::{WorkExecutor, WorkLogger},
};

mod session;
mod state;


use self::{
    session::{SessionPolicy, WorkerSession},
    state::RunState,
};

/// Generates load by letting workers arrive over time,
/// each issuing requests against a [`WorkExecutor`]
/// and recording them in a [`WorkLogger`].
///
/// A generator is single-shot: [`LoadGenerator::generate_load`] consumes it.
pub struct LoadGenerator<E, L> {
    cfg: LoadGeneratorConfig,
    timing: ArrivalTiming,
    executor: Arc<E>,
    logger: Arc<L>,
    rng: SmallRng,
}

impl<E, L> std::fmt::Debug for LoadGenerator<E, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadGenerator")
            .field("cfg", &self.cfg)
            .field("timing", &self.timing)
            .finish_non_exhaustive()
    }
}

impl<E, L> LoadGenerator<E, L>
where
    E: WorkExecutor,
    L: WorkLogger,
{
    /// Create a new generator, using OS entropy for all random decisions.
    pub fn new(cfg: LoadGeneratorConfig, logger: L, executor: E) -> Result<Self, InvalidConfig> {
        Self::new_with_rng(cfg, SmallRng::from_os_rng(), logger, executor)
    }

    /// Create a new generator whose random decisions are reproducible from `seed`.
    pub fn new_with_seed(
        cfg: LoadGeneratorConfig,
        seed: u64,
        logger: L,
        executor: E,
    ) -> Result<Self, InvalidConfig> {
        Self::new_with_rng(cfg, SmallRng::seed_from_u64(seed), logger, executor)
    }

    /// Create a new generator drawing all random decisions from `rng`.
    ///
    /// The arrival jitter is drawn directly from it, while every worker session
    /// gets its own generator seeded from it at arrival.
    pub fn new_with_rng(
        cfg: LoadGeneratorConfig,
        rng: SmallRng,
        logger: L,
        executor: E,
    ) -> Result<Self, InvalidConfig> {
        let timing = cfg.validate()?;
        Ok(Self {
            cfg,
            timing,
            executor: Arc::new(executor),
            logger: Arc::new(logger),
            rng,
        })
    }

    /// Run the experiment until all workers are done.
    ///
    /// All `max_workers` workers arrive, regardless of cancellation.
    /// Cancelling `cancel` stops the run cooperatively: sessions end at their
    /// next checkpoint, which for a newly arrived worker is after its first
    /// request. The run derives its own child token from it, which gets
    /// cancelled on the first failure without affecting `cancel` itself.
    ///
    /// Returns the first error returned by either the executor or the logger,
    /// as-is. Workers leaving or the request budget running out is not an error.
    pub async fn generate_load(mut self, cancel: CancellationToken) -> Result<(), BoxError> {
        let state = Arc::new(RunState::new(cancel.child_token()));
        let policy = SessionPolicy {
            stay_probability: self.cfg.stay_probability,
            think_time: self.cfg.think_time,
            max_requests: self.cfg.max_requests,
        };

        tracing::info!(
            max_workers = %self.cfg.max_workers,
            sleep_for = ?Duration::from_nanos(self.timing.sleep_for),
            arrival_jitter = ?Duration::from_nanos(self.timing.jitter),
            stay_probability = %policy.stay_probability,
            think_time = ?policy.think_time,
            max_requests = %policy.max_requests,
            "generate load",
        );

        let mut sessions = JoinSet::new();

        for worker_id in 0..self.cfg.max_workers {
            let session = WorkerSession {
                worker_id,
                policy,
                executor: self.executor.clone(),
                logger: self.logger.clone(),
                state: state.clone(),
                rng: SmallRng::from_rng(&mut self.rng),
            };
            sessions.spawn(
                session
                    .run()
                    .instrument(tracing::debug_span!("worker", %worker_id)),
            );
            tracing::debug!(%worker_id, "worker arrived");

            // arrivals are not a cancellation checkpoint: a worker arriving
            // after cancellation still runs its first request
            sleep(self.arrival_delay()).await;
        }

        while let Some(result) = sessions.join_next().await {
            if let Err(err) = result {
                tracing::error!("worker session task failed: {err}");
                state.fail(BoxError::from(err));
            }
        }

        match state.take_error() {
            Some(err) => {
                tracing::info!("load generation aborted: {err}");
                Err(err)
            }
            None => {
                tracing::info!("load generation finished");
                Ok(())
            }
        }
    }

    /// Delay between the arrival of the current and the next worker.
    ///
    /// Draws a magnitude in `[0, jitter)` and either adds it to or
    /// subtracts it from the nominal interval, with equal chance.
    fn arrival_delay(&mut self) -> Duration {
        let ArrivalTiming { sleep_for, jitter } = self.timing;
        if jitter == 0 {
            return Duration::from_nanos(sleep_for);
        }

        let offset = self.rng.random_range(0..jitter);
        if self.rng.random_bool(0.5) {
            Duration::from_nanos(sleep_for.saturating_add(offset))
        } else {
            // offset < jitter <= sleep_for
            Duration::from_nanos(sleep_for - offset)
        }
    }
}

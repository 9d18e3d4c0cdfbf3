use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};

use rama::telemetry::tracing;
use rand::{Rng as _, rngs::SmallRng};
use tokio::time::sleep;

use crate::work::{WorkExecutor, WorkId, WorkLogEntry, WorkLogger};

use super::state::RunState;

/// Per session copy of the config parameters governing the request loop.
#[derive(Debug, Clone, Copy)]
pub(super) struct SessionPolicy {
    pub(super) stay_probability: f64,
    pub(super) think_time: Duration,
    pub(super) max_requests: u64,
}

/// Lifetime of a single worker: issues requests until it leaves,
/// the global budget runs out, the run gets cancelled or a request fails.
pub(super) struct WorkerSession<E, L> {
    pub(super) worker_id: usize,
    pub(super) policy: SessionPolicy,
    pub(super) executor: Arc<E>,
    pub(super) logger: Arc<L>,
    pub(super) state: Arc<RunState>,
    pub(super) rng: SmallRng,
}

/// Why a worker session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SessionEnd {
    /// The stay roll decided the worker is done.
    Left,
    /// The global request budget is exhausted.
    BudgetExhausted,
    /// The run was cancelled.
    Cancelled,
    /// Executing or logging a request failed.
    Failed,
}

impl<E, L> WorkerSession<E, L>
where
    E: WorkExecutor,
    L: WorkLogger,
{
    pub(super) async fn run(mut self) -> SessionEnd {
        let worker_id = self.worker_id;
        let (end, requests) = self.request_loop().await;
        tracing::debug!(%worker_id, %requests, ?end, "worker session ended");
        end
    }

    /// Returns why the session ended together with the amount of completed requests.
    async fn request_loop(&mut self) -> (SessionEnd, usize) {
        let mut request_id = 0;
        loop {
            let work_id = WorkId {
                worker_id: self.worker_id,
                request_id,
            };

            if self.policy.max_requests > 0
                && !self.state.try_spend_request(self.policy.max_requests)
            {
                return (SessionEnd::BudgetExhausted, request_id);
            }

            let start = SystemTime::now();
            if let Err(err) = self
                .executor
                .do_work(self.state.cancel_token(), work_id)
                .await
            {
                self.state.fail(err);
                return (SessionEnd::Failed, request_id);
            }
            let end = SystemTime::now();

            if let Err(err) = self.logger.log(WorkLogEntry { work_id, start, end }).await {
                self.state.fail(err);
                return (SessionEnd::Failed, request_id);
            }
            tracing::trace!(
                worker_id = %work_id.worker_id,
                request_id = %work_id.request_id,
                "work completed",
            );
            request_id += 1;

            if self.rng.random::<f64>() > self.policy.stay_probability {
                return (SessionEnd::Left, request_id);
            }

            if self.state.is_cancelled() {
                return (SessionEnd::Cancelled, request_id);
            }

            if !self.policy.think_time.is_zero() {
                tokio::select! {
                    _ = self.state.cancel_token().cancelled() => {
                        return (SessionEnd::Cancelled, request_id);
                    }
                    _ = sleep(self.policy.think_time) => {}
                }

                if self.state.is_cancelled() {
                    return (SessionEnd::Cancelled, request_id);
                }
            }
        }
    }
}

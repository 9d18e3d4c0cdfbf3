use std::{sync::Arc, time::SystemTime};

use rama::error::BoxError;
use tokio_util::sync::CancellationToken;

/// Identifies one unit of work: the worker issuing it
/// and the zero-based sequence number of the request within that worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkId {
    pub worker_id: usize,
    pub request_id: usize,
}

/// Record of one completed (non-failed) unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkLogEntry {
    pub work_id: WorkId,
    pub start: SystemTime,
    pub end: SystemTime,
}

/// Performs a single unit of work on behalf of a worker session.
///
/// Executors are shared by all sessions and invoked concurrently without
/// any synchronisation, so implementations must be safe for that.
/// The cancellation token is raised as soon as the run is aborted and can be
/// used to return early. Any error is fatal for the whole run.
pub trait WorkExecutor: Send + Sync + 'static {
    fn do_work(
        &self,
        cancel: &CancellationToken,
        work_id: WorkId,
    ) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// Durably records completed units of work.
///
/// Same concurrency contract as [`WorkExecutor`]: shared by all sessions,
/// invoked concurrently, any error is fatal for the whole run.
pub trait WorkLogger: Send + Sync + 'static {
    fn log(&self, entry: WorkLogEntry) -> impl Future<Output = Result<(), BoxError>> + Send;
}

impl<E: WorkExecutor> WorkExecutor for Arc<E> {
    fn do_work(
        &self,
        cancel: &CancellationToken,
        work_id: WorkId,
    ) -> impl Future<Output = Result<(), BoxError>> + Send {
        (**self).do_work(cancel, work_id)
    }
}

impl<L: WorkLogger> WorkLogger for Arc<L> {
    fn log(&self, entry: WorkLogEntry) -> impl Future<Output = Result<(), BoxError>> + Send {
        (**self).log(entry)
    }
}

/// [`WorkExecutor`] backed by an async function or closure.
///
/// Created using [`work_fn`].
#[derive(Debug, Clone)]
pub struct WorkFn<F>(F);

/// Turn an async function or closure into a [`WorkExecutor`].
///
/// The error returned by the closure is boxed as-is,
/// so it can be downcasted again from the error of the run.
pub fn work_fn<F, Fut, E>(f: F) -> WorkFn<F>
where
    F: Fn(CancellationToken, WorkId) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), E>> + Send,
    E: Into<BoxError>,
{
    WorkFn(f)
}

impl<F, Fut, E> WorkExecutor for WorkFn<F>
where
    F: Fn(CancellationToken, WorkId) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), E>> + Send,
    E: Into<BoxError>,
{
    async fn do_work(&self, cancel: &CancellationToken, work_id: WorkId) -> Result<(), BoxError> {
        (self.0)(cancel.clone(), work_id).await.map_err(Into::into)
    }
}

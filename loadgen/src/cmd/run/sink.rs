use std::{
    fs::File,
    io::{BufWriter, Stdout},
    path::Path,
    sync::atomic::{AtomicU64, Ordering},
};

use partly_open_lib::{
    WorkLogEntry, WorkLogger,
    logger::{JsonLogger, NopLogger, StdoutLogger},
};
use rama::error::{BoxError, ErrorContext as _};

/// Destination of the work log of a run.
pub enum WorkLogSink {
    Discard(NopLogger),
    Stdout(JsonLogger<Stdout>),
    Print(StdoutLogger),
    File(JsonLogger<BufWriter<File>>),
}

impl WorkLogSink {
    pub fn stdout() -> Self {
        Self::Stdout(JsonLogger::new(std::io::stdout()))
    }

    /// Human readable entries on stdout, instead of JSON lines.
    pub fn print() -> Self {
        Self::Print(StdoutLogger::new())
    }

    pub fn discard() -> Self {
        Self::Discard(NopLogger::new())
    }

    pub fn try_new_file(path: &Path) -> Result<Self, BoxError> {
        let file = File::create(path).context("create work log file")?;
        Ok(Self::File(JsonLogger::new(BufWriter::new(file))))
    }
}

impl WorkLogger for WorkLogSink {
    async fn log(&self, entry: WorkLogEntry) -> Result<(), BoxError> {
        match self {
            WorkLogSink::Discard(logger) => logger.log(entry).await,
            WorkLogSink::Stdout(logger) => logger.log(entry).await,
            WorkLogSink::Print(logger) => logger.log(entry).await,
            WorkLogSink::File(logger) => logger.log(entry).await,
        }
    }
}

/// Counts the entries successfully logged by the wrapped sink.
pub struct CountingLogger<L> {
    inner: L,
    count: AtomicU64,
}

impl<L> CountingLogger<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            count: AtomicU64::new(0),
        }
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }
}

impl<L: WorkLogger> WorkLogger for CountingLogger<L> {
    async fn log(&self, entry: WorkLogEntry) -> Result<(), BoxError> {
        self.inner.log(entry).await?;
        self.count.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::UNIX_EPOCH;

    use partly_open_lib::WorkId;

    use super::*;

    #[tokio::test]
    async fn test_counting_logger_counts_logged_entries() {
        let logger = CountingLogger::new(WorkLogSink::discard());
        for request_id in 0..3 {
            logger
                .log(WorkLogEntry {
                    work_id: WorkId {
                        worker_id: 0,
                        request_id,
                    },
                    start: UNIX_EPOCH,
                    end: UNIX_EPOCH,
                })
                .await
                .unwrap();
        }
        assert_eq!(logger.count(), 3);
    }

    #[tokio::test]
    async fn test_print_sink_accepts_entries() {
        let logger = CountingLogger::new(WorkLogSink::print());
        logger
            .log(WorkLogEntry {
                work_id: WorkId {
                    worker_id: 1,
                    request_id: 0,
                },
                start: UNIX_EPOCH,
                end: UNIX_EPOCH,
            })
            .await
            .unwrap();
        assert_eq!(logger.count(), 1);
    }
}

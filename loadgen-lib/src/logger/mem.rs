use parking_lot::Mutex;
use rama::error::BoxError;

use crate::work::{WorkLogEntry, WorkLogger};

/// Keeps all entries in memory, in the order they were logged.
#[derive(Debug, Default)]
pub struct MemLogger {
    logs: Mutex<Vec<WorkLogEntry>>,
}

impl MemLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries logged so far.
    pub fn logs(&self) -> Vec<WorkLogEntry> {
        self.logs.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.logs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.lock().is_empty()
    }
}

impl WorkLogger for MemLogger {
    async fn log(&self, entry: WorkLogEntry) -> Result<(), BoxError> {
        self.logs.lock().push(entry);
        Ok(())
    }
}

//! Ready made [`WorkLogger`] sinks.
//!
//! [`WorkLogger`]: crate::work::WorkLogger

mod json;
mod mem;
mod stdout;

pub use self::{json::JsonLogger, mem::MemLogger, stdout::StdoutLogger};

use rama::error::BoxError;

use crate::work::{WorkLogEntry, WorkLogger};

/// Discards every entry.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct NopLogger;

impl NopLogger {
    pub fn new() -> Self {
        Self
    }
}

impl WorkLogger for NopLogger {
    async fn log(&self, _entry: WorkLogEntry) -> Result<(), BoxError> {
        Ok(())
    }
}

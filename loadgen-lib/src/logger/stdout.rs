use std::io::Write;

use rama::error::{BoxError, ErrorContext as _};

use crate::work::{WorkLogEntry, WorkLogger};

/// Prints every entry in its human readable [`Debug`] form to stdout,
/// one entry per line.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct StdoutLogger;

impl StdoutLogger {
    pub fn new() -> Self {
        Self
    }
}

fn write_entry(w: &mut impl Write, entry: &WorkLogEntry) -> Result<(), BoxError> {
    writeln!(w, "{entry:?}").context("print work log entry")?;
    w.flush().context("flush stdout")?;
    Ok(())
}

impl WorkLogger for StdoutLogger {
    async fn log(&self, entry: WorkLogEntry) -> Result<(), BoxError> {
        write_entry(&mut std::io::stdout().lock(), &entry)
    }
}

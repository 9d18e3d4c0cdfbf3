use std::io::Write;

use parking_lot::Mutex;
use rama::error::{BoxError, ErrorContext as _};
use serde::Serialize;

use crate::work::{WorkLogEntry, WorkLogger};

/// Writes every entry as a single JSON object followed by a newline (JSON lines).
///
/// ```text
/// {"work-id":{"worker-id":0,"request-id":1},"start":"...","end":"..."}
/// ```
///
/// Timestamps are RFC 3339 formatted with nanosecond precision.
#[derive(Debug)]
pub struct JsonLogger<W> {
    w: Mutex<W>,
}

impl<W> JsonLogger<W> {
    pub fn new(w: W) -> Self {
        Self { w: Mutex::new(w) }
    }

    /// Consume the logger, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.w.into_inner()
    }
}

impl<W: Write> JsonLogger<W> {
    fn write_entry(&self, entry: &WorkLogEntry) -> Result<(), BoxError> {
        let line = JsonEntry {
            work_id: JsonWorkId {
                worker_id: entry.work_id.worker_id,
                request_id: entry.work_id.request_id,
            },
            start: humantime::format_rfc3339_nanos(entry.start).to_string(),
            end: humantime::format_rfc3339_nanos(entry.end).to_string(),
        };

        let mut w = self.w.lock();
        serde_json::to_writer(&mut *w, &line).context("encode work log entry as json")?;
        w.write_all(b"\n").context("write work log entry delimiter")?;
        w.flush().context("flush work log writer")?;
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct JsonEntry {
    work_id: JsonWorkId,
    start: String,
    end: String,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct JsonWorkId {
    worker_id: usize,
    request_id: usize,
}

impl<W: Write + Send + 'static> WorkLogger for JsonLogger<W> {
    async fn log(&self, entry: WorkLogEntry) -> Result<(), BoxError> {
        self.write_entry(&entry)
    }
}

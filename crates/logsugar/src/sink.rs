#![forbid(unsafe_code)]

//! Row destinations.
//!
//! The formatter never writes to stdout/stderr on its own. Every rendered
//! row goes through a [`Sink`] as a `(tag, message)` pair, synchronously and
//! on the caller's thread. A sink error propagates to the logging call.
//!
//! ```
//! use logsugar::sink::{CaptureSink, Sink};
//!
//! let sink = CaptureSink::new();
//! sink.write_row(".(main.rs:3)", "hello").unwrap();
//! assert_eq!(sink.messages(), vec!["hello"]);
//! ```

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

/// Destination for rendered rows.
pub trait Sink: Send + Sync {
    /// Accept one physical row.
    fn write_row(&self, tag: &str, message: &str) -> io::Result<()>;
}

impl<F> Sink for F
where
    F: Fn(&str, &str) -> io::Result<()> + Send + Sync,
{
    fn write_row(&self, tag: &str, message: &str) -> io::Result<()> {
        self(tag, message)
    }
}

/// Writes `"{tag}: {message}"` lines to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl Sink for StdoutSink {
    fn write_row(&self, tag: &str, message: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{tag}: {message}")
    }
}

/// Writes `"{tag}: {message}"` lines to any writer.
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consume the sink and return the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl<W: Write + Send> Sink for WriterSink<W> {
    fn write_row(&self, tag: &str, message: &str) -> io::Result<()> {
        let mut writer = match self.writer.lock() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        };
        writeln!(writer, "{tag}: {message}")
    }
}

impl<W> fmt::Debug for WriterSink<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterSink").finish_non_exhaustive()
    }
}

/// A captured row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedRow {
    pub tag: String,
    pub message: String,
}

/// Keeps rows in memory, for tests and previews.
///
/// Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct CaptureSink {
    rows: Arc<Mutex<Vec<CapturedRow>>>,
}

impl CaptureSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CapturedRow>> {
        match self.rows.lock() {
            Ok(rows) => rows,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Snapshot of every row so far.
    #[must_use]
    pub fn rows(&self) -> Vec<CapturedRow> {
        self.lock().clone()
    }

    /// Snapshot of the message half of every row.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.lock().iter().map(|r| r.message.clone()).collect()
    }

    /// Snapshot of the tag half of every row.
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        self.lock().iter().map(|r| r.tag.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl Sink for CaptureSink {
    fn write_row(&self, tag: &str, message: &str) -> io::Result<()> {
        self.lock().push(CapturedRow {
            tag: tag.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }
}

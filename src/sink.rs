//! Shared output sink and terminal size probing.
//!
//! Widgets render from background owner threads, so the destination writer
//! must be shareable. A [`Sink`] is a cheap cloneable handle over one
//! `Write` target with two guarantees:
//!
//! - every write is atomic with respect to other sink users (one interior
//!   lock orders all writes), and
//! - every write is flushed immediately, so partially buffered escape
//!   sequences never linger between frames.
//!
//! [`Sink::capture`] returns a sink backed by an in-memory buffer plus an
//! inspection handle, which is how the widget test suites observe rendered
//! byte streams without a terminal.

use parking_lot::Mutex;
use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

/// A thread-safe, auto-flushing handle to a writable destination.
///
/// # Example
///
/// ```
/// use liveline::Sink;
///
/// let (sink, capture) = Sink::capture();
/// sink.write_str("hello").unwrap();
/// assert_eq!(capture.contents(), "hello");
/// ```
#[derive(Clone)]
pub struct Sink {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Sink {
    /// Wrap an arbitrary writer. For live output pass
    /// `std::io::stdout()` or `std::io::stderr()`; sinks are always
    /// injected, never ambient globals.
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Create a sink backed by an in-memory buffer, plus a [`Capture`]
    /// handle for inspecting everything written to it.
    #[must_use]
    pub fn capture() -> (Self, Capture) {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let sink = Self::new(CaptureWriter(Arc::clone(&buf)));
        (sink, Capture { buf })
    }

    /// Write a string, flushing immediately.
    pub fn write_str(&self, s: &str) -> io::Result<usize> {
        let mut writer = self.writer.lock();
        let n = writer.write(s.as_bytes())?;
        writer.flush()?;
        Ok(n)
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut writer = self.writer.lock();
        let n = writer.write(buf)?;
        writer.flush()?;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.lock().flush()
    }
}

impl std::fmt::Debug for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sink").finish_non_exhaustive()
    }
}

struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Read side of a [`Sink::capture`] pair.
#[derive(Clone)]
pub struct Capture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl Capture {
    /// Everything written so far, lossily decoded as UTF-8.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock()).into_owned()
    }

    /// Number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.lock().len()
    }

    /// Whether nothing has been written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discard everything captured so far.
    pub fn clear(&self) {
        self.buf.lock().clear();
    }
}

impl std::fmt::Debug for Capture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capture").field("len", &self.len()).finish()
    }
}

/// Current terminal width in columns, or 0 when stdout is not a TTY
/// (pipes, CI logs) or the size query fails.
#[must_use]
pub fn terminal_width() -> usize {
    if !io::stdout().is_terminal() {
        return 0;
    }
    crossterm::terminal::size().map_or(0, |(w, _)| w as usize)
}

/// Current terminal height in rows, or 0 when stdout is not a TTY or the
/// size query fails.
#[must_use]
pub fn terminal_height() -> usize {
    if !io::stdout().is_terminal() {
        return 0;
    }
    crossterm::terminal::size().map_or(0, |(_, h)| h as usize)
}

//! The matrix: a growable set of addressable terminal rows with a
//! background repaint loop.
//!
//! Rows are slots in an arena owned by the matrix; a [`Row`] handle is an
//! index plus a reference to the shared state, so handles stay valid for
//! the lifetime of the matrix and can be used from any thread. One
//! exclusive lock serializes row writes against the repaint pass.
//!
//! Repaint walks every row in creation order. A modified row is redrawn
//! with an erase-line prefix; an unmodified row contributes a bare newline
//! that preserves its vertical slot without re-sending content. After a
//! periodic pass the cursor moves back up over the region so the next pass
//! overwrites it in place.
//!
//! # Example
//!
//! ```
//! use liveline::{Matrix, Sink};
//! use std::time::Duration;
//!
//! let (sink, capture) = Sink::capture();
//! let matrix = Matrix::new(sink, Duration::from_millis(20));
//! let row = matrix.new_row();
//! row.update("building...");
//!
//! let guard = matrix.start().unwrap();
//! row.update("done");
//! guard.stop(); // blocks until the final frame is on the sink
//! assert!(capture.contents().contains("done"));
//! ```

use crate::ansi::{self, Cursor};
use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::sink::Sink;
use crossbeam_channel::{select, tick};
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Opaque identifier of a matrix row, usable for later lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowId(usize);

#[derive(Default)]
struct RowSlot {
    value: String,
    modified: bool,
}

struct Shared {
    rows: Mutex<Vec<RowSlot>>,
    sink: Sink,
    started: AtomicBool,
}

/// A multi-line region of the terminal that repaints itself in the
/// background. Cloning yields another handle to the same row table.
#[derive(Clone)]
pub struct Matrix {
    shared: Arc<Shared>,
    refresh_interval: Duration,
}

impl Matrix {
    /// Create a matrix that writes to `sink` and repaints every
    /// `refresh_interval` once started.
    #[must_use]
    pub fn new(sink: Sink, refresh_interval: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                rows: Mutex::new(Vec::new()),
                sink,
                started: AtomicBool::new(false),
            }),
            refresh_interval,
        }
    }

    /// The configured repaint interval.
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// Number of rows allocated so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.rows.lock().len()
    }

    /// Whether no rows have been allocated yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocate one row at the end of the matrix and return its handle.
    pub fn new_row(&self) -> Row {
        let mut rows = self.shared.rows.lock();
        self.push_row(&mut rows)
    }

    /// Allocate `count` consecutive rows and return their handles in
    /// creation order.
    pub fn new_range(&self, count: usize) -> Vec<Row> {
        let mut rows = self.shared.rows.lock();
        (0..count).map(|_| self.push_row(&mut rows)).collect()
    }

    fn push_row(&self, rows: &mut Vec<RowSlot>) -> Row {
        let id = RowId(rows.len());
        rows.push(RowSlot::default());
        Row {
            shared: Arc::clone(&self.shared),
            id,
        }
    }

    /// Look up a row by index. Indices never go stale: rows are append-only.
    pub fn row(&self, index: usize) -> Result<Row> {
        let len = self.shared.rows.lock().len();
        if index >= len {
            return Err(Error::RowOutOfRange { index, len });
        }
        Ok(Row {
            shared: Arc::clone(&self.shared),
            id: RowId(index),
        })
    }

    /// Look up a row by the identifier a previous handle reported.
    pub fn row_by_id(&self, id: RowId) -> Result<Row> {
        self.row(id.0)
    }

    /// Perform one repaint pass immediately.
    ///
    /// This is the manual alternative to [`start`](Self::start); combining
    /// it with a running background loop is not prevented but will produce
    /// interleaved frames.
    pub fn render_once(&self, reset_cursor: bool) {
        let mut rows = self.shared.rows.lock();
        if rows.is_empty() {
            return;
        }

        for slot in rows.iter_mut() {
            if slot.modified {
                let line = format!("{}{}\n", ansi::ERASE_LINE, slot.value);
                // A failed write leaves the row modified so the next pass
                // retries it instead of losing the update.
                slot.modified = self.shared.sink.write_str(&line).is_err();
            } else {
                let _ = self.shared.sink.write_str("\n");
            }
        }

        if reset_cursor {
            Cursor::new(self.shared.sink.clone()).up(rows.len());
        }
    }

    /// Launch the background repaint loop.
    ///
    /// Returns a [`MatrixGuard`] whose [`stop`](MatrixGuard::stop) cancels
    /// the loop and blocks until the final repaint has reached the sink.
    /// Once `stop` returns, no further bytes are written, so another widget
    /// may safely take over the same sink.
    ///
    /// A matrix starts at most once; a second call returns
    /// [`Error::AlreadyActive`].
    pub fn start(&self) -> Result<MatrixGuard> {
        if self
            .shared
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::AlreadyActive("matrix"));
        }

        let token = CancelToken::new();
        let matrix = self.clone();
        let loop_token = token.clone();
        debug!(interval = ?self.refresh_interval, "matrix repaint loop starting");

        let thread = thread::spawn(move || {
            let ticker = tick(matrix.refresh_interval);
            let cancelled = loop_token.cancelled().clone();
            loop {
                select! {
                    recv(cancelled) -> _ => {
                        // Final frame, no cursor reset: leave the region
                        // fully painted and the cursor below it.
                        matrix.render_once(false);
                        debug!("matrix repaint loop drained");
                        return;
                    }
                    recv(ticker) -> _ => matrix.render_once(true),
                }
            }
        });

        Ok(MatrixGuard {
            token,
            thread: Some(thread),
        })
    }
}

impl std::fmt::Debug for Matrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matrix")
            .field("rows", &self.len())
            .field("refresh_interval", &self.refresh_interval)
            .finish()
    }
}

/// Cancellation handle for a running matrix.
///
/// Dropping the guard stops the loop as well, but [`stop`](Self::stop)
/// makes the drain explicit at the call site.
pub struct MatrixGuard {
    token: CancelToken,
    thread: Option<thread::JoinHandle<()>>,
}

impl MatrixGuard {
    /// Stop the repaint loop and wait for its final frame to be written.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.token.cancel();
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MatrixGuard {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for MatrixGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatrixGuard")
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}

/// Accessor handle to one matrix row.
///
/// Writes replace the row's value (last-write-wins) after trimming leading
/// and trailing line feed / carriage return characters, which would
/// otherwise corrupt the fixed-height region. Safe to use from any thread,
/// concurrently with repaints.
#[derive(Clone)]
pub struct Row {
    shared: Arc<Shared>,
    id: RowId,
}

impl Row {
    /// The identifier of this row.
    #[must_use]
    pub fn id(&self) -> RowId {
        self.id
    }

    /// Replace the row's content. The modified flag is reassigned on every
    /// call: a changed value schedules a redraw, while an update identical
    /// to the stored value clears any still-pending one.
    pub fn update(&self, value: &str) {
        let trimmed = value.trim_matches(|c| c == '\n' || c == '\r');
        let mut rows = self.shared.rows.lock();
        let slot = &mut rows[self.id.0];
        slot.modified = trimmed != slot.value;
        if slot.modified {
            slot.value.clear();
            slot.value.push_str(trimmed);
        }
    }

    /// The row's current content.
    #[must_use]
    pub fn value(&self) -> String {
        self.shared.rows.lock()[self.id.0].value.clone()
    }
}

impl Write for Row {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(&String::from_utf8_lossy(buf));
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Row").field("id", &self.id).finish()
    }
}

//! Indeterminate spinner with asynchronous title updates.
//!
//! The spinner's glyph index and title live entirely on its owner thread;
//! external callers only hand values over channels. [`Spinner::set_title`]
//! is therefore race-free without any lock on the render path: the owner
//! adopts the new title on receipt and re-renders immediately with the
//! *current* glyph, while the periodic ticker advances the glyph and
//! re-renders with whatever title it last adopted.
//!
//! # Example
//!
//! ```
//! use liveline::{CancelToken, Sink, Spinner, SpinnerStyle};
//! use std::time::Duration;
//!
//! let (sink, capture) = Sink::capture();
//! let spinner = Spinner::new(sink, "warming up", Duration::from_millis(10), SpinnerStyle::default());
//! let token = CancelToken::new();
//!
//! spinner.start(&token).unwrap();
//! spinner.set_title("almost there").unwrap();
//! spinner.stop("done").unwrap();
//! assert!(capture.contents().ends_with("done"));
//! ```

use crate::ansi;
use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::sink::Sink;
use crossbeam_channel::{bounded, select, tick, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Glyph sequence a [`Spinner`] cycles through.
#[derive(Debug, Clone)]
pub struct SpinnerStyle {
    /// Animation frames, cycled in order. Must not be empty; an empty set
    /// falls back to the default frames.
    pub frames: Vec<String>,
}

impl SpinnerStyle {
    /// The classic braille dots sequence.
    #[must_use]
    pub fn braille() -> Self {
        Self {
            frames: ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
        }
    }

    /// A custom frame sequence.
    #[must_use]
    pub fn with_frames<S: Into<String>>(frames: impl IntoIterator<Item = S>) -> Self {
        let frames: Vec<String> = frames.into_iter().map(Into::into).collect();
        if frames.is_empty() {
            return Self::braille();
        }
        Self { frames }
    }
}

impl Default for SpinnerStyle {
    fn default() -> Self {
        Self::braille()
    }
}

/// Message written when the owner exits because its token was cancelled.
const CANCELLED_MESSAGE: &str = "Cancelled...";

struct Control {
    title_tx: Sender<String>,
    stop_tx: Sender<()>,
    ack_rx: Receiver<()>,
    thread: thread::JoinHandle<()>,
}

/// A single-row indeterminate progress indicator.
pub struct Spinner {
    sink: Sink,
    title: String,
    interval: Duration,
    style: SpinnerStyle,
    started: AtomicBool,
    control: Mutex<Option<Control>>,
}

impl Spinner {
    /// Create a spinner that writes to `sink`, advancing one glyph per
    /// `interval` once started.
    #[must_use]
    pub fn new(sink: Sink, title: &str, interval: Duration, style: SpinnerStyle) -> Self {
        Self {
            sink,
            title: title.trim().to_owned(),
            interval,
            style,
            started: AtomicBool::new(false),
            control: Mutex::new(None),
        }
    }

    /// Start the spinner in the background.
    ///
    /// Renders the initial glyph and title immediately. Fails with
    /// [`Error::AlreadyActive`] on a second start and [`Error::Cancelled`]
    /// if `token` is already cancelled.
    pub fn start(&self, token: &CancelToken) -> Result<()> {
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let mut control = self.control.lock();
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::AlreadyActive("spinner"));
        }

        let (title_tx, title_rx) = bounded::<String>(0);
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let (ack_tx, ack_rx) = bounded::<()>(0);

        let sink = self.sink.clone();
        // The field is public, so guard against a hand-built empty set.
        let frames = if self.style.frames.is_empty() {
            SpinnerStyle::braille().frames
        } else {
            self.style.frames.clone()
        };
        let interval = self.interval;
        let owner_token = token.clone();
        let mut title = self.title.clone();
        debug!(interval = ?self.interval, "spinner owner starting");

        let thread = thread::spawn(move || {
            let render = |frame: &str, title: &str| {
                let line = if title.is_empty() {
                    format!("{}{frame}", ansi::ERASE_LINE)
                } else {
                    format!("{}{frame} {title}", ansi::ERASE_LINE)
                };
                let _ = sink.write_str(&line);
            };

            let ticker = tick(interval);
            let cancelled = owner_token.cancelled().clone();
            let mut index = 0usize;
            render(&frames[index], &title);

            loop {
                select! {
                    recv(cancelled) -> _ => {
                        let _ = sink.write_str(ansi::ERASE_LINE);
                        let _ = sink.write_str(CANCELLED_MESSAGE);
                        debug!("spinner owner cancelled");
                        return;
                    }
                    recv(stop_rx) -> msg => {
                        if msg.is_ok() {
                            let _ = ack_tx.send(());
                        }
                        return;
                    }
                    recv(title_rx) -> new_title => {
                        if let Ok(new_title) = new_title {
                            // Re-render right away with the current glyph;
                            // the next advance keeps its own schedule.
                            title = new_title;
                            render(&frames[index], &title);
                        }
                    }
                    recv(ticker) -> _ => {
                        index = (index + 1) % frames.len();
                        render(&frames[index], &title);
                    }
                }
            }
        });

        *control = Some(Control {
            title_tx,
            stop_tx,
            ack_rx,
            thread,
        });
        Ok(())
    }

    /// Hand a new title to the owner thread, which re-renders with it
    /// immediately. The title is whitespace-trimmed.
    ///
    /// Fails with [`Error::NotActive`] if the spinner is not running
    /// (including after its token was cancelled).
    pub fn set_title(&self, title: &str) -> Result<()> {
        let control = self.control.lock();
        let control = control.as_ref().ok_or(Error::NotActive("spinner"))?;
        // A disconnected channel means the owner is gone; surface that as
        // an inactive spinner rather than a channel-level fault.
        control
            .title_tx
            .send(title.trim().to_owned())
            .map_err(|_| Error::NotActive("spinner"))
    }

    /// Stop the spinner, wait for the owner to acknowledge, then write the
    /// exit message over the spinner's row.
    ///
    /// No trailing line terminator is written, so the caller's next output
    /// decides line placement. Fails with [`Error::NotActive`] if the
    /// spinner is not running.
    pub fn stop(&self, message: &str) -> Result<()> {
        let mut guard = self.control.lock();
        let control = guard.take().ok_or(Error::NotActive("spinner"))?;

        if control.stop_tx.send(()).is_err() {
            // Owner already exited (cancelled token); it wrote its own
            // final frame.
            let _ = control.thread.join();
            return Err(Error::NotActive("spinner"));
        }
        let _ = control.ack_rx.recv();
        let _ = control.thread.join();

        let _ = self.sink.write_str(ansi::ERASE_LINE);
        let _ = self.sink.write_str(message);
        debug!("spinner stopped");
        Ok(())
    }
}

impl std::fmt::Debug for Spinner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spinner")
            .field("interval", &self.interval)
            .field("active", &self.control.lock().is_some())
            .finish()
    }
}

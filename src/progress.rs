//! Determinate progress bar with an owner-thread tick protocol.
//!
//! A [`ProgressBar`] can be driven synchronously (`tick` / `tick_with`) or
//! started in the background, in which case all progress flows through a
//! [`ProgressHandle`]: each call sends one request to the owner thread over
//! a zero-capacity channel and blocks for the reply on the same round trip.
//! The rendezvous keeps at most one render in flight and totally orders
//! ticks from any number of caller threads, so concurrent callers can never
//! interleave partial frames.
//!
//! Cancelling the token while the bar is unfinished makes the owner drain
//! the remaining ticks to 100% before exiting — a cancelled run still ends
//! on a clean, complete frame.
//!
//! # Example
//!
//! ```
//! use liveline::{BarStyle, CancelToken, ProgressBar, Sink};
//!
//! let (sink, capture) = Sink::capture();
//! let bar = ProgressBar::new(sink, 4, 80, 20, BarStyle::default());
//! let token = CancelToken::new();
//!
//! let handle = bar.start(&token).unwrap();
//! while handle.tick(None) {}
//! handle.wait();
//! assert!(capture.contents().contains("100%"));
//! ```

use crate::ansi;
use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::sink::Sink;
use crate::text::truncate;
use crossbeam_channel::{bounded, select, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::debug;

/// Characters reserved next to the bar itself: two borders, up to three
/// percentage digits, the percent sign, and one padding space.
const RESERVED_WIDTH: usize = 7;

/// Visual styling of a [`ProgressBar`].
#[derive(Debug, Clone)]
pub struct BarStyle {
    /// Left border character.
    pub left: char,
    /// Right border character.
    pub right: char,
    /// Fill character for completed progress.
    pub fill: char,
    /// Width of the status message column left of the bar. Zero disables
    /// the message area entirely.
    pub message_width: usize,
}

impl Default for BarStyle {
    fn default() -> Self {
        Self {
            left: '\u{258F}',  // ▏
            right: '\u{2595}', // ▕
            fill: '\u{2587}',  // ▇
            message_width: 0,
        }
    }
}

impl BarStyle {
    /// Default styling with a message column of the given width.
    #[must_use]
    pub fn with_message_width(width: usize) -> Self {
        Self {
            message_width: width,
            ..Self::default()
        }
    }
}

struct BarShared {
    sink: Sink,
    max_ticks: usize,
    width: usize,
    style: BarStyle,
    ticks: Mutex<usize>,
    started: AtomicBool,
}

/// A single-row determinate progress indicator.
///
/// Cloning yields another handle to the same bar state.
#[derive(Clone)]
pub struct ProgressBar {
    shared: Arc<BarShared>,
}

impl ProgressBar {
    /// Create a progress bar.
    ///
    /// `term_width` is the current terminal width (0 for no TTY); the
    /// effective bar width is `requested_width` clamped so the bar, its
    /// borders, the percentage, and the message column fit:
    /// `min(requested_width, term_width - reserved)`, never below zero.
    #[must_use]
    pub fn new(
        sink: Sink,
        max_ticks: usize,
        term_width: usize,
        requested_width: usize,
        style: BarStyle,
    ) -> Self {
        let reserved = RESERVED_WIDTH + style.message_width;
        let width = requested_width.min(term_width.saturating_sub(reserved));
        Self {
            shared: Arc::new(BarShared {
                sink,
                max_ticks: max_ticks.max(1),
                width,
                style,
                ticks: Mutex::new(0),
                started: AtomicBool::new(false),
            }),
        }
    }

    /// Create a bar with default styling, sized to half the given terminal
    /// width.
    #[must_use]
    pub fn with_defaults(sink: Sink, max_ticks: usize, term_width: usize) -> Self {
        Self::new(sink, max_ticks, term_width, term_width / 2, BarStyle::default())
    }

    /// The effective bar width in characters after clamping.
    #[must_use]
    pub fn width(&self) -> usize {
        self.shared.width
    }

    /// Whether the bar has reached 100%.
    #[must_use]
    pub fn is_done(&self) -> bool {
        *self.shared.ticks.lock() >= self.shared.max_ticks
    }

    /// Advance by one tick and render. Returns `true` while the bar is not
    /// yet done; once done, further calls are no-ops returning `false`.
    pub fn tick(&self) -> bool {
        self.advance(None)
    }

    /// Like [`tick`](Self::tick), rendering `message` in the message
    /// column (truncated to the column width; invisible when the style has
    /// no message area).
    pub fn tick_with(&self, message: &str) -> bool {
        self.advance(Some(message))
    }

    fn advance(&self, message: Option<&str>) -> bool {
        let mut ticks = self.shared.ticks.lock();
        if *ticks >= self.shared.max_ticks {
            return false;
        }
        *ticks += 1;

        let frame = self.render_frame(*ticks, message);
        // Best effort: a dropped frame must not kill progress accounting.
        let _ = self.shared.sink.write_str(&frame);

        *ticks < self.shared.max_ticks
    }

    fn render_frame(&self, ticks: usize, message: Option<&str>) -> String {
        let width = self.shared.width;
        // Single-precision on purpose: the truncated integer percentage is
        // part of the rendered contract.
        let percent = ticks as f32 / self.shared.max_ticks as f32;
        let filled = (percent * width as f32) as usize;
        let blank = width - filled;

        let mut frame = String::from(ansi::ERASE_LINE);
        if self.shared.style.message_width > 0 {
            let msg = truncate(message.unwrap_or(""), self.shared.style.message_width);
            frame.push_str(&format!(
                "{msg:<width$}",
                width = self.shared.style.message_width
            ));
        }
        frame.push(self.shared.style.left);
        frame.extend(std::iter::repeat(self.shared.style.fill).take(filled));
        frame.extend(std::iter::repeat(' ').take(blank));
        frame.push(self.shared.style.right);
        frame.push_str(&format!(" {}%", (percent * 100.0) as usize));
        frame
    }

    /// Start the bar in the background.
    ///
    /// Fails with [`Error::AlreadyActive`] if the bar was already started
    /// and with [`Error::Cancelled`] if `token` is already cancelled. On
    /// success a zero-progress frame has been rendered and the returned
    /// [`ProgressHandle`] is the only way to advance the bar.
    pub fn start(&self, token: &CancelToken) -> Result<ProgressHandle> {
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if self
            .shared
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::AlreadyActive("progress bar"));
        }

        let frame = self.render_frame(0, None);
        let _ = self.shared.sink.write_str(&frame);

        let (request_tx, request_rx) = bounded::<Option<String>>(0);
        let (reply_tx, reply_rx) = bounded::<bool>(0);
        let bar = self.clone();
        let owner_token = token.clone();
        debug!(max_ticks = self.shared.max_ticks, "progress bar owner starting");

        let thread = thread::spawn(move || {
            let cancelled = owner_token.cancelled().clone();
            loop {
                select! {
                    recv(cancelled) -> _ => {
                        // Drain: a cancelled-but-unfinished bar still reaches
                        // a complete terminal frame before the owner exits.
                        debug!("progress bar cancelled, draining to completion");
                        while bar.tick() {}
                        return;
                    }
                    recv(request_rx) -> request => match request {
                        Ok(message) => {
                            let more = bar.advance(message.as_deref());
                            if reply_tx.send(more).is_err() {
                                return;
                            }
                        }
                        // All caller handles dropped: nothing left to serve.
                        // Both arms can be ready at once, so the drain
                        // contract is honored here too.
                        Err(_) => {
                            if owner_token.is_cancelled() {
                                debug!("progress bar cancelled, draining to completion");
                                while bar.tick() {}
                            }
                            return;
                        }
                    },
                }
            }
        });

        Ok(ProgressHandle {
            token: token.clone(),
            request_tx: Some(request_tx),
            reply_rx,
            thread: Some(thread),
        })
    }
}

impl std::fmt::Debug for ProgressBar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressBar")
            .field("max_ticks", &self.shared.max_ticks)
            .field("ticks", &*self.shared.ticks.lock())
            .field("width", &self.shared.width)
            .finish()
    }
}

/// Caller-side handle to a background progress bar.
///
/// [`tick`](Self::tick) may be called from any thread; each call is one
/// rendezvous with the owner. Dropping the handle (or calling
/// [`wait`](Self::wait)) closes the request channel and joins the owner,
/// after which no further bytes reach the sink.
pub struct ProgressHandle {
    token: CancelToken,
    request_tx: Option<Sender<Option<String>>>,
    reply_rx: Receiver<bool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl ProgressHandle {
    /// Advance the bar by one tick, optionally rendering a message.
    ///
    /// Returns `true` while the bar is not yet done. If the token is
    /// already cancelled this returns `false` without contacting the owner.
    pub fn tick(&self, message: Option<&str>) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        let Some(request_tx) = self.request_tx.as_ref() else {
            return false;
        };
        if request_tx.send(message.map(str::to_owned)).is_err() {
            return false;
        }
        self.reply_rx.recv().unwrap_or(false)
    }

    /// Wait for the owner thread to exit.
    ///
    /// Closes the request channel first, so an idle owner wakes up and
    /// finishes (draining to 100% first if the token was cancelled). Once
    /// this returns, the sink is quiet.
    pub fn wait(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.request_tx.take();
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ProgressHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ProgressHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressHandle")
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::sink::Capture;

    const TERM_WIDTH: usize = 100;

    fn capture_bar(max_ticks: usize, width: usize) -> (ProgressBar, Capture) {
        let (sink, capture) = Sink::capture();
        (
            ProgressBar::new(sink, max_ticks, TERM_WIDTH, width, BarStyle::default()),
            capture,
        )
    }

    #[test]
    fn tick_returns_true_until_done() {
        let (bar, _) = capture_bar(3, 10);
        assert!(bar.tick());
        assert!(bar.tick());
        assert!(!bar.is_done());
        assert!(!bar.tick());
        assert!(bar.is_done());
        // Done bars no-op.
        assert!(!bar.tick());
        assert!(bar.is_done());
    }

    #[test]
    fn width_is_clamped_to_terminal() {
        let (bar, _) = capture_bar(2, TERM_WIDTH * 2);
        assert_eq!(bar.width(), TERM_WIDTH - RESERVED_WIDTH);

        let (sink, _) = Sink::capture();
        let zero_term = ProgressBar::new(sink, 2, 0, 50, BarStyle::default());
        assert_eq!(zero_term.width(), 0);
    }

    #[test]
    fn message_column_reserves_additional_width() {
        let (sink, _) = Sink::capture();
        let bar = ProgressBar::new(sink, 2, TERM_WIDTH, TERM_WIDTH, BarStyle::with_message_width(10));
        assert_eq!(bar.width(), TERM_WIDTH - RESERVED_WIDTH - 10);
    }

    #[test]
    fn zero_width_bar_completes_without_output_garbage() {
        let (sink, _) = Sink::capture();
        let bar = ProgressBar::new(sink, 5, 0, 10, BarStyle::default());
        let mut count = 0;
        while bar.tick() {
            count += 1;
        }
        assert_eq!(count, 4);
        assert!(bar.is_done());
    }

    #[test]
    fn golden_half_frame() {
        let (bar, capture) = capture_bar(2, 10);
        bar.tick();
        assert_eq!(
            capture.contents(),
            "\r\x1b[K\u{258F}\u{2587}\u{2587}\u{2587}\u{2587}\u{2587}     \u{2595} 50%"
        );
    }

    #[test]
    fn percentage_is_truncated_not_rounded() {
        let (bar, capture) = capture_bar(3, 9);
        bar.tick();
        // 1/3 = 33.33..% -> 33, 3 of 9 cells filled.
        let contents = capture.contents();
        assert!(contents.ends_with(" 33%"), "got {contents:?}");
    }

    #[test]
    fn message_is_rendered_and_truncated() {
        let (sink, capture) = Sink::capture();
        let bar = ProgressBar::new(sink, 2, TERM_WIDTH, 10, BarStyle::with_message_width(8));
        bar.tick_with("compiling everything");
        let contents = capture.contents();
        assert!(contents.contains("compil.."), "got {contents:?}");
        assert!(!contents.contains("compiling"));
    }

    #[test]
    fn message_invisible_without_message_area() {
        let (bar, capture) = capture_bar(2, 10);
        bar.tick_with("should not appear");
        assert!(!capture.contents().contains("should not appear"));
    }

    #[test]
    fn start_renders_zero_progress_frame() {
        let (bar, capture) = capture_bar(4, 8);
        let token = CancelToken::new();
        let handle = bar.start(&token).unwrap();
        assert!(capture.contents().ends_with(" 0%"));
        handle.wait();
    }

    #[test]
    fn start_twice_fails() {
        let (bar, _) = capture_bar(2, 10);
        let token = CancelToken::new();
        let _handle = bar.start(&token).unwrap();
        assert!(matches!(bar.start(&token), Err(Error::AlreadyActive(_))));
    }

    #[test]
    fn start_with_cancelled_token_fails_without_activating() {
        let (bar, capture) = capture_bar(2, 10);
        let token = CancelToken::new();
        token.cancel();

        assert!(matches!(bar.start(&token), Err(Error::Cancelled)));
        assert!(capture.is_empty());
        // The failed start did not consume the single activation.
        let fresh = CancelToken::new();
        assert!(bar.start(&fresh).is_ok());
    }

    #[test]
    fn handle_ticks_through_the_owner() {
        let (bar, capture) = capture_bar(2, 10);
        let token = CancelToken::new();
        let handle = bar.start(&token).unwrap();

        assert!(handle.tick(None));
        assert!(!handle.tick(None));
        assert!(!handle.tick(None));
        handle.wait();
        assert!(capture.contents().contains("100%"));
    }

    #[test]
    fn tick_after_cancel_is_a_non_blocking_false() {
        let (bar, _) = capture_bar(10, 10);
        let token = CancelToken::new();
        let handle = bar.start(&token).unwrap();

        assert!(handle.tick(None));
        token.cancel();
        assert!(!handle.tick(None));
        handle.wait();
    }

    #[test]
    fn cancel_drains_to_completion_then_goes_quiet() {
        let (bar, capture) = capture_bar(10, 10);
        let token = CancelToken::new();
        let handle = bar.start(&token).unwrap();

        assert!(handle.tick(None));
        token.cancel();
        handle.wait();

        let contents = capture.contents();
        assert!(contents.contains("100%"), "drained bar ends at 100%: {contents:?}");
        assert!(bar.is_done());

        let quiet_len = capture.len();
        std::thread::sleep(std::time::Duration::from_millis(200));
        assert_eq!(capture.len(), quiet_len, "no bytes after wait() returned");
    }
}

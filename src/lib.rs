//! # liveline
//!
//! Flicker-minimizing live terminal output, rendered concurrently with
//! application work: a multi-row [`Matrix`] of addressable lines, a
//! determinate [`ProgressBar`], and an indeterminate [`Spinner`], all
//! emitting raw ANSI sequences to an injected [`Sink`].
//!
//! The interesting part is the render-synchronization protocol shared by
//! all three widgets:
//!
//! - each started widget owns exactly one background thread that performs
//!   every read and write of its render state;
//! - foreign threads advance a bar or retitle a spinner through channel
//!   round trips, never by touching shared state;
//! - shutdown is ordered and deterministic: once a stop or cancellation is
//!   acknowledged (`MatrixGuard::stop`, `ProgressHandle::wait`,
//!   `Spinner::stop` returning), no further bytes reach the sink, so
//!   callers can interleave multiple live widgets on one stream.
//!
//! Cancellation is cooperative via [`CancelToken`]. A cancelled progress
//! bar drains to 100% before its owner exits, leaving a clean final frame.
//!
//! # Example
//!
//! ```
//! use liveline::{CancelToken, ProgressBar, Sink, terminal_width};
//!
//! let sink = Sink::new(std::io::stdout());
//! let bar = ProgressBar::with_defaults(sink, 10, terminal_width());
//! let token = CancelToken::new();
//!
//! let handle = bar.start(&token)?;
//! for step in 0..10 {
//!     // ... do one unit of work ...
//!     let message = format!("step {step}");
//!     handle.tick(Some(&message));
//! }
//! handle.wait();
//! # Ok::<(), liveline::Error>(())
//! ```
//!
//! Out of scope by design: scrollback-safe regions, unicode display-width
//! accounting, and OS-specific terminal capability negotiation.

pub mod ansi;
pub mod cancel;
pub mod error;
pub mod matrix;
pub mod progress;
pub mod sink;
pub mod spinner;
pub mod text;

pub use ansi::Cursor;
pub use cancel::CancelToken;
pub use error::{Error, Result};
pub use matrix::{Matrix, MatrixGuard, Row, RowId};
pub use progress::{BarStyle, ProgressBar, ProgressHandle};
pub use sink::{terminal_height, terminal_width, Capture, Sink};
pub use spinner::{Spinner, SpinnerStyle};
pub use text::truncate;

//! Crate error type.

use thiserror::Error;

/// Errors returned by liveline widgets.
///
/// Only programmer-facing conditions surface here: lifecycle misuse and
/// out-of-range row lookups. Sink I/O failures are absorbed by the render
/// loops (a dropped frame is preferable to a dead widget) and never reach
/// this type.
#[derive(Debug, Error)]
pub enum Error {
    /// `start` was called on a widget that is already running, or that has
    /// already completed its single start/stop cycle.
    #[error("{0} already active")]
    AlreadyActive(&'static str),

    /// An operation that requires a running widget (`stop`, `set_title`)
    /// was called on an inactive one.
    #[error("{0} not active")]
    NotActive(&'static str),

    /// The supplied cancellation token was already cancelled.
    #[error("cancelled")]
    Cancelled,

    /// A row lookup was outside the matrix range.
    #[error("row index {index} out of range (matrix has {len} rows)")]
    RowOutOfRange {
        /// The requested index.
        index: usize,
        /// The number of rows at lookup time.
        len: usize,
    },
}

/// Convenience alias for results with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

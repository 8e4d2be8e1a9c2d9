//! Cooperative cancellation token.
//!
//! A [`CancelToken`] is the only cancellation mechanism the widgets support.
//! Clones share one cancellation state; once cancelled, a token stays
//! cancelled forever. Owner threads observe cancellation either by polling
//! [`CancelToken::is_cancelled`] or by including
//! [`CancelToken::cancelled`] in a `crossbeam_channel::select!` arm.

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cloneable cancellation token.
///
/// # Example
///
/// ```
/// use liveline::CancelToken;
///
/// let token = CancelToken::new();
/// let worker = token.clone();
/// assert!(!worker.is_cancelled());
///
/// token.cancel();
/// assert!(worker.is_cancelled());
/// // The wait channel is now disconnected, so recv() returns immediately.
/// assert!(worker.cancelled().recv().is_err());
/// ```
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

struct Inner {
    cancelled: AtomicBool,
    // Held until cancel(); dropping it disconnects every receiver clone,
    // which is what makes select! arms fire.
    keeper: Mutex<Option<Sender<()>>>,
    rx: Receiver<()>,
}

impl CancelToken {
    /// Create a new, un-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = bounded::<()>(0);
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                keeper: Mutex::new(Some(tx)),
                rx,
            }),
        }
    }

    /// Cancel the token. Idempotent; safe to call from any thread.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        // Drop the sender so every receiver observes disconnection.
        self.inner.keeper.lock().take();
    }

    /// Whether [`cancel`](Self::cancel) has been called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// A channel that becomes ready (disconnected) once the token is
    /// cancelled. Intended for `select!`; nothing is ever sent on it.
    #[must_use]
    pub fn cancelled(&self) -> &Receiver<()> {
        &self.inner.rx
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

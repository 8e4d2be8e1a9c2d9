//! ANSI control sequences and the cursor controller.
//!
//! Every sequence the crate emits is defined here, byte-exact, so golden
//! tests can assert against rendered streams. Only relative cursor motion
//! and line erasure are used by the widgets; there is no capability
//! negotiation and no scrollback-safe region handling.

use crate::sink::Sink;

/// Erase the current line and return the cursor to column 0.
pub const ERASE_LINE: &str = "\r\x1b[K";

/// Clear the screen and home the cursor (the shell `clear` idiom).
pub const CLEAR_SCREEN: &str = "\x1b[H\x1b[2J";

/// Hide the cursor.
pub const CURSOR_HIDE: &str = "\x1b[?25l";

/// Show the cursor.
pub const CURSOR_SHOW: &str = "\x1b[?25h";

/// Save the cursor position.
pub const CURSOR_SAVE: &str = "\x1b[s";

/// Restore the saved cursor position.
pub const CURSOR_RESTORE: &str = "\x1b[u";

/// Writes relative cursor movements to a [`Sink`].
///
/// Stateless: each call emits exactly one escape sequence. I/O errors are
/// discarded here — cursor motion is always part of a best-effort frame,
/// and the sink's own error policy governs anything more serious.
///
/// # Example
///
/// ```
/// use liveline::{Cursor, Sink};
///
/// let (sink, capture) = Sink::capture();
/// let cursor = Cursor::new(sink);
/// cursor.up(3);
/// cursor.hide();
/// assert_eq!(capture.contents(), "\x1b[3A\x1b[?25l");
/// ```
#[derive(Debug, Clone)]
pub struct Cursor {
    sink: Sink,
}

impl Cursor {
    /// Create a cursor controller writing to `sink`.
    #[must_use]
    pub fn new(sink: Sink) -> Self {
        Self { sink }
    }

    /// Move the cursor up `lines` lines.
    pub fn up(&self, lines: usize) {
        let _ = self.sink.write_str(&format!("\x1b[{lines}A"));
    }

    /// Move the cursor down `lines` lines.
    pub fn down(&self, lines: usize) {
        let _ = self.sink.write_str(&format!("\x1b[{lines}B"));
    }

    /// Move the cursor forward `cols` columns.
    pub fn forward(&self, cols: usize) {
        let _ = self.sink.write_str(&format!("\x1b[{cols}C"));
    }

    /// Move the cursor backward `cols` columns.
    pub fn backward(&self, cols: usize) {
        let _ = self.sink.write_str(&format!("\x1b[{cols}D"));
    }

    /// Move the cursor to an absolute 1-based row/column position.
    pub fn position(&self, row: usize, col: usize) {
        let _ = self.sink.write_str(&format!("\x1b[{row};{col}H"));
    }

    /// Clear the screen and move the cursor to the top-left corner.
    pub fn clear_screen(&self) {
        let _ = self.sink.write_str(CLEAR_SCREEN);
    }

    /// Save the current cursor position.
    pub fn save_position(&self) {
        let _ = self.sink.write_str(CURSOR_SAVE);
    }

    /// Restore the last saved cursor position.
    pub fn restore_position(&self) {
        let _ = self.sink.write_str(CURSOR_RESTORE);
    }

    /// Hide the cursor.
    pub fn hide(&self) {
        let _ = self.sink.write_str(CURSOR_HIDE);
    }

    /// Show the cursor.
    pub fn show(&self) {
        let _ = self.sink.write_str(CURSOR_SHOW);
    }
}

//! Width-bounded text helpers.

use std::borrow::Cow;

/// Truncate `s` to at most `max_len` characters.
///
/// Strings longer than `max_len` keep their first `max_len - 2` characters
/// and gain a `".."` suffix. A budget of one character or less leaves no room
/// for meaningful output and yields the empty string.
///
/// Characters are counted as `char`s, not display columns; wide-glyph
/// accounting is out of scope for this crate.
///
/// # Example
///
/// ```
/// use liveline::truncate;
///
/// assert_eq!(truncate("progress", 10), "progress");
/// assert_eq!(truncate("downloading artifacts", 10), "download..");
/// assert_eq!(truncate("x", 1), "x");
/// assert_eq!(truncate("xy", 1), "");
/// ```
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> Cow<'_, str> {
    if s.chars().count() <= max_len {
        return Cow::Borrowed(s);
    }
    if max_len <= 1 {
        return Cow::Borrowed("");
    }

    let mut out: String = s.chars().take(max_len - 2).collect();
    out.push_str("..");
    Cow::Owned(out)
}

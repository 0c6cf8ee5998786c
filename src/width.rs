//! Terminal display width helpers.
//!
//! ANSI-aware width calculation so wrapping and padding stay aligned even
//! when the engine emits styled text.

/// Compute the display width of a string after stripping ANSI escapes.
pub fn display_width(text: &str) -> usize {
    let clean = strip_ansi_escapes::strip(text);
    let clean_str = String::from_utf8_lossy(&clean);
    unicode_width::UnicodeWidthStr::width(&*clean_str)
}

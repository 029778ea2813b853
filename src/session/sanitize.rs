//! Terminal output sanitizer
//!
//! Dev servers and installers decorate their output with ANSI control
//! sequences. Everything surfaced to the output log goes through
//! `sanitize` first, which strips the control sequences and leaves
//! ordinary printable text untouched.

use once_cell::sync::Lazy;
use regex::Regex;

// Color/style, plus parameterless cursor and erase finals.
static STYLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*[mGKH]").unwrap());
// Cursor repositioning with row;column parameters.
static CURSOR_POSITION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9]*;[0-9]*H").unwrap());
static ERASE_DISPLAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9]*J").unwrap());
static ERASE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9]*K").unwrap());
// Private mode toggles such as cursor hide/show.
static PRIVATE_MODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[\?[0-9]*[hl]").unwrap());
// Whatever CSI sequences remain.
static REMAINING_CSI: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9]*[@A-Z]").unwrap());

/// Strip terminal control sequences from raw process output.
///
/// Removes style/color codes, cursor movement, erase sequences, mode
/// toggles, leftover CSI sequences, backspaces, and bare carriage returns —
/// a `\r` immediately followed by `\n` is kept so legitimate blank lines
/// survive.
pub fn sanitize(raw: &str) -> String {
    let text = STYLE.replace_all(raw, "");
    let text = CURSOR_POSITION.replace_all(&text, "");
    let text = ERASE_DISPLAY.replace_all(&text, "");
    let text = ERASE_LINE.replace_all(&text, "");
    let text = PRIVATE_MODE.replace_all(&text, "");
    let text = REMAINING_CSI.replace_all(&text, "");
    strip_control_chars(&text)
}

// Backspaces and bare carriage returns; the regex crate has no lookahead,
// so the \r-not-before-\n rule is a manual scan.
fn strip_control_chars(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\x08' => {}
            '\r' if chars.peek() != Some(&'\n') => {}
            _ => cleaned.push(ch),
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable_text_passes_through() {
        let text = "plain text\nwith lines\n\nand a blank\n";
        assert_eq!(sanitize(text), text);
    }

    #[test]
    fn test_strips_color_codes() {
        assert_eq!(sanitize("\x1b[32mok\x1b[0m done"), "ok done");
    }

    #[test]
    fn test_strips_cursor_reposition_without_losing_neighbors() {
        assert_eq!(sanitize("before\x1b[2;5Hafter"), "beforeafter");
        assert_eq!(sanitize("top\x1b[Hhome"), "tophome");
    }

    #[test]
    fn test_strips_erase_and_mode_sequences() {
        assert_eq!(sanitize("\x1b[2J\x1b[0Kcleared"), "cleared");
        assert_eq!(sanitize("\x1b[?25lhidden\x1b[?25h"), "hidden");
    }

    #[test]
    fn test_strips_remaining_csi_sequences() {
        assert_eq!(sanitize("a\x1b[3Ab"), "ab");
        assert_eq!(sanitize("a\x1b[@b"), "ab");
    }

    #[test]
    fn test_strips_backspaces() {
        assert_eq!(sanitize("typo\x08\x08fix"), "typofix");
    }

    #[test]
    fn test_bare_carriage_return_removed_crlf_kept() {
        assert_eq!(sanitize("progress 50%\rprogress 100%"), "progress 50%progress 100%");
        assert_eq!(sanitize("line\r\nnext"), "line\r\nnext");
        assert_eq!(sanitize("end\r"), "end");
    }
}

//! ANSI escape sequence stripping

use std::fmt;
use vte::{Parser, Perform};

/// Collects printable text and the line-structure controls, dropping every
/// escape, control and string sequence the parser recognizes.
struct TextCollector<'a> {
    out: &'a mut Vec<u8>,
}

impl Perform for TextCollector<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\r' | b'\t') {
            self.out.push(byte);
        }
    }
}

/// Streaming ANSI escape sequence stripper.
///
/// Output arrives in arbitrary chunks, so a sequence can start at the end of
/// one chunk and finish in the next. The stripper owns a VT parser whose
/// state survives between calls, so half a sequence never leaks into the
/// buffer. CSI sequences end on any final byte (`@` through `~`), and
/// DCS/SOS/PM/APC/OSC string bodies are dropped up to their terminator.
///
/// Text is decoded as UTF-8; invalid bytes come out as U+FFFD.
pub struct AnsiStripper {
    parser: Parser,
}

impl fmt::Debug for AnsiStripper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnsiStripper").finish_non_exhaustive()
    }
}

impl Default for AnsiStripper {
    fn default() -> Self {
        Self::new()
    }
}

impl AnsiStripper {
    /// Create a stripper positioned in plain text.
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    /// Strip a chunk, carrying any unfinished sequence over to the next call.
    pub fn strip(&mut self, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len());
        self.parser.advance(&mut TextCollector { out: &mut out }, data);
        out
    }
}

/// Strip ANSI escape sequences from a complete byte slice
pub fn strip_ansi(data: &[u8]) -> Vec<u8> {
    AnsiStripper::new().strip(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_csi() {
        let input = b"Hello \x1b[31mred\x1b[0m world";
        assert_eq!(strip_ansi(input), b"Hello red world");
    }

    #[test]
    fn test_csi_with_non_letter_final_byte() {
        // Insert-character ends on `@`, not a letter
        assert_eq!(strip_ansi(b"\x1b[2@HELLO"), b"HELLO");
        assert_eq!(strip_ansi(b"a\x1b[5`b"), b"ab");
    }

    #[test]
    fn test_strip_osc() {
        let input = b"Hello \x1b]0;Title\x07 world";
        assert_eq!(strip_ansi(input), b"Hello  world");
    }

    #[test]
    fn test_strip_osc_with_string_terminator() {
        let input = b"a\x1b]2;title\x1b\\b";
        assert_eq!(strip_ansi(input), b"ab");
    }

    #[test]
    fn test_strip_dcs_and_apc_bodies() {
        assert_eq!(strip_ansi(b"x\x1bPq#0;2;0;0;0\x1b\\y"), b"xy");
        assert_eq!(strip_ansi(b"x\x1b_Gi=1;AAAA\x1b\\y"), b"xy");
    }

    #[test]
    fn test_no_ansi() {
        assert_eq!(strip_ansi(b"Hello world"), b"Hello world");
    }

    #[test]
    fn test_keeps_line_controls_only() {
        assert_eq!(strip_ansi(b"a\tb\x07\r\n"), b"a\tb\r\n");
    }

    #[test]
    fn test_bracketed_paste_toggle() {
        let input = b"\x1b[?2004h$ echo hi\r\n\x1b[?2004l";
        assert_eq!(strip_ansi(input), b"$ echo hi\r\n");
    }

    #[test]
    fn test_sequence_split_across_chunks() {
        let mut stripper = AnsiStripper::new();
        let mut out = stripper.strip(b"HEL\x1b[3");
        out.extend(stripper.strip(b"1mLO\x1b"));
        out.extend(stripper.strip(b"[0m!"));
        assert_eq!(out, b"HELLO!");
    }

    #[test]
    fn test_charset_designator_split() {
        let mut stripper = AnsiStripper::new();
        let mut out = stripper.strip(b"x\x1b(");
        out.extend(stripper.strip(b"By"));
        assert_eq!(out, b"xy");
    }

    #[test]
    fn test_utf8_split_across_chunks() {
        let mut stripper = AnsiStripper::new();
        let mut out = stripper.strip(b"caf\xc3");
        out.extend(stripper.strip(b"\xa9"));
        assert_eq!(out, "café".as_bytes());
    }
}

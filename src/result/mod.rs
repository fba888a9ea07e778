//! Result types for expect operations

mod error;

pub use error::{ExpectError, MatcherError, PatternError};

/// Result of a successful match.
///
/// Offsets are absolute positions in the full output history (see
/// [`Session::snapshot`](crate::Session::snapshot)), so they keep growing
/// across calls.
///
/// # Examples
///
/// ```no_run
/// use termexpect::Session;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let mut session = Session::spawn("echo test")?;
/// let result = session.expect("test").await?;
///
/// println!("Matched: {}", result.matched);
/// println!("Skipped over: {}", result.before);
/// println!("Position: {}..{}", result.start, result.end);
/// # Ok(())
/// # }
/// ```
///
/// # Regex Captures
///
/// ```no_run
/// use regex::bytes::Regex;
/// use termexpect::Session;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let mut session = Session::spawn("echo user@example.com")?;
/// let pattern = Regex::new(r"(\w+)@(\w+)\.(\w+)")?;
/// let result = session.expect_regex(&pattern).await?;
///
/// // captures[0] is the full match
/// println!("User: {}", result.captures[1]);
/// println!("Domain: {}", result.captures[2]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    /// The matched text.
    ///
    /// For custom matchers, which only report where consumption ends, this
    /// is everything that was consumed.
    pub matched: String,

    /// Start of the match in the output history (byte offset).
    pub start: usize,

    /// End of the match in the output history; the cursor after the call.
    pub end: usize,

    /// Unconsumed text that preceded the match and was skipped over.
    pub before: String,

    /// Capture groups for regex matches; index 0 is the full match.
    ///
    /// Groups that did not participate in the match are empty strings.
    /// Empty for every other matcher.
    pub captures: Vec<String>,
}

impl MatchResult {
    /// Build a result from the consumed part of a window.
    ///
    /// `window_start` is the absolute offset of the window, `match_start`
    /// and `match_end` are relative to it.
    pub(crate) fn from_window(
        window_start: usize,
        window: &[u8],
        match_start: usize,
        match_end: usize,
    ) -> Self {
        Self {
            matched: String::from_utf8_lossy(&window[match_start..match_end]).into_owned(),
            start: window_start + match_start,
            end: window_start + match_end,
            before: String::from_utf8_lossy(&window[..match_start]).into_owned(),
            captures: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_window_offsets() {
        let result = MatchResult::from_window(10, b"junk HELLO rest", 5, 10);
        assert_eq!(result.matched, "HELLO");
        assert_eq!(result.before, "junk ");
        assert_eq!(result.start, 15);
        assert_eq!(result.end, 20);
        assert!(result.captures.is_empty());
    }
}

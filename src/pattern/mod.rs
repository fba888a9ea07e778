//! Matchers evaluated against the unconsumed output window

mod matcher;

pub use matcher::{EchoMatcher, ExactMatcher, RegexMatcher};

use crate::result::{MatchResult, MatcherError};

/// What a matcher reports for one window.
///
/// - `Ok(Some(end))` with `end > 0`: matched, consume the window through `end`
/// - `Ok(None)` or `Ok(Some(0))`: no match yet, wait for more output
/// - `Err(e)`: abort the expect call and hand `e` back to the caller
pub type MatchOutcome = Result<Option<usize>, MatcherError>;

/// A matching callback.
///
/// Each time new output arrives the matcher is handed the *whole*
/// unconsumed window, not just the new bytes, since a match may span
/// several reads. Any `FnMut(&[u8]) -> MatchOutcome` closure is a matcher.
///
/// # Examples
///
/// ```
/// use termexpect::{Matcher, MatchOutcome};
///
/// let mut until_prompt = |window: &[u8]| -> MatchOutcome {
///     Ok(window.iter().position(|&b| b == b'$').map(|i| i + 1))
/// };
/// assert_eq!(until_prompt.consume(b"login ok\r\n$ ").unwrap(), Some(11));
/// ```
pub trait Matcher: Send {
    /// Evaluate the current unconsumed window
    fn consume(&mut self, window: &[u8]) -> MatchOutcome;

    /// Describe a successful match ending at `end` within `window`.
    ///
    /// The default treats everything consumed as the matched text.
    fn result(&self, window_start: usize, window: &[u8], end: usize) -> MatchResult {
        MatchResult::from_window(window_start, window, 0, end)
    }
}

impl<F> Matcher for F
where
    F: FnMut(&[u8]) -> MatchOutcome + Send,
{
    fn consume(&mut self, window: &[u8]) -> MatchOutcome {
        self(window)
    }
}

/// End offset just past the first occurrence of `needle`, or `None`.
///
/// Handy inside custom matchers:
///
/// ```
/// use termexpect::pattern::end_of;
///
/// assert_eq!(end_of(b"say Hello World", b"Hello"), Some(9));
/// assert_eq!(end_of(b"nothing", b"Hello"), None);
/// ```
pub fn end_of(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|start| start + needle.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_matcher() {
        let mut calls = 0;
        let mut matcher = |window: &[u8]| -> MatchOutcome {
            calls += 1;
            Ok(end_of(window, b"ready"))
        };
        assert_eq!(matcher.consume(b"not yet").unwrap(), None);
        assert_eq!(matcher.consume(b"now ready!").unwrap(), Some(9));
        drop(matcher);
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_default_result_covers_consumed_bytes() {
        let matcher = |_: &[u8]| -> MatchOutcome { Ok(None) };
        let result = matcher.result(3, b"abcdef", 4);
        assert_eq!(result.matched, "abcd");
        assert_eq!(result.before, "");
        assert_eq!(result.start, 3);
        assert_eq!(result.end, 7);
    }

    #[test]
    fn test_end_of_empty_needle() {
        assert_eq!(end_of(b"abc", b""), None);
    }
}

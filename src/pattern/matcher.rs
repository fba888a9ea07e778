//! Matcher implementations

use super::{MatchOutcome, Matcher};
use crate::result::{MatchResult, PatternError};
use regex::bytes::Regex;

/// Exact byte string matcher using the Boyer-Moore-Horspool algorithm.
///
/// Consumes through the end of the first occurrence of the target.
#[derive(Debug, Clone)]
pub struct ExactMatcher {
    pattern: Vec<u8>,
    bad_char_table: [usize; 256],
}

impl ExactMatcher {
    /// Create a new exact matcher
    pub fn new(pattern: impl Into<Vec<u8>>) -> Result<Self, PatternError> {
        let pattern = pattern.into();

        if pattern.is_empty() {
            return Err(PatternError::EmptyPattern);
        }

        let mut bad_char_table = [pattern.len(); 256];
        for (i, &byte) in pattern.iter().enumerate().take(pattern.len() - 1) {
            bad_char_table[byte as usize] = pattern.len() - 1 - i;
        }

        Ok(Self {
            pattern,
            bad_char_table,
        })
    }

    /// Offset of the first occurrence in `haystack`
    pub fn find(&self, haystack: &[u8]) -> Option<usize> {
        let len = self.pattern.len();
        let mut pos = 0;
        while pos + len <= haystack.len() {
            if haystack[pos..pos + len] == self.pattern[..] {
                return Some(pos);
            }
            pos += self.bad_char_table[haystack[pos + len - 1] as usize];
        }
        None
    }

    /// The target bytes
    pub fn target(&self) -> &[u8] {
        &self.pattern
    }
}

impl Matcher for ExactMatcher {
    fn consume(&mut self, window: &[u8]) -> MatchOutcome {
        Ok(self.find(window).map(|start| start + self.pattern.len()))
    }

    fn result(&self, window_start: usize, window: &[u8], end: usize) -> MatchResult {
        let start = end.saturating_sub(self.pattern.len());
        MatchResult::from_window(window_start, window, start, end)
    }
}

/// Regex matcher with leftmost-first semantics.
///
/// Consumes through the end of the full match, never just a capture group.
/// Works on raw bytes, so output that is not valid UTF-8 can still match.
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    regex: Regex,
    last_start: usize,
    captures: Vec<String>,
}

impl RegexMatcher {
    /// Compile a new regex matcher
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        Ok(Self::from_regex(Regex::new(pattern)?))
    }

    /// Wrap an already compiled regex
    pub fn from_regex(regex: Regex) -> Self {
        Self {
            regex,
            last_start: 0,
            captures: Vec::new(),
        }
    }
}

impl Matcher for RegexMatcher {
    fn consume(&mut self, window: &[u8]) -> MatchOutcome {
        let Some(captures) = self.regex.captures(window) else {
            return Ok(None);
        };
        let Some(full) = captures.get(0) else {
            return Ok(None);
        };

        self.last_start = full.start();
        self.captures = captures
            .iter()
            .map(|group| {
                group
                    .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
                    .unwrap_or_default()
            })
            .collect();

        Ok(Some(full.end()))
    }

    fn result(&self, window_start: usize, window: &[u8], end: usize) -> MatchResult {
        let mut result = MatchResult::from_window(window_start, window, self.last_start, end);
        result.captures = self.captures.clone();
        result
    }
}

/// Matches the terminal's echo of the last line sent.
///
/// Without any pending input there is nothing to wait for, and the matcher
/// reports no match until the deadline. An empty line echoes as a bare line
/// break, so that is what it waits for.
#[derive(Debug, Clone)]
pub struct EchoMatcher {
    inner: Option<ExactMatcher>,
}

impl EchoMatcher {
    /// Build a matcher for the given pending input
    pub fn new(last_sent: Option<&str>) -> Self {
        let inner = last_sent.and_then(|line| {
            let target: &[u8] = if line.is_empty() { b"\n" } else { line.as_bytes() };
            ExactMatcher::new(target).ok()
        });
        Self { inner }
    }

    /// Whether there is input to wait for
    pub fn is_armed(&self) -> bool {
        self.inner.is_some()
    }
}

impl Matcher for EchoMatcher {
    fn consume(&mut self, window: &[u8]) -> MatchOutcome {
        match self.inner.as_mut() {
            Some(exact) => exact.consume(window),
            None => Ok(None),
        }
    }

    fn result(&self, window_start: usize, window: &[u8], end: usize) -> MatchResult {
        match &self.inner {
            Some(exact) => exact.result(window_start, window, end),
            None => MatchResult::from_window(window_start, window, 0, end),
        }
    }
}

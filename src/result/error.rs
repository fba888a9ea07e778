//! Error types for termexpect

use std::time::Duration;
use thiserror::Error;

/// Error produced by a matcher callback.
///
/// Returned to the caller of the expect call untouched, so the original
/// value can be recovered with `downcast_ref`.
pub type MatcherError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during expect operations.
///
/// # Examples
///
/// ```no_run
/// use termexpect::{ExpectError, ExpectOpts, Session};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut session = Session::spawn("some-command")?;
///
/// let opts = ExpectOpts::new().timeout(Duration::from_secs(5)).silence();
/// match session.with(opts).expect("done").await {
///     Ok(result) => println!("Matched: {}", result.matched),
///     Err(ExpectError::Timeout { duration, exited }) => {
///         eprintln!("Timed out after {:?} (process exited: {})", duration, exited);
///     }
///     Err(e) => return Err(e.into()),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Error, Debug)]
pub enum ExpectError {
    /// No match and no matcher error before the deadline.
    ///
    /// `exited` is set when the process finished and its output was fully
    /// drained before the deadline, so waiting longer could not help.
    #[error("Timeout waiting for match (after {duration:?}, process exited: {exited})")]
    Timeout {
        /// Time spent waiting
        duration: Duration,
        /// Whether the output stream had already ended
        exited: bool,
    },

    /// A matcher callback aborted the expect call.
    #[error("Matcher error: {0}")]
    Matcher(#[source] MatcherError),

    /// A matcher asked to consume past the end of the window it was given.
    #[error("Matcher consumed {end} bytes from a {window}-byte window")]
    InvalidConsume {
        /// End position returned by the matcher
        end: usize,
        /// Length of the window
        window: usize,
    },

    /// The output channel failed for a reason other than process exit.
    #[error("Reading process output failed: {0}")]
    ReadFailed(#[source] std::io::Error),

    /// The process exited with a different status than asserted.
    #[error("Expected exit code {expected}, process exited with {actual}")]
    ExitCode {
        /// Asserted exit code
        expected: u32,
        /// Actual exit code
        actual: u32,
    },

    /// Invalid pattern.
    #[error("Invalid pattern: {0}")]
    PatternError(#[from] PatternError),

    /// I/O error writing to the process or waiting on it.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// PTY creation or manipulation failed.
    #[error("PTY error: {0}")]
    PtyError(String),

    /// The command could not be spawned.
    #[error("Failed to spawn process: {0}")]
    SpawnError(String),
}

impl ExpectError {
    /// Whether this is the timeout sentinel
    pub fn is_timeout(&self) -> bool {
        matches!(self, ExpectError::Timeout { .. })
    }

    /// The matcher's own error, if the call was aborted by one
    pub fn matcher_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            ExpectError::Matcher(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// Errors related to pattern creation.
#[derive(Error, Debug)]
pub enum PatternError {
    /// Invalid regex pattern.
    #[error("Invalid regex: {0}")]
    InvalidRegex(#[from] regex::Error),

    /// Empty pattern.
    ///
    /// An empty target would match immediately without consuming anything.
    #[error("Pattern cannot be empty")]
    EmptyPattern,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("custom error")]
    struct Custom;

    #[test]
    fn test_timeout_display() {
        let err = ExpectError::Timeout {
            duration: Duration::from_millis(100),
            exited: true,
        };
        assert!(err.is_timeout());
        assert_eq!(
            err.to_string(),
            "Timeout waiting for match (after 100ms, process exited: true)"
        );
    }

    #[test]
    fn test_matcher_error_is_recoverable() {
        let err = ExpectError::Matcher(Box::new(Custom));
        assert!(!err.is_timeout());
        assert!(err.matcher_error().unwrap().downcast_ref::<Custom>().is_some());
    }

    #[test]
    fn test_exit_code_display() {
        let err = ExpectError::ExitCode {
            expected: 0,
            actual: 2,
        };
        assert_eq!(err.to_string(), "Expected exit code 0, process exited with 2");
    }
}

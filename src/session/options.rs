//! Per-call expect options and failure reporting

use crate::result::ExpectError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// What happens to a failed expect call beyond returning the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorHandling {
    /// Hand the failure to the session's [`ErrorReporter`] as well
    #[default]
    Report,
    /// Only return the failure; used when the failure is expected
    Silence,
}

/// Hook invoked with every unsilenced expect failure.
///
/// The error is still returned to the caller after the hook runs. A hook
/// that panics aborts the surrounding test.
#[derive(Clone)]
pub struct ErrorReporter(Arc<dyn Fn(&ExpectError) + Send + Sync>);

impl ErrorReporter {
    /// Wrap a closure as a reporter
    pub fn new(f: impl Fn(&ExpectError) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Reporter that panics, failing the enclosing `#[test]`
    pub fn panic() -> Self {
        Self::new(|err| panic!("expect failed: {err}"))
    }

    pub(crate) fn report(&self, err: &ExpectError) {
        (self.0)(err)
    }
}

impl fmt::Debug for ErrorReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ErrorReporter(..)")
    }
}

/// Overrides for a single expect call.
///
/// Unset fields fall back to the session defaults.
///
/// # Examples
///
/// ```no_run
/// use termexpect::{ExpectOpts, Session};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let mut session = Session::spawn("bash")?;
/// let quick = ExpectOpts::new()
///     .timeout(Duration::from_millis(100))
///     .silence();
/// let err = session.with(quick).expect("never printed").await.unwrap_err();
/// assert!(err.is_timeout());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpectOpts {
    pub(crate) timeout: Option<Option<Duration>>,
    pub(crate) error_handling: Option<ErrorHandling>,
}

impl ExpectOpts {
    /// Options that keep every session default
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait at most `timeout` for this call
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(Some(timeout));
        self
    }

    /// Wait without a deadline for this call
    pub fn no_timeout(mut self) -> Self {
        self.timeout = Some(None);
        self
    }

    /// Return failures without reporting them
    pub fn silence(self) -> Self {
        self.error_handling(ErrorHandling::Silence)
    }

    /// Set the error handling mode for this call
    pub fn error_handling(mut self, mode: ErrorHandling) -> Self {
        self.error_handling = Some(mode);
        self
    }
}

/// Session-wide defaults, assembled by the builder.
#[derive(Debug, Clone)]
pub(crate) struct Policy {
    pub timeout: Option<Duration>,
    pub error_handling: ErrorHandling,
    pub reporter: Option<ErrorReporter>,
    pub verbose: bool,
}

impl Policy {
    /// Timeout after applying per-call overrides
    pub fn timeout_for(&self, opts: &ExpectOpts) -> Option<Duration> {
        opts.timeout.unwrap_or(self.timeout)
    }

    /// Pass a failure through the configured handling and return it
    pub fn handle(&self, opts: &ExpectOpts, err: ExpectError) -> ExpectError {
        if opts.error_handling.unwrap_or(self.error_handling) == ErrorHandling::Silence {
            tracing::debug!(error = %err, "expect failed (silenced)");
            return err;
        }

        match &self.reporter {
            Some(reporter) => reporter.report(&err),
            None => tracing::error!(error = %err, "expect failed"),
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn policy(reporter: Option<ErrorReporter>) -> Policy {
        Policy {
            timeout: Some(Duration::from_secs(30)),
            error_handling: ErrorHandling::Report,
            reporter,
            verbose: false,
        }
    }

    fn timeout_err() -> ExpectError {
        ExpectError::Timeout {
            duration: Duration::from_millis(5),
            exited: false,
        }
    }

    #[test]
    fn test_timeout_override() {
        let policy = policy(None);
        assert_eq!(
            policy.timeout_for(&ExpectOpts::new()),
            Some(Duration::from_secs(30))
        );
        assert_eq!(
            policy.timeout_for(&ExpectOpts::new().timeout(Duration::from_millis(1))),
            Some(Duration::from_millis(1))
        );
        assert_eq!(policy.timeout_for(&ExpectOpts::new().no_timeout()), None);
    }

    #[test]
    fn test_reporter_called_unless_silenced() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let policy = policy(Some(ErrorReporter::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        })));

        let err = policy.handle(&ExpectOpts::new(), timeout_err());
        assert!(err.is_timeout());
        assert_eq!(count.load(Ordering::SeqCst), 1);

        let err = policy.handle(&ExpectOpts::new().silence(), timeout_err());
        assert!(err.is_timeout());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_session_silence_can_be_overridden_per_call() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let mut policy = policy(Some(ErrorReporter::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        })));
        policy.error_handling = ErrorHandling::Silence;

        policy.handle(&ExpectOpts::new(), timeout_err());
        assert_eq!(count.load(Ordering::SeqCst), 0);

        policy.handle(
            &ExpectOpts::new().error_handling(ErrorHandling::Report),
            timeout_err(),
        );
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[should_panic(expected = "expect failed")]
    fn test_panic_reporter() {
        policy(Some(ErrorReporter::panic())).handle(&ExpectOpts::new(), timeout_err());
    }
}

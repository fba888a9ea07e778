//! Session management for PTY-based process automation

mod builder;
mod engine;
mod options;
mod pump;

pub use builder::SessionBuilder;
pub use options::{ErrorHandling, ErrorReporter, ExpectOpts};

use crate::buffer::SessionBuffer;
use crate::pattern::{EchoMatcher, ExactMatcher, Matcher, RegexMatcher};
use crate::result::{ExpectError, MatchResult};
use options::Policy;
use portable_pty::{ChildKiller, ExitStatus, MasterPty};
use pump::ProcessRecord;
use regex::bytes::Regex;
use std::io::Write;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

/// Line terminator appended by [`Session::send_line`]
#[cfg(windows)]
const LINE_TERMINATOR: &str = "\r\n";
#[cfg(not(windows))]
const LINE_TERMINATOR: &str = "\n";

/// A running process attached to a PTY.
///
/// Output is captured continuously by a background reader into an
/// append-only buffer. Each successful expect call consumes output up to
/// the end of its match, so the next call only looks at what came after.
///
/// # Examples
///
/// ```no_run
/// use termexpect::Session;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut session = Session::builder()
///     .timeout(Duration::from_secs(10))
///     .spawn("bash")?;
///
/// session.send_line("echo ONE TWO").await?;
/// session.expect_input().await?;
/// session.expect("ONE").await?;
/// session.expect("TWO").await?;
/// session.send_line("exit").await?;
/// session.expect_exit_code(0).await?;
/// # Ok(())
/// # }
/// ```
pub struct Session {
    _master: Box<dyn MasterPty + Send>,
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    killer: Box<dyn ChildKiller + Send + Sync>,
    process_id: Option<u32>,
    buffer: Arc<SessionBuffer>,
    record: watch::Receiver<ProcessRecord>,
    _pump: JoinHandle<()>,
    last_sent: Option<String>,
    policy: Policy,
}

impl Session {
    /// Create a new session builder.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Spawn a command with default configuration.
    ///
    /// Shorthand for `Session::builder().spawn(command)`.
    pub fn spawn(command: &str) -> Result<Self, ExpectError> {
        SessionBuilder::new().spawn(command)
    }

    /// Override the timeout or error handling for the next expect call.
    ///
    /// ```no_run
    /// use termexpect::{ExpectOpts, Session};
    /// use std::time::Duration;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let mut session = Session::spawn("bash")?;
    /// let opts = ExpectOpts::new().timeout(Duration::from_secs(1)).silence();
    /// if session.with(opts).expect("maybe").await.is_err() {
    ///     println!("not there");
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn with(&mut self, opts: ExpectOpts) -> Expecter<'_> {
        Expecter {
            session: self,
            opts,
        }
    }

    /// Wait for `text` and consume output through its first occurrence.
    pub async fn expect(&mut self, text: &str) -> Result<MatchResult, ExpectError> {
        self.with(ExpectOpts::default()).expect(text).await
    }

    /// Wait for a regex match and consume output through the end of it.
    pub async fn expect_regex(&mut self, pattern: &Regex) -> Result<MatchResult, ExpectError> {
        self.with(ExpectOpts::default()).expect_regex(pattern).await
    }

    /// Wait for a custom matcher to match.
    pub async fn expect_custom<M: Matcher>(&mut self, matcher: M) -> Result<MatchResult, ExpectError> {
        self.with(ExpectOpts::default()).expect_custom(matcher).await
    }

    /// Consume the terminal's echo of the last line sent with
    /// [`send_line`](Self::send_line).
    ///
    /// Do this before expecting output that repeats the input, otherwise
    /// the echo itself satisfies the expectation.
    pub async fn expect_input(&mut self) -> Result<MatchResult, ExpectError> {
        self.with(ExpectOpts::default()).expect_input().await
    }

    /// Wait for the process to exit and assert its exit code.
    pub async fn expect_exit_code(&mut self, code: u32) -> Result<ExitStatus, ExpectError> {
        self.with(ExpectOpts::default()).expect_exit_code(code).await
    }

    /// Send raw bytes to the process.
    ///
    /// Control characters and escape sequences go through unchanged:
    ///
    /// ```no_run
    /// use termexpect::Session;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let mut session = Session::spawn("bash")?;
    /// // Ctrl-C
    /// session.send(&[0x03]).await?;
    /// // Up arrow
    /// session.send(b"\x1b[A").await?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// Raw sends are not recorded for [`expect_input`](Self::expect_input).
    pub async fn send(&mut self, data: &[u8]) -> Result<(), ExpectError> {
        let writer = self.writer.clone();
        let data = data.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut writer = writer.blocking_lock();
            writer.write_all(&data)?;
            writer.flush()
        })
        .await
        .map_err(|e| ExpectError::IoError(std::io::Error::other(e)))??;

        Ok(())
    }

    /// Send a line followed by the platform line terminator.
    ///
    /// The line is remembered as pending input until
    /// [`expect_input`](Self::expect_input) consumes its echo or another
    /// line replaces it.
    pub async fn send_line(&mut self, line: &str) -> Result<(), ExpectError> {
        debug!(line, "sending line");
        self.send(format!("{line}{LINE_TERMINATOR}").as_bytes())
            .await?;
        self.last_sent = Some(line.to_string());
        Ok(())
    }

    /// Wait up to `timeout` for the process to exit.
    ///
    /// Unlike the expect calls this never goes through the error reporter.
    pub async fn wait(&mut self, timeout: Duration) -> Result<ExitStatus, ExpectError> {
        engine::wait_exit(&mut self.record, Some(timeout)).await
    }

    /// Everything the process has printed so far, consumed or not.
    pub fn snapshot(&self) -> String {
        String::from_utf8_lossy(&self.buffer.snapshot()).into_owned()
    }

    /// Output not yet consumed by any match.
    pub fn unconsumed(&self) -> String {
        self.buffer
            .with_window(|_, window| String::from_utf8_lossy(window).into_owned())
    }

    /// Exit status, if the process has exited and been reaped.
    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.record.borrow().exit.clone()
    }

    /// Whether the process has exited and been reaped.
    pub fn has_exited(&self) -> bool {
        self.record.borrow().exit.is_some()
    }

    /// OS process id of the child, where the platform reports one.
    pub fn process_id(&self) -> Option<u32> {
        self.process_id
    }

    /// Kill the process.
    ///
    /// The reader still drains whatever output is left and records the
    /// exit status.
    pub fn kill(&mut self) -> Result<(), ExpectError> {
        if self.record.borrow().finished {
            return Ok(());
        }
        debug!(pid = ?self.process_id, "killing process");
        self.killer.kill()?;
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.record.borrow().finished {
            if let Err(e) = self.killer.kill() {
                warn!(error = %e, "failed to kill process on drop");
            }
        }
    }
}

/// Expect calls with per-call options applied.
///
/// Created by [`Session::with`].
pub struct Expecter<'a> {
    session: &'a mut Session,
    opts: ExpectOpts,
}

impl Expecter<'_> {
    fn fail(&self, err: ExpectError) -> ExpectError {
        self.session.policy.handle(&self.opts, err)
    }

    async fn run<M: Matcher + ?Sized>(&mut self, matcher: &mut M) -> Result<MatchResult, ExpectError> {
        let timeout = self.session.policy.timeout_for(&self.opts);
        let result = engine::evaluate(
            &self.session.buffer,
            &mut self.session.record,
            matcher,
            timeout,
            self.session.policy.verbose,
        )
        .await;
        result.map_err(|e| self.fail(e))
    }

    /// Wait for `text` and consume output through its first occurrence.
    pub async fn expect(mut self, text: &str) -> Result<MatchResult, ExpectError> {
        let mut matcher = ExactMatcher::new(text).map_err(|e| self.fail(e.into()))?;
        debug!(text, "expecting text");
        self.run(&mut matcher).await
    }

    /// Wait for a regex match and consume output through the end of it.
    pub async fn expect_regex(mut self, pattern: &Regex) -> Result<MatchResult, ExpectError> {
        let mut matcher = RegexMatcher::from_regex(pattern.clone());
        debug!(pattern = pattern.as_str(), "expecting pattern");
        self.run(&mut matcher).await
    }

    /// Wait for a custom matcher to match.
    pub async fn expect_custom<M: Matcher>(mut self, mut matcher: M) -> Result<MatchResult, ExpectError> {
        self.run(&mut matcher).await
    }

    /// Consume the terminal's echo of the last line sent.
    ///
    /// With no pending input there is nothing to match and the call runs
    /// into its timeout.
    pub async fn expect_input(mut self) -> Result<MatchResult, ExpectError> {
        let mut matcher = EchoMatcher::new(self.session.last_sent.as_deref());
        if !matcher.is_armed() {
            debug!("expecting input echo with no input pending");
        }
        let result = self.run(&mut matcher).await?;
        self.session.last_sent = None;
        Ok(result)
    }

    /// Wait for the process to exit and assert its exit code.
    ///
    /// Unconsumed output does not hold this up.
    pub async fn expect_exit_code(self, code: u32) -> Result<ExitStatus, ExpectError> {
        let timeout = self.session.policy.timeout_for(&self.opts);
        let status = engine::wait_exit(&mut self.session.record, timeout)
            .await
            .map_err(|e| self.fail(e))?;

        if status.exit_code() != code {
            return Err(self.fail(ExpectError::ExitCode {
                expected: code,
                actual: status.exit_code(),
            }));
        }
        Ok(status)
    }
}

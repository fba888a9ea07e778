//! Session builder for configuration

use super::options::{ErrorHandling, ErrorReporter, Policy};
use super::{pump, Session};
use crate::buffer::SessionBuffer;
use crate::result::ExpectError;
use portable_pty::{native_pty_system, ChildKiller, CommandBuilder, PtySize};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Default timeout for expect operations (in seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default PTY rows
const DEFAULT_PTY_ROWS: u16 = 24;

/// Default PTY columns
const DEFAULT_PTY_COLS: u16 = 80;

/// Builder for configuring and spawning sessions.
///
/// # Defaults
///
/// - Timeout: 30 seconds
/// - Error handling: report failures
/// - Reporter: none (failures are logged)
/// - Verbose logging: disabled
/// - ANSI stripping: disabled
/// - PTY size: 24 rows × 80 columns
///
/// # Examples
///
/// ```no_run
/// use termexpect::Session;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let session = Session::builder()
///     .timeout(Duration::from_secs(60))
///     .strip_ansi(true)
///     .panic_on_failure()
///     .env("PS1", "$ ")
///     .spawn_args("bash", ["--norc", "--noprofile"])?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    timeout: Option<Duration>,
    error_handling: ErrorHandling,
    reporter: Option<ErrorReporter>,
    verbose: bool,
    strip_ansi: bool,
    pty_size: PtySize,
    env: Vec<(OsString, OsString)>,
    cwd: Option<PathBuf>,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBuilder {
    /// Create a new session builder with default configuration.
    pub fn new() -> Self {
        Self {
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            error_handling: ErrorHandling::default(),
            reporter: None,
            verbose: false,
            strip_ansi: false,
            pty_size: PtySize {
                rows: DEFAULT_PTY_ROWS,
                cols: DEFAULT_PTY_COLS,
                pixel_width: 0,
                pixel_height: 0,
            },
            env: Vec::new(),
            cwd: None,
        }
    }

    /// Set the default timeout for expect operations.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disable the default timeout (wait until match or process exit).
    pub fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Set the default error handling mode.
    pub fn error_handling(mut self, mode: ErrorHandling) -> Self {
        self.error_handling = mode;
        self
    }

    /// Install a hook that receives every unsilenced expect failure.
    pub fn error_reporter(mut self, f: impl Fn(&ExpectError) + Send + Sync + 'static) -> Self {
        self.reporter = Some(ErrorReporter::new(f));
        self
    }

    /// Panic on unsilenced expect failures, failing the enclosing test.
    pub fn panic_on_failure(mut self) -> Self {
        self.reporter = Some(ErrorReporter::panic());
        self
    }

    /// Log every matcher evaluation along with the window it saw.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Enable or disable ANSI escape sequence stripping.
    ///
    /// When enabled, escape sequences are removed as output is captured, so
    /// matchers and snapshots only see plain text.
    pub fn strip_ansi(mut self, strip: bool) -> Self {
        self.strip_ansi = strip;
        self
    }

    /// Set PTY (terminal) size.
    pub fn pty_size(mut self, rows: u16, cols: u16) -> Self {
        self.pty_size = PtySize {
            rows,
            cols,
            pixel_width: 0,
            pixel_height: 0,
        };
        self
    }

    /// Set an environment variable for the spawned process.
    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.env
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    /// Set the working directory of the spawned process.
    pub fn cwd(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Spawn a whitespace-separated command line.
    ///
    /// Use [`spawn_args`](Self::spawn_args) when an argument contains spaces.
    ///
    /// # Errors
    ///
    /// Returns an error if the command is empty, the PTY cannot be created,
    /// or the process cannot be spawned.
    pub fn spawn(self, command: &str) -> Result<Session, ExpectError> {
        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| ExpectError::SpawnError("Empty command".to_string()))?;
        self.spawn_args(program, parts)
    }

    /// Spawn `program` with an explicit argument list.
    ///
    /// ```no_run
    /// use termexpect::Session;
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let session = Session::builder().spawn_args("bash", ["-c", "echo HELLO"])?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn spawn_args<I, S>(self, program: impl AsRef<OsStr>, args: I) -> Result<Session, ExpectError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let program = program.as_ref();
        if program.is_empty() {
            return Err(ExpectError::SpawnError("Empty command".to_string()));
        }

        let mut cmd = CommandBuilder::new(program);
        for arg in args {
            cmd.arg(arg);
        }
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        if let Some(dir) = &self.cwd {
            cmd.cwd(dir);
        }

        let pty_pair = native_pty_system()
            .openpty(self.pty_size)
            .map_err(|e| ExpectError::PtyError(e.to_string()))?;

        let child = pty_pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| ExpectError::SpawnError(e.to_string()))?;
        // The reader only sees end of stream once every slave handle is closed
        drop(pty_pair.slave);

        let process_id = child.process_id();
        let killer = child.clone_killer();
        debug!(program = ?program, pid = ?process_id, "spawned process");

        let reader = pty_pair
            .master
            .try_clone_reader()
            .map_err(|e| ExpectError::PtyError(e.to_string()))?;
        let writer = pty_pair
            .master
            .take_writer()
            .map_err(|e| ExpectError::PtyError(e.to_string()))?;

        let buffer = Arc::new(SessionBuffer::new(self.strip_ansi));
        let (record, pump) = pump::start(reader, child, buffer.clone())?;

        Ok(Session {
            _master: pty_pair.master,
            writer: Arc::new(Mutex::new(writer)),
            killer,
            process_id,
            buffer,
            record,
            _pump: pump,
            last_sent: None,
            policy: Policy {
                timeout: self.timeout,
                error_handling: self.error_handling,
                reporter: self.reporter,
                verbose: self.verbose,
            },
        })
    }
}

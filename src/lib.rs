//! termexpect: expect-style automation of interactive programs
//!
//! termexpect spawns a process on a pseudo-terminal, captures everything it
//! prints, and lets you wait for text to appear. Every successful match
//! consumes the output up to its end, so a sequence of expectations walks
//! forward through the output instead of matching the same text twice.
//!
//! # Features
//!
//! - **Consuming matches**: a cursor separates consumed from unconsumed output
//! - **Pluggable matchers**: exact text, regex, input echo, or any closure
//! - **Deadlines**: every expectation waits for a bounded time
//! - **Failure reporting**: unsilenced failures go to a hook, e.g. to fail a test
//! - **ANSI stripping**: optional removal of escape sequences before matching
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use termexpect::Session;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = Session::builder()
//!         .timeout(Duration::from_secs(10))
//!         .spawn_args("bash", ["-c", "echo HELLO"])?;
//!
//!     session.expect("HELLO").await?;
//!     session.expect_exit_code(0).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Interactive Input
//!
//! A terminal echoes what you type. Consume that echo with
//! [`Session::expect_input`] before looking for real output, or the echo
//! will satisfy the expectation instead:
//!
//! ```rust,no_run
//! use termexpect::{ExpectOpts, Session};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = Session::spawn("bash")?;
//! session.send_line("FOO=bar").await?;
//! session.expect_input().await?;
//!
//! // Nothing but the echo ever contained FOO=bar
//! let quick = ExpectOpts::new().timeout(Duration::from_millis(100)).silence();
//! assert!(session.with(quick).expect("FOO=bar").await.unwrap_err().is_timeout());
//! # Ok(())
//! # }
//! ```
//!
//! # Custom Matchers
//!
//! A matcher sees the whole unconsumed window and says how far to consume:
//!
//! ```rust,no_run
//! use termexpect::{MatchOutcome, Session};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let mut session = Session::spawn("bash")?;
//! session
//!     .expect_custom(|window: &[u8]| -> MatchOutcome {
//!         Ok(window.iter().rposition(|&b| b == b'$').map(|i| i + 1))
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod buffer;
pub mod pattern;
mod result;
mod session;

// Public API exports
pub use buffer::{strip_ansi, AnsiStripper};
pub use pattern::{EchoMatcher, ExactMatcher, MatchOutcome, Matcher, RegexMatcher};
pub use result::{ExpectError, MatchResult, MatcherError, PatternError};
pub use session::{ErrorHandling, ErrorReporter, ExpectOpts, Expecter, Session, SessionBuilder};

// Re-export commonly used types
pub use portable_pty::ExitStatus;
pub use regex::bytes::Regex;

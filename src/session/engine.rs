//! Blocking-with-deadline evaluation of matchers against the output window

use super::pump::ProcessRecord;
use crate::buffer::SessionBuffer;
use crate::pattern::Matcher;
use crate::result::{ExpectError, MatchResult};
use portable_pty::ExitStatus;
use std::io;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

fn timed_out(started: Instant, exited: bool) -> ExpectError {
    ExpectError::Timeout {
        duration: started.elapsed(),
        exited,
    }
}

/// Deadline for `timeout` from `started`. A timeout too large to
/// represent means no deadline at all.
fn deadline_for(started: Instant, timeout: Option<Duration>) -> Option<Instant> {
    timeout.and_then(|t| started.checked_add(t))
}

fn pump_stopped() -> ExpectError {
    ExpectError::ReadFailed(io::Error::new(
        io::ErrorKind::BrokenPipe,
        "output reader stopped unexpectedly",
    ))
}

/// Evaluate `matcher` until it matches, errors, or time runs out.
///
/// The matcher always sees the whole unconsumed window. Between
/// evaluations the call sleeps until the pump publishes a change, so an
/// idle process costs nothing. On a match the cursor moves past the
/// consumed bytes; on every other outcome it is left alone.
///
/// Once the output is drained one last evaluation decides the call, so a
/// dead process fails fast instead of running out the clock.
pub(crate) async fn evaluate<M: Matcher + ?Sized>(
    buffer: &SessionBuffer,
    record: &mut watch::Receiver<ProcessRecord>,
    matcher: &mut M,
    timeout: Option<Duration>,
    verbose: bool,
) -> Result<MatchResult, ExpectError> {
    let started = Instant::now();
    let deadline = deadline_for(started, timeout);
    let mut pump_gone = false;

    loop {
        // Mark the state seen before reading the window: anything appended
        // after this point triggers another round.
        let state = record.borrow_and_update().clone();

        let outcome = buffer.with_window(|start, window| {
            if verbose {
                debug!(
                    cursor = start,
                    window = %String::from_utf8_lossy(window),
                    "evaluating matcher"
                );
            }

            match matcher.consume(window) {
                Err(e) => Some(Err(ExpectError::Matcher(e))),
                Ok(Some(end)) if end > window.len() => Some(Err(ExpectError::InvalidConsume {
                    end,
                    window: window.len(),
                })),
                Ok(Some(end)) if end > 0 => Some(Ok((end, matcher.result(start, window, end)))),
                Ok(_) => None,
            }
        });

        if let Some(outcome) = outcome {
            // Appends since the evaluation only grow the window, so `end`
            // is still in range.
            let (end, result) = outcome?;
            buffer.advance(end)?;
            debug!(start = result.start, end = result.end, "matched");
            return Ok(result);
        }

        if let Some(failure) = &state.failure {
            return Err(ExpectError::ReadFailed(failure.to_io_error()));
        }
        if state.drained {
            return Err(timed_out(started, true));
        }
        if pump_gone {
            return Err(pump_stopped());
        }

        let changed = match deadline {
            Some(deadline) => {
                if Instant::now() >= deadline {
                    return Err(timed_out(started, false));
                }
                match tokio::time::timeout_at(deadline, record.changed()).await {
                    Ok(changed) => changed,
                    Err(_) => return Err(timed_out(started, false)),
                }
            }
            None => record.changed().await,
        };
        pump_gone = changed.is_err();
    }
}

/// Wait for the process to be reaped, without looking at its output.
///
/// Independent of the cursor, so it is safe to call with unconsumed
/// output still pending.
pub(crate) async fn wait_exit(
    record: &mut watch::Receiver<ProcessRecord>,
    timeout: Option<Duration>,
) -> Result<ExitStatus, ExpectError> {
    let started = Instant::now();
    let finished = record.wait_for(|state| state.finished);

    let state = match deadline_for(started, timeout) {
        Some(deadline) => match tokio::time::timeout_at(deadline, finished).await {
            Ok(state) => state,
            Err(_) => return Err(timed_out(started, false)),
        },
        None => finished.await,
    }
    .map_err(|_| pump_stopped())?
    .clone();

    match (state.exit, state.failure) {
        (Some(status), _) => Ok(status),
        (None, Some(failure)) => Err(ExpectError::ReadFailed(failure.to_io_error())),
        (None, None) => Err(pump_stopped()),
    }
}

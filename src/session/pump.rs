//! Background reader feeding process output into the session buffer

use crate::buffer::SessionBuffer;
use portable_pty::{Child, ExitStatus};
use std::io::{self, Read};
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

/// Bytes requested per read
const READ_CHUNK: usize = 4096;

/// Linux and macOS report EIO on the master once the slave side is gone.
#[cfg(unix)]
const EIO: i32 = 5;

/// A failure of the output channel, kept in a cloneable form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadFailure {
    kind: io::ErrorKind,
    message: String,
}

impl ReadFailure {
    pub(crate) fn new(err: &io::Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// Rebuild an `io::Error` describing the failure
    pub fn to_io_error(&self) -> io::Error {
        io::Error::new(self.kind, self.message.clone())
    }
}

/// What the pump knows about the process and its output.
///
/// Published through a watch channel; every change wakes waiting expect
/// calls. Data is appended to the buffer before the matching change is
/// published, so a waiter that sees a change also sees its bytes.
#[derive(Debug, Clone, Default)]
pub struct ProcessRecord {
    /// Number of chunks appended so far
    pub appended: u64,
    /// No more output will ever arrive
    pub drained: bool,
    /// Output channel or wait failure, if any
    pub failure: Option<ReadFailure>,
    /// Exit status, set once the process has been reaped
    pub exit: Option<ExitStatus>,
    /// The pump thread is done; nothing in this record changes again
    pub finished: bool,
}

/// Start the reader pump on its own thread.
///
/// The thread reads until end of stream, then reaps the child and records
/// its exit status.
pub(crate) fn start(
    mut reader: Box<dyn Read + Send>,
    mut child: Box<dyn Child + Send + Sync>,
    buffer: Arc<SessionBuffer>,
) -> io::Result<(watch::Receiver<ProcessRecord>, JoinHandle<()>)> {
    let (tx, rx) = watch::channel(ProcessRecord::default());

    let handle = std::thread::Builder::new()
        .name("termexpect-pump".to_string())
        .spawn(move || {
            let mut chunk = [0u8; READ_CHUNK];
            loop {
                match reader.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => {
                        let stored = buffer.append(&chunk[..n]);
                        trace!(read = n, stored, "pump appended output");
                        tx.send_modify(|record| record.appended += 1);
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) if is_hangup(&e) => break,
                    Err(e) => {
                        warn!(error = %e, "reading process output failed");
                        tx.send_modify(|record| record.failure = Some(ReadFailure::new(&e)));
                        break;
                    }
                }
            }
            tx.send_modify(|record| record.drained = true);
            debug!(bytes = buffer.len(), "process output drained");

            match child.wait() {
                Ok(status) => {
                    debug!(exit_code = status.exit_code(), "process exited");
                    tx.send_modify(|record| {
                        record.exit = Some(status);
                        record.finished = true;
                    });
                }
                Err(e) => {
                    warn!(error = %e, "waiting for process failed");
                    tx.send_modify(|record| {
                        record.failure.get_or_insert_with(|| ReadFailure::new(&e));
                        record.finished = true;
                    });
                }
            }
        })?;

    Ok((rx, handle))
}

fn is_hangup(err: &io::Error) -> bool {
    #[cfg(unix)]
    if err.raw_os_error() == Some(EIO) {
        return true;
    }
    matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe | io::ErrorKind::UnexpectedEof
    )
}

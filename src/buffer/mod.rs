//! Append-only capture of process output with a consumed cursor

mod ansi;

pub use ansi::{strip_ansi, AnsiStripper};

use crate::result::ExpectError;
use bytes::{Bytes, BytesMut};
use std::sync::{Mutex, MutexGuard};
use tracing::warn;

/// Initial capacity reserved for captured output
const INITIAL_CAPACITY: usize = 8192;

struct BufferState {
    bytes: BytesMut,
    cursor: usize,
    stripper: Option<AnsiStripper>,
}

/// Session output buffer.
///
/// Bytes are only ever appended; nothing is truncated or rewritten. The
/// cursor marks how much of the output has been consumed by matches and
/// only moves forward. The reader pump appends and the expect engine
/// advances under the same lock, so each operation is atomic with respect
/// to the other.
pub struct SessionBuffer {
    state: Mutex<BufferState>,
}

impl SessionBuffer {
    /// Create an empty buffer, optionally stripping ANSI sequences on append
    pub fn new(strip_ansi: bool) -> Self {
        Self {
            state: Mutex::new(BufferState {
                bytes: BytesMut::with_capacity(INITIAL_CAPACITY),
                cursor: 0,
                stripper: strip_ansi.then(AnsiStripper::new),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BufferState> {
        self.state.lock().unwrap_or_else(|e| {
            warn!("session buffer lock was poisoned, recovering");
            e.into_inner()
        })
    }

    /// Append a chunk of output, returning how many bytes were stored
    pub fn append(&self, chunk: &[u8]) -> usize {
        let mut state = self.lock();
        match state.stripper.as_mut() {
            Some(stripper) => {
                let clean = stripper.strip(chunk);
                state.bytes.extend_from_slice(&clean);
                clean.len()
            }
            None => {
                state.bytes.extend_from_slice(chunk);
                chunk.len()
            }
        }
    }

    /// Run `f` over the unconsumed window as of now.
    ///
    /// `f` gets the absolute offset of the window and a borrowed view of
    /// it. The lock is held for the duration, so appends wait until `f`
    /// returns.
    pub fn with_window<R>(&self, f: impl FnOnce(usize, &[u8]) -> R) -> R {
        let state = self.lock();
        f(state.cursor, &state.bytes[state.cursor..])
    }

    /// Move the cursor forward by `n` bytes, returning the new cursor.
    ///
    /// `n` comes from a match against a previously captured window, so it
    /// can never legitimately pass the current end.
    pub fn advance(&self, n: usize) -> Result<usize, ExpectError> {
        let mut state = self.lock();
        let available = state.bytes.len() - state.cursor;
        if n > available {
            return Err(ExpectError::InvalidConsume {
                end: n,
                window: available,
            });
        }
        state.cursor += n;
        Ok(state.cursor)
    }

    /// Full output history including consumed bytes. Diagnostics only.
    pub fn snapshot(&self) -> Bytes {
        Bytes::copy_from_slice(&self.lock().bytes)
    }

    /// Current cursor position
    #[cfg(test)]
    pub fn cursor(&self) -> usize {
        self.lock().cursor
    }

    /// Total bytes captured so far
    pub fn len(&self) -> usize {
        self.lock().bytes.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.lock().bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn window(buffer: &SessionBuffer) -> (usize, Vec<u8>) {
        buffer.with_window(|start, bytes| (start, bytes.to_vec()))
    }

    #[test]
    fn test_new_buffer() {
        let buffer = SessionBuffer::new(false);
        assert!(buffer.is_empty());
        assert_eq!(buffer.cursor(), 0);
        assert_eq!(window(&buffer), (0, Vec::new()));
    }

    #[test]
    fn test_append_grows_window() {
        let buffer = SessionBuffer::new(false);
        assert_eq!(buffer.append(b"Hello "), 6);
        buffer.append(b"World");

        assert_eq!(window(&buffer), (0, b"Hello World".to_vec()));
    }

    #[test]
    fn test_advance_hides_consumed_bytes() {
        let buffer = SessionBuffer::new(false);
        buffer.append(b"Hello World");

        assert_eq!(buffer.advance(6).unwrap(), 6);
        assert_eq!(window(&buffer), (6, b"World".to_vec()));
    }

    #[test]
    fn test_snapshot_keeps_consumed_bytes() {
        let buffer = SessionBuffer::new(false);
        buffer.append(b"ONE TWO");
        buffer.advance(4).unwrap();

        assert_eq!(&buffer.snapshot()[..], b"ONE TWO");
    }

    #[test]
    fn test_advance_past_end_is_rejected() {
        let buffer = SessionBuffer::new(false);
        buffer.append(b"abc");
        buffer.advance(1).unwrap();

        match buffer.advance(3) {
            Err(ExpectError::InvalidConsume { end, window }) => {
                assert_eq!(end, 3);
                assert_eq!(window, 2);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(buffer.cursor(), 1);
    }

    #[test]
    fn test_window_borrows_buffer_storage() {
        let buffer = SessionBuffer::new(false);
        buffer.append(b"0123456789");
        buffer.advance(4).unwrap();

        let base = buffer.lock().bytes.as_ptr() as usize;
        let seen = buffer.with_window(|start, window| {
            assert_eq!(start, 4);
            window.as_ptr() as usize
        });
        assert_eq!(seen, base + 4);
    }

    #[test]
    fn test_append_between_window_and_advance() {
        let buffer = SessionBuffer::new(false);
        buffer.append(b"PROMPT> ");
        let (_, seen) = window(&buffer);

        buffer.append(b"late output");
        buffer.advance(seen.len()).unwrap();

        assert_eq!(window(&buffer).1, b"late output");
    }

    #[test]
    fn test_strip_ansi_enabled() {
        let buffer = SessionBuffer::new(true);
        let stored = buffer.append(b"Hello \x1b[31mRed\x1b[0m World");

        assert_eq!(stored, 15);
        assert_eq!(&buffer.snapshot()[..], b"Hello Red World");
    }

    #[test]
    fn test_strip_ansi_disabled() {
        let buffer = SessionBuffer::new(false);
        let data = b"Hello \x1b[31mRed\x1b[0m World";
        buffer.append(data);

        assert_eq!(&buffer.snapshot()[..], data);
    }

    #[test]
    fn test_binary_data() {
        let buffer = SessionBuffer::new(false);
        buffer.append(&[0xFF, 0x00, 0xFE]);

        assert_eq!(window(&buffer).1, [0xFF, 0x00, 0xFE]);
    }

    proptest! {
        #[test]
        fn cursor_never_passes_end(
            chunks in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..32), 1..16),
            steps in proptest::collection::vec(0usize..64, 1..16),
        ) {
            let buffer = SessionBuffer::new(false);
            let mut last = 0;
            for (chunk, step) in chunks.iter().zip(steps.iter().cycle()) {
                buffer.append(chunk);
                let _ = buffer.advance(*step);
                let cursor = buffer.cursor();
                prop_assert!(cursor >= last);
                prop_assert!(cursor <= buffer.len());
                last = cursor;
            }
        }
    }
}

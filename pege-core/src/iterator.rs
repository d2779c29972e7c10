/*!
The sliding, line-aware byte iterator that the recognizer reads from.

An [`InputCursor`] never frees bytes once they're buffered: a streamed
source's window only ever grows, because the outermost composite of a
grammar (typically the axiom itself) may need to rewind all the way
back to its own start on failure, so no byte read during a parse can
ever be safely discarded before that parse concludes. This falls back
to full in-memory buffering for the life of a parse, one of the two
implementation choices spec.md's re-architecture guidance explicitly
allows for streaming sources ("bound this or fall back to full
in-memory buffering").
*/

use std::io::{self, Read};

use memchr::memchr_iter;

use crate::error::SourceError;

/// Default byte used to count lines when none is configured.
pub const DEFAULT_SEPARATOR: u8 = b'\n';

/// Where an [`InputCursor`] pulls its bytes from.
enum Source {
    /// The whole input is already in memory; `buffer` *is* the input and
    /// is never refilled.
    Bytes,
    /// Bytes are pulled from a reader as needed.
    Reader(Box<dyn Read + Send>),
}

/// A sliding, line-tracking cursor over a byte stream.
///
/// Presents the input as a byte sequence with an absolute `offset`,
/// refilling its internal buffer from the underlying source as the
/// recognizer advances, while still allowing the recognizer to rewind
/// within the buffered window (backtracking and memoization both rely
/// on this).
pub struct InputCursor {
    source: Source,
    /// The buffered window. For `Source::Bytes` this holds the entire
    /// input; for `Source::Reader` it holds only a trailing window.
    buffer: Vec<u8>,
    /// Absolute offset of `buffer[0]`.
    window_start: usize,
    /// Absolute offset of the iterator's current position.
    offset: usize,
    /// Target size of the buffered window when streaming. Ignored for
    /// `Source::Bytes`.
    capacity: usize,
    /// Byte used to count lines.
    separator: u8,
    /// 1-based line number of `window_start`.
    base_line: usize,
    /// Set once the underlying reader has returned EOF.
    exhausted: bool,
}

impl InputCursor {
    /// Construct an iterator over an in-memory byte buffer.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let len = bytes.len();
        InputCursor {
            source: Source::Bytes,
            buffer: bytes,
            window_start: 0,
            offset: 0,
            capacity: len,
            separator: DEFAULT_SEPARATOR,
            base_line: 1,
            exhausted: true,
        }
    }

    /// Construct an iterator over a streamed source, keeping roughly
    /// `capacity` bytes buffered at a time.
    pub fn from_reader(reader: impl Read + Send + 'static, capacity: usize) -> Self {
        InputCursor {
            source: Source::Reader(Box::new(reader)),
            buffer: Vec::new(),
            window_start: 0,
            offset: 0,
            capacity: capacity.max(1),
            separator: DEFAULT_SEPARATOR,
            base_line: 1,
            exhausted: false,
        }
    }

    /// Open a path and construct a streamed iterator over its contents.
    pub fn from_path(path: impl AsRef<std::path::Path>, capacity: usize) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| SourceError::Io {
            path: path.to_owned(),
            source,
        })?;
        Ok(Self::from_reader(file, capacity))
    }

    /// Change the byte used to count lines. Must be called before any
    /// advancing, or line numbers before the change will be wrong.
    pub fn set_separator(&mut self, separator: u8) {
        self.separator = separator;
    }

    /// The current absolute offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Index of `offset` within the buffer, if it's within the window.
    fn local_offset(&self, offset: usize) -> Option<usize> {
        offset.checked_sub(self.window_start).filter(|&o| o <= self.buffer.len())
    }

    /// Pull more bytes from the underlying reader until at least
    /// `target_local_len` bytes are buffered, or the source is exhausted.
    fn fill_to(&mut self, target_local_len: usize) {
        let Source::Reader(reader) = &mut self.source else {
            return;
        };
        if self.exhausted {
            return;
        }
        let mut chunk = [0u8; 8192];
        while self.buffer.len() < target_local_len {
            match reader.read(&mut chunk) {
                Ok(0) => {
                    self.exhausted = true;
                    break;
                }
                Ok(n) => self.buffer.extend_from_slice(&chunk[..n]),
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => {
                    self.exhausted = true;
                    break;
                }
            }
        }
    }

    /// Ensure the window covers `[self.offset, self.offset + n)`,
    /// refilling from the reader if necessary.
    fn ensure_available(&mut self, n: usize) {
        let local_end = self.offset - self.window_start + n;
        if local_end > self.buffer.len() {
            self.fill_to(local_end);
        }
    }

    /// Return up to `n` bytes starting at the current offset, without
    /// advancing. Returns fewer than `n` bytes at end of input.
    pub fn peek(&mut self, n: usize) -> &[u8] {
        self.ensure_available(n);
        let local = self.offset - self.window_start;
        let end = local.saturating_add(n).min(self.buffer.len());
        &self.buffer[local..end]
    }

    /// Return every byte from the current offset to the end of input,
    /// pulling in the rest of the underlying reader if necessary
    /// (streamed sources buffer their entire remainder eagerly once
    /// this is called — the right tool for matching regex tokens
    /// against, not for bounding memory).
    pub fn remaining(&mut self) -> &[u8] {
        if matches!(self.source, Source::Reader(_)) {
            while !self.exhausted {
                let target = self.buffer.len() + 8192;
                self.fill_to(target);
            }
        }
        let local = (self.offset - self.window_start).min(self.buffer.len());
        &self.buffer[local..]
    }

    /// True if there is no more input at the current offset.
    pub fn at_end(&mut self) -> bool {
        self.peek(1).is_empty()
    }

    /// Move the offset forward by `n` bytes. Returns `false` (and
    /// advances only as far as possible) if fewer than `n` bytes
    /// remained.
    pub fn advance(&mut self, n: usize) -> bool {
        self.ensure_available(n);
        let local = self.offset - self.window_start;
        let available = self.buffer.len() - local;
        let actual = available.min(n);
        self.offset += actual;
        actual == n
    }

    /// Seek backward (or forward) within the currently buffered window.
    /// Fails if `offset` is outside `[window_start, window_start + buffer.len()]`.
    pub fn set_offset(&mut self, offset: usize) -> bool {
        match self.local_offset(offset) {
            Some(_) => {
                self.offset = offset;
                true
            }
            None => false,
        }
    }

    /// 1-based line number containing `offset`. `offset` must be within
    /// the buffered window.
    pub fn line_of(&self, offset: usize) -> usize {
        let local = self
            .local_offset(offset)
            .unwrap_or(self.buffer.len().min(offset.saturating_sub(self.window_start)));
        self.base_line + memchr_iter(self.separator, &self.buffer[..local]).count()
    }

    /// The currently buffered window, for diagnostics (offsets within it
    /// are relative to [`InputCursor::window_start`]).
    pub fn window(&self) -> &[u8] {
        &self.buffer
    }

    /// Absolute offset of the first byte of [`InputCursor::window`].
    pub fn window_start(&self) -> usize {
        self.window_start
    }

    /// A slice of the input between `offset` and `offset + length`, if
    /// still within the buffered window. Used to read back matched text
    /// (e.g. for diagnostics); token capture groups are copied eagerly
    /// at match time and don't depend on this.
    pub fn slice(&self, offset: usize, length: usize) -> Option<&[u8]> {
        let start = self.local_offset(offset)?;
        let end = start.checked_add(length).filter(|&e| e <= self.buffer.len())?;
        Some(&self.buffer[start..end])
    }

    /// Target size of each refill read from a streamed source; does not
    /// bound how large the buffered window can eventually grow.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peek_and_advance_in_memory() {
        let mut it = InputCursor::from_bytes(b"hello world".to_vec());
        assert_eq!(it.peek(5), b"hello");
        assert!(it.advance(5));
        assert_eq!(it.offset(), 5);
        assert_eq!(it.peek(1), b" ");
    }

    #[test]
    fn advance_past_end_reports_false() {
        let mut it = InputCursor::from_bytes(b"hi".to_vec());
        assert!(!it.advance(10));
        assert_eq!(it.offset(), 2);
        assert!(it.at_end());
    }

    #[test]
    fn set_offset_rewinds_within_window() {
        let mut it = InputCursor::from_bytes(b"abcdef".to_vec());
        it.advance(4);
        assert!(it.set_offset(1));
        assert_eq!(it.peek(2), b"bc");
        assert!(!it.set_offset(100));
    }

    #[test]
    fn line_tracking() {
        let mut it = InputCursor::from_bytes(b"one\ntwo\nthree".to_vec());
        assert_eq!(it.line_of(0), 1);
        it.advance(4);
        assert_eq!(it.line_of(it.offset()), 2);
        it.advance(4);
        assert_eq!(it.line_of(it.offset()), 3);
    }

    #[test]
    fn streaming_refill() {
        let data = b"one two three four five".to_vec();
        let mut it = InputCursor::from_reader(io::Cursor::new(data), 4);
        assert_eq!(it.peek(3), b"one");
        assert!(it.advance(4));
        assert_eq!(it.peek(3), b"two");
    }
}

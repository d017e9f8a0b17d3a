//! Buffered, compacting input window over a byte stream.
//!
//! Bytes are read in chunks and decoded incrementally into a `String` buffer
//! (UTF-8 sequences split across chunk boundaries are carried, invalid bytes
//! become U+FFFD). The tokenizer addresses the buffer by byte offset; once a
//! consumed prefix grows past `COMPACT_MIN` it is discarded and all offsets
//! rebase toward zero. Compaction is the tokenizer's call and only legal at a
//! token boundary, which keeps the discarded length observable downstream.

use std::io::Read;

use tools::utf8::Utf8Carry;

pub(crate) const READ_CHUNK: usize = 4096;
pub(crate) const COMPACT_MIN: usize = 4096;

#[derive(Debug)]
pub(crate) struct BufferedInput<R> {
    src: R,
    buf: String,
    carry: Utf8Carry,
    exhausted: bool,
    failure: Option<std::io::Error>,
}

impl<R: Read> BufferedInput<R> {
    pub(crate) fn new(src: R) -> Self {
        Self {
            src,
            buf: String::new(),
            carry: Utf8Carry::new(),
            exhausted: false,
            failure: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.buf
    }

    /// Byte at `i`; the caller must have `ensure`d it.
    pub(crate) fn byte(&self, i: usize) -> u8 {
        self.buf.as_bytes()[i]
    }

    /// Make the byte at `i` available, reading as needed.
    ///
    /// Returns false when the stream ends (or fails) first; `take_failure`
    /// distinguishes the two.
    pub(crate) fn ensure(&mut self, i: usize) -> bool {
        while self.buf.len() <= i {
            if self.exhausted || self.failure.is_some() {
                return false;
            }
            self.fill();
        }
        true
    }

    fn fill(&mut self) {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.src.read(&mut chunk) {
                Ok(0) => {
                    self.exhausted = true;
                    // Never drop a trailing partial sequence.
                    self.carry.finish(&mut self.buf);
                    return;
                }
                Ok(n) => {
                    self.carry.push(&mut self.buf, &chunk[..n]);
                    return;
                }
                Err(err) => {
                    if err.kind() == std::io::ErrorKind::Interrupted {
                        continue;
                    }
                    self.failure = Some(err);
                    return;
                }
            }
        }
    }

    pub(crate) fn take_failure(&mut self) -> Option<std::io::Error> {
        self.failure.take()
    }

    /// Discard the first `n` bytes; callers rebase their offsets.
    pub(crate) fn compact(&mut self, n: usize) {
        debug_assert!(
            self.buf.is_char_boundary(n),
            "compaction must land on a UTF-8 boundary"
        );
        self.buf.drain(..n);
    }
}

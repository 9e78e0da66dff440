use std::ops::Range;

use tracing::debug;

use crate::{
    error::ScanError,
    source::{Chunk, ChunkSource},
};

/// A dynamically resizable buffer that acts like a window being moved over
/// a larger input stream. Indexes passed to and returned from the window are
/// relative to its current start. [`Window::absolute`] translates them into
/// positions in the input stream.
#[derive(Debug)]
pub struct Window {
    /// Number of input bytes that have been dropped from the front
    pos: u64,

    /// The buffered bytes
    buf: Vec<u8>,

    /// The next index to inspect
    cursor: usize,

    /// Number of fresh bytes to request from the source per refill
    refill_size: usize,

    /// `true` as soon as the source has reported the end of its input
    exhausted: bool,
}

impl Window {
    pub fn new(refill_size: usize) -> Self {
        Self {
            pos: 0,
            buf: Vec::new(),
            cursor: 0,
            refill_size,
            exhausted: false,
        }
    }

    /// Append chunks from `source` until `refill_size` fresh bytes have been
    /// buffered or the source is exhausted. Returns the number of bytes
    /// appended. A single chunk may be shorter than requested, so the source
    /// is asked repeatedly.
    pub fn ensure_data<S: ChunkSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<usize, ScanError> {
        let target = self.buf.len() + self.refill_size;
        let mut appended = 0;
        while !self.exhausted && self.buf.len() < target {
            let max = target - self.buf.len();
            match source.read_chunk(max, &mut self.buf) {
                Ok(Chunk::Filled(n)) => appended += n,
                Ok(Chunk::EndOfInput) => self.exhausted = true,
                Err(err) => {
                    return Err(ScanError::source_unavailable(
                        format!(
                            "unable to read from source at offset {}",
                            self.absolute(self.buf.len())
                        ),
                        err,
                    ))
                }
            }
        }
        Ok(appended)
    }

    /// Drop all bytes before `consumed_through` and move the cursor
    /// accordingly. Returns the number of bytes dropped.
    pub fn trim(&mut self, consumed_through: usize) -> usize {
        let dropped = consumed_through.min(self.buf.len());
        if dropped > 0 {
            self.buf.drain(0..dropped);
            self.pos += dropped as u64;
            debug!(dropped, retained = self.buf.len(), pos = self.pos, "trimmed window");
        }
        self.cursor = self.cursor.saturating_sub(dropped);
        dropped
    }

    /// Find the first occurrence of `needle` that lies completely inside
    /// `range`
    pub fn find(&self, needle: &[u8], range: Range<usize>) -> Option<usize> {
        let end = range.end.min(self.buf.len());
        if needle.is_empty() || range.start > end || end - range.start < needle.len() {
            return None;
        }
        self.buf[range.start..end]
            .windows(needle.len())
            .position(|w| w == needle)
            .map(|p| p + range.start)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: usize) {
        debug_assert!(cursor <= self.buf.len());
        self.cursor = cursor;
    }

    /// The position of the window's first byte in the input stream
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Convert a window index into a position in the input stream
    pub fn absolute(&self, index: usize) -> u64 {
        self.pos + index as u64
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

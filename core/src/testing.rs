//! Test doubles shared by the unit tests of this crate

use std::{cell::Cell, io, rc::Rc};

use crate::{
    config::NestedStartPolicy,
    scan::record::{CaptureMode, Record},
    source::{Chunk, ChunkSource},
};

/// A source that serves its data in scripted (short) chunks, can be told to
/// fail after a number of bytes, and counts how often it was released
pub struct ScriptedSource {
    data: Vec<u8>,
    pos: usize,
    chunk_sizes: Vec<usize>,
    next_chunk: usize,
    fail_at: Option<usize>,
    releases: Rc<Cell<usize>>,
}

impl ScriptedSource {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            chunk_sizes: Vec::new(),
            next_chunk: 0,
            fail_at: None,
            releases: Rc::new(Cell::new(0)),
        }
    }

    /// Never return more bytes per read than the given sizes (used in a
    /// round-robin fashion)
    pub fn with_chunk_sizes(mut self, chunk_sizes: &[usize]) -> Self {
        self.chunk_sizes = chunk_sizes.to_vec();
        self
    }

    /// Fail with an I/O error as soon as `pos` bytes have been served
    pub fn failing_at(mut self, pos: usize) -> Self {
        self.fail_at = Some(pos);
        self
    }

    pub fn releases(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.releases)
    }
}

impl ChunkSource for ScriptedSource {
    fn read_chunk(&mut self, max: usize, buf: &mut Vec<u8>) -> io::Result<Chunk> {
        if self.releases.get() > 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "read after release"));
        }

        if matches!(self.fail_at, Some(f) if self.pos >= f) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "scripted failure"));
        }

        if self.pos == self.data.len() {
            return Ok(Chunk::EndOfInput);
        }

        let mut n = max.min(self.data.len() - self.pos);
        if !self.chunk_sizes.is_empty() {
            let limit = self.chunk_sizes[self.next_chunk % self.chunk_sizes.len()].max(1);
            self.next_chunk += 1;
            n = n.min(limit);
        }
        if let Some(f) = self.fail_at {
            n = n.min(f - self.pos);
        }

        buf.extend_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(Chunk::Filled(n))
    }

    fn release(&mut self) -> io::Result<()> {
        self.releases.set(self.releases.get() + 1);
        Ok(())
    }
}

/// An owned copy of an emitted record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captured {
    pub text: String,
    pub mode: CaptureMode,
    pub offset: u64,
}

impl From<Record<'_>> for Captured {
    fn from(record: Record<'_>) -> Self {
        Self {
            text: String::from_utf8_lossy(record.bytes()).into_owned(),
            mode: record.mode(),
            offset: record.offset(),
        }
    }
}

/// Find all records of `input` by searching the whole input at once. Used
/// as a reference for the buffered scan.
pub fn reference_records(
    input: &[u8],
    start: &[u8],
    end: &[u8],
    nested_start: NestedStartPolicy,
) -> Vec<(u64, Vec<u8>)> {
    fn find(haystack: &[u8], needle: &[u8], from: usize, to: usize) -> Option<usize> {
        haystack
            .get(from..to)?
            .windows(needle.len())
            .position(|w| w == needle)
            .map(|p| p + from)
    }

    let mut result = Vec::new();
    let mut cursor = 0;
    while let Some(s) = find(input, start, cursor, input.len()) {
        let body = s + start.len();
        let e = find(input, end, body, input.len());

        // restart at a start marker that ends before the end marker
        if nested_start == NestedStartPolicy::Restart {
            if let Some(next) = find(input, start, body, e.unwrap_or(input.len())) {
                cursor = next;
                continue;
            }
        }

        let Some(e) = e else {
            break;
        };
        let stop = e + end.len();
        result.push((s as u64, input[s..stop].to_vec()));
        cursor = stop;
    }
    result
}

use std::{
    fs::File,
    io::{self, Read},
    path::Path,
};

use tracing::{debug, warn};

use crate::error::ScanError;

/// The outcome of a single [`ChunkSource::read_chunk`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunk {
    /// This many bytes have been appended to the buffer (never zero)
    Filled(usize),

    /// The source has no more bytes
    EndOfInput,
}

/// A sequential byte source that a scan consumes chunk by chunk
pub trait ChunkSource {
    /// Append at most `max` bytes to `buf`. A source may return fewer bytes
    /// than requested even if it is not exhausted yet.
    fn read_chunk(&mut self, max: usize, buf: &mut Vec<u8>) -> io::Result<Chunk>;

    /// Release all resources held by the source. The source must not be
    /// read afterwards.
    fn release(&mut self) -> io::Result<()>;
}

/// Adapts an arbitrary [`Read`] implementation to a [`ChunkSource`]
pub struct ReadSource<R> {
    inner: Option<R>,
}

impl<R> ReadSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner: Some(inner) }
    }
}

impl<R: Read> ChunkSource for ReadSource<R> {
    fn read_chunk(&mut self, max: usize, buf: &mut Vec<u8>) -> io::Result<Chunk> {
        let inner = self
            .inner
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "source has been released"))?;

        let n = inner.by_ref().take(max as u64).read_to_end(buf)?;
        if n == 0 {
            Ok(Chunk::EndOfInput)
        } else {
            Ok(Chunk::Filled(n))
        }
    }

    fn release(&mut self) -> io::Result<()> {
        self.inner.take();
        Ok(())
    }
}

/// A [`ChunkSource`] reading a file from disk
pub type FileSource = ReadSource<File>;

impl FileSource {
    /// Open the file at the given path. Fails if the path does not point to
    /// a readable regular file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ScanError> {
        let path = path.as_ref();

        let metadata = path.metadata().map_err(|err| {
            ScanError::source_unavailable(format!("unable to access `{}'", path.display()), err)
        })?;
        if !metadata.is_file() {
            return Err(ScanError::source_unavailable(
                format!("`{}' is not a regular file", path.display()),
                io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }

        let file = File::open(path).map_err(|err| {
            ScanError::source_unavailable(format!("unable to open `{}'", path.display()), err)
        })?;
        debug!(path = %path.display(), len = metadata.len(), "opened source file");

        Ok(Self::new(file))
    }
}

/// Owns a [`ChunkSource`] for the duration of a scan and makes sure it is
/// released exactly once, also if the scan is aborted early
pub struct SourceGuard<S: ChunkSource> {
    source: S,
    released: bool,
}

impl<S: ChunkSource> SourceGuard<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            released: false,
        }
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Release the source. Subsequent calls do nothing.
    pub fn release(&mut self) -> Result<(), ScanError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.source
            .release()
            .map_err(|err| ScanError::source_unavailable("unable to release source", err))
    }
}

impl<S: ChunkSource> Drop for SourceGuard<S> {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            warn!("{err}");
        }
    }
}

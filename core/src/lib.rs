//! Incrementally extracts records delimited by a start and an end marker
//! from large, sequentially written byte sources ("tape files") without
//! loading the whole source into memory.
//!
//! A [`ScanSession`] pulls chunks from a [`ChunkSource`] into a sliding
//! window, finds records (even if they or their markers straddle window
//! refills) and calls a [`RecordHandler`] exactly once per record, in input
//! order.

use std::{io::Read, path::Path};

pub mod config;
pub mod error;
pub mod scan;
pub mod session;
pub mod source;
pub(crate) mod util;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{NestedStartPolicy, ScanConfig, ScanConfigBuilder, UnterminatedPolicy};
pub use error::ScanError;
pub use scan::{
    emitter::{ScanSummary, Unterminated},
    record::{CaptureMode, Record, RecordHandler},
};
pub use session::{CancelFlag, ScanSession};
pub use source::{Chunk, ChunkSource, FileSource, ReadSource};

/// Scan everything `reader` produces
pub fn scan_reader<R: Read, H: RecordHandler>(
    reader: R,
    config: ScanConfig,
    handler: H,
) -> Result<ScanSummary, ScanError> {
    ScanSession::new(config, ReadSource::new(reader), handler)?.run()
}

/// Open the file at `path` and scan it
pub fn scan_file<H: RecordHandler>(
    path: impl AsRef<Path>,
    config: ScanConfig,
    handler: H,
) -> Result<ScanSummary, ScanError> {
    ScanSession::new(config, FileSource::open(path)?, handler)?.run()
}

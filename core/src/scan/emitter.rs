use tracing::{debug, trace};

use crate::error::ScanError;

use super::record::{CaptureMode, Record, RecordHandler};

/// A record that was still open when the input ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unterminated {
    /// Position of the dangling start marker in the input
    pub offset: u64,

    /// Number of bytes captured before the input ended
    pub len: usize,
}

/// Statistics of a finished scan
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    /// Number of records delivered to the handler
    pub records: u64,

    /// Records found within a single window
    pub immediate: u64,

    /// Records assembled across window refills
    pub accumulated: u64,

    /// Open records discarded because another start marker appeared before
    /// their end marker
    pub skipped: u64,

    /// Number of bytes read from the source
    pub bytes_read: u64,

    /// Number of passes over the window
    pub passes: u64,

    /// The fragment dropped at the end of the input, if any
    pub unterminated: Option<Unterminated>,
}

/// Delivers records to the registered handler and keeps count
pub struct Emitter<H> {
    handler: H,
    summary: ScanSummary,
}

impl<H: RecordHandler> Emitter<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            summary: ScanSummary::default(),
        }
    }

    /// Call the handler synchronously. A handler error is wrapped into
    /// [`ScanError::HandlerFailure`].
    pub fn emit(&mut self, record: Record<'_>) -> Result<(), ScanError> {
        trace!(
            offset = record.offset(),
            len = record.len(),
            mode = %record.mode(),
            "emitting record"
        );

        let index = self.summary.records;
        self.handler
            .on_record(record)
            .map_err(|source| ScanError::HandlerFailure {
                record: index,
                source,
            })?;

        self.summary.records += 1;
        match record.mode() {
            CaptureMode::Immediate => self.summary.immediate += 1,
            CaptureMode::Accumulated => self.summary.accumulated += 1,
        }

        Ok(())
    }

    /// Count an open record that was discarded without being delivered
    pub fn skip(&mut self, offset: u64) {
        debug!(offset, "discarding empty entry");
        self.summary.skipped += 1;
    }

    pub fn into_summary(self) -> ScanSummary {
        self.summary
    }
}

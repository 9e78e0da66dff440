use thiserror::Error;

/// Everything that can go wrong while configuring or running a scan
#[derive(Error, Debug)]
pub enum ScanError {
    /// Missing or empty markers, or a buffer size below the minimum
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The chunk source could not be opened, read, or released
    #[error("source unavailable: {context}")]
    SourceUnavailable {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The record handler returned an error. `record` is the zero-based
    /// index of the record that was being delivered.
    #[error("record handler failed on record {record}")]
    HandlerFailure {
        record: u64,
        #[source]
        source: anyhow::Error,
    },

    /// End of input was reached while a record was still open
    #[error("input ended inside a record starting at offset {offset} ({len} bytes captured)")]
    UnterminatedCapture { offset: u64, len: usize },

    /// The scan was cancelled between two window passes
    #[error("scan cancelled after {offset} bytes")]
    Cancelled { offset: u64 },
}

impl ScanError {
    pub(crate) fn source_unavailable(context: impl Into<String>, source: std::io::Error) -> Self {
        ScanError::SourceUnavailable {
            context: context.into(),
            source,
        }
    }
}

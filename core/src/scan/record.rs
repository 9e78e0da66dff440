use std::fmt;

/// How a record was assembled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureMode {
    /// The record was found completely within one buffered window
    Immediate,

    /// The record was assembled from two or more window refills
    Accumulated,
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureMode::Immediate => write!(f, "immediate"),
            CaptureMode::Accumulated => write!(f, "accumulated"),
        }
    }
}

/// A record handed to a [`RecordHandler`]: the bytes from the first byte of
/// the start marker through the last byte of the end marker. Only valid for
/// the duration of the handler call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    bytes: &'a [u8],
    mode: CaptureMode,
    offset: u64,
}

impl<'a> Record<'a> {
    pub(crate) fn new(bytes: &'a [u8], mode: CaptureMode, offset: u64) -> Self {
        Self {
            bytes,
            mode,
            offset,
        }
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    /// Position of the record's first byte in the input
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }
}

/// Receives every record found by a scan, in input order. Returning an
/// error aborts the scan.
pub trait RecordHandler {
    fn on_record(&mut self, record: Record<'_>) -> anyhow::Result<()>;
}

impl<F> RecordHandler for F
where
    F: FnMut(Record<'_>) -> anyhow::Result<()>,
{
    fn on_record(&mut self, record: Record<'_>) -> anyhow::Result<()> {
        self(record)
    }
}

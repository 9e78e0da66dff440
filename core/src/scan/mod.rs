use tracing::debug;

use crate::{
    config::{NestedStartPolicy, ScanConfig},
    error::ScanError,
    util::window::Window,
};

use self::{
    emitter::{Emitter, Unterminated},
    record::{CaptureMode, Record, RecordHandler},
};

pub mod emitter;
pub mod record;

/// A record whose end marker has not been found yet
#[derive(Debug)]
struct Capture {
    /// Position of the start marker in the input
    offset: u64,

    /// The bytes collected so far
    bytes: Vec<u8>,

    /// Window index up to which bytes have been copied into `bytes`
    copied_through: usize,

    /// Window index from which to look for another start marker
    nested_from: usize,
}

/// The state of the scanner between two steps
#[derive(Debug)]
enum ScanState {
    /// No record is open. Look for the next start marker.
    Searching,

    /// A record is open. Look for its end marker.
    Collecting(Capture),
}

/// What the scanner wants to do after a step
enum Step {
    /// Keep on scanning the current window
    Continue(ScanState),

    /// Nothing more to find in the current window
    Refill(ScanState),
}

/// Finds records delimited by a start and an end marker in a [`Window`].
/// The scanner is fed one window pass at a time and keeps its state across
/// refills, so markers and records may straddle window boundaries.
///
/// Every search resumes at the earliest index where a marker could still
/// begin that has not been ruled out yet, i.e. the last `marker.len() - 1`
/// bytes of a window are searched again after a refill. Bytes of emitted
/// records are never searched again.
#[derive(Debug)]
pub(crate) struct Scanner {
    start: Vec<u8>,
    end: Vec<u8>,
    nested_start: NestedStartPolicy,
    state: ScanState,
}

impl Scanner {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            start: config.start_marker().to_vec(),
            end: config.end_marker().to_vec(),
            nested_start: config.nested_start(),
            state: ScanState::Searching,
        }
    }

    /// Emit all records visible in the window, starting at its cursor.
    /// Returns when the window has to be refilled.
    pub fn pass<H: RecordHandler>(
        &mut self,
        window: &mut Window,
        emitter: &mut Emitter<H>,
    ) -> Result<(), ScanError> {
        loop {
            let state = std::mem::replace(&mut self.state, ScanState::Searching);
            let step = match state {
                ScanState::Searching => self.search(window, emitter)?,
                ScanState::Collecting(capture) => self.collect(window, capture, emitter)?,
            };
            match step {
                Step::Continue(state) => self.state = state,
                Step::Refill(state) => {
                    self.state = state;
                    return Ok(());
                }
            }
        }
    }

    /// The window index before which no byte is needed anymore
    pub fn retain_from(&self, window: &Window) -> usize {
        match &self.state {
            ScanState::Searching => window.cursor(),
            ScanState::Collecting(capture) => window.cursor().min(capture.nested_from),
        }
    }

    /// Shift the scanner's window indexes after `dropped` bytes have been
    /// trimmed from the front of the window
    pub fn rebase(&mut self, dropped: usize) {
        if let ScanState::Collecting(capture) = &mut self.state {
            capture.copied_through = capture.copied_through.saturating_sub(dropped);
            capture.nested_from = capture.nested_from.saturating_sub(dropped);
        }
    }

    /// Finish the scan. Returns the record that is still open, if any.
    pub fn finish(self) -> Option<Unterminated> {
        match self.state {
            ScanState::Searching => None,
            ScanState::Collecting(capture) => Some(Unterminated {
                offset: capture.offset,
                len: capture.bytes.len(),
            }),
        }
    }

    /// The earliest index at which `marker` could still begin if it has not
    /// been found in `from..limit`
    fn resume_at(limit: usize, marker: &[u8], from: usize) -> usize {
        limit
            .saturating_sub(marker.len().saturating_sub(1))
            .max(from)
            .min(limit)
    }

    /// The window index before which a nested start marker must end to come
    /// before the end marker
    fn nested_limit(window: &Window, end: Option<usize>, end_from: usize) -> usize {
        match end {
            Some(e) => e,
            None if window.is_exhausted() => window.len(),
            None => end_from,
        }
    }

    fn search<H: RecordHandler>(
        &self,
        window: &mut Window,
        emitter: &mut Emitter<H>,
    ) -> Result<Step, ScanError> {
        let len = window.len();
        let cursor = window.cursor();

        let Some(s) = window.find(&self.start, cursor..len) else {
            window.set_cursor(Self::resume_at(len, &self.start, cursor));
            return Ok(Step::Refill(ScanState::Searching));
        };

        let body = s + self.start.len();
        let end = window.find(&self.end, body..len);
        let end_from = Self::resume_at(len, &self.end, body);

        if self.nested_start == NestedStartPolicy::Restart {
            let limit = Self::nested_limit(window, end, end_from);
            if let Some(next) = window.find(&self.start, body..limit) {
                emitter.skip(window.absolute(s));
                window.set_cursor(next);
                return Ok(Step::Continue(ScanState::Searching));
            }
        }

        match end {
            Some(e) => {
                let stop = e + self.end.len();
                emitter.emit(Record::new(
                    &window.bytes()[s..stop],
                    CaptureMode::Immediate,
                    window.absolute(s),
                ))?;
                window.set_cursor(stop);
                Ok(Step::Continue(ScanState::Searching))
            }

            None => {
                let capture = Capture {
                    offset: window.absolute(s),
                    bytes: window.bytes()[s..].to_vec(),
                    copied_through: len,
                    nested_from: Self::resume_at(end_from, &self.start, body),
                };
                debug!(offset = capture.offset, "record continues beyond window");
                window.set_cursor(end_from);
                Ok(Step::Refill(ScanState::Collecting(capture)))
            }
        }
    }

    fn collect<H: RecordHandler>(
        &self,
        window: &mut Window,
        mut capture: Capture,
        emitter: &mut Emitter<H>,
    ) -> Result<Step, ScanError> {
        let len = window.len();
        let cursor = window.cursor();

        let end = window.find(&self.end, cursor..len);
        let end_from = Self::resume_at(len, &self.end, cursor);

        if self.nested_start == NestedStartPolicy::Restart {
            let limit = Self::nested_limit(window, end, end_from);
            if let Some(next) = window.find(&self.start, capture.nested_from..limit) {
                emitter.skip(capture.offset);
                window.set_cursor(next);
                return Ok(Step::Continue(ScanState::Searching));
            }
        }

        match end {
            Some(e) => {
                let stop = e + self.end.len();
                debug_assert!(capture.copied_through <= stop);
                capture
                    .bytes
                    .extend_from_slice(&window.bytes()[capture.copied_through..stop]);
                emitter.emit(Record::new(
                    &capture.bytes,
                    CaptureMode::Accumulated,
                    capture.offset,
                ))?;
                window.set_cursor(stop);
                Ok(Step::Continue(ScanState::Searching))
            }

            None => {
                capture
                    .bytes
                    .extend_from_slice(&window.bytes()[capture.copied_through..]);
                capture.copied_through = len;
                capture.nested_from =
                    Self::resume_at(end_from, &self.start, capture.nested_from);
                window.set_cursor(end_from);
                Ok(Step::Refill(ScanState::Collecting(capture)))
            }
        }
    }
}

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tracing::{debug, instrument, warn};

use crate::{
    config::{ScanConfig, UnterminatedPolicy},
    error::ScanError,
    scan::{
        emitter::{Emitter, ScanSummary},
        record::RecordHandler,
        Scanner,
    },
    source::{ChunkSource, SourceGuard},
    util::window::Window,
};

/// A flag that can be raised from another thread to stop a running scan.
/// The scan checks it before every window pass.
#[derive(Debug, Default, Clone)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One scan over one source. Owns the source, the window, the scanner state
/// and the handler, and is consumed by [`ScanSession::run`].
pub struct ScanSession<S: ChunkSource, H> {
    config: ScanConfig,
    source: SourceGuard<S>,
    handler: H,
    cancel: Option<CancelFlag>,
}

impl<S: ChunkSource, H: RecordHandler> ScanSession<S, H> {
    /// Create a new session. Fails with [`ScanError::InvalidConfiguration`]
    /// if the configuration is unusable. The source is released in this case.
    pub fn new(config: ScanConfig, source: S, handler: H) -> Result<Self, ScanError> {
        let source = SourceGuard::new(source);
        config.validate()?;
        Ok(Self {
            config,
            source,
            handler,
            cancel: None,
        })
    }

    /// Stop the scan as soon as the given flag is raised
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Process the source until it is exhausted and call the handler for
    /// every record found. The source is released on every exit path.
    #[instrument(skip_all, fields(buffer_size = self.config.buffer_size()))]
    pub fn run(self) -> Result<ScanSummary, ScanError> {
        let Self {
            config,
            mut source,
            handler,
            cancel,
        } = self;

        let mut window = Window::new(config.buffer_size());
        let mut scanner = Scanner::new(&config);
        let mut emitter = Emitter::new(handler);
        let mut passes = 0;

        loop {
            if cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
                debug!(pos = window.pos(), "scan cancelled");
                return Err(ScanError::Cancelled {
                    offset: window.absolute(window.len()),
                });
            }

            let appended = window.ensure_data(source.get_mut())?;
            passes += 1;
            debug!(
                pass = passes,
                appended,
                len = window.len(),
                exhausted = window.is_exhausted(),
                "scanning window"
            );

            scanner.pass(&mut window, &mut emitter)?;
            if window.is_exhausted() {
                break;
            }

            let dropped = window.trim(scanner.retain_from(&window));
            scanner.rebase(dropped);
        }

        let bytes_read = window.absolute(window.len());
        let unterminated = scanner.finish();
        if let Some(u) = unterminated {
            match config.unterminated() {
                UnterminatedPolicy::Discard => {
                    debug!(offset = u.offset, len = u.len, "dropping unterminated record")
                }
                UnterminatedPolicy::Warn => warn!(
                    offset = u.offset,
                    len = u.len,
                    "input ended inside a record, dropping it"
                ),
                UnterminatedPolicy::Fail => {
                    return Err(ScanError::UnterminatedCapture {
                        offset: u.offset,
                        len: u.len,
                    })
                }
            }
        }

        source.release()?;

        let mut summary = emitter.into_summary();
        summary.bytes_read = bytes_read;
        summary.passes = passes;
        summary.unterminated = unterminated;
        debug!(records = summary.records, bytes_read, "scan finished");
        Ok(summary)
    }
}

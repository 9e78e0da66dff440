use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::{Args, ValueEnum};
use humantime::format_duration;
use tapescan_core::{NestedStartPolicy, ScanConfig, ScanSummary, UnterminatedPolicy};

use crate::config::{merge, FileConfig, Overrides, CONFIG_ENV};

use self::{
    marker::{unescape, unescape_marker},
    marker_error::IntoArgumentError,
};

pub mod count;
pub mod extract;
pub mod marker;
pub mod marker_error;

/// What to do with a record that is still open when the input ends
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum UnterminatedArg {
    /// Drop it silently
    Discard,
    /// Drop it and print a warning
    Warn,
    /// Fail with an error
    Fail,
}

impl From<UnterminatedArg> for UnterminatedPolicy {
    fn from(arg: UnterminatedArg) -> Self {
        match arg {
            UnterminatedArg::Discard => UnterminatedPolicy::Discard,
            UnterminatedArg::Warn => UnterminatedPolicy::Warn,
            UnterminatedArg::Fail => UnterminatedPolicy::Fail,
        }
    }
}

/// Options shared by all commands that scan a tape file
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// The tape file to scan
    pub file: PathBuf,

    /// The marker that starts a record (escape sequences such as `\n` or
    /// `\x1e` are supported)
    #[arg(long, short)]
    pub start: Option<String>,

    /// The marker that ends a record
    #[arg(long, short)]
    pub end: Option<String>,

    /// Number of bytes to read from the file per window refill
    #[arg(long, short)]
    pub buffer_size: Option<usize>,

    /// What to do with a record that is still open at the end of the file
    #[arg(long, value_enum)]
    pub unterminated: Option<UnterminatedArg>,

    /// Discard an open record if another start marker appears before its end
    /// marker
    #[arg(long)]
    pub restart_on_nested_start: bool,

    /// A TOML file with default settings
    #[arg(long, env = CONFIG_ENV)]
    pub config: Option<PathBuf>,
}

impl ScanArgs {
    /// Combine the configuration file and the command line options
    pub fn to_scan_config(&self) -> Result<ScanConfig> {
        let file = FileConfig::load_optional(self.config.as_ref())?;
        let overrides = Overrides {
            start_marker: self
                .start
                .as_deref()
                .map(|s| parse_marker("--start", s))
                .transpose()?,
            end_marker: self
                .end
                .as_deref()
                .map(|s| parse_marker("--end", s))
                .transpose()?,
            buffer_size: self.buffer_size,
            unterminated: self.unterminated.map(Into::into),
            nested_start: self
                .restart_on_nested_start
                .then_some(NestedStartPolicy::Restart),
        };
        Ok(merge(file, overrides))
    }
}

/// Decode the escape sequences in the value of a command line option
pub fn parse_marker(option: &str, value: &str) -> Result<Vec<u8>> {
    match unescape_marker(value) {
        Ok(marker) => Ok(marker.into_owned()),
        Err(err) => Err(err.into_argument_error(option, value).into()),
    }
}

/// Decode the escape sequences in the value of a command line option that
/// may be empty
pub fn parse_separator(option: &str, value: &str) -> Result<Vec<u8>> {
    match unescape(value) {
        Ok(separator) => Ok(separator.into_owned()),
        Err(err) => Err(err.into_argument_error(option, value).into()),
    }
}

/// Print the statistics of a finished scan to stderr
pub fn print_summary(verb: &str, summary: &ScanSummary, elapsed: Duration) {
    eprintln!(
        "{} {} records ({} immediate, {} accumulated) from {} bytes in {}",
        verb,
        summary.records,
        summary.immediate,
        summary.accumulated,
        summary.bytes_read,
        format_duration(Duration::from_millis(elapsed.as_millis() as u64))
    );

    if summary.skipped > 0 {
        eprintln!("Skipped {} empty entries", summary.skipped);
    }

    if let Some(u) = summary.unterminated {
        eprintln!(
            "Dropped unterminated record at offset {} ({} bytes)",
            u.offset, u.len
        );
    }
}

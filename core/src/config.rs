use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ScanError;

/// The smallest buffer size a scan accepts
pub const MIN_BUFFER_SIZE: usize = 1;

/// Buffer sizes below this value work but cause many tiny reads
pub const RECOMMENDED_MIN_BUFFER_SIZE: usize = 1024;

/// Number of bytes requested from the source per window refill if nothing
/// else has been configured
pub const DEFAULT_BUFFER_SIZE: usize = 100_000_000;

/// What to do with a record that has been opened by a start marker but is
/// still unclosed when the input ends
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnterminatedPolicy {
    /// Drop the dangling fragment silently
    #[default]
    Discard,

    /// Drop the fragment but log a warning and report it in the summary
    Warn,

    /// Abort the scan with [`ScanError::UnterminatedCapture`]
    Fail,
}

/// What to do when a second start marker appears before the end marker of
/// an open record
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NestedStartPolicy {
    /// The second start marker is ordinary payload
    #[default]
    Ignore,

    /// Discard the open record as an empty entry and start capturing again
    /// at the second start marker
    Restart,
}

/// Markers, buffer size and policies of a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    start_marker: Vec<u8>,
    end_marker: Vec<u8>,
    buffer_size: usize,
    unterminated: UnterminatedPolicy,
    nested_start: NestedStartPolicy,
}

impl ScanConfig {
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    pub fn start_marker(&self) -> &[u8] {
        &self.start_marker
    }

    pub fn end_marker(&self) -> &[u8] {
        &self.end_marker
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn unterminated(&self) -> UnterminatedPolicy {
        self.unterminated
    }

    pub fn nested_start(&self) -> NestedStartPolicy {
        self.nested_start
    }

    /// Check that the configuration can be used for a scan. Fails with
    /// [`ScanError::InvalidConfiguration`] if a marker is empty or the
    /// buffer size is too small.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.start_marker.is_empty() {
            return Err(ScanError::InvalidConfiguration(
                "start marker must not be empty".to_string(),
            ));
        }

        if self.end_marker.is_empty() {
            return Err(ScanError::InvalidConfiguration(
                "end marker must not be empty".to_string(),
            ));
        }

        if self.buffer_size < MIN_BUFFER_SIZE {
            return Err(ScanError::InvalidConfiguration(format!(
                "buffer size should be at least {MIN_BUFFER_SIZE} byte(s). Given: {}",
                self.buffer_size
            )));
        }

        if self.buffer_size < RECOMMENDED_MIN_BUFFER_SIZE {
            warn!(
                buffer_size = self.buffer_size,
                recommended = RECOMMENDED_MIN_BUFFER_SIZE,
                "buffer size is below the recommended minimum"
            );
        }

        Ok(())
    }
}

/// Collects the settings of a [`ScanConfig`]. Setters can be called any
/// number of times; the last value wins.
#[derive(Debug, Clone)]
pub struct ScanConfigBuilder {
    start_marker: Vec<u8>,
    end_marker: Vec<u8>,
    buffer_size: usize,
    unterminated: UnterminatedPolicy,
    nested_start: NestedStartPolicy,
}

impl Default for ScanConfigBuilder {
    fn default() -> Self {
        Self {
            start_marker: Vec::new(),
            end_marker: Vec::new(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            unterminated: UnterminatedPolicy::default(),
            nested_start: NestedStartPolicy::default(),
        }
    }
}

impl ScanConfigBuilder {
    pub fn start_marker(mut self, marker: impl Into<Vec<u8>>) -> Self {
        self.start_marker = marker.into();
        self
    }

    pub fn end_marker(mut self, marker: impl Into<Vec<u8>>) -> Self {
        self.end_marker = marker.into();
        self
    }

    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn unterminated(mut self, policy: UnterminatedPolicy) -> Self {
        self.unterminated = policy;
        self
    }

    pub fn nested_start(mut self, policy: NestedStartPolicy) -> Self {
        self.nested_start = policy;
        self
    }

    /// Create the configuration without validating it. Validation happens
    /// when a scan session is created.
    pub fn build(self) -> ScanConfig {
        ScanConfig {
            start_marker: self.start_marker,
            end_marker: self.end_marker,
            buffer_size: self.buffer_size,
            unterminated: self.unterminated,
            nested_start: self.nested_start,
        }
    }
}

#[cfg(test)]
mod tests {
    use assertor::{assert_that, EqualityAssertion};

    use crate::error::ScanError;

    use super::{NestedStartPolicy, ScanConfig, UnterminatedPolicy, DEFAULT_BUFFER_SIZE};

    /// Unset markers are rejected
    #[test]
    fn missing_markers() {
        let config = ScanConfig::builder().build();
        assert!(matches!(
            config.validate(),
            Err(ScanError::InvalidConfiguration(_))
        ));

        let config = ScanConfig::builder().start_marker("<<").build();
        assert!(matches!(
            config.validate(),
            Err(ScanError::InvalidConfiguration(msg)) if msg.contains("end marker")
        ));

        let config = ScanConfig::builder().end_marker(">>").build();
        assert!(matches!(
            config.validate(),
            Err(ScanError::InvalidConfiguration(msg)) if msg.contains("start marker")
        ));
    }

    /// A zero buffer size is rejected, tiny ones are accepted
    #[test]
    fn buffer_size_limits() {
        let builder = ScanConfig::builder().start_marker("<<").end_marker(">>");

        let config = builder.clone().buffer_size(0).build();
        assert!(matches!(
            config.validate(),
            Err(ScanError::InvalidConfiguration(_))
        ));

        let config = builder.clone().buffer_size(1).build();
        assert!(config.validate().is_ok());

        let config = builder.build();
        assert_that!(config.buffer_size()).is_equal_to(DEFAULT_BUFFER_SIZE);
        assert!(config.validate().is_ok());
    }

    /// Calling a setter twice keeps the latest value
    #[test]
    fn latest_value_wins() {
        let config = ScanConfig::builder()
            .start_marker("<a>")
            .end_marker("</a>")
            .buffer_size(10)
            .unterminated(UnterminatedPolicy::Fail)
            .start_marker("<b>")
            .end_marker("</b>")
            .buffer_size(20)
            .unterminated(UnterminatedPolicy::Warn)
            .build();

        assert_that!(config.start_marker()).is_equal_to(&b"<b>"[..]);
        assert_that!(config.end_marker()).is_equal_to(&b"</b>"[..]);
        assert_that!(config.buffer_size()).is_equal_to(20);
        assert_that!(config.unterminated()).is_equal_to(UnterminatedPolicy::Warn);
        assert_that!(config.nested_start()).is_equal_to(NestedStartPolicy::Ignore);
    }

    /// Policies use lowercase names in configuration files
    #[test]
    fn policy_names() {
        #[derive(serde::Deserialize)]
        struct Policies {
            unterminated: UnterminatedPolicy,
            nested_start: NestedStartPolicy,
        }

        let p: Policies = toml::from_str(
            r#"
            unterminated = "fail"
            nested_start = "restart"
            "#,
        )
        .unwrap();
        assert_that!(p.unterminated).is_equal_to(UnterminatedPolicy::Fail);
        assert_that!(p.nested_start).is_equal_to(NestedStartPolicy::Restart);
    }
}

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use tapescan_core::{NestedStartPolicy, ScanConfig, UnterminatedPolicy};

/// Environment variable pointing to a configuration file that is used if no
/// `--config` option is given
pub const CONFIG_ENV: &str = "TAPESCAN_CONFIG";

/// Scan settings read from a TOML file. Every setting is optional and can
/// be overridden on the command line.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub start_marker: Option<String>,
    pub end_marker: Option<String>,
    pub buffer_size: Option<usize>,
    pub unterminated: Option<UnterminatedPolicy>,
    pub nested_start: Option<NestedStartPolicy>,
}

impl FileConfig {
    /// Read and parse the configuration file at `path`
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read configuration file at {:?}", path))?;
        toml::from_str(&file).with_context(|| format!("configuration file {:?} malformed", path))
    }

    /// Load the file at `path` if given, otherwise return an empty
    /// configuration
    pub fn load_optional(path: Option<&PathBuf>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

/// Settings given on the command line. `None` means "not given".
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub start_marker: Option<Vec<u8>>,
    pub end_marker: Option<Vec<u8>>,
    pub buffer_size: Option<usize>,
    pub unterminated: Option<UnterminatedPolicy>,
    pub nested_start: Option<NestedStartPolicy>,
}

/// Merge the configuration file and the command line options into a
/// [`ScanConfig`]. Command line options win.
pub fn merge(file: FileConfig, overrides: Overrides) -> ScanConfig {
    let mut builder = ScanConfig::builder();

    if let Some(start) = overrides
        .start_marker
        .or(file.start_marker.map(String::into_bytes))
    {
        builder = builder.start_marker(start);
    }
    if let Some(end) = overrides
        .end_marker
        .or(file.end_marker.map(String::into_bytes))
    {
        builder = builder.end_marker(end);
    }
    if let Some(buffer_size) = overrides.buffer_size.or(file.buffer_size) {
        builder = builder.buffer_size(buffer_size);
    }
    if let Some(policy) = overrides.unterminated.or(file.unterminated) {
        builder = builder.unterminated(policy);
    }
    if let Some(policy) = overrides.nested_start.or(file.nested_start) {
        builder = builder.nested_start(policy);
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use assertor::{assert_that, EqualityAssertion};
    use pretty_assertions::assert_eq;
    use tapescan_core::{NestedStartPolicy, UnterminatedPolicy};
    use tempdir::TempDir;

    use super::{merge, FileConfig, Overrides};

    /// Parse a complete configuration file
    #[test]
    fn load() {
        let dir = TempDir::new("tapescan_config").unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
            start_marker = "<offer>"
            end_marker = "</offer>"
            buffer_size = 4096
            unterminated = "warn"
            nested_start = "restart"
            "#,
        )
        .unwrap();

        let config = FileConfig::load(&path).unwrap();
        assert_eq!(
            config,
            FileConfig {
                start_marker: Some("<offer>".to_string()),
                end_marker: Some("</offer>".to_string()),
                buffer_size: Some(4096),
                unterminated: Some(UnterminatedPolicy::Warn),
                nested_start: Some(NestedStartPolicy::Restart),
            }
        );
    }

    /// Unknown keys are rejected
    #[test]
    fn unknown_key() {
        let dir = TempDir::new("tapescan_config").unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "start = \"<<\"\n").unwrap();

        assert!(FileConfig::load(&path).is_err());
        assert!(FileConfig::load(&dir.path().join("missing.toml")).is_err());
    }

    /// Command line options override the configuration file
    #[test]
    fn overrides_win() {
        let file = FileConfig {
            start_marker: Some("<a>".to_string()),
            end_marker: Some("</a>".to_string()),
            buffer_size: Some(10),
            unterminated: Some(UnterminatedPolicy::Warn),
            nested_start: None,
        };
        let overrides = Overrides {
            start_marker: Some(b"<b>".to_vec()),
            buffer_size: Some(20),
            nested_start: Some(NestedStartPolicy::Restart),
            ..Default::default()
        };

        let config = merge(file, overrides);
        assert_that!(config.start_marker()).is_equal_to(&b"<b>"[..]);
        assert_that!(config.end_marker()).is_equal_to(&b"</a>"[..]);
        assert_that!(config.buffer_size()).is_equal_to(20);
        assert_that!(config.unterminated()).is_equal_to(UnterminatedPolicy::Warn);
        assert_that!(config.nested_start()).is_equal_to(NestedStartPolicy::Restart);
    }

    /// Without any settings the markers stay empty and validation fails
    #[test]
    fn nothing_given() {
        let config = merge(FileConfig::default(), Overrides::default());
        assert!(config.validate().is_err());
    }
}

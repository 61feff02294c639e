//! Configuration management for perflog reports

use crate::error::{PerflogError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// When the header row is written to the output table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeaderPolicy {
    /// Write the header on every invocation, even when appending to
    /// an existing table.
    #[default]
    Always,
    /// Write the header only when the output file is empty or missing.
    WhenEmpty,
}

impl FromStr for HeaderPolicy {
    type Err = PerflogError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "always" => Ok(HeaderPolicy::Always),
            "when-empty" => Ok(HeaderPolicy::WhenEmpty),
            other => Err(PerflogError::Config(format!("invalid header policy: {}", other))),
        }
    }
}

/// Whether CPU/memory utilization is looked up for each record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UsageMode {
    /// Look up usage if the monitoring tool is installed.
    #[default]
    Auto,
    Disabled,
}

impl FromStr for UsageMode {
    type Err = PerflogError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(UsageMode::Auto),
            "disabled" => Ok(UsageMode::Disabled),
            other => Err(PerflogError::Config(format!("invalid usage mode: {}", other))),
        }
    }
}

/// Report configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Local directory the raw logs are downloaded to. Each log family
    /// falls back to its own default when unset.
    pub logs_dir: Option<PathBuf>,
    /// Output table, opened in append mode
    pub output: PathBuf,
    pub header: HeaderPolicy,
    pub usage: UsageMode,
    /// Parse whatever is already under `logs_dir` without downloading
    pub skip_download: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            logs_dir: None,
            output: PathBuf::from("./output.csv"),
            header: HeaderPolicy::Always,
            usage: UsageMode::Auto,
            skip_download: false,
        }
    }
}

impl ReportConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Resolve the logs directory, using `default` when none is configured
    pub fn logs_dir_or(&self, default: &str) -> PathBuf {
        self.logs_dir.clone().unwrap_or_else(|| PathBuf::from(default))
    }
}

/// Configuration source for loading report settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Default,
    Environment,
}

impl ConfigSource {
    /// A config file wins; otherwise `PERFLOG_*` variables apply unless
    /// `ignore_env` asks for the built-in defaults.
    pub fn select(file: Option<PathBuf>, ignore_env: bool) -> Self {
        match file {
            Some(path) => ConfigSource::File(path),
            None if ignore_env => ConfigSource::Default,
            None => ConfigSource::Environment,
        }
    }
}

/// Load report configuration from various sources
pub fn load_config(source: ConfigSource) -> Result<ReportConfig> {
    match source {
        ConfigSource::File(path) => ReportConfig::from_file(&path),
        ConfigSource::Default => Ok(ReportConfig::default()),
        ConfigSource::Environment => {
            let mut config = ReportConfig::default();

            if let Ok(dir) = std::env::var("PERFLOG_LOGS_DIR") {
                config.logs_dir = Some(PathBuf::from(dir));
            }

            if let Ok(output) = std::env::var("PERFLOG_OUTPUT") {
                config.output = PathBuf::from(output);
            }

            if let Ok(header) = std::env::var("PERFLOG_HEADER") {
                config.header = header.parse()?;
            }

            if let Ok(usage) = std::env::var("PERFLOG_USAGE") {
                config.usage = usage.parse()?;
            }

            Ok(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = ReportConfig::default();
        assert_eq!(config.output, PathBuf::from("./output.csv"));
        assert_eq!(config.header, HeaderPolicy::Always);
        assert_eq!(config.usage, UsageMode::Auto);
        assert!(!config.skip_download);
        assert_eq!(config.logs_dir_or("../logs"), PathBuf::from("../logs"));
    }

    #[test]
    fn test_config_file_partial_overrides() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("perflog.toml");
        std::fs::write(
            &config_path,
            "logs_dir = \"/tmp/fio-logs\"\nheader = \"when-empty\"\nusage = \"disabled\"\n",
        )
        .unwrap();

        let config = load_config(ConfigSource::File(config_path)).unwrap();
        assert_eq!(config.logs_dir_or("unused"), PathBuf::from("/tmp/fio-logs"));
        assert_eq!(config.header, HeaderPolicy::WhenEmpty);
        assert_eq!(config.usage, UsageMode::Disabled);
        assert_eq!(config.output, PathBuf::from("./output.csv"));
    }

    #[test]
    fn test_select_source() {
        let path = PathBuf::from("perflog.toml");
        assert_eq!(ConfigSource::select(Some(path.clone()), true), ConfigSource::File(path));
        assert_eq!(ConfigSource::select(None, false), ConfigSource::Environment);
        assert_eq!(ConfigSource::select(None, true), ConfigSource::Default);

        let config = load_config(ConfigSource::select(None, true)).unwrap();
        assert_eq!(config.output, ReportConfig::default().output);
        assert_eq!(config.header, HeaderPolicy::Always);
    }

    #[test]
    fn test_invalid_config_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("broken.toml");
        std::fs::write(&config_path, "header = \"sometimes\"\n").unwrap();

        assert!(matches!(
            ReportConfig::from_file(&config_path),
            Err(PerflogError::Toml(_))
        ));
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("when-empty".parse::<HeaderPolicy>().unwrap(), HeaderPolicy::WhenEmpty);
        assert_eq!("disabled".parse::<UsageMode>().unwrap(), UsageMode::Disabled);
        assert!("never".parse::<HeaderPolicy>().is_err());
    }
}

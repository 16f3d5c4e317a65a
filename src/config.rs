use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::alpha_vantage::DEFAULT_BASE_URL;
use crate::report::OutputFormat;

/// Dashboard configuration, usually read from `dashboard.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub alpha_vantage: AlphaVantageConfig,
    pub file: FileConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlphaVantageConfig {
    pub base_url: String,
    pub api_key: String,
    /// Request timeout in seconds; no timeout when unset.
    pub timeout_secs: Option<u64>,
}

impl Default for AlphaVantageConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: "demo".to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Used when no file is given on the command line.
    pub default_path: PathBuf,
    /// Metadata lines before the header.
    pub skip_rows: usize,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            default_path: PathBuf::from("Data.csv"),
            skip_rows: 1,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.alpha_vantage.base_url.trim().is_empty() {
            anyhow::bail!("alpha_vantage.base_url must not be empty");
        }

        if self.alpha_vantage.timeout_secs == Some(0) {
            anyhow::bail!("alpha_vantage.timeout_secs must be greater than 0");
        }

        Ok(())
    }

    /// Checks needed only when the remote source is used.
    pub fn validate_remote(&self) -> Result<()> {
        if self.alpha_vantage.api_key.trim().is_empty() {
            anyhow::bail!("alpha_vantage.api_key must not be empty");
        }
        Ok(())
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.alpha_vantage.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.file.skip_rows, 1);
        assert_eq!(config.file.default_path, PathBuf::from("Data.csv"));
        assert_eq!(config.output.format, OutputFormat::Table);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[alpha_vantage]").unwrap();
        writeln!(file, "api_key = \"secret\"").unwrap();
        writeln!(file, "timeout_secs = 15").unwrap();
        writeln!(file, "[output]").unwrap();
        writeln!(file, "format = \"json\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.alpha_vantage.api_key, "secret");
        assert_eq!(config.alpha_vantage.timeout_secs, Some(15));
        assert_eq!(config.alpha_vantage.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.file.skip_rows, 1);
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.alpha_vantage.timeout_secs = Some(0);
        assert!(config.validate().is_err());

        config.alpha_vantage.timeout_secs = None;
        config.alpha_vantage.base_url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_key_checked_only_for_remote() {
        let mut config = Config::default();
        config.alpha_vantage.api_key = " ".to_string();

        assert!(config.validate().is_ok());
        assert!(config.validate_remote().is_err());

        config.alpha_vantage.api_key = "demo".to_string();
        assert!(config.validate_remote().is_ok());
    }
}

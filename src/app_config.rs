use anyhow::{anyhow, Context, Result};
use log::{warn, LevelFilter};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Connection settings for the SQL services
    #[serde(default)]
    pub service: ServiceConfig,

    /// Input acquisition settings
    #[serde(default)]
    pub input: InputConfig,

    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Service connection configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServiceConfig {
    /// Base URL of the SQL conversion backend
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// API key forwarded to the conversion service (optional)
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Request timeout in seconds for catalog, extraction and export calls
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Request timeout in seconds for the conversion call
    #[serde(default = "default_conversion_timeout_secs")]
    pub conversion_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
            conversion_timeout_secs: default_conversion_timeout_secs(),
        }
    }
}

impl ServiceConfig {
    /// Bounded wait for every call except conversion
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Bounded wait for the conversion call
    pub fn conversion_timeout(&self) -> Duration {
        Duration::from_secs(self.conversion_timeout_secs)
    }

    /// The API key, if one is configured
    pub fn api_key(&self) -> Option<&str> {
        let key = self.api_key.trim();
        if key.is_empty() { None } else { Some(key) }
    }
}

/// Input acquisition configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct InputConfig {
    /// Quiet period after the last keystroke before typed text is parsed
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl InputConfig {
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Export configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExportConfig {
    /// Directory where exported documents are saved
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Base name of every exported file
    #[serde(default = "default_file_base")]
    pub file_base: String,

    /// Append a timestamp token so repeated exports do not overwrite each other
    #[serde(default)]
    pub unique_filenames: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            file_base: default_file_base(),
            unique_filenames: false,
        }
    }
}

impl ExportConfig {
    /// Resolve the output directory: configured value, then the user's
    /// download directory, then the current directory
    pub fn resolved_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_conversion_timeout_secs() -> u64 {
    // Conversion is AI-backed and much slower than the other calls
    120
}

fn default_debounce_ms() -> u64 {
    1000
}

fn default_file_base() -> String {
    "converted_sql".to_string()
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.service.endpoint)
            .with_context(|| format!("Invalid service endpoint: {}", self.service.endpoint))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(anyhow!(
                "Service endpoint must use http or https: {}",
                self.service.endpoint
            ));
        }

        if self.service.timeout_secs == 0 {
            return Err(anyhow!("Request timeout must be greater than zero"));
        }
        if self.service.conversion_timeout_secs == 0 {
            return Err(anyhow!("Conversion timeout must be greater than zero"));
        }

        let base = self.export.file_base.trim();
        if base.is_empty() {
            return Err(anyhow!("Export file base name must not be empty"));
        }
        if base.contains('/') || base.contains('\\') {
            return Err(anyhow!(
                "Export file base name must not contain path separators: {}",
                base
            ));
        }

        Ok(())
    }

    /// Load the configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save the configuration as pretty-printed JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Load the configuration, writing a default one first if the file is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load_from_file(path);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save_to_file(path)?;
        Ok(config)
    }
}

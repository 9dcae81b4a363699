//! Configuration management

use crate::error::{DetectiveError, DetectiveResult, ErrorContext};
use crate::logging::LoggingConfig;
use crate::types::{AnalysisConfig, DetectiveConfig, StorageConfig};

use std::path::{Path, PathBuf};

/// Directory name used under the platform config and data directories
pub const APP_DIR_NAME: &str = "digital-detective";

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            temperature: 0.2,
            timeout_seconds: 60,
            user_agent: format!("digital-detective/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.digital-detective".to_string(),
            store_file: "local_storage.json".to_string(),
        }
    }
}

impl Default for DetectiveConfig {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl StorageConfig {
    /// Full path of the key-value store file, with `~` expanded
    pub fn store_path(&self) -> PathBuf {
        expand_home(&self.data_dir).join(&self.store_file)
    }
}

/// Expand a leading `~` to the user's home directory
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest.trim_start_matches(['/', '\\']));
        }
    }
    PathBuf::from(path)
}

/// Default location written by `config --init`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|d| d.join(".config")))
        .map(|d| d.join(APP_DIR_NAME).join("config.toml"))
}

/// Locations searched, in order, when no explicit config path is given
pub fn config_search_paths() -> Vec<PathBuf> {
    [
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.toml")),
        dirs::home_dir().map(|d| d.join(".digital-detective").join("config.toml")),
        Some(PathBuf::from("detective.toml")),
    ]
    .into_iter()
    .flatten()
    .collect()
}

impl DetectiveConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> DetectiveResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DetectiveError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: DetectiveConfig = toml::from_str(&content).map_err(|e| DetectiveError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Load from `path` if given, otherwise from the first default location that exists
    pub fn load(path: Option<&Path>) -> DetectiveResult<Self> {
        if let Some(path) = path {
            tracing::info!("Loading configuration from {:?}", path);
            return Self::from_file(path);
        }

        for candidate in config_search_paths() {
            if candidate.exists() {
                tracing::info!("Loading configuration from {:?}", candidate);
                return Self::from_file(&candidate);
            }
        }

        tracing::debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Save configuration to a file, creating the parent directory if needed
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> DetectiveResult<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| DetectiveError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content).map_err(|e| DetectiveError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> DetectiveResult<()> {
        if self.analysis.model.trim().is_empty() {
            return Err(invalid(
                "analysis.model must not be empty",
                "Set analysis.model, e.g. gemini-2.5-flash",
            ));
        }

        if !(self.analysis.base_url.starts_with("http://")
            || self.analysis.base_url.starts_with("https://"))
        {
            return Err(invalid(
                "analysis.base_url must be an http(s) URL",
                "Set analysis.base_url to https://generativelanguage.googleapis.com",
            ));
        }

        if !(0.0..=2.0).contains(&self.analysis.temperature) {
            return Err(invalid(
                "analysis.temperature must be between 0.0 and 2.0",
                "Set analysis.temperature to a value in [0.0, 2.0]",
            ));
        }

        if self.analysis.timeout_seconds == 0 {
            return Err(invalid(
                "analysis.timeout_seconds must be greater than 0",
                "Set analysis.timeout_seconds to a positive value",
            ));
        }

        if self.storage.store_file.trim().is_empty() {
            return Err(invalid(
                "storage.store_file must not be empty",
                "Set storage.store_file, e.g. local_storage.json",
            ));
        }

        Ok(())
    }

    /// Read a single value by dotted key
    pub fn get_value(&self, key: &str) -> DetectiveResult<String> {
        let parts: Vec<&str> = key.split('.').collect();
        let value = match parts.as_slice() {
            ["analysis", "model"] => self.analysis.model.clone(),
            ["analysis", "base_url"] => self.analysis.base_url.clone(),
            ["analysis", "temperature"] => self.analysis.temperature.to_string(),
            ["analysis", "timeout_seconds"] => self.analysis.timeout_seconds.to_string(),
            ["analysis", "user_agent"] => self.analysis.user_agent.clone(),
            ["storage", "data_dir"] => self.storage.data_dir.clone(),
            ["storage", "store_file"] => self.storage.store_file.clone(),
            ["logging", "level"] => self.logging.level.clone(),
            _ => return Err(unknown_key(key, "config_get")),
        };
        Ok(value)
    }

    /// Set a single value by dotted key
    pub fn set_value(&mut self, key: &str, value: &str) -> DetectiveResult<()> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["analysis", "model"] => self.analysis.model = value.to_string(),
            ["analysis", "base_url"] => self.analysis.base_url = value.to_string(),
            ["analysis", "temperature"] => {
                self.analysis.temperature = value
                    .parse()
                    .map_err(|_| bad_value(key, value, "float"))?;
            }
            ["analysis", "timeout_seconds"] => {
                self.analysis.timeout_seconds = value
                    .parse()
                    .map_err(|_| bad_value(key, value, "integer"))?;
            }
            ["analysis", "user_agent"] => self.analysis.user_agent = value.to_string(),
            ["storage", "data_dir"] => self.storage.data_dir = value.to_string(),
            ["storage", "store_file"] => self.storage.store_file = value.to_string(),
            ["logging", "level"] => self.logging.level = value.to_string(),
            _ => return Err(unknown_key(key, "config_set")),
        }
        Ok(())
    }
}

fn invalid(message: &str, suggestion: &str) -> DetectiveError {
    DetectiveError::Config {
        message: message.to_string(),
        source: None,
        context: ErrorContext::new("config")
            .with_operation("validate")
            .with_suggestion(suggestion),
    }
}

fn unknown_key(key: &str, operation: &str) -> DetectiveError {
    DetectiveError::Config {
        message: format!("Unknown configuration key: {}", key),
        source: None,
        context: ErrorContext::new("config")
            .with_operation(operation)
            .with_suggestion("Use 'detective config --show' to see available configuration keys"),
    }
}

fn bad_value(key: &str, value: &str, kind: &str) -> DetectiveError {
    DetectiveError::Config {
        message: format!("Invalid {} value for {}: {}", kind, key, value),
        source: None,
        context: ErrorContext::new("config").with_operation("config_set"),
    }
}

//! # Configuration Management
//!
//! Centralized configuration for codec managers and linear codecs.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment variable overrides via `from_env()`
//!
//! ## Resource Limits
//! - `max_size` caps the bytes one `marshal` call may produce (default 1 MiB)
//! - `max_slice_len` caps the element count of any sequence (default 2 Mi),
//!   bounding what a corrupt length prefix can make the decoder allocate
//! - `max_depth` caps how many sequences, boxes and polymorphic values may
//!   nest during one decode (default 128), bounding recursion

use crate::core::packer::{DEFAULT_MAX_SIZE, VERSION_SIZE};
use crate::error::{CodecError, Result};
use crate::protocol::linear::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_SLICE_LEN};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::Level;

/// Largest `max_size` accepted by validation (256 MiB)
const MAX_RECOMMENDED_SIZE: usize = 256 * 1024 * 1024;

/// Largest `max_depth` accepted by validation
const MAX_RECOMMENDED_DEPTH: usize = 1024;

/// Main codec configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CodecConfig {
    /// Maximum bytes a single marshal call may produce
    #[serde(default = "default_max_size")]
    pub max_size: usize,

    /// Maximum element count of a dynamic sequence
    #[serde(default = "default_max_slice_len")]
    pub max_slice_len: usize,

    /// Maximum nesting of containers during one decode
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Whether unmarshal accepts unconsumed bytes after the value
    #[serde(default = "default_allow_trailing_bytes")]
    pub allow_trailing_bytes: bool,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_max_size() -> usize {
    DEFAULT_MAX_SIZE
}

fn default_max_slice_len() -> usize {
    DEFAULT_MAX_SLICE_LEN
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_allow_trailing_bytes() -> bool {
    true
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            max_slice_len: DEFAULT_MAX_SLICE_LEN,
            max_depth: DEFAULT_MAX_DEPTH,
            allow_trailing_bytes: true,
            logging: LoggingConfig::default(),
        }
    }
}

impl CodecConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| CodecError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| CodecError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| CodecError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(size) = std::env::var("VERSIONED_CODEC_MAX_SIZE") {
            config.max_size = size.parse::<usize>().map_err(|e| {
                CodecError::ConfigError(format!("Invalid VERSIONED_CODEC_MAX_SIZE: {e}"))
            })?;
        }

        if let Ok(len) = std::env::var("VERSIONED_CODEC_MAX_SLICE_LEN") {
            config.max_slice_len = len.parse::<usize>().map_err(|e| {
                CodecError::ConfigError(format!("Invalid VERSIONED_CODEC_MAX_SLICE_LEN: {e}"))
            })?;
        }

        if let Ok(depth) = std::env::var("VERSIONED_CODEC_MAX_DEPTH") {
            config.max_depth = depth.parse::<usize>().map_err(|e| {
                CodecError::ConfigError(format!("Invalid VERSIONED_CODEC_MAX_DEPTH: {e}"))
            })?;
        }

        if let Ok(allow) = std::env::var("VERSIONED_CODEC_ALLOW_TRAILING_BYTES") {
            config.allow_trailing_bytes = allow.parse::<bool>().map_err(|e| {
                CodecError::ConfigError(format!(
                    "Invalid VERSIONED_CODEC_ALLOW_TRAILING_BYTES: {e}"
                ))
            })?;
        }

        if let Ok(level) = std::env::var("VERSIONED_CODEC_LOG_LEVEL") {
            config.logging.log_level = level.parse::<Level>().map_err(|_| {
                CodecError::ConfigError(format!("Invalid VERSIONED_CODEC_LOG_LEVEL: {level}"))
            })?;
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CodecError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| CodecError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_size < VERSION_SIZE {
            errors.push(format!(
                "Max size too small: {} bytes (minimum: {VERSION_SIZE} for the version prefix)",
                self.max_size
            ));
        } else if self.max_size > MAX_RECOMMENDED_SIZE {
            errors.push(format!(
                "Max size too large: {} bytes (maximum recommended: 256 MB)",
                self.max_size
            ));
        }

        if self.max_slice_len == 0 {
            errors.push("Max slice length must be greater than 0".to_string());
        } else if self.max_slice_len > u32::MAX as usize {
            errors.push(format!(
                "Max slice length {} exceeds the 4-byte count prefix",
                self.max_slice_len
            ));
        }

        if self.max_depth == 0 {
            errors.push("Max depth must be greater than 0".to_string());
        } else if self.max_depth > MAX_RECOMMENDED_DEPTH {
            errors.push(format!(
                "Max depth too large: {} (maximum recommended: {MAX_RECOMMENDED_DEPTH})",
                self.max_depth
            ));
        }

        errors.extend(self.logging.validate());

        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CodecError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("versioned-codec"),
            log_level: Level::INFO,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}

//! Configuration management

use crate::error::{ErrorContext, ScopeError, ScopeResult};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    pub logging: LoggingConfig,
    pub retrieval: RetrievalConfig,
}

/// Tuning for per-course backend calls
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Courses fetched concurrently during cross-course listing (1 = sequential)
    pub max_concurrent_courses: usize,
    /// Timeout applied to every individual backend call
    pub backend_timeout_ms: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_concurrent_courses: 4,
            backend_timeout_ms: 5_000,
        }
    }
}

impl ScopeConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> ScopeResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ScopeError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: ScopeConfig = toml::from_str(&content).map_err(|e| ScopeError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ScopeResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ScopeError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| ScopeError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> ScopeResult<()> {
        if self.retrieval.max_concurrent_courses == 0 {
            return Err(ScopeError::Config {
                message: "retrieval.max_concurrent_courses must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Use 1 for sequential retrieval"),
            });
        }

        if self.retrieval.backend_timeout_ms == 0 {
            return Err(ScopeError::Config {
                message: "retrieval.backend_timeout_ms must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set retrieval.backend_timeout_ms to a positive value"),
            });
        }

        Ok(())
    }
}

//! Configuration management

use crate::error::{DeskError, DeskResult, ErrorContext};
use crate::logging::LoggingConfig;
use crate::types::ReconcilePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides `api.base_url`
pub const API_BASE_ENV: &str = "AGENTDESK_API";

pub const DEFAULT_API_BASE: &str = "http://localhost:5000/api";

/// Top-level client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    pub api: ApiSettings,
    pub session: SessionSettings,
    pub logging: LoggingConfig,
}

/// Remote API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            timeout_seconds: 30,
            user_agent: format!("agentdesk/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Local session persistence settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Where the durable session record lives; platform data dir when unset
    pub record_path: Option<PathBuf>,
    /// Where transport cookies are kept between runs
    pub credentials_path: Option<PathBuf>,
    pub policy: ReconcilePolicy,
}

impl DeskConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> DeskResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DeskError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: DeskConfig = toml::from_str(&content).map_err(|e| DeskError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> DeskResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| DeskError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, content).map_err(|e| DeskError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup (the environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base) = lookup(API_BASE_ENV).filter(|v| !v.trim().is_empty()) {
            self.api.base_url = base.trim().to_string();
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> DeskResult<()> {
        let parsed = url::Url::parse(&self.api.base_url).map_err(|e| DeskError::Config {
            message: format!("Invalid api.base_url '{}': {}", self.api.base_url, e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("validate")
                .with_suggestion("Use an absolute URL such as http://localhost:5000/api"),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DeskError::Config {
                message: format!("Unsupported api.base_url scheme: {}", parsed.scheme()),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Use http or https"),
            });
        }

        if self.api.timeout_seconds == 0 {
            return Err(DeskError::Config {
                message: "api.timeout_seconds must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set api.timeout_seconds to a positive value"),
            });
        }

        Ok(())
    }
}

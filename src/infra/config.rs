//! Configuration management infrastructure.
//!
//! This module provides configuration file support, allowing users to save
//! and load agent endpoint, timestamp service and key store settings.

use crate::adapters::agent::client::DEFAULT_AGENT_ENDPOINT;
use crate::adapters::timestamp_http_client::DEFAULT_TIMESTAMP_ENDPOINT;
use crate::domain::types::{AgentUrl, TimestampUrl};
use crate::infra::error::{SigningError, SigningResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application configuration with all signing bridge settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfiguration {
    /// WebSocket endpoint of the local signing agent
    pub agent_url: String,

    /// API key for the agent handshake (empty means the public localhost key)
    #[serde(default)]
    pub agent_api_key: String,

    /// Multibank timestamp endpoint
    pub timestamp_endpoint: String,

    /// Certificate store directory (empty means `~/DSKEYS`)
    #[serde(default)]
    pub cert_store_dir: String,

    /// Freshness window for a cached key handle, in minutes
    pub key_ttl_minutes: u64,

    /// Network timeout settings
    pub network_timeout_seconds: u64,

    /// Number of retry attempts for the timestamp fetch
    pub retry_attempts: usize,

    /// Delay between retry attempts, in seconds
    pub retry_delay_seconds: u64,

    /// Whether to show verbose output
    pub verbose: bool,
}

impl Default for BridgeConfiguration {
    fn default() -> Self {
        Self {
            agent_url: DEFAULT_AGENT_ENDPOINT.to_string(),
            agent_api_key: String::new(),
            timestamp_endpoint: DEFAULT_TIMESTAMP_ENDPOINT.to_string(),
            cert_store_dir: String::new(),
            key_ttl_minutes: 30,
            network_timeout_seconds: 30,
            retry_attempts: 3,
            retry_delay_seconds: 2,
            verbose: false,
        }
    }
}

/// Configuration manager for handling config files
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new configuration manager with default path
    pub fn new() -> SigningResult<Self> {
        let config_path = Self::default_config_path()?;
        Ok(Self { config_path })
    }

    /// Create a configuration manager with custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> SigningResult<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Ok(config_dir.join("eimzo-signer").join("config.toml"))
        } else {
            // Fallback to current directory
            Ok(PathBuf::from("eimzo-signer-config.toml"))
        }
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub fn load_or_create_default(&self) -> SigningResult<BridgeConfiguration> {
        if self.config_path.exists() {
            self.load()
        } else {
            log::info!(
                "Configuration file not found, creating default: {}",
                self.config_path.display()
            );
            let default_config = BridgeConfiguration::default();
            self.save(&default_config)?;
            Ok(default_config)
        }
    }

    /// Load configuration from file
    pub fn load(&self) -> SigningResult<BridgeConfiguration> {
        log::info!("Loading configuration from: {}", self.config_path.display());

        let content = fs::read_to_string(&self.config_path).map_err(|e| {
            SigningError::ConfigurationError(format!(
                "Failed to read config file {}: {}",
                self.config_path.display(),
                e
            ))
        })?;

        let config: BridgeConfiguration = toml::from_str(&content).map_err(|e| {
            SigningError::ConfigurationError(format!("Failed to parse config file: {e}"))
        })?;

        self.validate_config(&config)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, config: &BridgeConfiguration) -> SigningResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SigningError::ConfigurationError(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = toml::to_string_pretty(config).map_err(|e| {
            SigningError::ConfigurationError(format!("Failed to serialize config: {e}"))
        })?;

        fs::write(&self.config_path, content).map_err(|e| {
            SigningError::ConfigurationError(format!(
                "Failed to write config file {}: {}",
                self.config_path.display(),
                e
            ))
        })?;

        log::info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Validate configuration values
    fn validate_config(&self, config: &BridgeConfiguration) -> SigningResult<()> {
        AgentUrl::new(&config.agent_url)?;
        TimestampUrl::new(&config.timestamp_endpoint)?;

        if config.key_ttl_minutes == 0 {
            return Err(SigningError::ConfigurationError(
                "Key TTL must be greater than 0".to_string(),
            ));
        }

        if config.network_timeout_seconds == 0 {
            return Err(SigningError::ConfigurationError(
                "Network timeout must be greater than 0".to_string(),
            ));
        }

        if config.retry_attempts == 0 {
            return Err(SigningError::ConfigurationError(
                "Retry attempts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Update a specific configuration value
    pub fn update_value(&self, key: &str, value: &str) -> SigningResult<()> {
        let mut config = self.load()?;

        match key {
            "agent_url" => {
                AgentUrl::new(value)?; // Validate
                config.agent_url = value.to_string();
            }
            "timestamp_endpoint" => {
                TimestampUrl::new(value)?; // Validate
                config.timestamp_endpoint = value.to_string();
            }
            "cert_store_dir" => {
                config.cert_store_dir = value.to_string();
            }
            "agent_api_key" => {
                config.agent_api_key = value.to_string();
            }
            "network_timeout_seconds" => {
                let seconds: u64 = value.parse().map_err(|_| {
                    SigningError::ConfigurationError(format!("Invalid second value: {value}"))
                })?;
                if seconds == 0 {
                    return Err(SigningError::ConfigurationError(
                        "Network timeout must be greater than 0".to_string(),
                    ));
                }
                config.network_timeout_seconds = seconds;
            }
            "retry_attempts" => {
                let attempts: usize = value.parse().map_err(|_| {
                    SigningError::ConfigurationError(format!("Invalid attempt count: {value}"))
                })?;
                if attempts == 0 {
                    return Err(SigningError::ConfigurationError(
                        "Retry attempts must be greater than 0".to_string(),
                    ));
                }
                config.retry_attempts = attempts;
            }
            "retry_delay_seconds" => {
                config.retry_delay_seconds = value.parse().map_err(|_| {
                    SigningError::ConfigurationError(format!("Invalid second value: {value}"))
                })?;
            }
            "key_ttl_minutes" => {
                let minutes: u64 = value.parse().map_err(|_| {
                    SigningError::ConfigurationError(format!("Invalid minute value: {value}"))
                })?;
                if minutes == 0 {
                    return Err(SigningError::ConfigurationError(
                        "Key TTL must be greater than 0".to_string(),
                    ));
                }
                config.key_ttl_minutes = minutes;
            }
            "verbose" => {
                config.verbose = value.parse().map_err(|_| {
                    SigningError::ConfigurationError(format!("Invalid boolean value: {value}"))
                })?;
            }
            _ => {
                return Err(SigningError::ConfigurationError(format!(
                    "Unknown configuration key: {key}"
                )));
            }
        }

        self.save(&config)
    }

    /// Get the configuration file path
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

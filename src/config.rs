//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and every field is optional; missing values fall back to the
//! defaults below.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{PadlinkError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub sampler: SamplerConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Controller configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControllerConfig {
    /// Event device to open; empty means auto-detect.
    #[serde(default)]
    pub device_path: String,

    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,
}

/// Sampling loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SamplerConfig {
    #[serde(default = "default_frame_rate_hz")]
    pub frame_rate_hz: u32,

    /// Consecutive unreadable ticks before returning to idle; 0 disables the check.
    #[serde(default)]
    pub liveness_miss_limit: u32,

    #[serde(default = "default_log_interval_frames")]
    pub log_interval_frames: u64,
}

/// Transport configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TransportConfig {
    /// Listener WebSocket URL
    #[serde(default = "default_transport_url")]
    pub url: String,

    #[serde(default = "default_event_name")]
    pub event_name: String,

    /// Frames waiting to be written before new ones are dropped
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,
}

/// Mapping persistence configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PersistenceConfig {
    #[serde(default = "default_persistence_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_persistence_timeout_ms")]
    pub timeout_ms: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily log files; empty means stdout only.
    #[serde(default)]
    pub log_dir: String,
}

// Default value functions
fn default_reconnect_interval_ms() -> u64 { 1000 }

fn default_frame_rate_hz() -> u32 { 60 }
fn default_log_interval_frames() -> u64 { 3600 }

fn default_transport_url() -> String { "ws://127.0.0.1:8000/ws".to_string() }
fn default_queue_capacity() -> usize { 8 }
fn default_event_name() -> String { crate::transport::DEFAULT_EVENT_NAME.to_string() }

fn default_persistence_endpoint() -> String { "http://127.0.0.1:8000/save-mapping".to_string() }
fn default_persistence_timeout_ms() -> u64 { 2000 }

fn default_log_level() -> String { "info".to_string() }

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            device_path: String::new(),
            reconnect_interval_ms: default_reconnect_interval_ms(),
        }
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: default_frame_rate_hz(),
            liveness_miss_limit: 0,
            log_interval_frames: default_log_interval_frames(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            url: default_transport_url(),
            event_name: default_event_name(),
            queue_capacity: default_queue_capacity(),
            reconnect_interval_ms: default_reconnect_interval_ms(),
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_persistence_endpoint(),
            timeout_ms: default_persistence_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use padlink::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.controller.reconnect_interval_ms == 0 || self.controller.reconnect_interval_ms > 60000 {
            return Err(invalid("reconnect_interval_ms must be between 1 and 60000"));
        }

        if self.sampler.frame_rate_hz == 0 || self.sampler.frame_rate_hz > 1000 {
            return Err(invalid("frame_rate_hz must be between 1 and 1000"));
        }

        if self.sampler.log_interval_frames == 0 {
            return Err(invalid("log_interval_frames must be greater than 0"));
        }

        match self.transport.url.strip_prefix("ws://") {
            Some(rest) if !rest.is_empty() && !rest.starts_with('/') => {}
            _ => return Err(invalid("transport url must be a ws:// URL with a host")),
        }

        if self.transport.queue_capacity == 0 || self.transport.queue_capacity > 1024 {
            return Err(invalid("transport queue_capacity must be between 1 and 1024"));
        }

        if self.transport.reconnect_interval_ms == 0 || self.transport.reconnect_interval_ms > 60000 {
            return Err(invalid("transport reconnect_interval_ms must be between 1 and 60000"));
        }

        if self.transport.event_name.trim().is_empty() {
            return Err(invalid("transport event_name cannot be empty"));
        }

        if !(self.persistence.endpoint.starts_with("http://")
            || self.persistence.endpoint.starts_with("https://"))
        {
            return Err(invalid("persistence endpoint must be an http:// or https:// URL"));
        }

        if self.persistence.timeout_ms == 0 || self.persistence.timeout_ms > 60000 {
            return Err(invalid("persistence timeout_ms must be between 1 and 60000"));
        }

        if self.logging.level.trim().is_empty() {
            return Err(invalid("logging level cannot be empty"));
        }

        Ok(())
    }
}

fn invalid(msg: &str) -> PadlinkError {
    PadlinkError::Config(toml::de::Error::custom(msg))
}

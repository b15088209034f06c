//! # Error Types
//!
//! Custom error types for Padlink using `thiserror`.

use thiserror::Error;

/// Main error type for Padlink
#[derive(Debug, Error)]
pub enum PadlinkError {
    /// Controller access errors
    #[error("Controller error: {0}")]
    Controller(String),

    /// No gamepad found under /dev/input
    #[error("No gamepad found")]
    ControllerNotFound,

    /// A field key that is not `button_<n>` or `axis_<n>`
    #[error("Invalid input index: {0}")]
    InvalidRawIndex(String),

    /// Unrecognized console command
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Transport errors
    #[error("Transport error: {0}")]
    Transport(String),

    /// Mapping persistence errors
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// JSON encoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Padlink
pub type Result<T> = std::result::Result<T, PadlinkError>;

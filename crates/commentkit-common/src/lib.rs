//! # CommentKit Common
//!
//! Common error types, logging configuration and page configuration shared by
//! the CommentKit crates.
//!
//! ## Features
//!
//! - Unified error type with optional sources
//! - Logging configuration and setup
//! - Serde-backed configuration with defaults matching the comment templates
//! - Result extension traits

use thiserror::Error;

pub mod config;
pub mod logging;

pub use config::{CommentKitConfig, FormConfig, HttpConfig, ReplyConfig};
pub use logging::{init_logging, LogConfig, LogFormat};

/// Unified error type for CommentKit.
#[derive(Error, Debug)]
pub enum CommentKitError {
    /// DOM-related errors.
    #[error("DOM error: {message}")]
    Dom {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Network-related errors.
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors.
    #[error("Config error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A page element required by a UI binding is absent.
    #[error("Missing element for {role}: {selector}")]
    MissingElement {
        role: &'static str,
        selector: String,
    },

    /// I/O errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl CommentKitError {
    /// Create a DOM error.
    pub fn dom(message: impl Into<String>) -> Self {
        Self::Dom {
            message: message.into(),
            source: None,
        }
    }

    /// Create a DOM error with source.
    pub fn dom_with_source<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Dom {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Create a network error with source.
    pub fn network_with_source<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a config error with source.
    pub fn config_with_source<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a missing-element error.
    pub fn missing(role: &'static str, selector: impl Into<String>) -> Self {
        Self::MissingElement {
            role,
            selector: selector.into(),
        }
    }

    /// Get the error category for log fields.
    pub fn category(&self) -> &'static str {
        match self {
            CommentKitError::Dom { .. } => "dom",
            CommentKitError::Network { .. } => "network",
            CommentKitError::Config { .. } => "config",
            CommentKitError::MissingElement { .. } => "missing_element",
            CommentKitError::Io(_) => "io",
            CommentKitError::InvalidArgument(_) => "invalid_argument",
        }
    }
}

/// Result type alias for CommentKit operations.
pub type Result<T> = std::result::Result<T, CommentKitError>;

/// Extension trait for Result.
pub trait ResultExt<T> {
    /// Wrap the error as a DOM error with context.
    fn dom_context(self, message: impl Into<String>) -> Result<T>;

    /// Wrap the error as a network error with context.
    fn network_context(self, message: impl Into<String>) -> Result<T>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn dom_context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| CommentKitError::dom_with_source(message, e))
    }

    fn network_context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| CommentKitError::network_with_source(message, e))
    }
}

/// Extension trait for Option.
pub trait OptionExt<T> {
    /// Convert None to a MissingElement error.
    fn ok_or_missing(self, role: &'static str, selector: impl Into<String>) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_missing(self, role: &'static str, selector: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| CommentKitError::missing(role, selector))
    }
}

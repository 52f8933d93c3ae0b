//! Error handling for acrl-rs
//!
//! This module defines the crate error type and a Result alias. Most public
//! operations in the tick path never return these errors to the host; they are
//! logged and collapsed into `Option`, `bool` or an outcome enum at the boundary.

use thiserror::Error;

/// Main error type for acrl-rs operations
#[derive(Error, Debug)]
pub enum AcrlError {
    /// Socket creation, bind, send or receive failure
    #[error("Transport error on {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    /// A command message or one of its values could not be interpreted
    #[error("Malformed command: {0}")]
    MalformedCommand(String),

    /// A field group provider is not available on the host
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// A single host query failed
    #[error("Query {name} failed: {message}")]
    Query { name: String, message: String },

    /// A host-side action (e.g. reset) failed
    #[error("Host action error: {0}")]
    HostAction(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AcrlError>,
    },
}

impl AcrlError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AcrlError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a query error for the named host query
    pub fn query(name: impl Into<String>, message: impl Into<String>) -> Self {
        AcrlError::Query {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for AcrlError {
    fn from(err: serde_json::Error) -> Self {
        AcrlError::Serialization(err.to_string())
    }
}

/// Result type alias for acrl-rs operations
pub type Result<T> = std::result::Result<T, AcrlError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AcrlError::Io(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AcrlError::Io(e).with_context(f()))
    }
}

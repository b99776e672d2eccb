//! Error types for definition resolution

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Error type for define operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// I/O error during cache, socket or artifact operations
    #[error("I/O {operation} failed{}", path.as_ref().map_or(String::new(), |p| format!(": {}", p.display())))]
    #[diagnostic(
        code(define::io),
        help("Check file permissions and ensure the path exists")
    )]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path that caused the error, if available
        path: Option<Box<Path>>,
        /// Operation that failed (e.g., "read", "rename", "bind")
        operation: String,
    },

    /// Configuration or path resolution error
    #[error("Configuration error: {message}")]
    #[diagnostic(code(define::config))]
    Configuration {
        /// Error message describing the configuration issue
        message: String,
    },

    /// Serialization error
    #[error("Serialization error: {message}")]
    #[diagnostic(code(define::serialization))]
    Serialization {
        /// Error message describing the serialization issue
        message: String,
    },

    /// A lookup provider produced no usable definition
    #[error("Provider {provider} failed: {message}")]
    #[diagnostic(
        code(define::provider),
        help("Provider failures are expected; the next provider in the chain is tried")
    )]
    Provider {
        /// Name of the provider that failed
        provider: &'static str,
        /// What went wrong
        message: String,
    },

    /// An outbound call exceeded its deadline
    #[error("{operation} timed out after {millis}ms")]
    #[diagnostic(code(define::timeout))]
    Timeout {
        /// The operation that was abandoned
        operation: String,
        /// The deadline in milliseconds
        millis: u64,
    },
}

impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    /// Create an I/O error with path context
    #[must_use]
    pub fn io(
        source: std::io::Error,
        path: impl AsRef<Path>,
        operation: impl Into<String>,
    ) -> Self {
        Self::Io {
            source,
            path: Some(path.as_ref().into()),
            operation: operation.into(),
        }
    }

    /// Create a serialization error
    #[must_use]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
        }
    }

    /// Create a provider failure
    #[must_use]
    pub fn provider(provider: &'static str, msg: impl Into<String>) -> Self {
        Self::Provider {
            provider,
            message: msg.into(),
        }
    }

    /// Create a timeout error
    #[must_use]
    pub fn timeout(operation: impl Into<String>, deadline: std::time::Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            millis: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Result type for define operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_io_error_mentions_path() {
        let err = Error::io(
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            "/tmp/define/cache.json",
            "read",
        );
        let msg = err.to_string();
        assert!(msg.contains("read"));
        assert!(msg.contains("/tmp/define/cache.json"));
    }

    #[test]
    fn test_timeout_reports_millis() {
        let err = Error::timeout("primary lookup", Duration::from_millis(900));
        assert_eq!(err.to_string(), "primary lookup timed out after 900ms");
    }

    #[test]
    fn test_provider_error_display() {
        let err = Error::provider("wiktionary", "HTTP 404");
        assert_eq!(err.to_string(), "Provider wiktionary failed: HTTP 404");
    }
}

//! Unified error types for metr

use thiserror::Error;

/// Unified error type for all metr operations
#[derive(Error, Debug)]
pub enum MetrError {
    // Handler errors
    #[error("Handler error: {0}")]
    Handler(String),

    #[error("Handler already closed: {0}")]
    Closed(String),

    // Backend errors
    #[error("Sink error: {0}")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),

    // Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MetrError {
    /// Wrap a backend-specific error, keeping it as the error source
    pub fn sink(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Sink(err.into())
    }
}

/// Result type alias using MetrError
pub type Result<T> = std::result::Result<T, MetrError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_sink_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe gone");
        let err = MetrError::sink(io);

        assert!(err.to_string().contains("pipe gone"));
        assert!(err.source().is_some());
    }
}

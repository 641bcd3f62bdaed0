//! Error types for getforget

use thiserror::Error;

/// Main error type for getforget operations
#[derive(Error, Debug)]
pub enum ForgetError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller supplied unusable input (empty text, malformed body)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Input text produced no keyword long enough to be remembered
    #[error("No keywords found in input")]
    NoKeywords,

    /// Tokenizer (external analyzer) failed for a single request
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// HTTP server errors
    #[error("Server error: {0}")]
    Server(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ForgetError {
    /// Whether the error was caused by the caller rather than the daemon
    pub fn is_client_error(&self) -> bool {
        matches!(self, ForgetError::InvalidInput(_) | ForgetError::NoKeywords)
    }
}

/// Result type alias for getforget operations
pub type Result<T> = std::result::Result<T, ForgetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(ForgetError::InvalidInput("empty".to_string()).is_client_error());
        assert!(ForgetError::NoKeywords.is_client_error());
        assert!(!ForgetError::Tokenizer("analyzer down".to_string()).is_client_error());
        assert!(!ForgetError::Config("bad".to_string()).is_client_error());
    }

    #[test]
    fn test_error_display() {
        let err = ForgetError::Tokenizer("analyzer down".to_string());
        assert_eq!(err.to_string(), "Tokenizer error: analyzer down");
    }
}

//! Error types for vibenav

use thiserror::Error;

/// Result type alias using VibeError
pub type Result<T> = std::result::Result<T, VibeError>;

/// Error type alias for convenience
pub type Error = VibeError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
}

/// Main error type for vibenav
#[derive(Debug, Error)]
pub enum VibeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Place not found: {0}")]
    PlaceNotFound(String),

    #[error("Data not found: {0}")]
    DataNotFound(String),

    #[error("Vector index not loaded")]
    IndexNotLoaded,

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External service error: {0}")]
    ExternalError(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl VibeError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::PlaceNotFound(_) | Self::DataNotFound(_) | Self::IndexNotLoaded => {
                exit_codes::NOT_FOUND
            }
            Self::InvalidInput(_) | Self::Config(_) => exit_codes::INVALID_INPUT,
            _ => exit_codes::GENERAL_ERROR,
        }
    }

    /// Whether this error came from talking to an external provider
    /// (network failure, quota, non-2xx status) rather than from local data.
    pub fn is_provider_error(&self) -> bool {
        matches!(self, Self::Http(_) | Self::ExternalError(_) | Self::Llm(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            VibeError::PlaceNotFound("x".into()).exit_code(),
            exit_codes::NOT_FOUND
        );
        assert_eq!(VibeError::IndexNotLoaded.exit_code(), exit_codes::NOT_FOUND);
        assert_eq!(
            VibeError::Config("bad".into()).exit_code(),
            exit_codes::INVALID_INPUT
        );
        assert_eq!(
            VibeError::Index("oops".into()).exit_code(),
            exit_codes::GENERAL_ERROR
        );
    }
}

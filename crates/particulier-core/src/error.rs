//! Error types for particulier

use thiserror::Error;

/// The main error type for particulier operations
#[derive(Debug, Error)]
pub enum ParticulierError {
    #[error("Invalid capacity: {0} (must be between 1 and {max})", max = u32::MAX)]
    InvalidCapacity(usize),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),
}

/// Result type alias for particulier operations
pub type Result<T> = std::result::Result<T, ParticulierError>;

impl From<toml::de::Error> for ParticulierError {
    fn from(err: toml::de::Error) -> Self {
        ParticulierError::TomlParseError(err.to_string())
    }
}

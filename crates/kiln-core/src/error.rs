//! Error types for Kiln

use thiserror::Error;

/// The main error type for Kiln operations
#[derive(Debug, Error)]
pub enum KilnError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Generation error: {0}")]
    GenerationError(String),

    #[error("Scene error: {0}")]
    SceneError(String),

    #[error("Import error: {0}")]
    ImportError(String),

    #[error("Texture error: {0}")]
    TextureError(String),
}

/// Result type alias for Kiln operations
pub type Result<T> = std::result::Result<T, KilnError>;

impl From<toml::de::Error> for KilnError {
    fn from(err: toml::de::Error) -> Self {
        KilnError::TomlParseError(err.to_string())
    }
}

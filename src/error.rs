//! Error types for the Mavis engine

use thiserror::Error;

/// Result type alias for Mavis operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Mavis engine
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Corrector service error (bad address, malformed reply)
    #[error("corrector error: {0}")]
    Corrector(String),

    /// Service discovery error
    #[error("discovery error: {0}")]
    Discovery(String),

    /// Imported file does not match any recognized name
    #[error("unrecognized file name \"{name}\"; expected one of: {expected}")]
    UnrecognizedFile {
        /// File name that was offered for import
        name: String,
        /// Comma separated list of recognized names
        expected: String,
    },

    /// Import failed for a recognized file
    #[error("import error: {0}")]
    Import(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

//! Error type for the crate's own fallible operations.
//!
//! The classifiers never fail. Building custom patterns, loading configuration
//! and rendering the pattern table can, and they report through
//! [`ClassifierError`].

use config::ConfigError;
use thiserror::Error;

/// Errors that can occur while building or configuring a classifier.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// A pattern's regular expression failed to compile.
    #[error("invalid pattern `{name}`: {source}")]
    InvalidPattern {
        /// Name of the offending pattern.
        name: String,
        /// The underlying regex compilation error.
        #[source]
        source: regex::Error,
    },

    /// The configuration file was not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// The configuration file path is not valid UTF-8.
    #[error("invalid configuration path: {0}")]
    InvalidPath(String),

    /// The configuration could not be read or deserialized.
    #[error("failed to parse configuration: {0}")]
    Config(#[from] ConfigError),

    /// Reading input failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The pattern table could not be rendered.
    #[error("failed to render pattern table: {0}")]
    Render(String),
}

impl From<toml::ser::Error> for ClassifierError {
    fn from(err: toml::ser::Error) -> Self {
        ClassifierError::Render(err.to_string())
    }
}

impl From<serde_json::Error> for ClassifierError {
    fn from(err: serde_json::Error) -> Self {
        ClassifierError::Render(err.to_string())
    }
}

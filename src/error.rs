//! Error types for Newscast.

use thiserror::Error;

/// Library-level error type for Newscast operations.
#[derive(Error, Debug)]
pub enum NewscastError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Feed error: {0}")]
    Feed(String),

    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("State error: {0}")]
    State(String),

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Newscast operations.
pub type Result<T> = std::result::Result<T, NewscastError>;

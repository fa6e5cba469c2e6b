//! fbscrape: posts, comments and replies from public Facebook pages
//!
//! This crate drives a headless browser through the basic mobile site, pages
//! through each post's comments (and optionally each comment's replies) under a
//! collection budget, and appends every finished post to an append-only dump.

pub mod config;
pub mod crawler;
pub mod output;
pub mod post;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for fbscrape operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Login unsuccessful: {0}")]
    Login(String),

    #[error(
        "Page source no longer matches the expected structure ({0}); the page decoder needs updating"
    )]
    Source(String),

    #[error("Bad post at {url}: {reason}")]
    BadPost { url: String, reason: String },

    #[error("Invalid post URL {url}: must start with {expected}")]
    InvalidUrl { url: String, expected: String },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),
}

impl From<chromiumoxide::error::CdpError> for ScrapeError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Self::Browser(err.to_string())
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),
}

/// Result type alias for fbscrape operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use post::{Author, Comment, Post, PostMetadata, Reply};
pub use state::{CollectionBudget, StopReason};

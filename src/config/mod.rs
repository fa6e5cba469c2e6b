//! Configuration module for fbscrape
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use fbscrape::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("fbscrape.toml")).unwrap();
//! println!("Scraping page: {}", config.scrape.page_id);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{BrowserConfig, Config, OutputConfig, PacingConfig, ScrapeConfig, SessionConfig};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, resolve_password, PASSWORD_ENV_VAR,
};
pub use validation::MIN_ALLOWED_DELAY;

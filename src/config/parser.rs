use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable consulted when the config file carries no password
pub const PASSWORD_ENV_VAR: &str = "FBSCRAPE_PASSWORD";

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use fbscrape::config::load_config;
///
/// let config = load_config(Path::new("fbscrape.toml")).unwrap();
/// println!("Page: {}", config.scrape.page_id);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at start-up so a dump can be traced back to the settings that
/// produced it.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Returns the login password, from the config file or the environment
pub fn resolve_password(config: &Config) -> Result<String, ConfigError> {
    if let Some(password) = config.session.password.as_ref().filter(|p| !p.is_empty()) {
        return Ok(password.clone());
    }

    match std::env::var(PASSWORD_ENV_VAR) {
        Ok(password) if !password.is_empty() => Ok(password),
        _ => Err(ConfigError::MissingCredential(format!(
            "no password in [session] and {} is not set",
            PASSWORD_ENV_VAR
        ))),
    }
}

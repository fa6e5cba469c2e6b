use crate::config::types::{
    BrowserConfig, Config, OutputConfig, PacingConfig, ScrapeConfig, SessionConfig,
};
use crate::ConfigError;

/// Shortest pause accepted between navigations (milliseconds)
pub const MIN_ALLOWED_DELAY: u64 = 1_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_session_config(&config.session)?;
    validate_browser_config(&config.browser)?;
    validate_pacing_config(&config.pacing)?;
    validate_scrape_config(&config.scrape)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    if config.email.trim().is_empty() {
        return Err(ConfigError::Validation("email cannot be empty".to_string()));
    }
    Ok(())
}

fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.window_width == 0 || config.window_height == 0 {
        return Err(ConfigError::Validation(format!(
            "window size must be non-zero, got {}x{}",
            config.window_width, config.window_height
        )));
    }

    if config.request_timeout < 1_000 {
        return Err(ConfigError::Validation(format!(
            "request_timeout must be >= 1000ms, got {}ms",
            config.request_timeout
        )));
    }

    if let Some(path) = &config.chrome_path {
        if path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "chrome_path cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// The post-navigation pause is mandatory: at least one second, min <= max
fn validate_pacing_config(config: &PacingConfig) -> Result<(), ConfigError> {
    if config.min_delay < MIN_ALLOWED_DELAY {
        return Err(ConfigError::Validation(format!(
            "min_delay must be >= {}ms, got {}ms",
            MIN_ALLOWED_DELAY, config.min_delay
        )));
    }

    if config.min_delay > config.max_delay {
        return Err(ConfigError::Validation(format!(
            "min_delay ({}ms) cannot exceed max_delay ({}ms)",
            config.min_delay, config.max_delay
        )));
    }

    Ok(())
}

fn validate_scrape_config(config: &ScrapeConfig) -> Result<(), ConfigError> {
    validate_page_id(&config.page_id)?;

    if config.scrolls > 10_000 {
        return Err(ConfigError::Validation(format!(
            "scrolls must be <= 10000, got {}",
            config.scrolls
        )));
    }

    if config.reply_limit.is_some() && !config.fetch_replies {
        tracing::warn!("reply-limit is set but fetch-replies is off; replies will not be scraped");
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.dump_path.is_empty() {
        return Err(ConfigError::Validation(
            "dump_path cannot be empty".to_string(),
        ));
    }

    if config.json_path.as_deref() == Some(config.dump_path.as_str()) {
        return Err(ConfigError::Validation(
            "json_path must differ from dump_path".to_string(),
        ));
    }

    Ok(())
}

/// Page ids are vanity names or numeric ids: alphanumerics and dots
fn validate_page_id(page_id: &str) -> Result<(), ConfigError> {
    if page_id.is_empty() {
        return Err(ConfigError::Validation(
            "page_id cannot be empty".to_string(),
        ));
    }

    if !page_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "page_id must contain only alphanumerics, '.', '-' or '_', got '{}'",
            page_id
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_page_id() {
        assert!(validate_page_id("DonaldTrump").is_ok());
        assert!(validate_page_id("some.page").is_ok());
        assert!(validate_page_id("100064").is_ok());

        assert!(validate_page_id("").is_err());
        assert!(validate_page_id("a/b").is_err());
        assert!(validate_page_id("page?x=1").is_err());
    }

    #[test]
    fn test_validate_pacing() {
        let ok = PacingConfig {
            min_delay: 1000,
            max_delay: 1000,
        };
        assert!(validate_pacing_config(&ok).is_ok());

        let too_fast = PacingConfig {
            min_delay: 200,
            max_delay: 1000,
        };
        assert!(validate_pacing_config(&too_fast).is_err());

        let inverted = PacingConfig {
            min_delay: 5000,
            max_delay: 2000,
        };
        assert!(validate_pacing_config(&inverted).is_err());
    }

    #[test]
    fn test_validate_output() {
        let same = OutputConfig {
            dump_path: "posts.bin".to_string(),
            json_path: Some("posts.bin".to_string()),
        };
        assert!(validate_output_config(&same).is_err());

        let fine = OutputConfig {
            dump_path: "posts.bin".to_string(),
            json_path: Some("posts.json".to_string()),
        };
        assert!(validate_output_config(&fine).is_ok());
    }
}

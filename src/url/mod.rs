//! URL handling module for fbscrape
//!
//! This module knows the site's hosts, rejects post URLs outside the basic
//! mobile host before any navigation happens, and resolves the relative links
//! found in page markup.

mod story;

use crate::{Result, ScrapeError};
use url::Url;

pub use story::{collect_story_urls, story_key, STORY_PATH_PREFIX};

/// Login page
pub const BASE_URL: &str = "https://facebook.com";

/// Canonical host used for profile links
pub const W3_BASE_URL: &str = "https://www.facebook.com";

/// Mobile host used for the post listing
pub const MOBILE_URL: &str = "https://mobile.facebook.com";

/// Basic mobile host serving posts, comments and replies
pub const MBASIC_URL: &str = "https://mbasic.facebook.com";

/// Checks that a post URL points at the basic mobile host
///
/// # Examples
///
/// ```
/// use fbscrape::url::validate_post_url;
///
/// assert!(validate_post_url("https://mbasic.facebook.com/story.php?story_fbid=1&id=2").is_ok());
/// assert!(validate_post_url("https://www.facebook.com/story.php?story_fbid=1&id=2").is_err());
/// ```
pub fn validate_post_url(url: &str) -> Result<Url> {
    let invalid = || ScrapeError::InvalidUrl {
        url: url.to_string(),
        expected: MBASIC_URL.to_string(),
    };

    if !url.starts_with(MBASIC_URL) {
        return Err(invalid());
    }

    let parsed = Url::parse(url).map_err(|_| invalid())?;
    let expected = Url::parse(MBASIC_URL)?;
    if parsed.scheme() != expected.scheme() || parsed.host_str() != expected.host_str() {
        return Err(invalid());
    }

    Ok(parsed)
}

/// Builds the mobile listing URL for a page
pub fn page_url(page_id: &str) -> Result<Url> {
    Ok(Url::parse(&format!("{}/{}", MOBILE_URL, page_id))?)
}

/// Resolves an href found in page markup against one of the site's hosts
///
/// Returns None for empty hrefs, fragments and non-HTTP(S) results.
pub fn resolve_link(base: &str, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let base = Url::parse(base).ok()?;
    let resolved = base.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}

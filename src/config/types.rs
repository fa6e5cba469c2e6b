use serde::Deserialize;

/// Main configuration structure for fbscrape
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub session: SessionConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    pub scrape: ScrapeConfig,
    pub output: OutputConfig,
}

/// Login credentials
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Email address or phone number used on the login form
    pub email: String,

    /// Password; falls back to the `FBSCRAPE_PASSWORD` environment variable
    #[serde(default)]
    pub password: Option<String>,
}

/// Headless browser configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    /// Path to a Chrome/Chromium executable (auto-detected when absent)
    #[serde(rename = "chrome-path", default)]
    pub chrome_path: Option<String>,

    #[serde(default = "default_headless")]
    pub headless: bool,

    #[serde(rename = "window-width", default = "default_window_width")]
    pub window_width: u32,

    #[serde(rename = "window-height", default = "default_window_height")]
    pub window_height: u32,

    /// Timeout for a single browser request (milliseconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: default_headless(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Randomized pause taken after every navigation
#[derive(Debug, Clone, Deserialize)]
pub struct PacingConfig {
    /// Shortest pause (milliseconds)
    #[serde(rename = "min-delay", default = "default_min_delay")]
    pub min_delay: u64,

    /// Longest pause (milliseconds)
    #[serde(rename = "max-delay", default = "default_max_delay")]
    pub max_delay: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_delay: default_min_delay(),
            max_delay: default_max_delay(),
        }
    }
}

/// What to scrape and how much of it
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeConfig {
    /// Page whose posts are listed (e.g. "DonaldTrump")
    #[serde(rename = "page-id")]
    pub page_id: String,

    /// Number of scrolls on the listing page
    #[serde(default)]
    pub scrolls: u32,

    /// Upper bound on comments per post (unbounded when absent)
    #[serde(rename = "comment-limit", default)]
    pub comment_limit: Option<usize>,

    #[serde(rename = "fetch-replies", default)]
    pub fetch_replies: bool,

    /// Upper bound on replies per comment (unbounded when absent)
    #[serde(rename = "reply-limit", default)]
    pub reply_limit: Option<usize>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the append-only post dump
    #[serde(rename = "dump-path")]
    pub dump_path: String,

    /// If set, the dump is converted to a JSON list here after the run
    #[serde(rename = "json-path", default)]
    pub json_path: Option<String>,
}

fn default_headless() -> bool {
    true
}

fn default_window_width() -> u32 {
    1280
}

fn default_window_height() -> u32 {
    800
}

fn default_request_timeout() -> u64 {
    30_000
}

fn default_min_delay() -> u64 {
    5_000
}

fn default_max_delay() -> u64 {
    15_000
}

//! Page fetching through a headless browser
//!
//! This module defines the [`PageFetcher`] capability the pagination engine
//! works against, and [`BrowserFetcher`], its Chrome/Chromium implementation:
//! - Launching the browser with a spawned CDP handler task
//! - Submitting the login form once per session
//! - Navigating, with the mandatory randomized pause after each load
//! - Scrolling the listing page to load more posts

use crate::config::BrowserConfig as BrowserSettings;
use crate::crawler::scheduler::Pacer;
use crate::url::BASE_URL;
use crate::{Result, ScrapeError};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures_util::StreamExt;
use std::fmt;
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

const SCROLL_SCRIPT: &str =
    "window.scrollTo(0, document.body.scrollHeight); document.body.scrollHeight;";

/// Login credentials
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Capability to load rendered pages
///
/// Methods take `&mut self`: a browser session serves one navigation at a
/// time, and the borrow checker keeps it that way.
#[async_trait]
pub trait PageFetcher: Send {
    /// Logs in; fails with [`ScrapeError::Login`] if the form is missing or rejected
    async fn login(&mut self, credentials: &Credentials) -> Result<()>;

    /// Loads a URL and returns its rendered content
    async fn navigate(&mut self, url: &Url) -> Result<String>;

    /// Scrolls the current page to the bottom `times` times
    async fn scroll(&mut self, times: u32) -> Result<()>;

    /// Returns the current page's rendered content
    async fn content(&mut self) -> Result<String>;

    /// Releases the underlying session
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Headless Chrome/Chromium page fetcher
pub struct BrowserFetcher {
    browser: Browser,
    page: Page,
    handler: Option<JoinHandle<()>>,
    pacer: Pacer,
}

impl BrowserFetcher {
    /// Launches the browser and opens the single tab used for the session
    pub async fn launch(settings: &BrowserSettings, pacer: Pacer) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(settings.window_width, settings.window_height)
            .request_timeout(Duration::from_millis(settings.request_timeout))
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--disable-crash-reporter")
            .arg("--disable-extensions")
            .arg("--disable-in-process-stack-traces")
            .arg("--disable-logging")
            .arg("--log-level=3");

        if !settings.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &settings.chrome_path {
            builder = builder.chrome_executable(path);
        }

        let config = builder
            .build()
            .map_err(|e| ScrapeError::Browser(format!("Failed to build browser config: {}", e)))?;

        tracing::info!("Launching headless browser");
        let (browser, mut handler) = Browser::launch(config).await?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler error: {}", e);
                }
            }
        });

        let page = browser.new_page("about:blank").await?;

        Ok(Self {
            browser,
            page,
            handler: Some(handler),
            pacer,
        })
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn login(&mut self, credentials: &Credentials) -> Result<()> {
        let unrecognized = |what: &str| ScrapeError::Login(format!("login page has no {} field", what));

        self.page.goto(BASE_URL).await?;
        self.page.wait_for_navigation().await?;

        let email = self
            .page
            .find_element("input[name=email]")
            .await
            .map_err(|_| unrecognized("email"))?;
        email.click().await?;
        email.type_str(&credentials.email).await?;

        let password = self
            .page
            .find_element("input[name=pass]")
            .await
            .map_err(|_| unrecognized("password"))?;
        password.click().await?;
        password.type_str(&credentials.password).await?;

        self.page
            .find_element("[name=login]")
            .await
            .map_err(|_| unrecognized("login button"))?
            .click()
            .await?;
        self.page.wait_for_navigation().await?;
        self.pacer.pause().await;

        // A rejected login re-renders the form
        if self.page.find_element("input[name=pass]").await.is_ok() {
            return Err(ScrapeError::Login(
                "credentials were rejected (login form shown again)".to_string(),
            ));
        }

        tracing::info!("Successfully logged in");
        Ok(())
    }

    async fn navigate(&mut self, url: &Url) -> Result<String> {
        tracing::debug!("Navigating to {}", url);
        self.page.goto(url.as_str()).await?;
        self.page.wait_for_navigation().await?;
        self.pacer.pause().await;
        Ok(self.page.content().await?)
    }

    async fn scroll(&mut self, times: u32) -> Result<()> {
        for i in 0..times {
            self.page.evaluate(SCROLL_SCRIPT).await?;
            self.pacer.pause().await;
            if (i + 1) % 10 == 0 {
                tracing::info!("Scrolled {}/{} times", i + 1, times);
            }
        }
        Ok(())
    }

    async fn content(&mut self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    async fn close(&mut self) -> Result<()> {
        if let Err(e) = self.browser.close().await {
            tracing::warn!("Failed to close browser: {}", e);
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        tracing::info!("Browser shutdown complete");
        Ok(())
    }
}

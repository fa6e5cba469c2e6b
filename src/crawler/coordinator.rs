//! Scrape coordinator - post listing, assembly and the batch loop
//!
//! This module ties the fetcher, the decoder and the pagination engine
//! together for one browser session:
//! - Logging in once
//! - Listing a page's post URLs
//! - Assembling one post (metadata, comments, per-comment replies) and
//!   appending it to the store
//! - Running the per-post loop, where a failed post never stops the batch

use crate::config::ScrapeConfig;
use crate::crawler::fetcher::{Credentials, PageFetcher};
use crate::crawler::paginator::Paginator;
use crate::crawler::parser::{MbasicDecoder, PageDecoder};
use crate::post::{Comment, Post, Reply};
use crate::state::CollectionBudget;
use crate::storage::PostStore;
use crate::url::{page_url, validate_post_url};
use crate::{Result, ScrapeError};
use chrono::Utc;
use url::Url;

/// How much of each post to collect
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeOptions {
    /// Ceiling on comments per post; further capped by the site-reported count
    pub comment_limit: Option<usize>,

    pub fetch_replies: bool,

    /// Ceiling on replies per comment
    pub reply_limit: Option<usize>,
}

impl From<&ScrapeConfig> for ScrapeOptions {
    fn from(config: &ScrapeConfig) -> Self {
        Self {
            comment_limit: config.comment_limit,
            fetch_replies: config.fetch_replies,
            reply_limit: config.reply_limit,
        }
    }
}

/// A post the batch loop gave up on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedPost {
    pub url: String,
    pub error: String,
}

/// Outcome of a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Posts assembled and appended to the store
    pub scraped: usize,

    /// Posts skipped after an error, in input order
    pub failed: Vec<FailedPost>,

    /// Comments across the scraped posts
    pub comments: usize,

    /// Replies across the scraped posts
    pub replies: usize,
}

impl BatchReport {
    pub fn attempted(&self) -> usize {
        self.scraped + self.failed.len()
    }
}

/// One scraping session over a single page fetcher
pub struct Session<F: PageFetcher> {
    fetcher: F,
    decoder: Box<dyn PageDecoder>,
}

impl<F: PageFetcher> Session<F> {
    /// Creates a session decoding pages from the basic mobile site
    pub fn new(fetcher: F) -> Self {
        Self::with_decoder(fetcher, Box::new(MbasicDecoder::new()))
    }

    pub fn with_decoder(fetcher: F, decoder: Box<dyn PageDecoder>) -> Self {
        Self { fetcher, decoder }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Logs in; a failure here aborts the whole run
    pub async fn login(&mut self, credentials: &Credentials) -> Result<()> {
        tracing::info!("Logging in as {}", credentials.email);
        self.fetcher.login(credentials).await
    }

    /// Lists the post URLs of a page
    ///
    /// Loads the page's mobile listing, scrolls `scrolls` times to load older
    /// posts, and returns the deduplicated story links in page order.
    pub async fn list_post_urls(&mut self, page_id: &str, scrolls: u32) -> Result<Vec<Url>> {
        let listing = page_url(page_id)?;
        tracing::info!("Listing posts of {} ({} scrolls)", listing, scrolls);

        self.fetcher.navigate(&listing).await?;
        self.fetcher.scroll(scrolls).await?;
        let html = self.fetcher.content().await?;

        let urls = self.decoder.decode_story_links(&html);
        tracing::info!("Found {} posts on {}", urls.len(), page_id);
        Ok(urls)
    }

    /// Scrapes one post and appends it to `store`
    ///
    /// # Arguments
    ///
    /// * `url` - Post URL on the basic mobile host
    /// * `store` - Destination the finished post is appended to
    /// * `options` - Comment and reply limits
    ///
    /// # Returns
    ///
    /// * `Ok(Post)` - The post as it was appended; comments are empty when
    ///   their first page could not be fetched or decoded
    /// * `Err(ScrapeError)` - The URL was rejected, the post metadata could
    ///   not be decoded, or the store rejected the write
    pub async fn scrape_post(
        &mut self,
        url: &str,
        store: &mut dyn PostStore,
        options: &ScrapeOptions,
    ) -> Result<Post> {
        let url = validate_post_url(url)?;

        let html = self.fetcher.navigate(&url).await?;
        let metadata = self
            .decoder
            .decode_post_metadata(&html)
            .map_err(|e| e.at(&url))?;
        let post_id = metadata
            .post_id()
            .map(str::to_owned)
            .ok_or_else(|| ScrapeError::BadPost {
                url: url.to_string(),
                reason: format!("identifier {:?} has no post id segment", metadata.identifier),
            })?;

        let reported = usize::try_from(metadata.comment_count).unwrap_or(usize::MAX);
        let mut budget = CollectionBudget::from_limit(options.comment_limit).clamp_to(reported);
        tracing::debug!(
            "Post {}: {} comments reported, collecting up to {}",
            post_id,
            metadata.comment_count,
            budget.requested()
        );

        let mut comments = match Paginator::new(&mut self.fetcher, &*self.decoder)
            .run::<Comment>(url.clone(), &post_id, &mut budget)
            .await
        {
            Ok(pagination) => pagination.items,
            Err(e) => {
                tracing::warn!("Storing post {} without comments: {}", post_id, e);
                Vec::new()
            }
        };

        if options.fetch_replies {
            for comment in comments.iter_mut() {
                comment.replies = self.collect_replies(comment, options.reply_limit).await;
            }
        }

        let post = Post::assemble(metadata, comments, Utc::now());
        store.append(&post)?;

        Ok(post)
    }

    /// Collects one comment's replies; any failure leaves them empty
    async fn collect_replies(&mut self, comment: &Comment, limit: Option<usize>) -> Vec<Reply> {
        let Some(link) = comment.replies_link.as_deref() else {
            return Vec::new();
        };

        let seed = match Url::parse(link) {
            Ok(seed) => seed,
            Err(e) => {
                tracing::warn!("Skipping replies of {}: bad link {}: {}", comment.identifier, link, e);
                return Vec::new();
            }
        };

        let mut budget = CollectionBudget::from_limit(limit);
        match Paginator::new(&mut self.fetcher, &*self.decoder)
            .run::<Reply>(seed, &comment.identifier, &mut budget)
            .await
        {
            Ok(pagination) => pagination.items,
            Err(e) => {
                tracing::warn!("Failed to fetch replies of {}: {}", comment.identifier, e);
                Vec::new()
            }
        }
    }

    /// Scrapes every URL in order, logging and skipping failed posts
    pub async fn scrape_all<I>(
        &mut self,
        urls: I,
        store: &mut dyn PostStore,
        options: &ScrapeOptions,
    ) -> BatchReport
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let urls: Vec<I::Item> = urls.into_iter().collect();
        let total = urls.len();
        let start_time = std::time::Instant::now();
        let mut report = BatchReport::default();

        tracing::info!("Scraping {} posts", total);

        for (index, url) in urls.iter().enumerate() {
            let url = url.as_ref();
            tracing::info!("Scraping post {}/{}: {}", index + 1, total, url);

            match self.scrape_post(url, store, options).await {
                Ok(post) => {
                    tracing::info!(
                        "Stored post {} with {} comments and {} replies",
                        post.identifier,
                        post.comments.len(),
                        post.reply_total()
                    );
                    report.scraped += 1;
                    report.comments += post.comments.len();
                    report.replies += post.reply_total();
                }
                Err(e) => {
                    tracing::error!("Error processing {}: {}", url, e);
                    report.failed.push(FailedPost {
                        url: url.to_string(),
                        error: e.to_string(),
                    });
                }
            }

            if (index + 1) % 10 == 0 {
                let elapsed = start_time.elapsed();
                tracing::info!(
                    "Progress: {}/{} posts, {} failed, {:.1} posts/min",
                    index + 1,
                    total,
                    report.failed.len(),
                    (index + 1) as f64 / elapsed.as_secs_f64().max(1.0) * 60.0
                );
            }
        }

        tracing::info!(
            "Batch completed: {} scraped, {} failed in {:?}",
            report.scraped,
            report.failed.len(),
            start_time.elapsed()
        );

        report
    }

    /// Closes the underlying fetcher
    pub async fn close(&mut self) -> Result<()> {
        self.fetcher.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_config() {
        let config = ScrapeConfig {
            page_id: "SomePage".to_string(),
            scrolls: 3,
            comment_limit: Some(50),
            fetch_replies: true,
            reply_limit: None,
        };
        let options = ScrapeOptions::from(&config);
        assert_eq!(options.comment_limit, Some(50));
        assert!(options.fetch_replies);
        assert_eq!(options.reply_limit, None);
    }

    #[test]
    fn test_report_attempted() {
        let report = BatchReport {
            scraped: 4,
            failed: vec![FailedPost {
                url: "https://mbasic.facebook.com/x".to_string(),
                error: "boom".to_string(),
            }],
            ..Default::default()
        };
        assert_eq!(report.attempted(), 5);
    }
}

//! Crawler module for page fetching and post extraction
//!
//! This module contains the core scraping logic, including:
//! - Browser-driven page fetching behind the `PageFetcher` trait
//! - Page decoding behind the `PageDecoder` trait
//! - Comment and reply pagination under a collection budget
//! - Randomized pacing between navigations
//! - Post assembly and the per-post batch loop

mod coordinator;
mod fetcher;
mod paginator;
mod parser;
mod scheduler;

pub use coordinator::{BatchReport, FailedPost, ScrapeOptions, Session};
pub use fetcher::{BrowserFetcher, Credentials, PageFetcher};
pub use paginator::{admit_batch, Paginated, Pagination, Paginator};
pub use parser::{container_class, filter_containers, DecodeError, MbasicDecoder, PageDecoder};
pub use scheduler::Pacer;

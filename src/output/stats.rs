//! Statistics over a post dump
//!
//! This module provides functionality for summarizing what a run wrote and
//! displaying it.

use crate::post::Post;
use crate::storage::{read_intact_posts, StorageResult};
use std::path::Path;

/// Dump statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpStatistics {
    /// Number of posts in the dump
    pub posts: u64,

    /// Comments actually scraped
    pub comments: u64,

    /// Replies actually scraped
    pub replies: u64,

    /// Sum of the site-reported comment counts
    pub reported_comments: u64,

    /// Posts stored without any comment
    pub posts_without_comments: u64,

    /// Posts whose scraped comments fall short of the reported count
    pub posts_below_reported: u64,
}

impl DumpStatistics {
    /// Adds one post to the totals
    pub fn record(&mut self, post: &Post) {
        let comments = post.comments.len() as u64;
        self.posts += 1;
        self.comments += comments;
        self.replies += post.reply_total() as u64;
        self.reported_comments += post.comment_count;
        if comments == 0 {
            self.posts_without_comments += 1;
        }
        if comments < post.comment_count {
            self.posts_below_reported += 1;
        }
    }

    /// Share of the reported comments that were scraped, as a percentage
    pub fn coverage(&self) -> f64 {
        if self.reported_comments == 0 {
            return 100.0;
        }
        (self.comments as f64 / self.reported_comments as f64) * 100.0
    }
}

/// Loads statistics from a dump file
///
/// # Arguments
///
/// * `path` - The framed dump to read
///
/// # Returns
///
/// * `Ok(DumpStatistics)` - Totals over every intact post; a corrupt frame
///   and everything after it are left out
/// * `Err(StorageError)` - The dump could not be read
pub fn load_statistics(path: &Path) -> StorageResult<DumpStatistics> {
    let mut stats = DumpStatistics::default();
    for post in read_intact_posts(path)? {
        stats.record(&post);
    }
    Ok(stats)
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &DumpStatistics) {
    println!("=== Dump Statistics ===\n");

    println!("Overview:");
    println!("  Posts: {}", stats.posts);
    println!("  Comments scraped: {}", stats.comments);
    println!("  Replies scraped: {}", stats.replies);
    println!();

    println!("Comment Coverage:");
    println!("  Reported by the site: {}", stats.reported_comments);
    println!("  Scraped: {} ({:.1}%)", stats.comments, stats.coverage());
    println!("  Posts without comments: {}", stats.posts_without_comments);
    println!(
        "  Posts below their reported count: {}",
        stats.posts_below_reported
    );

    if stats.posts > 0 {
        println!(
            "\nAverage comments per post: {:.1}",
            stats.comments as f64 / stats.posts as f64
        );
    }
}

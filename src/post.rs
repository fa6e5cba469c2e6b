//! Scraped records: posts, their comments, and the comments' replies
//!
//! A [`Post`] owns its comments and each [`Comment`] owns its replies. Field
//! names serialize in camelCase so the JSON export keeps the dataset's
//! established key names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a post, comment or reply
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub url: String,
}

/// A reply to a comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub author: Author,
    pub text: String,
}

/// A top-level comment on a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// `{post id}_{element id}`; also keys the comment's "more replies" link
    pub identifier: String,
    pub author: Author,
    pub text: String,
    pub replies_link: Option<String>,
    pub replies: Vec<Reply>,
}

/// Metadata decoded from a post page's structured-data block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostMetadata {
    /// Composite identifier, `;`-separated
    pub identifier: String,
    pub created_time: String,
    pub text: String,
    pub url: String,
    pub like_count: u64,
    pub share_count: u64,
    /// Total reported by the site, not the number scraped
    pub comment_count: u64,
    pub author: Author,
}

impl PostMetadata {
    /// Second `;` segment of the identifier: the id that keys comment pagination
    pub fn post_id(&self) -> Option<&str> {
        self.identifier
            .split(';')
            .nth(1)
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// A fully scraped post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub identifier: String,
    #[serde(rename = "time")]
    pub created_time: String,
    pub text: String,
    pub url: String,
    pub like_count: u64,
    pub share_count: u64,
    pub comment_count: u64,
    pub author: Author,
    pub comments: Vec<Comment>,
    pub scraped_at: DateTime<Utc>,
}

impl Post {
    /// Assembles a post from its metadata and collected comments
    pub fn assemble(metadata: PostMetadata, comments: Vec<Comment>, scraped_at: DateTime<Utc>) -> Self {
        Self {
            identifier: metadata.identifier,
            created_time: metadata.created_time,
            text: metadata.text,
            url: metadata.url,
            like_count: metadata.like_count,
            share_count: metadata.share_count,
            comment_count: metadata.comment_count,
            author: metadata.author,
            comments,
            scraped_at,
        }
    }

    /// Number of replies across all comments
    pub fn reply_total(&self) -> usize {
        self.comments.iter().map(|c| c.replies.len()).sum()
    }
}

//! Storage traits and error types
//!
//! This module defines the trait interface for post stores and the
//! associated error types.

use crate::post::Post;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt dump at frame {frame}: {reason}")]
    Corrupt { frame: usize, reason: String },

    #[error("Post too large to frame: {0} bytes")]
    FrameTooLarge(usize),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Append-only destination for finished posts
///
/// A post is handed to the store exactly once, after assembly; stores never
/// rewrite or reorder what was already appended.
pub trait PostStore {
    /// Durably appends one post
    fn append(&mut self, post: &Post) -> StorageResult<()>;
}

/// Collects posts in memory
impl PostStore for Vec<Post> {
    fn append(&mut self, post: &Post) -> StorageResult<()> {
        self.push(post.clone());
        Ok(())
    }
}

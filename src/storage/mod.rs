//! Storage module for persisting scraped posts
//!
//! This module handles the output store:
//! - The append-only framed dump written once per finished post
//! - Sequential frame decoding for the export and statistics utilities

mod framed;
mod traits;

pub use framed::{read_intact_posts, read_posts, FrameReader, FramedStore};
pub use traits::{PostStore, StorageError, StorageResult};

use std::path::Path;

/// Opens the dump at `path` for appending
pub fn open_store(path: &Path) -> FramedStore {
    FramedStore::new(path)
}

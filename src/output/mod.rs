//! Output module for reading back a post dump
//!
//! This module handles:
//! - Converting the framed dump into the JSON interchange list
//! - Summarizing a dump's contents

mod json;
pub mod stats;

pub use json::{convert_to_json, write_json};
pub use stats::{load_statistics, print_statistics, DumpStatistics};

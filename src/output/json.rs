//! Conversion of the framed dump into a JSON array

use crate::post::Post;
use crate::storage::{read_intact_posts, StorageResult};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes posts as a JSON array indented by four spaces
pub fn write_json<W: Write>(posts: &[Post], writer: W) -> serde_json::Result<()> {
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
    posts.serialize(&mut serializer)
}

/// Converts the dump at `source` into a JSON array at `destination`
///
/// Every field, nesting level and the append order are preserved. A corrupt
/// frame ends the export; the posts before it are still written.
///
/// # Returns
///
/// * `Ok(usize)` - Number of posts written
/// * `Err(StorageError)` - The dump could not be read or the file written
pub fn convert_to_json(source: &Path, destination: &Path) -> StorageResult<usize> {
    let posts = read_intact_posts(source)?;

    let mut writer = BufWriter::new(File::create(destination)?);
    write_json(&posts, &mut writer)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    tracing::info!(
        "Converted {} posts from {} to {}",
        posts.len(),
        source.display(),
        destination.display()
    );
    Ok(posts.len())
}

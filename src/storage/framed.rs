//! Append-only framed dump of posts
//!
//! Each post is one frame: a 4-byte big-endian length followed by that many
//! bytes of JSON. The file is opened in append mode for every write and closed
//! again, so an interrupted run keeps every post written before it. A frame
//! torn by a crash is cut off before the next append lands behind it.

use crate::post::Post;
use crate::storage::traits::{PostStore, StorageError, StorageResult};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

const LENGTH_PREFIX: usize = 4;

/// Post store backed by a framed dump file
#[derive(Debug, Clone)]
pub struct FramedStore {
    path: PathBuf,
    tail_checked: bool,
}

impl FramedStore {
    /// Creates a store appending to `path`; the file is created on first append
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tail_checked: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Truncates a trailing partial frame left by an interrupted write
    fn repair_tail(&self, file: &mut File) -> StorageResult<()> {
        let total = file.metadata()?.len();
        let intact = frame_boundary(&mut BufReader::new(&mut *file), total)?;
        if intact < total {
            tracing::warn!(
                "Dropping {} bytes of a partial frame at the end of {}",
                total - intact,
                self.path.display()
            );
            file.set_len(intact)?;
        }
        Ok(())
    }
}

impl PostStore for FramedStore {
    fn append(&mut self, post: &Post) -> StorageResult<()> {
        let payload = serde_json::to_vec(post)?;
        let length =
            u32::try_from(payload.len()).map_err(|_| StorageError::FrameTooLarge(payload.len()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;
        if !self.tail_checked {
            self.repair_tail(&mut file)?;
            self.tail_checked = true;
        }

        let mut frame = Vec::with_capacity(LENGTH_PREFIX + payload.len());
        frame.extend_from_slice(&length.to_be_bytes());
        frame.extend_from_slice(&payload);
        file.write_all(&frame)?;
        file.sync_data()?;

        tracing::debug!(
            "Appended post {} ({} bytes) to {}",
            post.identifier,
            payload.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Offset just past the last frame that fits entirely within `total` bytes
fn frame_boundary<R: Read>(reader: &mut R, total: u64) -> std::io::Result<u64> {
    let mut offset = 0u64;
    loop {
        if total - offset < LENGTH_PREFIX as u64 {
            return Ok(offset);
        }
        let mut prefix = [0u8; LENGTH_PREFIX];
        reader.read_exact(&mut prefix)?;
        let length = u64::from(u32::from_be_bytes(prefix));
        let end = offset + LENGTH_PREFIX as u64 + length;
        if end > total {
            return Ok(offset);
        }
        let skipped = std::io::copy(&mut (&mut *reader).take(length), &mut std::io::sink())?;
        if skipped < length {
            return Ok(offset);
        }
        offset = end;
    }
}

/// Sequential reader over a framed dump
pub struct FrameReader<R: Read> {
    reader: R,
    frame: usize,
    done: bool,
}

impl FrameReader<BufReader<File>> {
    /// Opens a dump file for reading
    pub fn open(path: &Path) -> StorageResult<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: Read> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            frame: 0,
            done: false,
        }
    }

    /// Reads the next post; `Ok(None)` at a clean end of stream
    pub fn next_post(&mut self) -> StorageResult<Option<Post>> {
        let mut prefix = [0u8; LENGTH_PREFIX];
        let read = read_full(&mut self.reader, &mut prefix)?;
        if read == 0 {
            return Ok(None);
        }
        if read < LENGTH_PREFIX {
            return Err(self.corrupt(format!(
                "truncated length prefix ({} of {} bytes)",
                read, LENGTH_PREFIX
            )));
        }

        let length = u32::from_be_bytes(prefix) as usize;
        let mut payload = Vec::new();
        let read = (&mut self.reader)
            .take(length as u64)
            .read_to_end(&mut payload)?;
        if read < length {
            return Err(self.corrupt(format!(
                "truncated payload ({} of {} bytes)",
                read, length
            )));
        }

        let post = serde_json::from_slice(&payload)
            .map_err(|e| self.corrupt(format!("undecodable payload: {}", e)))?;
        self.frame += 1;
        Ok(Some(post))
    }

    fn corrupt(&self, reason: String) -> StorageError {
        StorageError::Corrupt {
            frame: self.frame,
            reason,
        }
    }
}

impl<R: Read> Iterator for FrameReader<R> {
    type Item = StorageResult<Post>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_post() {
            Ok(Some(post)) => Some(Ok(post)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Reads every post from a dump file, in append order
pub fn read_posts(path: &Path) -> StorageResult<Vec<Post>> {
    FrameReader::open(path)?.collect()
}

/// Reads posts up to the first corrupt frame, which is logged and skipped
/// along with everything after it
pub fn read_intact_posts(path: &Path) -> StorageResult<Vec<Post>> {
    let mut posts = Vec::new();
    for post in FrameReader::open(path)? {
        match post {
            Ok(post) => posts.push(post),
            Err(StorageError::Corrupt { frame, reason }) => {
                tracing::warn!(
                    "Stopped reading {} at frame {}: {}",
                    path.display(),
                    frame,
                    reason
                );
                break;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(posts)
}

/// Fills `buf` as far as the stream allows and returns how many bytes were read
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

//! Image acquisition: file handles, concurrent reads and batches.

use crate::encoding::{detect_mime, encode};
use crate::error::{AcquireError, ReadError};
use futures::future::join_all;
use serde::Serialize;
use std::future::Future;
use std::io;
use std::path::PathBuf;

/// One acquired image, ready to be sent for inference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageItem {
    encoded_payload: String,
    display_name: String,
}

impl ImageItem {
    pub(crate) fn new(encoded_payload: String, display_name: String) -> Self {
        Self {
            encoded_payload,
            display_name,
        }
    }

    pub fn encoded_payload(&self) -> &str {
        &self.encoded_payload
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

/// Identity of a batch. Every acquisition gets a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BatchId(pub(crate) u64);

/// The ordered set of images currently live in a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    id: BatchId,
    items: Vec<ImageItem>,
}

impl Batch {
    pub(crate) fn new(id: BatchId, items: Vec<ImageItem>) -> Self {
        Self { id, items }
    }

    pub fn id(&self) -> BatchId {
        self.id
    }

    pub fn items(&self) -> &[ImageItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Encoded payloads in batch order.
    pub fn payloads(&self) -> Vec<String> {
        self.items
            .iter()
            .map(|item| item.encoded_payload.clone())
            .collect()
    }
}

/// Something a user handed over that holds image bytes.
pub trait FileHandle {
    /// Name shown next to the image.
    fn name(&self) -> &str;

    /// MIME type reported by whoever produced the handle, if any.
    fn mime_hint(&self) -> Option<&str> {
        None
    }

    /// Read the full content.
    fn read(&self) -> impl Future<Output = io::Result<Vec<u8>>> + Send;
}

/// A file on the local filesystem.
#[derive(Debug, Clone)]
pub struct PathFile {
    path: PathBuf,
    name: String,
}

impl PathFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }
}

impl FileHandle for PathFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self) -> impl Future<Output = io::Result<Vec<u8>>> + Send {
        tokio::fs::read(self.path.clone())
    }
}

/// Bytes that are already in memory, such as a drop event that carries them.
#[derive(Debug, Clone)]
pub struct MemoryFile {
    name: String,
    mime: Option<String>,
    bytes: Vec<u8>,
}

impl MemoryFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            mime: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

impl FileHandle for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime_hint(&self) -> Option<&str> {
        self.mime.as_deref()
    }

    fn read(&self) -> impl Future<Output = io::Result<Vec<u8>>> + Send {
        let bytes = self.bytes.clone();
        async move { Ok(bytes) }
    }
}

/// Outcome of reading a list of file handles.
#[derive(Debug, Default)]
pub struct Acquisition {
    /// Number of handles that were asked for.
    pub requested: usize,
    /// Successfully encoded images, in input order.
    pub items: Vec<ImageItem>,
    /// Files that were dropped, in input order.
    pub failures: Vec<AcquireError>,
}

/// Read and encode every handle concurrently.
///
/// Reads may finish in any order; `items` keeps the order of `files`.
pub async fn read_files<F: FileHandle>(files: &[F]) -> Acquisition {
    let reads = files.iter().map(|file| async move { (file, file.read().await) });
    let settled = join_all(reads).await;

    let mut acquisition = Acquisition {
        requested: files.len(),
        ..Acquisition::default()
    };
    for (file, read) in settled {
        match read.map_err(|source| ReadError {
            name: file.name().to_string(),
            source,
        }) {
            Ok(bytes) => match encode_file(file, &bytes) {
                Ok(item) => acquisition.items.push(item),
                Err(err) => {
                    tracing::warn!("dropping {}: {err}", file.name());
                    acquisition.failures.push(err);
                }
            },
            Err(err) => {
                tracing::warn!("dropping {}: {err}", file.name());
                acquisition.failures.push(err.into());
            }
        }
    }
    tracing::debug!(
        "read {} of {} files",
        acquisition.items.len(),
        acquisition.requested
    );
    acquisition
}

fn encode_file<F: FileHandle>(file: &F, bytes: &[u8]) -> Result<ImageItem, AcquireError> {
    let mime = file
        .mime_hint()
        .unwrap_or_else(|| detect_mime(bytes, file.name()));
    let payload = encode(bytes, mime).map_err(|source| AcquireError::Encoding {
        name: file.name().to_string(),
        source,
    })?;
    Ok(ImageItem::new(payload, file.name().to_string()))
}

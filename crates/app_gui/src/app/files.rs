//! File handles produced by the native file dialog and by egui drop events.

use eframe::egui;
use futures::future::Either;
use neuroscan_core::{FileHandle, MemoryFile, PathFile};
use std::future::Future;
use std::io;
use std::path::PathBuf;

pub(crate) const IMAGE_EXTENSIONS: &[&str] =
    &["png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff"];

/// A dropped file: a path on native platforms, bytes on the web.
pub(crate) enum DroppedFile {
    Disk(PathFile),
    Memory(MemoryFile),
}

impl DroppedFile {
    pub(crate) fn from_egui(file: &egui::DroppedFile) -> Option<Self> {
        if let Some(path) = &file.path {
            return Some(Self::Disk(PathFile::new(path)));
        }
        let bytes = file.bytes.as_ref()?;
        let name = if file.name.is_empty() {
            "dropped image".to_string()
        } else {
            file.name.clone()
        };
        let mut memory = MemoryFile::new(name, bytes.to_vec());
        if !file.mime.is_empty() {
            memory = memory.with_mime(file.mime.clone());
        }
        Some(Self::Memory(memory))
    }
}

impl FileHandle for DroppedFile {
    fn name(&self) -> &str {
        match self {
            DroppedFile::Disk(file) => file.name(),
            DroppedFile::Memory(file) => file.name(),
        }
    }

    fn mime_hint(&self) -> Option<&str> {
        match self {
            DroppedFile::Disk(file) => file.mime_hint(),
            DroppedFile::Memory(file) => file.mime_hint(),
        }
    }

    fn read(&self) -> impl Future<Output = io::Result<Vec<u8>>> + Send {
        match self {
            DroppedFile::Disk(file) => Either::Left(file.read()),
            DroppedFile::Memory(file) => Either::Right(file.read()),
        }
    }
}

/// Ask the user for one or more images.
pub(crate) fn pick_images() -> Option<Vec<PathFile>> {
    let picked: Vec<PathBuf> = rfd::FileDialog::new()
        .add_filter("Images", IMAGE_EXTENSIONS)
        .set_directory(".")
        .pick_files()?;
    Some(picked.into_iter().map(PathFile::new).collect())
}

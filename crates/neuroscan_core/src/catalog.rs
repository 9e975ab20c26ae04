//! The fixed set of sample scans offered when the user has not uploaded anything.

use crate::encoding::{detect_mime, encode, format_payload};
use crate::source::ImageItem;
use anyhow::{Context, Result};
use rand::Rng;
use std::fs;
use std::path::Path;

/// Number of images drawn for a sample batch.
pub const SAMPLE_BATCH_SIZE: usize = 3;

const SAMPLE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

const BUILTIN_SAMPLES: [&[u8]; 4] = [
    include_bytes!("../assets/samples/scan_1.png"),
    include_bytes!("../assets/samples/scan_2.png"),
    include_bytes!("../assets/samples/scan_3.png"),
    include_bytes!("../assets/samples/scan_4.png"),
];

/// Read-only list of pre-encoded sample images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleCatalog {
    entries: Vec<String>,
}

impl Default for SampleCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SampleCatalog {
    /// Scans shipped inside the binary.
    pub fn builtin() -> Self {
        let entries = BUILTIN_SAMPLES
            .iter()
            .map(|bytes| format_payload(bytes, "image/png"))
            .collect();
        Self { entries }
    }

    /// Samples from `dir` when one is configured, else the built-in scans.
    ///
    /// A directory that cannot be used is logged and ignored.
    pub fn load(dir: Option<&Path>) -> Self {
        let Some(dir) = dir else {
            return Self::builtin();
        };
        match Self::from_dir(dir) {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::warn!("using built-in samples: {e:#}");
                Self::builtin()
            }
        }
    }

    /// Load every supported image in `dir`, sorted by file name.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)
            .with_context(|| format!("cannot read sample directory {}", dir.display()))?
        {
            let path = entry?.path();
            if path.is_file() && has_sample_extension(&path) {
                paths.push(path);
            }
        }
        if paths.is_empty() {
            anyhow::bail!("no sample images in {}", dir.display());
        }
        paths.sort();

        let mut entries = Vec::with_capacity(paths.len());
        for path in paths {
            let bytes =
                fs::read(&path).with_context(|| format!("cannot read {}", path.display()))?;
            let mime = detect_mime(&bytes, &path.to_string_lossy());
            entries.push(encode(&bytes, mime)?);
        }
        tracing::info!("loaded {} sample images from {}", entries.len(), dir.display());
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `count` independent uniform draws with replacement, named `Sample 1..=count`.
    ///
    /// The same entry may appear more than once.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R, count: usize) -> Vec<ImageItem> {
        if self.entries.is_empty() {
            return Vec::new();
        }
        (0..count)
            .map(|slot| {
                let idx = rng.gen_range(0..self.entries.len());
                ImageItem::new(self.entries[idx].clone(), format!("Sample {}", slot + 1))
            })
            .collect()
    }
}

fn has_sample_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SAMPLE_EXTENSIONS.iter().any(|s| ext.eq_ignore_ascii_case(s)))
}

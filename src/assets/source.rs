use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::error::{LuminaError, LuminaResult};
use crate::foundation::math::Fnv1a64;
use crate::layers::model::SourceRef;

/// Maps a random seed to a stable image reference.
pub trait ImageSource: Send + Sync {
    /// Return the source for `seed`. The same seed always yields the same source.
    fn source_for_seed(&self, seed: &str) -> SourceRef;
}

/// Seeded images from picsum.photos at a fixed size.
#[derive(Clone, Debug)]
pub struct PicsumSource {
    /// Requested image width.
    pub width: u32,
    /// Requested image height.
    pub height: u32,
}

impl Default for PicsumSource {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 1600,
        }
    }
}

impl ImageSource for PicsumSource {
    fn source_for_seed(&self, seed: &str) -> SourceRef {
        SourceRef(format!(
            "https://picsum.photos/seed/{seed}/{}/{}",
            self.width, self.height
        ))
    }
}

/// Picks one file out of a fixed list by hashing the seed.
#[derive(Clone, Debug)]
pub struct DirectorySource {
    files: Vec<String>,
}

impl DirectorySource {
    /// Build from an explicit, non-empty list of fetcher-relative paths.
    pub fn from_files(mut files: Vec<String>) -> LuminaResult<Self> {
        if files.is_empty() {
            return Err(LuminaError::validation(
                "image directory source needs at least one file",
            ));
        }
        files.sort();
        Ok(Self { files })
    }

    /// List image files directly inside `dir`. Paths are stored relative to `dir`.
    pub fn scan(dir: &Path) -> LuminaResult<Self> {
        let rd = std::fs::read_dir(dir)
            .with_context(|| format!("read image directory '{}'", dir.display()))?;

        let mut files = Vec::new();
        for entry in rd.flatten() {
            let path = entry.path();
            if !path.is_file() || !has_image_extension(&path) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
                files.push(name.to_string());
            }
        }

        Self::from_files(files)
    }

    /// Candidate files in sorted order.
    pub fn files(&self) -> &[String] {
        &self.files
    }
}

impl ImageSource for DirectorySource {
    fn source_for_seed(&self, seed: &str) -> SourceRef {
        let mut h = Fnv1a64::new_default();
        h.write_bytes(seed.as_bytes());
        let idx = (h.finish() % self.files.len() as u64) as usize;
        SourceRef(self.files[idx].clone())
    }
}

fn has_image_extension(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
        return false;
    };
    matches!(
        ext.to_ascii_lowercase().as_str(),
        "png" | "jpg" | "jpeg" | "webp" | "bmp" | "gif" | "tif" | "tiff"
    )
}

/// Resolve a non-remote source against `root`.
pub(crate) fn local_path(root: &Path, source: &SourceRef) -> PathBuf {
    let s = source.as_str();
    let s = s.strip_prefix("file://").unwrap_or(s);
    let p = Path::new(s);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        root.join(p)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;

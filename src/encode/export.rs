//! Flattened raster export.

use std::path::{Path, PathBuf};

use anyhow::Context;
use image::ImageEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;

use crate::foundation::error::{LuminaError, LuminaResult};
use crate::render::backend::Composite;

/// Encoded file format for exports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ExportFormat {
    /// Lossless PNG.
    #[default]
    Png,
    /// JPEG at the given quality (1..=100).
    Jpeg {
        /// Encoder quality.
        quality: u8,
    },
}

impl ExportFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg { .. } => "jpg",
        }
    }
}

/// `lumina-art-<epoch-ms>.<ext>`.
pub fn export_file_name(epoch_ms: u64, format: ExportFormat) -> String {
    format!("lumina-art-{epoch_ms}.{}", format.extension())
}

/// Encode a composite into file bytes.
pub fn encode_composite(composite: &Composite, format: ExportFormat) -> LuminaResult<Vec<u8>> {
    let expected = (composite.width as usize) * (composite.height as usize) * 4;
    if composite.width == 0 || composite.height == 0 || composite.data.len() != expected {
        return Err(LuminaError::validation(format!(
            "composite buffer of {} bytes does not match {}x{}",
            composite.data.len(),
            composite.width,
            composite.height
        )));
    }

    let mut out = Vec::new();
    match format {
        ExportFormat::Png => PngEncoder::new(&mut out)
            .write_image(
                &composite.data,
                composite.width,
                composite.height,
                image::ExtendedColorType::Rgba8,
            )
            .context("encode png")?,
        ExportFormat::Jpeg { quality } => {
            let rgb: Vec<u8> = composite
                .data
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect();
            JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
                .write_image(
                    &rgb,
                    composite.width,
                    composite.height,
                    image::ExtendedColorType::Rgb8,
                )
                .context("encode jpeg")?
        }
    }
    Ok(out)
}

/// Encode and write a composite into `dir`, returning the artifact path.
///
/// Bytes are written to a `.partial` sibling and renamed into place.
#[tracing::instrument(
    level = "debug",
    skip(composite),
    fields(width = composite.width, height = composite.height)
)]
pub fn write_export(
    composite: &Composite,
    dir: &Path,
    epoch_ms: u64,
    format: ExportFormat,
) -> LuminaResult<PathBuf> {
    let bytes = encode_composite(composite, format)?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create export dir '{}'", dir.display()))?;

    let path = dir.join(export_file_name(epoch_ms, format));
    let tmp = path.with_extension("partial");
    std::fs::write(&tmp, &bytes).with_context(|| format!("write '{}'", tmp.display()))?;
    std::fs::rename(&tmp, &path).with_context(|| format!("rename into '{}'", path.display()))?;

    tracing::info!(path = %path.display(), bytes = bytes.len(), "exported composite");
    Ok(path)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/export.rs"]
mod tests;

use std::sync::Arc;

use image::imageops::FilterType;

use crate::assets::decode::PreparedImage;
use crate::foundation::core::Canvas;
use crate::foundation::error::{LuminaError, LuminaResult};

/// Interpolation used when stretching a source image to the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResampleFilter {
    /// Nearest neighbour.
    Nearest,
    /// Bilinear.
    #[default]
    Triangle,
    /// Bicubic Catmull-Rom.
    CatmullRom,
    /// Lanczos with window 3.
    Lanczos3,
}

impl ResampleFilter {
    fn filter_type(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Triangle => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Stretch `image` to fill `canvas` exactly, ignoring aspect ratio.
///
/// Images already at canvas size are shared, not copied.
pub fn stretch_to_canvas(
    image: &PreparedImage,
    canvas: Canvas,
    filter: ResampleFilter,
) -> LuminaResult<Arc<Vec<u8>>> {
    if image.width() == canvas.width && image.height() == canvas.height {
        return Ok(Arc::clone(image.rgba8()));
    }
    let view = image::ImageBuffer::<image::Rgba<u8>, &[u8]>::from_raw(
        image.width(),
        image.height(),
        image.rgba8().as_slice(),
    )
    .ok_or_else(|| LuminaError::composite("prepared image buffer does not match its size"))?;

    let out = image::imageops::resize(&view, canvas.width, canvas.height, filter.filter_type());
    Ok(Arc::new(out.into_raw()))
}

#[cfg(test)]
#[path = "../../tests/unit/render/resample.rs"]
mod tests;

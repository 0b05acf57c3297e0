use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{LuminaError, LuminaResult};

/// Decoded raster image in straight-alpha RGBA8 form.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedImage {
    width: u32,
    height: u32,
    rgba8: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Wrap raw RGBA8 bytes, checking the buffer length.
    pub fn from_rgba8(width: u32, height: u32, rgba8: Vec<u8>) -> LuminaResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| LuminaError::validation("image buffer size overflow"))?;
        if width == 0 || height == 0 || rgba8.len() != expected {
            return Err(LuminaError::validation(format!(
                "rgba8 buffer of {} bytes does not match {width}x{height}",
                rgba8.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8: Arc::new(rgba8),
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel bytes in row-major straight-alpha RGBA8. Always `width * height * 4` long.
    pub fn rgba8(&self) -> &Arc<Vec<u8>> {
        &self.rgba8
    }

    /// Uniformly coloured image, mostly useful for fixtures.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> LuminaResult<Self> {
        let len = (width as usize) * (height as usize);
        Self::from_rgba8(width, height, rgba.repeat(len))
    }
}

/// Decode encoded image bytes (PNG, JPEG, WebP, ...) into straight-alpha RGBA8.
pub fn decode_image(bytes: &[u8]) -> LuminaResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    PreparedImage::from_rgba8(width, height, rgba.into_raw())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;

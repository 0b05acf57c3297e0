use std::time::{SystemTime, UNIX_EPOCH};

use crate::foundation::error::{LuminaError, LuminaResult};

/// Straight-alpha RGBA8 pixel.
pub type Rgba8 = [u8; 4];

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Create a validated canvas with non-zero dimensions.
    pub fn new(width: u32, height: u32) -> LuminaResult<Self> {
        if width == 0 || height == 0 {
            return Err(LuminaError::validation(
                "canvas width and height must be > 0",
            ));
        }
        Ok(Self { width, height })
    }

    /// Number of pixels covered by the canvas.
    pub fn pixel_count(self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Length in bytes of a tightly packed RGBA8 buffer for this canvas.
    pub fn rgba_len(self) -> LuminaResult<usize> {
        self.pixel_count()
            .checked_mul(4)
            .ok_or_else(|| LuminaError::validation("canvas buffer size overflow"))
    }

    /// Scale down so the longer edge is at most `max_edge`, keeping the aspect ratio.
    ///
    /// Canvases that already fit are returned unchanged. Each edge stays at least one pixel.
    pub fn fit_within(self, max_edge: u32) -> Self {
        let longest = self.width.max(self.height);
        if max_edge == 0 || longest <= max_edge {
            return self;
        }
        let scale = f64::from(max_edge) / f64::from(longest);
        let w = (f64::from(self.width) * scale).round().max(1.0) as u32;
        let h = (f64::from(self.height) * scale).round().max(1.0) as u32;
        Self {
            width: w,
            height: h,
        }
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 1600,
        }
    }
}

/// Wall-clock milliseconds since the Unix epoch; `0` if the clock is before it.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;

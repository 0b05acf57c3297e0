use std::path::Path;

use anyhow::Context;

use crate::encode::export::ExportFormat;
use crate::foundation::core::Canvas;
use crate::foundation::error::{LuminaError, LuminaResult};
use crate::layers::preset::PRESETS_KEY;
use crate::render::resample::ResampleFilter;

/// Session configuration. Every field has a default, so partial JSON files are accepted.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StudioOpts {
    /// Export resolution.
    pub canvas: Canvas,
    /// Layers created by a fresh session.
    pub initial_layers: usize,
    /// Longest edge of preview composites.
    pub preview_max_edge: u32,
    /// Filter for stretching sources to the canvas.
    pub filter: ResampleFilter,
    /// Export file format.
    pub export_format: ExportFormat,
    /// Storage key of the preset library.
    pub presets_key: String,
    /// Fixed RNG seed; `None` seeds from the clock.
    pub seed: Option<u64>,
}

impl Default for StudioOpts {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            initial_layers: 4,
            preview_max_edge: 600,
            filter: ResampleFilter::default(),
            export_format: ExportFormat::default(),
            presets_key: PRESETS_KEY.to_string(),
            seed: None,
        }
    }
}

impl StudioOpts {
    /// Parse and validate options from JSON text.
    pub fn from_json_str(s: &str) -> LuminaResult<Self> {
        let opts: Self = serde_json::from_str(s)?;
        opts.validate()?;
        Ok(opts)
    }

    /// Read options from a JSON file.
    pub fn from_path(path: &Path) -> LuminaResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read options '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> LuminaResult<()> {
        Canvas::new(self.canvas.width, self.canvas.height)?;
        if self.preview_max_edge == 0 {
            return Err(LuminaError::validation("preview_max_edge must be > 0"));
        }
        if self.presets_key.trim().is_empty() {
            return Err(LuminaError::validation("presets_key must not be empty"));
        }
        if let ExportFormat::Jpeg { quality } = self.export_format
            && !(1..=100).contains(&quality)
        {
            return Err(LuminaError::validation("jpeg quality must be in 1..=100"));
        }
        Ok(())
    }

    /// Canvas used for interactive previews.
    pub fn preview_canvas(&self) -> Canvas {
        self.canvas.fit_within(self.preview_max_edge)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/opts.rs"]
mod tests;

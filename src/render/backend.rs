use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::cache::ImageCache;
use crate::foundation::core::Canvas;
use crate::foundation::error::{LuminaError, LuminaResult};
use crate::layers::model::{BlendMode, SourceRef, Stack};
use crate::render::composite::{fill, merge_in_place};
use crate::render::plan::{CompositePlan, CompositeWarning, WarningKind, compile_plan};
use crate::render::resample::{ResampleFilter, stretch_to_canvas};

const MAX_RESAMPLED: usize = 64;

/// Rendered RGBA8 output of one composite.
#[derive(Clone, Debug, PartialEq)]
pub struct Composite {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Opaque straight-alpha RGBA8 pixels, row-major.
    pub data: Vec<u8>,
    /// Layers that were skipped or degraded.
    pub warnings: Vec<CompositeWarning>,
}

/// Anything that can turn a stack into pixels.
///
/// Preview and export both go through [`CompositeBackend::composite`]; only the canvas differs.
pub trait CompositeBackend {
    /// Whether this backend can apply `mode` natively. Unsupported modes fall back to normal.
    fn supports(&self, _mode: BlendMode) -> bool {
        true
    }

    /// Execute a compiled plan.
    fn execute(&mut self, plan: &CompositePlan, images: &ImageCache) -> LuminaResult<Composite>;

    /// Compile and execute `stack` at `canvas` size.
    fn composite(
        &mut self,
        stack: &Stack,
        canvas: Canvas,
        images: &ImageCache,
    ) -> LuminaResult<Composite> {
        let plan = compile_plan(stack, canvas, images, |m| self.supports(m));
        for w in &plan.warnings {
            tracing::warn!(layer = %w.layer_id, kind = ?w.kind, "layer degraded during composite");
        }
        self.execute(&plan, images)
    }
}

/// Available compositing backends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackendKind {
    /// Multi-threaded CPU compositor.
    #[default]
    Cpu,
}

/// Backend configuration.
#[derive(Clone, Debug, Default)]
pub struct CompositeSettings {
    /// Filter used when stretching sources to the canvas.
    pub filter: ResampleFilter,
}

/// Construct a backend of the requested kind.
pub fn create_backend(
    kind: BackendKind,
    settings: &CompositeSettings,
) -> LuminaResult<Box<dyn CompositeBackend>> {
    match kind {
        BackendKind::Cpu => Ok(Box::new(CpuCompositor::new(settings.clone()))),
    }
}

/// CPU compositor. Keeps stretched copies of sources per canvas size.
pub struct CpuCompositor {
    settings: CompositeSettings,
    resampled: HashMap<(SourceRef, Canvas), Arc<Vec<u8>>>,
}

impl CpuCompositor {
    /// New compositor with an empty resample cache.
    pub fn new(settings: CompositeSettings) -> Self {
        Self {
            settings,
            resampled: HashMap::new(),
        }
    }

    /// Number of stretched buffers currently held.
    pub fn resampled_len(&self) -> usize {
        self.resampled.len()
    }

    fn stretched(
        &mut self,
        source: &SourceRef,
        canvas: Canvas,
        images: &ImageCache,
    ) -> LuminaResult<Arc<Vec<u8>>> {
        let key = (source.clone(), canvas);
        if let Some(buf) = self.resampled.get(&key) {
            return Ok(Arc::clone(buf));
        }
        let image = images
            .get(source)
            .ok_or_else(|| LuminaError::composite(format!("no decoded pixels for {source}")))?;
        let buf = stretch_to_canvas(image, canvas, self.settings.filter)?;
        if self.resampled.len() >= MAX_RESAMPLED {
            self.resampled.clear();
        }
        self.resampled.insert(key, Arc::clone(&buf));
        Ok(buf)
    }
}

impl std::fmt::Debug for CpuCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuCompositor")
            .field("settings", &self.settings)
            .field("resampled", &self.resampled.len())
            .finish()
    }
}

impl CompositeBackend for CpuCompositor {
    #[tracing::instrument(level = "debug", skip_all, fields(
        width = plan.canvas.width,
        height = plan.canvas.height,
        ops = plan.ops.len(),
    ))]
    fn execute(&mut self, plan: &CompositePlan, images: &ImageCache) -> LuminaResult<Composite> {
        let mut data = vec![0u8; plan.canvas.rgba_len()?];
        fill(&mut data, plan.background);
        let mut warnings = plan.warnings.clone();

        for op in &plan.ops {
            let src = match self.stretched(&op.source, plan.canvas, images) {
                Ok(src) => src,
                Err(err) => {
                    tracing::warn!(layer = %op.layer_id, error = %err, "skipping layer without usable pixels");
                    warnings.push(CompositeWarning {
                        layer_id: op.layer_id.clone(),
                        kind: WarningKind::MissingPixels,
                    });
                    continue;
                }
            };
            merge_in_place(&mut data, &src, op.mode, op.opacity)?;
        }

        Ok(Composite {
            width: plan.canvas.width,
            height: plan.canvas.height,
            data,
            warnings,
        })
    }
}

/// One-shot composite with a fresh CPU backend.
pub fn composite_stack(
    stack: &Stack,
    canvas: Canvas,
    images: &ImageCache,
) -> LuminaResult<Composite> {
    CpuCompositor::new(CompositeSettings::default()).composite(stack, canvas, images)
}

#[cfg(test)]
#[path = "../../tests/unit/render/backend.rs"]
mod tests;

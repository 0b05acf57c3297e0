//! Stack-to-plan compilation.
//!
//! A [`CompositePlan`] is the ordered list of blend operations a backend executes, plus the
//! warnings gathered while deciding which layers take part. Compilation never fails on layer
//! problems: a layer that cannot contribute is left out and reported.

use crate::assets::cache::ImageCache;
use crate::foundation::core::{Canvas, Rgba8};
use crate::layers::model::{BlendMode, LayerId, LoadState, SourceRef, Stack};

/// Opaque white, the starting accumulator.
pub const BACKGROUND: Rgba8 = [255, 255, 255, 255];

/// One layer's contribution, applied in stack order.
#[derive(Clone, Debug, PartialEq)]
pub struct BlendOp {
    /// Layer the op came from.
    pub layer_id: LayerId,
    /// Cached pixels to stretch over the canvas.
    pub source: SourceRef,
    /// Blend function actually applied.
    pub mode: BlendMode,
    /// Interpolation weight in `[0, 1]`.
    pub opacity: f32,
}

/// Why a layer was degraded or skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WarningKind {
    /// The layer's image failed to load; it contributes nothing.
    LoadFailed,
    /// The layer is marked ready but no decoded pixels are cached.
    MissingPixels,
    /// The backend cannot apply this mode; the layer was blended as normal.
    UnsupportedBlend(BlendMode),
}

/// Soft per-layer diagnostic. Warnings never abort a composite.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositeWarning {
    /// Affected layer.
    pub layer_id: LayerId,
    /// What went wrong.
    pub kind: WarningKind,
}

/// Everything a backend needs to produce one composite.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositePlan {
    /// Output size.
    pub canvas: Canvas,
    /// Initial accumulator colour.
    pub background: Rgba8,
    /// Blend operations, bottom layer first.
    pub ops: Vec<BlendOp>,
    /// Diagnostics collected during compilation.
    pub warnings: Vec<CompositeWarning>,
}

/// Compile `stack` into a plan for a backend that accepts modes where `supports` holds.
///
/// Hidden and pending layers are dropped silently. `Average` compiles to `Normal` at the
/// layer's stored opacity.
pub fn compile_plan(
    stack: &Stack,
    canvas: Canvas,
    images: &ImageCache,
    supports: impl Fn(BlendMode) -> bool,
) -> CompositePlan {
    let mut ops = Vec::with_capacity(stack.len());
    let mut warnings = Vec::new();

    for layer in stack {
        if !layer.is_visible {
            continue;
        }
        match layer.load_state {
            LoadState::Pending => continue,
            LoadState::Failed => {
                warnings.push(CompositeWarning {
                    layer_id: layer.id.clone(),
                    kind: WarningKind::LoadFailed,
                });
                continue;
            }
            LoadState::Ready => {}
        }
        if !images.contains(&layer.source) {
            warnings.push(CompositeWarning {
                layer_id: layer.id.clone(),
                kind: WarningKind::MissingPixels,
            });
            continue;
        }

        let mut mode = match layer.blend_mode {
            BlendMode::Average => BlendMode::Normal,
            other => other,
        };
        if !supports(mode) {
            warnings.push(CompositeWarning {
                layer_id: layer.id.clone(),
                kind: WarningKind::UnsupportedBlend(mode),
            });
            mode = BlendMode::Normal;
        }

        let opacity = if layer.opacity.is_finite() {
            layer.opacity.clamp(0.0, 1.0)
        } else {
            0.0
        };
        ops.push(BlendOp {
            layer_id: layer.id.clone(),
            source: layer.source.clone(),
            mode,
            opacity,
        });
    }

    CompositePlan {
        canvas,
        background: BACKGROUND,
        ops,
        warnings,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/plan.rs"]
mod tests;

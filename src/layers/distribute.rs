//! Default blend mode and opacity for new or re-rolled layers.
//!
//! The stack shares a fixed density budget: each layer's opacity targets
//! `DENSITY_BUDGET / total_layers`, so deep stacks stay translucent instead of piling up into an
//! opaque, crowded image.

use crate::foundation::math::Rng64;
use crate::layers::model::BlendMode;

/// Target sum of opacities across a stack.
pub const DENSITY_BUDGET: f64 = 2.5;
/// Lowest opacity the distribution ever returns.
pub const MIN_OPACITY: f32 = 0.05;
/// Highest opacity the distribution ever returns.
pub const MAX_OPACITY: f32 = 1.0;

const VARIATION_RATIO: f64 = 0.4;
const AGGRESSIVE_DAMPING: f64 = 0.8;
const AVERAGE_MAX_OPACITY: f64 = 0.5;

/// Draw a blend mode and opacity for the layer at `index` in a stack of `total_layers`.
///
/// The mode is uniform over [`BlendMode::ALL`] regardless of `index`. The result is always in
/// `[MIN_OPACITY, MAX_OPACITY]`, and at most `0.5` for [`BlendMode::Average`].
pub fn distribute(index: usize, total_layers: usize, rng: &mut Rng64) -> (BlendMode, f32) {
    let mode = BlendMode::ALL[rng.index(BlendMode::ALL.len())];

    let target = DENSITY_BUDGET / total_layers.max(1) as f64;
    let variation = target * VARIATION_RATIO;
    let shift = rng.range_f64(-variation / 2.0, variation / 2.0);
    let mut opacity = (target + shift).clamp(f64::from(MIN_OPACITY), f64::from(MAX_OPACITY));

    match mode {
        BlendMode::Difference | BlendMode::Exclusion => {
            opacity = (opacity * AGGRESSIVE_DAMPING).max(f64::from(MIN_OPACITY));
        }
        BlendMode::Average => opacity = opacity.min(AVERAGE_MAX_OPACITY),
        _ => {}
    }

    let opacity = (opacity as f32).clamp(MIN_OPACITY, MAX_OPACITY);
    tracing::trace!(index, total_layers, ?mode, opacity, "distributed layer params");
    (mode, opacity)
}

#[cfg(test)]
#[path = "../../tests/unit/layers/distribute.rs"]
mod tests;

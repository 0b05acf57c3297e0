use rayon::prelude::*;

use crate::foundation::core::Rgba8;
use crate::foundation::error::{LuminaError, LuminaResult};
use crate::layers::model::BlendMode;
use crate::render::blend::blend_rgb;

const PIXELS_PER_TASK: usize = 4096;

/// Merge one source pixel into an opaque accumulator pixel.
///
/// The effective weight is `opacity` scaled by the source alpha; the result is
/// `dst * (1 - w) + blend(dst, src) * w` per channel. The accumulator stays opaque.
pub fn merge_pixel(dst: Rgba8, src: Rgba8, mode: BlendMode, opacity: f32) -> Rgba8 {
    let weight = opacity.clamp(0.0, 1.0) * unit(src[3]);
    if weight <= 0.0 {
        return dst;
    }

    let b = [unit(dst[0]), unit(dst[1]), unit(dst[2])];
    let f = [unit(src[0]), unit(src[1]), unit(src[2])];
    let blended = blend_rgb(mode, b, f);

    let mix = |i: usize| to_u8(b[i] * (1.0 - weight) + blended[i] * weight);
    [mix(0), mix(1), mix(2), 255]
}

/// Merge a full source buffer into the accumulator, in parallel over pixel chunks.
pub fn merge_in_place(
    dst: &mut [u8],
    src: &[u8],
    mode: BlendMode,
    opacity: f32,
) -> LuminaResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(LuminaError::composite(
            "merge_in_place expects equal-length rgba8 buffers",
        ));
    }
    let chunk = PIXELS_PER_TASK * 4;
    dst.par_chunks_mut(chunk)
        .zip(src.par_chunks(chunk))
        .for_each(|(d, s)| {
            for (d, s) in d.chunks_exact_mut(4).zip(s.chunks_exact(4)) {
                let out = merge_pixel(
                    [d[0], d[1], d[2], d[3]],
                    [s[0], s[1], s[2], s[3]],
                    mode,
                    opacity,
                );
                d.copy_from_slice(&out);
            }
        });
    Ok(())
}

/// Fill `dst` with one colour.
pub fn fill(dst: &mut [u8], rgba: Rgba8) {
    for px in dst.chunks_exact_mut(4) {
        px.copy_from_slice(&rgba);
    }
}

fn unit(v: u8) -> f32 {
    f32::from(v) / 255.0
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;

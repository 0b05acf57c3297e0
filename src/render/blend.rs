//! Blend functions over normalized RGB.
//!
//! Separable modes follow the W3C Compositing and Blending Level 1 definitions channel by
//! channel; `Hue`, `Saturation`, `Color` and `Luminosity` use the non-separable HSL forms from
//! the same document. Inputs and outputs are in `[0, 1]`.

use crate::layers::model::BlendMode;

/// Normalized RGB triple.
pub type Rgb = [f32; 3];

/// Combine backdrop `b` and source `f` with `mode`, before opacity is applied.
///
/// [`BlendMode::Average`] is the normal blend; its averaging comes from the layer opacity.
pub fn blend_rgb(mode: BlendMode, b: Rgb, f: Rgb) -> Rgb {
    match mode {
        BlendMode::Normal | BlendMode::Average => f,
        BlendMode::Multiply => per_channel(b, f, |b, f| b * f),
        BlendMode::Screen => per_channel(b, f, screen),
        BlendMode::Overlay => per_channel(b, f, |b, f| hard_light(f, b)),
        BlendMode::Darken => per_channel(b, f, f32::min),
        BlendMode::Lighten => per_channel(b, f, f32::max),
        BlendMode::SoftLight => per_channel(b, f, soft_light),
        BlendMode::HardLight => per_channel(b, f, hard_light),
        BlendMode::Difference => per_channel(b, f, |b, f| (b - f).abs()),
        BlendMode::Exclusion => per_channel(b, f, |b, f| b + f - 2.0 * b * f),
        BlendMode::ColorDodge => per_channel(b, f, color_dodge),
        BlendMode::ColorBurn => per_channel(b, f, color_burn),
        BlendMode::Hue => set_lum(set_sat(f, sat(b)), lum(b)),
        BlendMode::Saturation => set_lum(set_sat(b, sat(f)), lum(b)),
        BlendMode::Color => set_lum(f, lum(b)),
        BlendMode::Luminosity => set_lum(b, lum(f)),
    }
}

fn per_channel(b: Rgb, f: Rgb, op: impl Fn(f32, f32) -> f32) -> Rgb {
    [op(b[0], f[0]), op(b[1], f[1]), op(b[2], f[2])]
}

fn screen(b: f32, f: f32) -> f32 {
    b + f - b * f
}

fn hard_light(b: f32, f: f32) -> f32 {
    if f <= 0.5 {
        b * 2.0 * f
    } else {
        screen(b, 2.0 * f - 1.0)
    }
}

fn soft_light(b: f32, f: f32) -> f32 {
    if f <= 0.5 {
        b - (1.0 - 2.0 * f) * b * (1.0 - b)
    } else {
        let d = if b <= 0.25 {
            ((16.0 * b - 12.0) * b + 4.0) * b
        } else {
            b.sqrt()
        };
        b + (2.0 * f - 1.0) * (d - b)
    }
}

fn color_dodge(b: f32, f: f32) -> f32 {
    if b <= 0.0 {
        0.0
    } else if f >= 1.0 {
        1.0
    } else {
        (b / (1.0 - f)).min(1.0)
    }
}

fn color_burn(b: f32, f: f32) -> f32 {
    if b >= 1.0 {
        1.0
    } else if f <= 0.0 {
        0.0
    } else {
        1.0 - ((1.0 - b) / f).min(1.0)
    }
}

fn lum(c: Rgb) -> f32 {
    0.3 * c[0] + 0.59 * c[1] + 0.11 * c[2]
}

fn clip_color(c: Rgb) -> Rgb {
    let l = lum(c);
    let n = c[0].min(c[1]).min(c[2]);
    let x = c[0].max(c[1]).max(c[2]);
    let mut out = c;
    if n < 0.0 && l - n > f32::EPSILON {
        out = out.map(|v| l + (v - l) * l / (l - n));
    }
    if x > 1.0 && x - l > f32::EPSILON {
        out = out.map(|v| l + (v - l) * (1.0 - l) / (x - l));
    }
    out
}

fn set_lum(c: Rgb, l: f32) -> Rgb {
    let d = l - lum(c);
    clip_color(c.map(|v| v + d))
}

fn sat(c: Rgb) -> f32 {
    c[0].max(c[1]).max(c[2]) - c[0].min(c[1]).min(c[2])
}

fn set_sat(c: Rgb, s: f32) -> Rgb {
    let mut idx = [0usize, 1, 2];
    idx.sort_by(|&a, &b| c[a].total_cmp(&c[b]));
    let [min_i, mid_i, max_i] = idx;

    let mut out = [0.0f32; 3];
    let range = c[max_i] - c[min_i];
    if range > 0.0 {
        out[mid_i] = (c[mid_i] - c[min_i]) * s / range;
        out[max_i] = s;
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/blend.rs"]
mod tests;

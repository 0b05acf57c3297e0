use super::*;

#[test]
fn zero_opacity_is_noop() {
    let dst = [10, 20, 30, 255];
    assert_eq!(merge_pixel(dst, [200, 0, 0, 255], BlendMode::Normal, 0.0), dst);
}

#[test]
fn transparent_source_is_noop() {
    let dst = [10, 20, 30, 255];
    assert_eq!(merge_pixel(dst, [200, 0, 0, 0], BlendMode::Multiply, 1.0), dst);
}

#[test]
fn opaque_normal_replaces_rgb() {
    let out = merge_pixel([255, 255, 255, 255], [12, 34, 56, 255], BlendMode::Normal, 1.0);
    assert_eq!(out, [12, 34, 56, 255]);
}

#[test]
fn half_opacity_normal_averages() {
    let out = merge_pixel([100, 0, 40, 255], [200, 100, 60, 255], BlendMode::Normal, 0.5);
    assert_eq!(out, [150, 50, 50, 255]);
}

#[test]
fn source_alpha_scales_the_weight() {
    let half = merge_pixel([0, 0, 0, 255], [200, 200, 200, 255], BlendMode::Normal, 0.5);
    assert_eq!(half, [100, 100, 100, 255]);

    let faded = merge_pixel([0, 0, 0, 255], [200, 200, 200, 51], BlendMode::Normal, 1.0);
    assert_eq!(faded, [40, 40, 40, 255]);
}

#[test]
fn out_of_range_opacity_is_clamped() {
    let dst = [10, 20, 30, 255];
    let src = [200, 100, 0, 255];
    assert_eq!(
        merge_pixel(dst, src, BlendMode::Normal, 3.0),
        merge_pixel(dst, src, BlendMode::Normal, 1.0)
    );
    assert_eq!(merge_pixel(dst, src, BlendMode::Normal, -1.0), dst);
}

#[test]
fn multiply_red_over_blue_is_black() {
    let out = merge_pixel([255, 0, 0, 255], [0, 0, 255, 255], BlendMode::Multiply, 1.0);
    assert_eq!(out, [0, 0, 0, 255]);
}

#[test]
fn merge_in_place_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    let err = merge_in_place(&mut dst, &[0u8; 4], BlendMode::Normal, 1.0).unwrap_err();
    assert!(err.to_string().contains("equal-length"));

    let mut odd = vec![0u8; 6];
    assert!(merge_in_place(&mut odd, &[0u8; 6], BlendMode::Normal, 1.0).is_err());
}

#[test]
fn merge_in_place_matches_per_pixel_across_chunks() {
    let pixels = PIXELS_PER_TASK * 2 + 17;
    let mut dst = Vec::with_capacity(pixels * 4);
    let mut src = Vec::with_capacity(pixels * 4);
    for i in 0..pixels {
        let v = (i % 251) as u8;
        dst.extend_from_slice(&[v, 255 - v, v / 2, 255]);
        src.extend_from_slice(&[255 - v, v, 128, (i % 256) as u8]);
    }

    let mut expected = dst.clone();
    for (d, s) in expected.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = merge_pixel(
            [d[0], d[1], d[2], d[3]],
            [s[0], s[1], s[2], s[3]],
            BlendMode::Overlay,
            0.7,
        );
        d.copy_from_slice(&out);
    }

    merge_in_place(&mut dst, &src, BlendMode::Overlay, 0.7).unwrap();
    assert_eq!(dst, expected);
}

#[test]
fn fill_writes_every_pixel() {
    let mut buf = vec![0u8; 12];
    fill(&mut buf, [1, 2, 3, 4]);
    assert_eq!(buf, vec![1, 2, 3, 4, 1, 2, 3, 4, 1, 2, 3, 4]);
}

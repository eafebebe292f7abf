use image::RgbaImage;

use crate::config::model::GlobalTransforms;

/// Contrast enhancement factor used by the global `boostContrast` flag.
pub const CONTRAST_BOOST: f32 = 1.5;

const BW_THRESHOLD: u8 = 128;

/// Apply `t` in the fixed pipeline order: invert, grayscale, contrast, black/white.
pub fn apply(img: &mut RgbaImage, t: GlobalTransforms) {
    if t.invert {
        invert(img);
    }
    apply_tonal(img, t);
}

/// The transforms that follow the overlay stamp: grayscale, contrast, black/white.
pub fn apply_tonal(img: &mut RgbaImage, t: GlobalTransforms) {
    if t.grayscale {
        to_grayscale(img);
    }
    if t.boost_contrast {
        boost_contrast(img, CONTRAST_BOOST);
    }
    if t.black_white {
        to_black_white(img);
    }
}

/// Invert color channels; alpha is kept.
pub fn invert(img: &mut RgbaImage) {
    for px in img.pixels_mut() {
        px[0] = 255 - px[0];
        px[1] = 255 - px[1];
        px[2] = 255 - px[2];
    }
}

/// Replace color channels with Rec.601 luma.
pub fn to_grayscale(img: &mut RgbaImage) {
    for px in img.pixels_mut() {
        let l = luma(px[0], px[1], px[2]);
        px[0] = l;
        px[1] = l;
        px[2] = l;
    }
}

/// Scale every channel away from the image's mean gray by `factor`.
///
/// `factor` 1.0 is the identity, 0.0 yields a flat mean-gray image.
pub fn boost_contrast(img: &mut RgbaImage, factor: f32) {
    let n = u64::from(img.width()) * u64::from(img.height());
    if n == 0 {
        return;
    }
    let sum: u64 = img
        .pixels()
        .map(|px| u64::from(luma(px[0], px[1], px[2])))
        .sum();
    let mean = ((sum as f64 / n as f64) + 0.5).floor() as f32;

    for px in img.pixels_mut() {
        for c in &mut px.0[..3] {
            let v = mean + factor * (f32::from(*c) - mean);
            *c = v.round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Threshold luma at mid-gray to pure black or white.
pub fn to_black_white(img: &mut RgbaImage) {
    for px in img.pixels_mut() {
        let v = if luma(px[0], px[1], px[2]) >= BW_THRESHOLD {
            255
        } else {
            0
        };
        px[0] = v;
        px[1] = v;
        px[2] = v;
    }
}

fn luma(r: u8, g: u8, b: u8) -> u8 {
    // 16.16 fixed-point Rec.601 weights.
    ((u32::from(r) * 19_595 + u32::from(g) * 38_470 + u32::from(b) * 7_471 + 0x8000) >> 16) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/draw/transform.rs"]
mod tests;

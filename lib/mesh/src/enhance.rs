//! Fixed colour enhancement applied before texturing
//!
//! Both steps blend the image against a "degenerate" version of itself:
//! `out = d + factor * (p - d)`, clamped to `[0, 255]` and truncated.
//! Contrast blends against a flat grey at the mean luma, saturation against
//! the per-pixel luma.

use image::{Rgb, RgbImage};

/// Contrast boost applied to every texture
pub const CONTRAST_FACTOR: f32 = 1.2;

/// Saturation boost applied after the contrast step
pub const SATURATION_FACTOR: f32 = 1.1;

/// Apply the contrast boost, then the saturation boost
pub fn enhance(image: RgbImage) -> RgbImage {
    saturate(contrast(image, CONTRAST_FACTOR), SATURATION_FACTOR)
}

/// ITU-R 601-2 luma in 16.16 fixed point, rounded
#[inline]
pub fn luma(pixel: &Rgb<u8>) -> u8 {
    let [r, g, b] = pixel.0;
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

/// Rounded mean luma of the whole image
pub fn mean_luma(image: &RgbImage) -> u8 {
    let count = image.width() as u64 * image.height() as u64;
    if count == 0 {
        return 0;
    }
    let total: u64 = image.pixels().map(|p| luma(p) as u64).sum();
    (total as f64 / count as f64 + 0.5) as u8
}

/// Scale the distance of every channel from the mean grey by `factor`
pub fn contrast(mut image: RgbImage, factor: f32) -> RgbImage {
    let mean = mean_luma(&image);
    for pixel in image.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = blend(mean, *channel, factor);
        }
    }
    image
}

/// Scale the distance of every channel from the pixel's own luma by `factor`
pub fn saturate(mut image: RgbImage, factor: f32) -> RgbImage {
    for pixel in image.pixels_mut() {
        let grey = luma(pixel);
        for channel in pixel.0.iter_mut() {
            *channel = blend(grey, *channel, factor);
        }
    }
    image
}

#[inline]
fn blend(degenerate: u8, value: u8, factor: f32) -> u8 {
    let d = degenerate as f32;
    let out = d + factor * (value as f32 - d);
    if out <= 0.0 {
        0
    } else if out >= 255.0 {
        255
    } else {
        out as u8
    }
}

//! 8-bit color conversions used to separate the composite background.
//!
//! Hue follows the common 8-bit convention of half-degrees (`0..180`), so that
//! pure green sits at 60. Saturation and value span `0..=255`.

use image::{GrayImage, Luma, Rgb, RgbImage};

use crate::config::BackgroundConfig;

/// Convert one RGB pixel to `[h, s, v]` with `h` in `0..180`.
pub fn rgb_to_hsv(pixel: Rgb<u8>) -> [u8; 3] {
    let [r, g, b] = pixel.0.map(f32::from);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let chroma = max - min;

    let s = if max == 0.0 { 0.0 } else { 255.0 * chroma / max };

    let mut h = if chroma == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / chroma
    } else if max == g {
        120.0 + 60.0 * (b - r) / chroma
    } else {
        240.0 + 60.0 * (r - g) / chroma
    };
    if h < 0.0 {
        h += 360.0;
    }

    let h = ((h / 2.0).round() as u16 % 180) as u8;
    [h, s.round() as u8, max as u8]
}

/// Rec. 601 luma with integer rounding.
pub fn luma(pixel: Rgb<u8>) -> u8 {
    let [r, g, b] = pixel.0.map(u32::from);
    ((299 * r + 587 * g + 114 * b + 500) / 1000) as u8
}

pub fn to_gray(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([luma(*image.get_pixel(x, y))])
    })
}

impl BackgroundConfig {
    /// Whether an HSV triple falls inside the closed background range.
    pub fn contains_hsv(&self, [h, s, v]: [u8; 3]) -> bool {
        (self.hue_low..=self.hue_high).contains(&h)
            && (self.saturation_low..=self.saturation_high).contains(&s)
            && (self.value_low..=self.value_high).contains(&v)
    }
}

/// 255 where the pixel lies in the background range, 0 elsewhere.
pub fn background_mask(image: &RgbImage, background: &BackgroundConfig) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let hsv = rgb_to_hsv(*image.get_pixel(x, y));
        Luma([if background.contains_hsv(hsv) { 255 } else { 0 }])
    })
}

pub fn invert_mask(mask: &GrayImage) -> GrayImage {
    let mut inverted = mask.clone();
    image::imageops::invert(&mut inverted);
    inverted
}

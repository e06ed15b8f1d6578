//! High-bit-depth acquisition frames to 8-bit RGB.

use std::path::Path;

use image::{ColorType, DynamicImage, GrayImage, Luma, RgbImage};
use serde::Serialize;

use crate::error::Result;

/// Reduce a frame to 8-bit grayscale.
///
/// Samples deeper than 8 bits are divided by 256 (truncating); 8-bit and
/// palette-expanded inputs are converted directly.
pub fn to_gray8(frame: &DynamicImage) -> GrayImage {
    if frame.color().bits_per_pixel() / u16::from(frame.color().channel_count()) > 8 {
        let wide = frame.to_luma16();
        GrayImage::from_fn(wide.width(), wide.height(), |x, y| {
            Luma([(wide.get_pixel(x, y)[0] / 256) as u8])
        })
    } else {
        frame.to_luma8()
    }
}

/// Normalize a frame to 8-bit gray, then duplicate it into three channels.
pub fn normalize_frame(frame: &DynamicImage) -> RgbImage {
    DynamicImage::ImageLuma8(to_gray8(frame)).to_rgb8()
}

/// What the acquisition file looks like before export
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FrameInfo {
    pub format: Option<String>,
    pub color: String,
    pub width: u32,
    pub height: u32,
    pub min: u32,
    pub max: u32,
}

/// Report format, color type, size and sample range of the first frame.
pub fn inspect(path: &Path) -> Result<FrameInfo> {
    let format = image::ImageFormat::from_path(path).ok().map(|f| format!("{f:?}"));
    let frame = image::open(path)?;
    Ok(describe(&frame, format))
}

fn describe(frame: &DynamicImage, format: Option<String>) -> FrameInfo {
    let color: ColorType = frame.color();
    let wide = frame.to_luma16();
    let (min, max) = wide
        .pixels()
        .fold((u16::MAX, u16::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
    let (min, max) = if wide.is_empty() { (0, 0) } else { (min, max) };

    // Report in the frame's native depth
    let scale = if color.bits_per_pixel() / u16::from(color.channel_count()) > 8 { 1 } else { 257 };

    FrameInfo {
        format,
        color: format!("{color:?}"),
        width: frame.width(),
        height: frame.height(),
        min: u32::from(min) / scale,
        max: u32::from(max) / scale,
    }
}

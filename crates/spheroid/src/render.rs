//! Full-resolution binary masks.

use std::path::{Path, PathBuf};

use image::{imageops::FilterType, GrayImage};

use crate::error::Result;

/// Nearest-neighbour resample of a binary mask to the original image size.
///
/// No interpolation, so a `{0, 255}` input stays `{0, 255}` at any scale.
pub fn upscale_mask(binary: &GrayImage, width: u32, height: u32) -> GrayImage {
    if binary.dimensions() == (width, height) {
        return binary.clone();
    }
    image::imageops::resize(binary, width, height, FilterType::Nearest)
}

/// `<stem>_mask<index>_class<class_id>_binary.png`
pub fn mask_file_name(stem: &str, index: usize, class_id: u32) -> String {
    format!("{stem}_mask{index}_class{class_id}_binary.png")
}

/// Resample and persist one instance mask, returning the written path.
pub fn render_mask(
    binary: &GrayImage,
    width: u32,
    height: u32,
    out_dir: &Path,
    file_name: &str,
) -> Result<PathBuf> {
    let full = upscale_mask(binary, width, height);
    let path = out_dir.join(file_name);
    full.save(&path)?;
    Ok(path)
}

//! Object-on-background composites.

use std::{collections::BTreeMap, path::{Path, PathBuf}};

use image::{DynamicImage, GrayImage, Rgb, RgbImage};

use crate::{
    algorithms::threshold_mask,
    config::BackgroundConfig,
    error::{Result, SpheroidError},
    io::name_key,
};

/// Min-max stretch of a raw image into the full 8-bit range, as RGB.
///
/// The shift to zero always happens; division by the maximum is skipped when
/// it is zero. Results are truncated.
pub fn normalize_raw(image: &DynamicImage) -> RgbImage {
    let (width, height) = (image.width(), image.height());
    let mut samples: Vec<f32> = match image {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageRgba8(_) => image.to_rgb8().into_raw().into_iter().map(f32::from).collect(),
        DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_)
        | DynamicImage::ImageRgb16(_)
        | DynamicImage::ImageRgba16(_) => image.to_rgb16().into_raw().into_iter().map(f32::from).collect(),
        _ => image.to_rgb32f().into_raw(),
    };

    let min = samples.iter().copied().fold(f32::INFINITY, f32::min);
    if min.is_finite() {
        samples.iter_mut().for_each(|v| *v -= min);
    }
    let max = samples.iter().copied().fold(0.0, f32::max);
    if max != 0.0 {
        samples.iter_mut().for_each(|v| *v /= max);
    }

    RgbImage::from_fn(width, height, |x, y| {
        let offset = 3 * (y as usize * width as usize + x as usize);
        Rgb([0, 1, 2].map(|channel| (samples[offset + channel] * 255.0) as u8))
    })
}

/// Keep raw pixels where the mask is foreground, paint the background color elsewhere.
///
/// Mask samples strictly above `binarize_threshold` are foreground. Sizes must
/// match; `mask_name` and `image_name` label the error when they do not.
pub fn composite(
    mask: &GrayImage,
    raw: &RgbImage,
    background: &BackgroundConfig,
    mask_name: &str,
    image_name: &str,
) -> Result<RgbImage> {
    if mask.dimensions() != raw.dimensions() {
        return Err(SpheroidError::DimensionMismatch {
            mask: mask_name.to_string(),
            image: image_name.to_string(),
            mask_size: mask.dimensions(),
            image_size: raw.dimensions(),
        });
    }

    let binary = threshold_mask(mask, background.binarize_threshold);
    let fill = Rgb(background.background_rgb);

    Ok(RgbImage::from_fn(raw.width(), raw.height(), |x, y| {
        if binary.get_pixel(x, y)[0] == 255 {
            *raw.get_pixel(x, y)
        } else {
            fill
        }
    }))
}

/// Load, normalize and composite one mask/image pair.
pub fn composite_files(mask_path: &Path, raw_path: &Path, background: &BackgroundConfig) -> Result<RgbImage> {
    let mask = image::open(mask_path)?.to_luma8();
    let raw = normalize_raw(&image::open(raw_path)?);

    composite(&mask, &raw, background, &display_name(mask_path), &display_name(raw_path))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// A raw image and its mask sharing a pair key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedPair {
    pub key: String,
    pub image: PathBuf,
    pub mask: PathBuf,
}

/// Outcome of joining images and masks by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub matched: Vec<MatchedPair>,
    pub image_only: Vec<String>,
    pub mask_only: Vec<String>,
}

impl Reconciliation {
    pub fn is_complete(&self) -> bool {
        self.image_only.is_empty() && self.mask_only.is_empty()
    }
}

/// Key files by their first `key_len` characters. Later files (by sorted path) win a shared key.
pub fn key_files(files: &[PathBuf], key_len: usize) -> BTreeMap<String, PathBuf> {
    files
        .iter()
        .map(|path| (name_key(path, key_len), path.clone()))
        .collect()
}

/// Split keys into matched, image-only and mask-only sets, each sorted by key.
pub fn reconcile(images: &BTreeMap<String, PathBuf>, masks: &BTreeMap<String, PathBuf>) -> Reconciliation {
    let mut reconciliation = Reconciliation::default();

    for (key, image) in images {
        match masks.get(key) {
            Some(mask) => reconciliation.matched.push(MatchedPair {
                key: key.clone(),
                image: image.clone(),
                mask: mask.clone(),
            }),
            None => reconciliation.image_only.push(key.clone()),
        }
    }
    reconciliation.mask_only = masks
        .keys()
        .filter(|key| !images.contains_key(*key))
        .cloned()
        .collect();

    reconciliation
}

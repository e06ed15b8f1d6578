//! Darkness scoring of composites by HSV background removal.

use image::{GrayImage, Luma, RgbImage};
use serde::{Deserialize, Serialize};

use crate::{
    algorithms::{background_mask, invert_mask, to_gray},
    config::BackgroundConfig,
    error::{Result, SpheroidError},
    histogram::IntensityHistogram,
};

/// Intermediate rasters and the score for one composite.
#[derive(Debug, Clone)]
pub struct DarknessAnalysis {
    /// 255 where the background color was detected
    pub background_mask: GrayImage,
    /// 255 on the object region
    pub object_mask: GrayImage,
    /// Grayscale composite with everything outside the object zeroed
    pub gray_object: GrayImage,
    pub record: DarknessRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DarknessRecord {
    pub mean_intensity: f64,
    pub pixel_count: u64,
    pub histogram: IntensityHistogram,
}

impl DarknessRecord {
    /// Mean rounded half-to-even for reporting.
    pub fn rounded_mean(&self) -> i64 {
        self.mean_intensity.round_ties_even() as i64
    }
}

/// One line of `average_intensities.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DarknessRow {
    #[serde(rename = "Image")]
    pub image: String,
    #[serde(rename = "Average Intensity")]
    pub average_intensity: i64,
}

/// Remove the background color and score the remaining object pixels.
///
/// `name` only labels the error when no object pixels remain.
pub fn analyze(composite: &RgbImage, background: &BackgroundConfig, name: &str) -> Result<DarknessAnalysis> {
    let background_mask = background_mask(composite, background);
    let object_mask = invert_mask(&background_mask);
    let gray = to_gray(composite);

    let samples: Vec<u8> = gray
        .pixels()
        .zip(object_mask.pixels())
        .filter(|(_, m)| m[0] > 0)
        .map(|(g, _)| g[0])
        .collect();

    if samples.is_empty() {
        return Err(SpheroidError::EmptyObjectRegion(name.to_string()));
    }

    let sum: u64 = samples.iter().map(|&v| u64::from(v)).sum();
    let mean_intensity = sum as f64 / samples.len() as f64;

    let gray_object = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if object_mask.get_pixel(x, y)[0] > 0 {
            *gray.get_pixel(x, y)
        } else {
            Luma([0])
        }
    });

    Ok(DarknessAnalysis {
        background_mask,
        object_mask,
        gray_object,
        record: DarknessRecord {
            mean_intensity,
            pixel_count: samples.len() as u64,
            histogram: IntensityHistogram::from_samples(&samples),
        },
    })
}

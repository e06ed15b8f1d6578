use std::path::Path;

use image::GrayImage;
use crate::{
    error::Result,
    histogram::IntensityHistogram,
    types::{ConfidenceMask, Contour, InferenceResult},
};

/// Trait for turning a model confidence mask into a strict binary raster
pub trait MaskPreprocessor: Send + Sync {
    /// Produce a mask whose samples are exactly 0 or 255
    fn binarize(&self, mask: &ConfidenceMask) -> Result<GrayImage>;
}

/// Trait for contour extraction algorithms
pub trait ContourExtractor: Send + Sync {
    /// Extract contours from a binary image
    fn extract_contours(&self, image: &GrayImage) -> Result<Vec<Contour>>;
}

/// Detection thresholds handed to the segmentation model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionThresholds {
    pub confidence: f32,
    pub iou: f32,
}

/// The external instance-segmentation model.
///
/// Blocking: every per-image result is returned before any downstream stage runs.
pub trait InstanceSegmenter {
    fn segment(&self, images_dir: &Path, thresholds: DetectionThresholds) -> Result<Vec<InferenceResult>>;
}

/// Side-effecting histogram plot
pub trait HistogramRenderer {
    fn render(&self, histogram: &IntensityHistogram, title: &str, path: &Path) -> Result<()>;
}

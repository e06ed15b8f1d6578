pub mod builder;

use image::GrayImage;
use crate::{
    error::Result,
    types::{ConfidenceMask, InstanceMetrics, ObjectInstance, ShapeMetrics},
    traits::{MaskPreprocessor, ContourExtractor},
};

/// Mask-to-metrics pipeline: binarize, trace external contours, measure.
pub struct GeometryPipeline {
    preprocessor: Box<dyn MaskPreprocessor>,
    contour_extractor: Box<dyn ContourExtractor>,
}

impl GeometryPipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    pub fn new(
        preprocessor: Box<dyn MaskPreprocessor>,
        contour_extractor: Box<dyn ContourExtractor>,
    ) -> Self {
        Self {
            preprocessor,
            contour_extractor,
        }
    }

    /// Binarize a confidence mask with the configured preprocessor
    pub fn binarize(&self, mask: &ConfidenceMask) -> Result<GrayImage> {
        self.preprocessor.binarize(mask)
    }

    /// Measure an already binarized mask
    pub fn measure_binary(&self, binary: &GrayImage) -> Result<ShapeMetrics> {
        let contours = self.contour_extractor.extract_contours(binary)?;
        Ok(ShapeMetrics::from_contours(&contours))
    }

    /// Measure one object instance, returning its binary mask alongside the metrics
    pub fn process(&self, instance: &ObjectInstance) -> Result<(GrayImage, InstanceMetrics)> {
        let binary = self.binarize(&instance.mask)?;
        let shape = self.measure_binary(&binary)?;

        Ok((
            binary,
            InstanceMetrics {
                class_id: instance.class_id,
                shape,
            },
        ))
    }
}

impl Default for GeometryPipeline {
    fn default() -> Self {
        builder::PipelineBuilder::new().build()
    }
}

use crate::{
    pipeline::GeometryPipeline,
    traits::{MaskPreprocessor, ContourExtractor},
    algorithms::{ConfidenceBinarizer, ExternalContourExtractor},
};

/// Builder for geometry pipelines with a fluent API
pub struct PipelineBuilder {
    preprocessor: Option<Box<dyn MaskPreprocessor>>,
    contour_extractor: Option<Box<dyn ContourExtractor>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            preprocessor: None,
            contour_extractor: None,
        }
    }

    /// Set the mask binarizer (replaces any existing one)
    pub fn set_preprocessor<P>(mut self, preprocessor: P) -> Self
    where
        P: MaskPreprocessor + 'static,
    {
        self.preprocessor = Some(Box::new(preprocessor));
        self
    }

    /// Set the contour extractor (replaces any existing one)
    pub fn set_contour_extractor<E>(mut self, extractor: E) -> Self
    where
        E: ContourExtractor + 'static,
    {
        self.contour_extractor = Some(Box::new(extractor));
        self
    }

    /// Build the pipeline with default components if not specified
    pub fn build(self) -> GeometryPipeline {
        let preprocessor = self.preprocessor
            .unwrap_or_else(|| Box::new(ConfidenceBinarizer));

        let contour_extractor = self.contour_extractor
            .unwrap_or_else(|| Box::new(ExternalContourExtractor));

        GeometryPipeline::new(preprocessor, contour_extractor)
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

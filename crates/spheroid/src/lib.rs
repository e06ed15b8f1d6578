//! # Spheroid Morphometry Library
//!
//! Turns microscopy images of spheroids into shape and intensity measurements.
//!
//! ## Stages
//!
//! - **Export**: 16-bit TIFF acquisitions to 8-bit RGB PNG
//! - **Measure**: instance masks from an external segmentation model to
//!   area, perimeter and circularity per image, plus full-resolution binary masks
//! - **Composite**: each object pasted onto a uniform background color
//! - **Score**: background removed in HSV space, mean grayscale "darkness"
//!   of the object region with a 256-bin histogram
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spheroid::{GeometryPipeline, PipelineConfig, segmenter::ManifestSegmenter, stages};
//! use std::path::Path;
//!
//! let config = PipelineConfig::default();
//! let segmenter = ManifestSegmenter::new("seg_output/manifest.json");
//! let output = stages::run_segmentation(
//!     &segmenter,
//!     Path::new("output"),
//!     Path::new("output"),
//!     Path::new("seg_output"),
//!     &config.segmentation,
//!     &GeometryPipeline::default(),
//! )?;
//! println!("{} images measured", output.table.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod traits;
pub mod algorithms;
pub mod pipeline;
pub mod config;
pub mod io;
pub mod histogram;
pub mod metrics;
pub mod normalize;
pub mod resolver;
pub mod render;
pub mod composite;
pub mod darkness;
pub mod segmenter;
pub mod stages;

// Re-exports for convenience
pub use error::{SpheroidError, Result};
pub use types::{ConfidenceMask, Contour, InferenceResult, InstanceMetrics, ObjectInstance, ShapeMetrics};
pub use traits::*;
pub use pipeline::{GeometryPipeline, builder::PipelineBuilder};
pub use config::{BackgroundConfig, PipelineConfig, UnmatchedPolicy};
pub use metrics::{ImageMetrics, ImageMetricsRow, MetricsTable};
pub use histogram::IntensityHistogram;
pub use darkness::{DarknessRecord, DarknessRow};
pub use stages::{Stage, StageReport};

//! Directory-level batch stages.
//!
//! Each stage processes its images one at a time. A failure on one image is
//! logged and recorded in the [`StageReport`]; it never aborts the batch or
//! leaks into other images' rows. Only stage-level problems (unreadable
//! directories, CSV write failures, a `fail` unmatched policy) return `Err`.

pub mod export;
pub mod measure;
pub mod composite;
pub mod score;

pub use export::{export_directory, inspect_directory};
pub use measure::{measure, run_segmentation, MeasureOutput};
pub use composite::composite_directory;
pub use score::{score_directory, ScoreOutput};

use serde::Serialize;
use strum::Display;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Export,
    Measure,
    Composite,
    Score,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageFailure {
    pub image: String,
    pub error: String,
}

/// What a stage did, image by image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub processed: Vec<String>,
    pub failures: Vec<ImageFailure>,
    /// Inputs left out on purpose, e.g. unmatched pair keys
    pub skipped: Vec<String>,
    /// Processed, but with reduced fidelity, e.g. measured at model resolution
    pub degraded: Vec<String>,
}

impl StageReport {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            processed: Vec::new(),
            failures: Vec::new(),
            skipped: Vec::new(),
            degraded: Vec::new(),
        }
    }

    pub(crate) fn record<T>(&mut self, image: &str, outcome: crate::Result<T>) -> Option<T> {
        match outcome {
            Ok(value) => {
                self.processed.push(image.to_string());
                Some(value)
            }
            Err(err) => {
                error!("[{}] {}: {}", self.stage, image, err);
                self.failures.push(ImageFailure {
                    image: image.to_string(),
                    error: err.to_string(),
                });
                None
            }
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn log_summary(&self) {
        info!(
            "[{}] {} processed, {} failed, {} skipped, {} degraded",
            self.stage,
            self.processed.len(),
            self.failures.len(),
            self.skipped.len(),
            self.degraded.len()
        );
    }
}

//! Adapters for the external instance-segmentation model.
//!
//! The model reports its detections through a JSON manifest:
//!
//! ```json
//! {"images": [{"path": "A01.png", "instances": [{"class_id": 0, "mask": "masks/A01_0.png"}]}]}
//! ```
//!
//! Relative paths are resolved against the manifest's directory. Mask rasters
//! are read as grayscale and scaled to `[0, 1]` confidences.

use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    error::{Result, SpheroidError},
    traits::{DetectionThresholds, InstanceSegmenter},
    types::{InferenceResult, ObjectInstance},
};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    pub images: Vec<ManifestImage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManifestImage {
    /// File the model processed
    pub path: PathBuf,
    #[serde(default)]
    pub instances: Vec<ManifestInstance>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManifestInstance {
    pub class_id: u32,
    /// Model-resolution mask raster
    pub mask: PathBuf,
}

/// Reads detections from a manifest the model already wrote.
#[derive(Debug, Clone)]
pub struct ManifestSegmenter {
    manifest: PathBuf,
}

impl ManifestSegmenter {
    pub fn new(manifest: impl Into<PathBuf>) -> Self {
        Self {
            manifest: manifest.into(),
        }
    }

    pub fn load(&self) -> Result<Vec<InferenceResult>> {
        let content = fs::read_to_string(&self.manifest)?;
        let manifest: Manifest = serde_json::from_str(&content)?;
        let base = self.manifest.parent().unwrap_or_else(|| Path::new("."));

        manifest
            .images
            .into_iter()
            .map(|entry| {
                let instances = entry
                    .instances
                    .iter()
                    .map(|instance| {
                        let mask = image::open(base.join(&instance.mask))?.to_luma32f();
                        Ok(ObjectInstance {
                            class_id: instance.class_id,
                            mask,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;

                Ok(InferenceResult::new(base.join(&entry.path), instances))
            })
            .collect()
    }
}

impl InstanceSegmenter for ManifestSegmenter {
    fn segment(&self, images_dir: &Path, thresholds: DetectionThresholds) -> Result<Vec<InferenceResult>> {
        debug!(
            "Reading precomputed detections for {:?} from {:?} (thresholds {:?} already applied)",
            images_dir, self.manifest, thresholds
        );
        self.load()
    }
}

/// Runs the model as an external program that writes a manifest.
///
/// Invoked as `<program> [args..] --source <dir> --conf <c> --iou <i> --manifest <file>`.
#[derive(Debug, Clone)]
pub struct CommandSegmenter {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl CommandSegmenter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl InstanceSegmenter for CommandSegmenter {
    fn segment(&self, images_dir: &Path, thresholds: DetectionThresholds) -> Result<Vec<InferenceResult>> {
        let scratch = tempfile::tempdir()?;
        let manifest = scratch.path().join("manifest.json");

        info!("Running segmentation model {:?} on {:?}", self.program, images_dir);
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg("--source")
            .arg(images_dir)
            .arg("--conf")
            .arg(thresholds.confidence.to_string())
            .arg("--iou")
            .arg(thresholds.iou.to_string())
            .arg("--manifest")
            .arg(&manifest)
            .output()?;

        if !output.status.success() {
            return Err(SpheroidError::SegmenterFailed(format!(
                "{} ({})",
                String::from_utf8_lossy(&output.stderr).trim(),
                output.status
            )));
        }

        ManifestSegmenter::new(manifest).load()
    }
}

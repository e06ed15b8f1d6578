//! Pair inference-time files with the original full-resolution images.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{Result, SpheroidError};

/// Extension priority list; the first existing candidate wins.
pub const CANDIDATE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

/// How the original image was located
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Found under the originals directory
    Matched,
    /// Nothing matched; the inference-time file stands in, at model resolution
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub path: PathBuf,
    /// Original file name, the per-image key in the metrics table
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub resolution: Resolution,
}

/// Look for `<stem>.<ext>` in `originals_dir` in priority order.
pub fn find_original(stem: &str, originals_dir: &Path) -> Option<PathBuf> {
    CANDIDATE_EXTENSIONS
        .iter()
        .map(|ext| originals_dir.join(format!("{stem}.{ext}")))
        .find(|candidate| candidate.is_file())
}

/// Recover the original image for an inference-time path.
///
/// A missing original is not fatal: the inference path itself is used and the
/// returned dimensions are those of the model's working image.
pub fn resolve(inference_path: &Path, originals_dir: &Path) -> Result<ResolvedImage> {
    let stem = inference_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let (path, resolution) = match find_original(&stem, originals_dir) {
        Some(path) => (path, Resolution::Matched),
        None => {
            let missing = SpheroidError::MissingOriginalImage {
                stem,
                dir: originals_dir.to_path_buf(),
            };
            warn!("{missing}; falling back to {:?}", inference_path);
            (inference_path.to_path_buf(), Resolution::Fallback)
        }
    };

    let (width, height) = image::image_dimensions(&path)?;
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(ResolvedImage {
        path,
        name,
        width,
        height,
        resolution,
    })
}

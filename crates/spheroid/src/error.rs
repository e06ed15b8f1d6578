use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpheroidError {
    #[error("Failed to load image: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported config format: {0:?} (use .toml or .json)")]
    UnsupportedConfigFormat(PathBuf),

    #[error("No original image found for stem '{stem}' in {dir:?}")]
    MissingOriginalImage { stem: String, dir: PathBuf },

    #[error("Size mismatch: mask {mask} is {mask_size:?}, image {image} is {image_size:?}")]
    DimensionMismatch {
        mask: String,
        image: String,
        mask_size: (u32, u32),
        image_size: (u32, u32),
    },

    #[error("No object pixels left after removing the background in '{0}'")]
    EmptyObjectRegion(String),

    #[error("Unmatched pairs: {image_only} image(s) without mask, {mask_only} mask(s) without image")]
    UnmatchedPairs { image_only: usize, mask_only: usize },

    #[error("Image '{name}' already measured; {path:?} resolves to the same original")]
    DuplicateImage { name: String, path: PathBuf },

    #[error("Image '{0}' was not registered before aggregation")]
    UnknownImage(String),

    #[error("Failed to load font: {0}")]
    Font(#[from] ab_glyph::InvalidFont),

    #[error("Segmentation command failed: {0}")]
    SegmenterFailed(String),
}

pub type Result<T> = std::result::Result<T, SpheroidError>;

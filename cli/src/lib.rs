use spheroid::{
    segmenter::{CommandSegmenter, ManifestSegmenter},
    InstanceSegmenter, PipelineConfig, SpheroidError,
};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Spheroid(#[from] SpheroidError),
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// Load the pipeline configuration, falling back to defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    PipelineConfig::from_file(path).map_err(|err| match err {
        SpheroidError::UnsupportedConfigFormat(_) => ConfigError::UnsupportedFileFormat,
        other => other.into(),
    })
}

/// Save a configuration, picking TOML or JSON from the extension
pub fn write_config(config: &PipelineConfig, path: &Path) -> Result<(), ConfigError> {
    let content = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => config.to_toml()?,
        Some("json") => config.to_json()?,
        _ => return Err(ConfigError::UnsupportedFileFormat),
    };
    fs::write(path, content)?;
    Ok(())
}

/// Pretty JSON schema of the configuration file
pub fn schema_json() -> Result<String, ConfigError> {
    Ok(serde_json::to_string_pretty(&PipelineConfig::schema())?)
}

/// Where instance masks come from.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmenterSource {
    /// A manifest already written by the model
    Manifest(PathBuf),
    /// A program run per batch that writes the manifest
    Command { program: PathBuf, args: Vec<String> },
}

impl SegmenterSource {
    pub fn from_args(
        manifest: Option<PathBuf>,
        command: Option<PathBuf>,
        args: Vec<String>,
    ) -> Option<Self> {
        match (manifest, command) {
            (Some(manifest), _) => Some(Self::Manifest(manifest)),
            (None, Some(program)) => Some(Self::Command { program, args }),
            (None, None) => None,
        }
    }

    pub fn build(&self) -> Box<dyn InstanceSegmenter> {
        match self {
            Self::Manifest(path) => Box::new(ManifestSegmenter::new(path.clone())),
            Self::Command { program, args } => {
                Box::new(CommandSegmenter::new(program.clone()).with_args(args.iter().cloned()))
            }
        }
    }
}

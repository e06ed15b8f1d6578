use std::{
    fs,
    path::{Path, PathBuf},
};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantNames};

use crate::{
    error::{Result, SpheroidError},
    traits::DetectionThresholds,
};

/// Background color and the HSV band that recovers it from a composite.
///
/// Hue is in half-degrees (`0..180`); saturation and value span `0..=255`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct BackgroundConfig {
    /// Fill color for pixels outside the object mask
    pub background_rgb: [u8; 3],
    pub hue_low: u8,
    pub hue_high: u8,
    pub saturation_low: u8,
    pub saturation_high: u8,
    pub value_low: u8,
    pub value_high: u8,
    /// Mask samples strictly above this value are foreground
    pub binarize_threshold: u8,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            background_rgb: [0, 255, 0],
            hue_low: 35,
            hue_high: 85,
            saturation_low: 50,
            saturation_high: 255,
            value_low: 50,
            value_high: 255,
            binarize_threshold: 127,
        }
    }
}

impl BackgroundConfig {
    /// Reject empty HSV bands and hues outside `0..180`.
    pub fn validate(&self) -> Result<()> {
        let bands = [
            ("hue", self.hue_low, self.hue_high),
            ("saturation", self.saturation_low, self.saturation_high),
            ("value", self.value_low, self.value_high),
        ];
        for (name, low, high) in bands {
            if low > high {
                return Err(SpheroidError::InvalidConfig(format!(
                    "background.{name}_low ({low}) is above background.{name}_high ({high})"
                )));
            }
        }
        if self.hue_high >= 180 {
            return Err(SpheroidError::InvalidConfig(format!(
                "background.hue_high ({}) must be below 180",
                self.hue_high
            )));
        }
        Ok(())
    }
}

/// What to do with files that have no partner in a keyed join
#[derive(
    Debug, Clone, Copy, Default,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, VariantNames,
    PartialEq, Eq
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UnmatchedPolicy {
    /// Log the unmatched keys and continue with the matched pairs
    #[default]
    Warn,
    /// Abort the stage
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct PairingConfig {
    /// Number of leading file-name characters used as the join key
    #[schemars(range(min = 1))]
    pub key_len: usize,
    pub unmatched: UnmatchedPolicy,
}

impl PairingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.key_len == 0 {
            return Err(SpheroidError::InvalidConfig(
                "pairing.key_len must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            key_len: 3,
            unmatched: UnmatchedPolicy::Warn,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct SegmentationConfig {
    #[schemars(range(min = 0.0, max = 1.0))]
    pub confidence: f32,
    #[schemars(range(min = 0.0, max = 1.0))]
    pub iou: f32,
    /// Full-resolution originals; defaults to the inference images directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub originals_dir: Option<PathBuf>,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            confidence: 0.25,
            iou: 0.45,
            originals_dir: None,
        }
    }
}

impl SegmentationConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("confidence", self.confidence), ("iou", self.iou)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SpheroidError::InvalidConfig(format!(
                    "segmentation.{name} ({value}) must lie in [0, 1]"
                )));
            }
        }
        Ok(())
    }

    pub fn thresholds(&self) -> DetectionThresholds {
        DetectionThresholds {
            confidence: self.confidence,
            iou: self.iou,
        }
    }
}

/// Full pipeline configuration; every field has a default so an empty file is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub segmentation: SegmentationConfig,
    pub background: BackgroundConfig,
    pub pairing: PairingConfig,
}

impl PipelineConfig {
    /// Get the JSON schema for the configuration file
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(PipelineConfig)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the constraints serde cannot express.
    pub fn validate(&self) -> Result<()> {
        self.segmentation.validate()?;
        self.background.validate()?;
        self.pairing.validate()
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&fs::read_to_string(path)?),
            Some("json") => Self::from_json(&fs::read_to_string(path)?),
            _ => Err(SpheroidError::UnsupportedConfigFormat(path.to_path_buf())),
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = PipelineConfig::from_toml("").expect("empty config");
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.background.background_rgb, [0, 255, 0]);
        assert_eq!(config.pairing.key_len, 3);
    }

    #[test]
    fn test_partial_override() {
        let config = PipelineConfig::from_toml(
            r#"
            [background]
            background_rgb = [0, 0, 255]
            hue_low = 100
            hue_high = 130

            [pairing]
            unmatched = "fail"
            "#,
        )
        .expect("parse");

        assert_eq!(config.background.background_rgb, [0, 0, 255]);
        assert_eq!(config.background.hue_low, 100);
        assert_eq!(config.background.saturation_low, 50);
        assert_eq!(config.pairing.unmatched, UnmatchedPolicy::Fail);
        assert_eq!(config.pairing.key_len, 3);
    }

    #[test]
    fn test_toml_and_json_agree() {
        let mut config = PipelineConfig::default();
        config.segmentation.confidence = 0.5;
        config.segmentation.originals_dir = Some(PathBuf::from("raw/tiff"));

        let toml = config.to_toml().expect("toml");
        let json = config.to_json().expect("json");
        assert_eq!(PipelineConfig::from_toml(&toml).unwrap(), config);
        assert_eq!(PipelineConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_from_file_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "").unwrap();
        assert!(matches!(
            PipelineConfig::from_file(&path),
            Err(SpheroidError::UnsupportedConfigFormat(_))
        ));

        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"pairing": {"key_len": 5}}"#).unwrap();
        assert_eq!(PipelineConfig::from_file(&path).unwrap().pairing.key_len, 5);
    }

    #[test]
    fn test_zero_key_len_is_rejected() {
        let err = PipelineConfig::from_toml("[pairing]\nkey_len = 0").unwrap_err();
        assert!(matches!(err, SpheroidError::InvalidConfig(msg) if msg.contains("key_len")));

        let err = PipelineConfig::from_json(r#"{"pairing": {"key_len": 0}}"#).unwrap_err();
        assert!(matches!(err, SpheroidError::InvalidConfig(_)));
    }

    #[test]
    fn test_inverted_bands_are_rejected() {
        let err = PipelineConfig::from_toml("[background]\nhue_low = 90\nhue_high = 40").unwrap_err();
        assert!(matches!(err, SpheroidError::InvalidConfig(msg) if msg.contains("hue_low")));

        let err = PipelineConfig::from_toml("[background]\nhue_high = 200").unwrap_err();
        assert!(matches!(err, SpheroidError::InvalidConfig(_)));

        let err = PipelineConfig::from_toml("[segmentation]\nconfidence = 1.5").unwrap_err();
        assert!(matches!(err, SpheroidError::InvalidConfig(_)));

        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_policy_names() {
        assert_eq!(UnmatchedPolicy::Fail.to_string(), "fail");
        assert_eq!("warn".parse::<UnmatchedPolicy>().unwrap(), UnmatchedPolicy::Warn);
    }

    #[test]
    fn test_schema_lists_sections() {
        let schema = serde_json::to_value(PipelineConfig::schema()).unwrap();
        let properties = &schema["properties"];
        assert!(properties.get("background").is_some());
        assert!(properties.get("pairing").is_some());
    }
}

use std::path::Path;

use tracing::{info, warn};

use super::{Stage, StageReport};
use crate::{
    composite::{composite_files, key_files, reconcile},
    config::{PipelineConfig, UnmatchedPolicy},
    error::{Result, SpheroidError},
    io::list_images,
};

const PAIR_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Composite every keyed raw/mask pair into `<mask_dir>/RawMasks/<key>_output.png`.
pub fn composite_directory(raw_dir: &Path, mask_dir: &Path, config: &PipelineConfig) -> Result<StageReport> {
    config.validate()?;
    let key_len = config.pairing.key_len;
    let images = key_files(&list_images(raw_dir, &PAIR_EXTENSIONS)?, key_len);
    let masks = key_files(&list_images(mask_dir, &PAIR_EXTENSIONS)?, key_len);
    let reconciliation = reconcile(&images, &masks);

    let mut report = StageReport::new(Stage::Composite);
    if !reconciliation.is_complete() {
        match config.pairing.unmatched {
            UnmatchedPolicy::Fail => {
                return Err(SpheroidError::UnmatchedPairs {
                    image_only: reconciliation.image_only.len(),
                    mask_only: reconciliation.mask_only.len(),
                });
            }
            UnmatchedPolicy::Warn => {
                for key in &reconciliation.image_only {
                    warn!("Skipping {}: image has no mask", key);
                    report.skipped.push(key.clone());
                }
                for key in &reconciliation.mask_only {
                    warn!("Skipping {}: mask has no image", key);
                    report.skipped.push(key.clone());
                }
            }
        }
    }

    let out_dir = mask_dir.join("RawMasks");
    std::fs::create_dir_all(&out_dir)?;

    for pair in &reconciliation.matched {
        let outcome = composite_files(&pair.mask, &pair.image, &config.background).and_then(|composite| {
            let out_path = out_dir.join(format!("{}_output.png", pair.key));
            composite.save(&out_path)?;
            info!("Output saved for {} at {:?}", pair.key, out_path);
            Ok(())
        });
        report.record(&pair.key, outcome);
    }

    report.log_summary();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    fn setup() -> (tempfile::TempDir, tempfile::TempDir) {
        let raw = tempfile::tempdir().unwrap();
        let masks = tempfile::tempdir().unwrap();

        RgbImage::from_pixel(4, 4, Rgb([90, 90, 90]))
            .save(raw.path().join("A01_processed.png"))
            .unwrap();
        RgbImage::new(4, 4).save(raw.path().join("B02_processed.png")).unwrap();
        RgbImage::new(4, 4).save(raw.path().join("C03_processed.png")).unwrap();

        let mut mask = GrayImage::new(4, 4);
        mask.put_pixel(0, 0, Luma([255]));
        mask.save(masks.path().join("A01_mask0_class0_binary.png")).unwrap();
        GrayImage::new(4, 5).save(masks.path().join("B02_mask0_class0_binary.png")).unwrap();
        GrayImage::new(4, 4).save(masks.path().join("D04_mask0_class0_binary.png")).unwrap();

        (raw, masks)
    }

    #[test]
    fn test_warn_policy_skips_and_isolates() {
        let (raw, masks) = setup();
        let report = composite_directory(raw.path(), masks.path(), &PipelineConfig::default()).unwrap();

        assert_eq!(report.processed, vec!["A01".to_string()]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].image, "B02");
        assert_eq!(report.skipped, vec!["C03".to_string(), "D04".to_string()]);

        let out = image::open(masks.path().join("RawMasks/A01_output.png")).unwrap().to_rgb8();
        // Flat raw image normalizes to black
        assert_eq!(*out.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*out.get_pixel(1, 0), Rgb([0, 255, 0]));
        assert!(!masks.path().join("RawMasks/B02_output.png").exists());
    }

    #[test]
    fn test_empty_pair_key_is_refused() {
        let (raw, masks) = setup();
        let mut config = PipelineConfig::default();
        config.pairing.key_len = 0;

        let err = composite_directory(raw.path(), masks.path(), &config).unwrap_err();
        assert!(matches!(err, SpheroidError::InvalidConfig(_)));
        assert!(!masks.path().join("RawMasks").exists());
    }

    #[test]
    fn test_fail_policy_aborts() {
        let (raw, masks) = setup();
        let mut config = PipelineConfig::default();
        config.pairing.unmatched = UnmatchedPolicy::Fail;

        let err = composite_directory(raw.path(), masks.path(), &config).unwrap_err();
        assert!(matches!(err, SpheroidError::UnmatchedPairs { image_only: 1, mask_only: 1 }));
    }
}

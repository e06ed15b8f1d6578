use image::{GrayImage, Luma};
use crate::{error::Result, traits::MaskPreprocessor, types::ConfidenceMask};

/// Scale confidences by 255 (truncating); any nonzero result is foreground.
#[derive(Debug, Clone, Default)]
pub struct ConfidenceBinarizer;

impl ConfidenceBinarizer {
    /// Confidence to an 8-bit sample, truncating like a `u8` cast of `v * 255`.
    pub fn scale(value: f32) -> u8 {
        (value * 255.0).clamp(0.0, 255.0) as u8
    }
}

impl MaskPreprocessor for ConfidenceBinarizer {
    fn binarize(&self, mask: &ConfidenceMask) -> Result<GrayImage> {
        let scaled = GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
            Luma([Self::scale(mask.get_pixel(x, y)[0])])
        });
        Ok(threshold_mask(&scaled, 0))
    }
}

/// Hard threshold: samples strictly greater than `threshold` become 255, the rest 0.
pub fn threshold_mask(image: &GrayImage, threshold: u8) -> GrayImage {
    imageproc::contrast::threshold(image, threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_scaling_truncates() {
        assert_eq!(ConfidenceBinarizer::scale(0.0), 0);
        assert_eq!(ConfidenceBinarizer::scale(0.5), 127);
        assert_eq!(ConfidenceBinarizer::scale(1.0), 255);
        assert_eq!(ConfidenceBinarizer::scale(1.7), 255);
        assert_eq!(ConfidenceBinarizer::scale(-0.2), 0);
        // Below 1/255 truncates to zero and drops out of the foreground
        assert_eq!(ConfidenceBinarizer::scale(0.003), 0);
    }

    #[test]
    fn test_binarize_is_strictly_binary() {
        let mask = ConfidenceMask::from_fn(8, 8, |x, _| Luma([x as f32 / 7.0]));
        let binary = ConfidenceBinarizer.binarize(&mask).expect("binarize");

        assert!(binary.pixels().all(|p| p[0] == 0 || p[0] == 255));
        assert_eq!(binary.get_pixel(0, 0)[0], 0);
        assert_eq!(binary.get_pixel(1, 0)[0], 255);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let image = GrayImage::from_raw(3, 1, vec![127, 128, 255]).unwrap();
        let binary = threshold_mask(&image, 127);
        assert_eq!(binary.into_raw(), vec![0, 255, 255]);
    }
}

use image::GrayImage;
use imageproc::contours::BorderType;
use crate::{error::Result, traits::ContourExtractor, types::Contour};

/// Imageproc-based extractor that keeps only outermost borders.
///
/// Hole borders, and the borders of islands nested inside holes, are dropped.
#[derive(Debug, Clone, Default)]
pub struct ExternalContourExtractor;

impl ContourExtractor for ExternalContourExtractor {
    fn extract_contours(&self, binary_image: &GrayImage) -> Result<Vec<Contour>> {
        let contours = imageproc::contours::find_contours::<i32>(binary_image);

        let result = contours
            .into_iter()
            .filter(|contour| matches!(contour.border_type, BorderType::Outer) && contour.parent.is_none())
            .map(|contour| {
                Contour::new(
                    contour.points
                        .iter()
                        .map(|p| [p.x as f64, p.y as f64])
                        .collect(),
                )
            })
            .collect();

        Ok(result)
    }
}

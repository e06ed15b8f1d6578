use std::path::PathBuf;

use geo_types::{Coord, LineString, Polygon};
use image::{ImageBuffer, Luma};
use serde::{Deserialize, Serialize};

/// Model-resolution mask with per-pixel confidence, nominally in `[0, 1]`.
pub type ConfidenceMask = ImageBuffer<Luma<f32>, Vec<f32>>;

/// One detected object as reported by the segmentation model.
#[derive(Debug, Clone)]
pub struct ObjectInstance {
    pub class_id: u32,
    pub mask: ConfidenceMask,
}

/// Everything the model reported for one submitted image.
#[derive(Debug, Clone)]
pub struct InferenceResult {
    /// Path of the file the model actually processed
    pub path: PathBuf,
    pub instances: Vec<ObjectInstance>,
}

impl InferenceResult {
    pub fn new(path: impl Into<PathBuf>, instances: Vec<ObjectInstance>) -> Self {
        Self {
            path: path.into(),
            instances,
        }
    }

    /// File stem of the inference-time path, the cross-stage join key.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Outer boundary of one connected region, in pixel coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contour {
    pub points: Vec<[f64; 2]>,
}

impl Contour {
    pub fn new(points: Vec<[f64; 2]>) -> Self {
        Self { points }
    }

    /// Convert to a geo-types Polygon; the ring is closed implicitly.
    pub fn to_geo_polygon(&self) -> Polygon<f64> {
        let coords: Vec<Coord<f64>> = self
            .points
            .iter()
            .map(|&[x, y]| Coord { x, y })
            .collect();

        Polygon::new(LineString::new(coords), vec![])
    }

    /// Enclosed polygon area.
    pub fn area(&self) -> f64 {
        use geo::Area;
        self.to_geo_polygon().unsigned_area()
    }

    /// Arc length of the closed contour.
    pub fn perimeter(&self) -> f64 {
        use geo::EuclideanLength;
        if self.points.len() < 2 {
            return 0.0;
        }
        self.to_geo_polygon().exterior().euclidean_length()
    }
}

/// Area, perimeter and circularity of one instance mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeMetrics {
    pub area: f64,
    pub perimeter: f64,
    pub circularity: f64,
}

impl ShapeMetrics {
    /// Sum area and perimeter over all contours, then derive circularity.
    pub fn from_contours(contours: &[Contour]) -> Self {
        let area: f64 = contours.iter().map(Contour::area).sum();
        let perimeter: f64 = contours.iter().map(Contour::perimeter).sum();

        Self {
            area,
            perimeter,
            circularity: circularity(area, perimeter),
        }
    }
}

/// Isoperimetric ratio `4πA/P²`. Zero perimeter yields 0; values above 1 are kept.
pub fn circularity(area: f64, perimeter: f64) -> f64 {
    if perimeter == 0.0 {
        0.0
    } else {
        4.0 * std::f64::consts::PI * area / (perimeter * perimeter)
    }
}

/// Metrics of a single object instance, tagged with its class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InstanceMetrics {
    pub class_id: u32,
    #[serde(flatten)]
    pub shape: ShapeMetrics,
}

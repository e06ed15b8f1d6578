use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, SpheroidError},
    types::InstanceMetrics,
};

/// Per-image accumulation of instance metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageMetrics {
    /// Summed area keyed by class id
    pub area_by_class: BTreeMap<u32, f64>,
    /// Summed over every instance regardless of class
    pub perimeter: f64,
    /// Summed over every instance regardless of class
    pub circularity: f64,
    pub instance_count: usize,
}

impl ImageMetrics {
    pub fn add(&mut self, instance: &InstanceMetrics) {
        *self.area_by_class.entry(instance.class_id).or_default() += instance.shape.area;
        self.perimeter += instance.shape.perimeter;
        self.circularity += instance.shape.circularity;
        self.instance_count += 1;
    }

    pub fn area(&self, class_id: u32) -> f64 {
        self.area_by_class.get(&class_id).copied().unwrap_or(0.0)
    }
}

/// One line of `seg_circularity.csv`.
///
/// Only classes 0 and 1 get an area column; other classes still count toward
/// the perimeter and circularity totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetricsRow {
    pub image_name: String,
    pub area_class_0: f64,
    pub area_class_1: f64,
    pub perimeter: f64,
    pub circularity: f64,
}

impl ImageMetricsRow {
    pub fn project(image_name: &str, metrics: &ImageMetrics) -> Self {
        Self {
            image_name: image_name.to_string(),
            area_class_0: metrics.area(0),
            area_class_1: metrics.area(1),
            perimeter: metrics.perimeter,
            circularity: metrics.circularity,
        }
    }
}

/// Ordered image key → metrics mapping.
///
/// Every submitted image is registered up front, so a zero row always means
/// "measured, nothing found" and never "missing".
#[derive(Debug, Clone, Default)]
pub struct MetricsTable {
    images: BTreeMap<String, ImageMetrics>,
}

impl MetricsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image with empty metrics. Re-registering resets it.
    pub fn register(&mut self, image_name: impl Into<String>) {
        self.images.insert(image_name.into(), ImageMetrics::default());
    }

    /// Replace an image's metrics with the given instances.
    pub fn commit(&mut self, image_name: &str, instances: &[InstanceMetrics]) -> Result<()> {
        let entry = self
            .images
            .get_mut(image_name)
            .ok_or_else(|| SpheroidError::UnknownImage(image_name.to_string()))?;

        let mut metrics = ImageMetrics::default();
        for instance in instances {
            metrics.add(instance);
        }
        *entry = metrics;
        Ok(())
    }

    /// Drop an image whose processing failed.
    pub fn discard(&mut self, image_name: &str) -> Option<ImageMetrics> {
        self.images.remove(image_name)
    }

    pub fn contains(&self, image_name: &str) -> bool {
        self.images.contains_key(image_name)
    }

    pub fn get(&self, image_name: &str) -> Option<&ImageMetrics> {
        self.images.get(image_name)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// CSV projection, sorted by image name.
    pub fn rows(&self) -> Vec<ImageMetricsRow> {
        self.images
            .iter()
            .map(|(name, metrics)| ImageMetricsRow::project(name, metrics))
            .collect()
    }
}

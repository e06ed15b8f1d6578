use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use tracing::{info, warn};

use super::{Stage, StageReport};
use crate::{
    config::SegmentationConfig,
    error::{Result, SpheroidError},
    io::write_rows,
    metrics::MetricsTable,
    pipeline::GeometryPipeline,
    render::{mask_file_name, render_mask},
    resolver::{resolve, Resolution, ResolvedImage},
    traits::InstanceSegmenter,
    types::{InferenceResult, InstanceMetrics},
};

pub const METRICS_HEADERS: [&str; 5] =
    ["image_name", "area_class_0", "area_class_1", "perimeter", "circularity"];

#[derive(Debug)]
pub struct MeasureOutput {
    pub report: StageReport,
    pub table: MetricsTable,
    /// Per-instance metrics keyed by image name, in instance order
    pub instances: BTreeMap<String, Vec<InstanceMetrics>>,
    pub csv_path: PathBuf,
    pub masks_dir: PathBuf,
}

/// Run the external model on `images_dir`, then measure its results.
pub fn run_segmentation(
    segmenter: &dyn InstanceSegmenter,
    images_dir: &Path,
    originals_dir: &Path,
    output_dir: &Path,
    config: &SegmentationConfig,
    pipeline: &GeometryPipeline,
) -> Result<MeasureOutput> {
    config.validate()?;
    let results = segmenter.segment(images_dir, config.thresholds())?;
    info!("Segmentation returned {} image(s)", results.len());
    measure(&results, originals_dir, output_dir, pipeline)
}

/// Measure every instance, write full-resolution masks and `seg_circularity.csv`.
///
/// Outputs go to `<output_dir>/inferenceSeg/`. Every result is registered in the
/// metrics table before any instance is measured.
pub fn measure(
    results: &[InferenceResult],
    originals_dir: &Path,
    output_dir: &Path,
    pipeline: &GeometryPipeline,
) -> Result<MeasureOutput> {
    let seg_dir = output_dir.join("inferenceSeg");
    let masks_dir = seg_dir.join("mask_crops");
    std::fs::create_dir_all(&masks_dir)?;

    let mut report = StageReport::new(Stage::Measure);
    let mut table = MetricsTable::new();

    // Resolve and register everything first. Two results resolving to the
    // same original would share a row, so the later one is refused.
    let mut resolved: Vec<(&InferenceResult, ResolvedImage)> = Vec::with_capacity(results.len());
    for result in results {
        let outcome = resolve(&result.path, originals_dir).and_then(|image| {
            if table.contains(&image.name) {
                return Err(SpheroidError::DuplicateImage {
                    name: image.name,
                    path: result.path.clone(),
                });
            }
            Ok(image)
        });
        match outcome {
            Ok(image) => {
                if image.resolution == Resolution::Fallback {
                    report.degraded.push(image.name.clone());
                }
                table.register(image.name.clone());
                resolved.push((result, image));
            }
            Err(err) => {
                report.record::<()>(&result.stem(), Err(err));
            }
        }
    }

    let mut instances = BTreeMap::new();
    for (result, image) in resolved {
        let outcome = measure_image(result, &image, &masks_dir, pipeline);
        match report.record(&image.name, outcome) {
            Some(metrics) => {
                table.commit(&image.name, &metrics)?;
                log_instances(&image.name, &metrics);
                instances.insert(image.name, metrics);
            }
            None => {
                table.discard(&image.name);
            }
        }
    }

    let csv_path = seg_dir.join("seg_circularity.csv");
    write_rows(&csv_path, &METRICS_HEADERS, &table.rows())?;
    info!("Wrote {} row(s) to {:?}", table.len(), csv_path);

    report.log_summary();
    Ok(MeasureOutput {
        report,
        table,
        instances,
        csv_path,
        masks_dir,
    })
}

fn measure_image(
    result: &InferenceResult,
    image: &ResolvedImage,
    masks_dir: &Path,
    pipeline: &GeometryPipeline,
) -> Result<Vec<InstanceMetrics>> {
    // Measure every instance before writing anything, so a failing image
    // leaves no masks behind.
    let measured = result
        .instances
        .iter()
        .map(|instance| pipeline.process(instance))
        .collect::<Result<Vec<_>>>()?;

    let stem = result.stem();
    let mut written = Vec::with_capacity(measured.len());
    for (index, (binary, metrics)) in measured.iter().enumerate() {
        let file_name = mask_file_name(&stem, index, metrics.class_id);
        match render_mask(binary, image.width, image.height, masks_dir, &file_name) {
            Ok(path) => written.push(path),
            Err(err) => {
                for path in &written {
                    if let Err(remove_err) = std::fs::remove_file(path) {
                        warn!("Could not remove partial mask {:?}: {}", path, remove_err);
                    }
                }
                return Err(err);
            }
        }
    }

    if measured.is_empty() {
        warn!("No instances detected in {}", image.name);
    }
    Ok(measured.into_iter().map(|(_, metrics)| metrics).collect())
}

fn log_instances(image_name: &str, metrics: &[InstanceMetrics]) {
    info!("IMAGE: {}", image_name);
    for (i, m) in metrics.iter().enumerate() {
        info!(
            "  Mask {}: class={}, area={:.2}, perimeter={:.2}, circularity={:.3}",
            i + 1,
            m.class_id,
            m.shape.area,
            m.shape.perimeter,
            m.shape.circularity
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        algorithms::ConfidenceBinarizer,
        traits::{DetectionThresholds, MaskPreprocessor},
        types::{ConfidenceMask, ObjectInstance},
    };
    use image::{GrayImage, Luma};
    use std::collections::BTreeSet;

    fn square_mask(size: u32, from: u32, to: u32) -> ConfidenceMask {
        let mut mask = ConfidenceMask::new(size, size);
        for y in from..to {
            for x in from..to {
                mask.put_pixel(x, y, Luma([1.0]));
            }
        }
        mask
    }

    struct FixedSegmenter(Vec<InferenceResult>);

    impl InstanceSegmenter for FixedSegmenter {
        fn segment(&self, _dir: &Path, _t: DetectionThresholds) -> Result<Vec<InferenceResult>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_submitted_set_equals_csv_set() {
        let originals = tempfile::tempdir().unwrap();
        let working = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();

        for name in ["A01", "B02", "C03"] {
            GrayImage::new(200, 200).save(originals.path().join(format!("{name}.png"))).unwrap();
            GrayImage::new(100, 100).save(working.path().join(format!("{name}.jpg"))).unwrap();
        }

        let results = vec![
            InferenceResult::new(
                working.path().join("A01.jpg"),
                vec![
                    ObjectInstance { class_id: 0, mask: square_mask(100, 20, 80) },
                    ObjectInstance { class_id: 1, mask: square_mask(100, 10, 20) },
                ],
            ),
            InferenceResult::new(working.path().join("B02.jpg"), vec![]),
            InferenceResult::new(
                working.path().join("C03.jpg"),
                vec![ObjectInstance { class_id: 2, mask: square_mask(100, 20, 80) }],
            ),
        ];

        let out = measure(&results, originals.path(), output.path(), &GeometryPipeline::default()).unwrap();
        assert!(out.report.is_clean());

        let csv = std::fs::read_to_string(&out.csv_path).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("image_name,area_class_0,area_class_1,perimeter,circularity"));
        let keys: BTreeSet<_> = lines.map(|l| l.split(',').next().unwrap().to_string()).collect();
        let expected: BTreeSet<_> = ["A01.png", "B02.png", "C03.png"].iter().map(|s| s.to_string()).collect();
        assert_eq!(keys, expected);

        assert!(csv.contains("B02.png,0.0,0.0,0.0,0.0"));

        let a01 = out.table.get("A01.png").unwrap();
        assert_eq!(a01.area(0), 59.0 * 59.0);
        assert_eq!(a01.area(1), 81.0);
        assert_eq!(a01.perimeter, 236.0 + 36.0);

        // Class 2 feeds only the totals
        let c03 = &out.table.rows()[2];
        assert_eq!((c03.area_class_0, c03.area_class_1), (0.0, 0.0));
        assert_eq!(c03.perimeter, 236.0);
    }

    #[test]
    fn test_masks_written_at_original_resolution() {
        let originals = tempfile::tempdir().unwrap();
        let working = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        GrayImage::new(300, 150).save(originals.path().join("A01.tif")).unwrap();
        GrayImage::new(100, 50).save(working.path().join("A01.png")).unwrap();

        let results = vec![InferenceResult::new(
            working.path().join("A01.png"),
            vec![
                ObjectInstance { class_id: 1, mask: square_mask(100, 5, 40) },
                ObjectInstance { class_id: 1, mask: square_mask(100, 50, 60) },
            ],
        )];

        let out = measure(&results, originals.path(), output.path(), &GeometryPipeline::default()).unwrap();

        for index in 0..2 {
            let path = out.masks_dir.join(format!("A01_mask{index}_class1_binary.png"));
            let mask = image::open(&path).unwrap().to_luma8();
            assert_eq!(mask.dimensions(), (300, 150));
            assert!(mask.pixels().all(|p| p[0] == 0 || p[0] == 255));
        }
    }

    #[test]
    fn test_fallback_keeps_image_in_table() {
        let originals = tempfile::tempdir().unwrap();
        let working = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        GrayImage::new(64, 64).save(working.path().join("Z99.png")).unwrap();

        let results = vec![InferenceResult::new(
            working.path().join("Z99.png"),
            vec![ObjectInstance { class_id: 0, mask: square_mask(64, 10, 20) }],
        )];
        let out = measure(&results, originals.path(), output.path(), &GeometryPipeline::default()).unwrap();

        assert_eq!(out.report.processed, vec!["Z99.png".to_string()]);
        assert_eq!(out.report.degraded, vec!["Z99.png".to_string()]);
        assert!(out.report.skipped.is_empty());
        let mask = image::open(out.masks_dir.join("Z99_mask0_class0_binary.png")).unwrap();
        assert_eq!((mask.width(), mask.height()), (64, 64));
    }

    #[test]
    fn test_unreadable_image_does_not_abort_batch() {
        let originals = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        GrayImage::new(32, 32).save(originals.path().join("A01.png")).unwrap();

        let results = vec![
            InferenceResult::new(originals.path().join("A01.png"), vec![]),
            InferenceResult::new(originals.path().join("missing/B02.png"), vec![]),
        ];
        let out = measure(&results, originals.path(), output.path(), &GeometryPipeline::default()).unwrap();

        assert_eq!(out.report.processed, vec!["A01.png".to_string()]);
        assert_eq!(out.report.failures.len(), 1);
        assert_eq!(out.report.failures[0].image, "B02");
        assert_eq!(out.table.len(), 1);
    }

    #[test]
    fn test_run_segmentation_uses_segmenter() {
        let images = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        GrayImage::new(16, 16).save(images.path().join("A01.png")).unwrap();

        let segmenter = FixedSegmenter(vec![InferenceResult::new(images.path().join("A01.png"), vec![])]);
        let out = run_segmentation(
            &segmenter,
            images.path(),
            images.path(),
            output.path(),
            &SegmentationConfig::default(),
            &GeometryPipeline::default(),
        )
        .unwrap();
        assert_eq!(out.table.len(), 1);

        struct Broken;
        impl InstanceSegmenter for Broken {
            fn segment(&self, _dir: &Path, _t: DetectionThresholds) -> Result<Vec<InferenceResult>> {
                Err(SpheroidError::SegmenterFailed("offline".into()))
            }
        }
        assert!(run_segmentation(
            &Broken,
            images.path(),
            images.path(),
            output.path(),
            &SegmentationConfig::default(),
            &GeometryPipeline::default(),
        )
        .is_err());
    }

    /// Refuses all-zero masks, standing in for a failing geometry step.
    struct RejectEmpty;

    impl MaskPreprocessor for RejectEmpty {
        fn binarize(&self, mask: &ConfidenceMask) -> Result<GrayImage> {
            if mask.pixels().all(|p| p[0] == 0.0) {
                return Err(SpheroidError::Io(std::io::Error::other("empty mask")));
            }
            ConfidenceBinarizer.binarize(mask)
        }
    }

    #[test]
    fn test_second_result_for_same_original_is_refused() {
        let originals = tempfile::tempdir().unwrap();
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        GrayImage::new(100, 100).save(originals.path().join("A01.png")).unwrap();
        GrayImage::new(100, 100).save(first.path().join("A01.jpg")).unwrap();
        GrayImage::new(100, 100).save(second.path().join("A01.jpg")).unwrap();

        let results = vec![
            InferenceResult::new(first.path().join("A01.jpg"), vec![]),
            InferenceResult::new(
                second.path().join("A01.jpg"),
                vec![ObjectInstance { class_id: 0, mask: square_mask(100, 20, 80) }],
            ),
        ];
        let out = measure(&results, originals.path(), output.path(), &GeometryPipeline::default()).unwrap();

        assert_eq!(out.report.processed, vec!["A01.png".to_string()]);
        assert_eq!(out.report.failures.len(), 1);
        assert!(out.report.failures[0].error.contains("A01.png"));
        assert_eq!(out.table.len(), 1);
        assert_eq!(out.table.get("A01.png").unwrap().instance_count, 0);

        let csv = std::fs::read_to_string(&out.csv_path).unwrap();
        assert_eq!(csv.lines().count(), 2);
        assert!(csv.contains("A01.png,0.0,0.0,0.0,0.0"));
        assert_eq!(std::fs::read_dir(&out.masks_dir).unwrap().count(), 0);
    }

    #[test]
    fn test_failed_instance_leaves_no_masks() {
        let originals = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        GrayImage::new(100, 100).save(originals.path().join("A01.png")).unwrap();
        GrayImage::new(100, 100).save(originals.path().join("B02.png")).unwrap();

        let results = vec![
            InferenceResult::new(
                originals.path().join("A01.png"),
                vec![
                    ObjectInstance { class_id: 0, mask: square_mask(100, 20, 80) },
                    ObjectInstance { class_id: 1, mask: ConfidenceMask::new(100, 100) },
                ],
            ),
            InferenceResult::new(
                originals.path().join("B02.png"),
                vec![ObjectInstance { class_id: 0, mask: square_mask(100, 10, 30) }],
            ),
        ];
        let pipeline = GeometryPipeline::builder().set_preprocessor(RejectEmpty).build();
        let out = measure(&results, originals.path(), output.path(), &pipeline).unwrap();

        assert_eq!(out.report.processed, vec!["B02.png".to_string()]);
        assert_eq!(out.report.failures[0].image, "A01.png");

        let written: Vec<_> = std::fs::read_dir(&out.masks_dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(written, vec!["B02_mask0_class0_binary.png".to_string()]);
    }
}

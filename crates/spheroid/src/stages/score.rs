use std::path::{Path, PathBuf};

use tracing::info;

use super::{Stage, StageReport};
use crate::{
    config::PipelineConfig,
    darkness::{analyze, DarknessRow},
    error::Result,
    io::{list_images, name_key, write_rows},
    traits::HistogramRenderer,
};

pub const DARKNESS_HEADERS: [&str; 2] = ["Image", "Average Intensity"];

#[derive(Debug)]
pub struct ScoreOutput {
    pub report: StageReport,
    pub rows: Vec<DarknessRow>,
    pub csv_path: PathBuf,
}

/// Score every composite PNG in `folder`; artifacts and the CSV go to `<folder>/output/`.
///
/// Composites with no object pixels are reported as failures and get no CSV row.
pub fn score_directory(
    folder: &Path,
    config: &PipelineConfig,
    renderer: &dyn HistogramRenderer,
) -> Result<ScoreOutput> {
    config.validate()?;
    let out_dir = folder.join("output");
    std::fs::create_dir_all(&out_dir)?;

    let mut report = StageReport::new(Stage::Score);
    let mut rows = Vec::new();

    for path in list_images(folder, &["png"])? {
        let key = name_key(&path, config.pairing.key_len);

        let outcome = (|| -> Result<DarknessRow> {
            let composite = image::open(&path)?.to_rgb8();
            let analysis = analyze(&composite, &config.background, &key)?;

            analysis.background_mask.save(out_dir.join(format!("{key}_green_mask.png")))?;
            analysis.object_mask.save(out_dir.join(format!("{key}_inverted_mask.png")))?;
            analysis.gray_object.save(out_dir.join(format!("{key}_gray_object.png")))?;
            renderer.render(
                &analysis.record.histogram,
                &format!("Grayscale Histogram: {key}"),
                &out_dir.join(format!("{key}_gray_histogram.png")),
            )?;

            Ok(DarknessRow {
                image: key.clone(),
                average_intensity: analysis.record.rounded_mean(),
            })
        })();

        if let Some(row) = report.record(&key, outcome) {
            rows.push(row);
        }
    }

    let csv_path = out_dir.join("average_intensities.csv");
    write_rows(&csv_path, &DARKNESS_HEADERS, &rows)?;
    info!("Analysis complete. Results and histograms saved in {:?}", out_dir);

    report.log_summary();
    Ok(ScoreOutput {
        report,
        rows,
        csv_path,
    })
}

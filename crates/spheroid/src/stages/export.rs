use std::path::Path;

use tracing::info;

use super::{Stage, StageReport};
use crate::{
    error::Result,
    io::list_images,
    normalize::{inspect, normalize_frame, FrameInfo},
};

const ACQUISITION_EXTENSIONS: [&str; 2] = ["tif", "tiff"];

/// Export every TIFF in `input_dir` as `<output_dir>/<stem>_processed.png`.
pub fn export_directory(input_dir: &Path, output_dir: &Path) -> Result<StageReport> {
    std::fs::create_dir_all(output_dir)?;
    let mut report = StageReport::new(Stage::Export);

    for path in list_images(input_dir, &ACQUISITION_EXTENSIONS)? {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let outcome = (|| -> Result<()> {
            let frame = image::open(&path)?;
            let out_path = output_dir.join(format!("{stem}_processed.png"));
            normalize_frame(&frame).save(&out_path)?;
            info!("Processed image saved to {:?}", out_path);
            Ok(())
        })();
        report.record(&stem, outcome);
    }

    report.log_summary();
    Ok(report)
}

/// Inspect every TIFF in `input_dir`.
pub fn inspect_directory(input_dir: &Path) -> Result<Vec<(String, FrameInfo)>> {
    let mut infos = Vec::new();
    for path in list_images(input_dir, &ACQUISITION_EXTENSIONS)? {
        let info = inspect(&path)?;
        info!(
            "{:?}: format={:?} color={} size={}x{} range=[{}, {}]",
            path, info.format, info.color, info.width, info.height, info.min, info.max
        );
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        infos.push((name, info));
    }
    Ok(infos)
}

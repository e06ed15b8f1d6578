pub mod csv;
pub mod plot;

pub use self::csv::write_rows;
pub use plot::BarChartRenderer;

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Files directly inside `dir` whose extension is one of `extensions` (case-insensitive), sorted by name.
pub fn list_images(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)));
        if matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// First `len` characters of a file name.
pub fn name_key(path: &Path, len: usize) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().chars().take(len).collect())
        .unwrap_or_default()
}

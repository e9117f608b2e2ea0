//! Result file discovery

use std::path::{Path, PathBuf};

use petclinic_core::{HarnessError, Result};

/// Suffix of per-run statistics files
pub const STATS_SUFFIX: &str = "_stats.csv";

/// All `*_stats.csv` files directly inside `dir`, sorted by name.
///
/// A missing directory yields no files.
pub fn discover_result_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| HarnessError::io(dir, e))? {
        let path = entry.map_err(|e| HarnessError::io(dir, e))?.path();
        let is_stats = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(STATS_SUFFIX));
        if is_stats && path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

//! Input discovery for batch commands.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::Result;

/// Expands `inputs` into a sorted list of files with the given extension.
/// Files are taken as given; directories are walked recursively.
pub fn collect_files(inputs: &[PathBuf], extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_file() {
            files.push(input.clone());
            continue;
        }
        for entry in WalkDir::new(input).follow_links(true) {
            let entry = entry.map_err(|e| std::io::Error::other(e.to_string()))?;
            let path = entry.path();
            if path.is_file() && has_extension(path, extension) {
                files.push(path.to_path_buf());
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

use bugseed_core::{parse_entries, RecordEntry, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Reads record entries from a list of JSON files, one file at a time.
/// A file that cannot be read or parsed is logged and skipped.
#[derive(Debug, Clone, Default)]
pub struct DataReader {
    paths: Vec<PathBuf>,
}

impl DataReader {
    pub fn new(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn entries<'a, T: DeserializeOwned + 'a>(
        &'a self,
    ) -> impl Iterator<Item = RecordEntry<T>> + 'a {
        self.paths.iter().flat_map(|path| match read_entries(path) {
            Ok(entries) => {
                debug!("Read {} entries from {}", entries.len(), path.display());
                entries
            }
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                Vec::new()
            }
        })
    }

    /// Every record, with groups flattened in file order.
    pub fn records<'a, T: DeserializeOwned + 'a>(&'a self) -> impl Iterator<Item = T> + 'a {
        self.entries::<T>().flat_map(|entry| match entry {
            RecordEntry::Single(record) => vec![record],
            RecordEntry::Group(records) => records,
        })
    }
}

pub fn read_entries<T: DeserializeOwned>(path: &Path) -> Result<Vec<RecordEntry<T>>> {
    let content = std::fs::read_to_string(path)?;
    parse_entries(&content)
}

use bugseed_core::{sidecar_path, Result, SEEDED_FILE_MARKER};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::SeededBug;

/// Writes seeded files and their metadata sidecars into one directory.
#[derive(Debug, Clone)]
pub struct SeededFileWriter {
    out_dir: PathBuf,
}

impl SeededFileWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Result<Self> {
        let out_dir = out_dir.into();
        fs::create_dir_all(&out_dir)?;
        Ok(Self { out_dir })
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Writes `<stem>_SEMSEED_MUTATED_<n>.js` and its `.json` sidecar, where
    /// `stem` names the analysed file. Returns the path of the code file.
    ///
    /// Names are claimed with `create_new`, so concurrent writers sharing a
    /// stem never overwrite each other. A failed code write is recorded in
    /// the sidecar's `error` field.
    pub fn write(&self, stem: &str, bug: &SeededBug) -> Result<PathBuf> {
        let mut metadata = bug.metadata.clone();
        let path = match self.claim(stem, bug) {
            Ok((path, mut file)) => {
                if let Err(e) = file.write_all(bug.code().as_bytes()) {
                    warn!("Could not write {}: {}", path.display(), e);
                    metadata.error = Some(e.to_string());
                }
                path
            }
            Err((path, e)) => {
                warn!("Could not create {}: {}", path.display(), e);
                metadata.error = Some(e.to_string());
                path
            }
        };
        fs::write(sidecar_path(&path), serde_json::to_string_pretty(&metadata)?)?;
        Ok(path)
    }

    /// Creates the first free name: `<base>.js`, then `<base>_<variant>.js`,
    /// then `<base>_<variant>_<attempt>.js`.
    fn claim(
        &self,
        stem: &str,
        bug: &SeededBug,
    ) -> std::result::Result<(PathBuf, File), (PathBuf, io::Error)> {
        let base = format!("{}{}{}", stem, SEEDED_FILE_MARKER, bug.location_number);
        let mut attempt = 0usize;
        loop {
            let name = match attempt {
                0 => format!("{}.js", base),
                1 => format!("{}_{}.js", base, bug.variant),
                n => format!("{}_{}_{}.js", base, bug.variant, n - 1),
            };
            let path = self.out_dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err((path, e)),
            }
        }
    }
}

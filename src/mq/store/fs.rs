use super::{FilePattern, FileStore, UniqueFile};
use crate::error::{MqError, Result};
use log::{debug, warn};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const UNIQUE_PREFIX: &str = "tmp";
const UNIQUE_SUFFIX: &str = ".tmp";

/// Filesystem-backed store. Relative patterns and new files live under `base`.
pub struct LocalStore {
    base: PathBuf,
}

impl LocalStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl FileStore for LocalStore {
    type Output = LocalFile;

    fn expand(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let Some(pattern_spec) = FilePattern::parse(pattern, &self.base)? else {
            return Ok(Vec::new());
        };

        let entries = fs::read_dir(&pattern_spec.dir).map_err(|e| {
            MqError::Pattern(format!("{}: {}: {}", pattern, pattern_spec.dir.display(), e))
        })?;

        let mut matched = Vec::new();
        for entry in entries {
            let entry = entry.map_err(MqError::Io)?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = entry.file_name();
            let lossy = name.to_string_lossy();
            if !pattern_spec.matches(&lossy) {
                continue;
            }
            if name.to_str().is_none() {
                warn!("{} is not valid UTF-8, matched as {}", path.display(), lossy);
            }
            matched.push(path);
        }
        matched.sort();

        debug!("Pattern {} matched {} file(s)", pattern, matched.len());
        Ok(matched)
    }

    fn read_all(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(MqError::Io)
    }

    fn create_unique(&mut self) -> Result<LocalFile> {
        let file = tempfile::Builder::new()
            .prefix(UNIQUE_PREFIX)
            .suffix(UNIQUE_SUFFIX)
            .tempfile_in(&self.base)
            .map_err(MqError::Io)?;
        Ok(LocalFile { file })
    }
}

/// A new file in the store's base directory. Deleted on drop unless persisted.
pub struct LocalFile {
    file: NamedTempFile,
}

impl Write for LocalFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl UniqueFile for LocalFile {
    fn persist(mut self) -> Result<PathBuf> {
        self.file.flush().map_err(MqError::Io)?;
        let (_, path) = self.file.keep().map_err(|e| MqError::Io(e.error))?;
        Ok(path)
    }
}

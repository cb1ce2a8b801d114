use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use archivebot_core::StoreError;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("archive directory missing or not writable: {0}")]
    ArchiveDir(String),
    #[error("feed registry unreadable: {0}")]
    Registry(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl From<PersistError> for StoreError {
    fn from(err: PersistError) -> Self {
        StoreError::Failed(err.to_string())
    }
}

/// Ensure the archive directory exists; create if missing.
pub fn ensure_archive_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::ArchiveDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::ArchiveDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::ArchiveDir(e.to_string()))?;
    }
    // Writability probe.
    NamedTempFile::new_in(dir).map_err(|e| PersistError::ArchiveDir(e.to_string()))?;
    Ok(())
}

/// Atomically replaces `{dir}/{filename}` by writing a temp file then renaming.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

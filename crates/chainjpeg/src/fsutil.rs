//! File helpers that attach the path to every error.

use crate::error::{ChainError, Result};
use std::io::ErrorKind;
use std::path::Path;

/// Read a whole file; a missing file is reported as a missing artifact
pub fn read(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            ChainError::MissingArtifact(path.to_path_buf())
        } else {
            ChainError::io(path, source)
        }
    })
}

/// Write a whole file, creating parent directories as needed
pub fn write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    std::fs::write(path, data).map_err(|source| ChainError::io(path, source))
}

/// Create a directory and its parents
pub fn create_dir_all(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|source| ChainError::io(path, source))
}

/// Remove a directory tree if it exists
pub fn remove_dir_all(path: &Path) -> Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(ChainError::io(path, source)),
    }
}

/// Size of a file in bytes
pub fn file_len(path: &Path) -> Result<usize> {
    let meta = std::fs::metadata(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            ChainError::MissingArtifact(path.to_path_buf())
        } else {
            ChainError::io(path, source)
        }
    })?;
    Ok(meta.len() as usize)
}

/// Fail with a missing-artifact error unless `path` exists
pub fn require(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(ChainError::MissingArtifact(path.to_path_buf()))
    }
}

//! Filesystem abstraction.
//!
//! The pipeline only needs a handful of primitives: list, read, write, rename, delete
//! and glob. They are collected behind the [`FileSystem`] trait so stages never touch
//! the disk directly, and tests can substitute a filesystem that injects failures.

use std::{
    ffi::OsStr,
    fs, io,
    path::{Path, PathBuf},
};

use globset::Glob;
use walkdir::WalkDir;

use crate::PipelineError;

/// Filesystem primitives used by the engine and side-input loaders.
pub trait FileSystem: Send + Sync {
    /// Returns true if anything exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Returns true if `path` is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Lists the data files directly inside `dir`, sorted by name.
    ///
    /// Subdirectories and marker files (names starting with `_` or `.`) are skipped.
    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>, PipelineError>;

    /// Reads a whole file as text. Invalid UTF-8 sequences are replaced with
    /// `U+FFFD` rather than failing the read.
    fn read_to_string(&self, path: &Path) -> Result<String, PipelineError>;

    /// Writes a file, creating parent directories as needed.
    fn write(&self, path: &Path, contents: &str) -> Result<(), PipelineError>;

    /// Moves a file, creating the destination's parent directories as needed.
    fn rename(&self, from: &Path, to: &Path) -> Result<(), PipelineError>;

    /// Recursively deletes `path`. Returns whether anything was deleted.
    fn delete(&self, path: &Path) -> Result<bool, PipelineError>;

    /// Expands a pattern whose final component may contain glob syntax, such as
    /// `out/step1/tfraw*`. A missing parent directory matches nothing.
    fn glob(&self, pattern: &Path) -> Result<Vec<PathBuf>, PipelineError> {
        let (Some(dir), Some(name)) = (pattern.parent(), pattern.file_name()) else {
            return Ok(Vec::new());
        };
        let name = name.to_string_lossy();
        let matcher = Glob::new(&name)
            .map_err(|source| PipelineError::InvalidGlob {
                pattern: pattern.display().to_string(),
                source,
            })?
            .compile_matcher();

        if !self.is_dir(dir) {
            return Ok(Vec::new());
        }

        Ok(self
            .list_files(dir)?
            .into_iter()
            .filter(|path| path.file_name().is_some_and(|n| matcher.is_match(n)))
            .collect())
    }
}

/// [`FileSystem`] backed by the local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FileSystem for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(dir).to_path_buf();
                PipelineError::io(path, io::Error::other(e.to_string()))
            })?;
            if !entry.file_type().is_file() || is_marker(entry.file_name()) {
                continue;
            }
            files.push(entry.into_path());
        }
        files.sort();
        Ok(files)
    }

    fn read_to_string(&self, path: &Path) -> Result<String, PipelineError> {
        let bytes = fs::read(path).map_err(|e| PipelineError::io(path, e))?;
        match String::from_utf8(bytes) {
            Ok(text) => Ok(text),
            Err(e) => Ok(String::from_utf8_lossy(e.as_bytes()).into_owned()),
        }
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), PipelineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
        }
        fs::write(path, contents).map_err(|e| PipelineError::io(path, e))
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), PipelineError> {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
        }
        fs::rename(from, to).map_err(|e| PipelineError::io(from, e))
    }

    fn delete(&self, path: &Path) -> Result<bool, PipelineError> {
        let metadata = match fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(PipelineError::io(path, e)),
        };
        let result = if metadata.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        result.map_err(|e| PipelineError::io(path, e))?;
        Ok(true)
    }
}

/// Checks if a file name marks bookkeeping rather than data (`_SUCCESS`, `.crc`, ...).
fn is_marker(name: &OsStr) -> bool {
    name.to_str()
        .is_some_and(|s| s.starts_with('_') || s.starts_with('.'))
}

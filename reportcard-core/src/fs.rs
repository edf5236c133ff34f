//! Filesystem abstractions used for source enumeration.

use std::path::{Path, PathBuf};

use crate::error::{ReportCardError, Result};

/// Abstraction over filesystem access for testability.
#[cfg_attr(test, mockall::automock)]
pub trait FileSystem {
    /// List files under `root`, not descending into hidden directories or
    /// directories whose name is in `skip_dirs`.
    fn list_files(&self, root: &Path, skip_dirs: &[String]) -> Result<Vec<PathBuf>>;
    /// Read a file into a string.
    fn read_to_string(&self, path: &Path) -> Result<String>;
}

/// Default filesystem implementation backed by `std::fs`.
#[derive(Debug, Default, Clone)]
pub struct StdFileSystem;

impl StdFileSystem {
    /// Create a new standard filesystem adapter.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for StdFileSystem {
    fn list_files(&self, root: &Path, skip_dirs: &[String]) -> Result<Vec<PathBuf>> {
        if !root.is_dir() {
            return Err(ReportCardError::InvalidDirectory(root.to_path_buf()));
        }
        let mut files = Vec::new();
        let mut pending = vec![root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            for entry in std::fs::read_dir(&dir)? {
                let entry = entry?;
                let path = entry.path();
                if is_hidden(&path) {
                    continue;
                }
                let file_type = entry.file_type()?;
                if file_type.is_dir() {
                    if !is_skipped(&path, skip_dirs) {
                        pending.push(path);
                    }
                } else if file_type.is_file() {
                    files.push(path);
                }
            }
        }

        files.sort();
        Ok(files)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        Ok(std::fs::read_to_string(path)?)
    }
}

fn is_hidden(path: &Path) -> bool {
    file_name(path).starts_with('.')
}

fn is_skipped(path: &Path, skip_dirs: &[String]) -> bool {
    let name = file_name(path);
    skip_dirs.iter().any(|skip| *skip == name)
}

fn file_name(path: &Path) -> &str {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
}

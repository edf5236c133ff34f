//! Source file enumeration for an evaluation target.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::debug;
use tokei::{Config, LanguageType};

use crate::check::Target;
use crate::error::{ReportCardError, Result};
use crate::fs::FileSystem;

/// Directory names whose contents are third-party code.
pub const VENDOR_DIRS: &[&str] = &["vendor", "Godeps", "third_party"];

/// Filename suffixes of machine-generated sources.
pub const GENERATED_SUFFIXES: &[&str] = &[".pb.go", ".pb.gw.go", ".generated.go", "bindata.go"];

/// Files selected for analysis.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceFiles {
    /// Source files to hand to the checks.
    pub files: Vec<PathBuf>,
    /// Files dropped because they are generated.
    pub skipped_generated: Vec<PathBuf>,
}

impl SourceFiles {
    /// Bind the selected files to `root` as an evaluation target.
    pub fn into_target(self, root: impl Into<PathBuf>) -> Target {
        Target::new(root, self.files)
    }
}

/// Walks a checkout and keeps the files written in the configured languages.
pub struct SourceInspector<F: FileSystem> {
    fs: F,
    config: Config,
    languages: Vec<LanguageType>,
}

impl<F: FileSystem> SourceInspector<F> {
    /// Create an inspector that selects Go sources.
    pub fn new(fs: F) -> Self {
        Self::with_languages(fs, vec![LanguageType::Go])
    }

    /// Create an inspector that selects the given languages.
    pub fn with_languages(fs: F, languages: Vec<LanguageType>) -> Self {
        Self {
            fs,
            config: Config::default(),
            languages,
        }
    }

    /// Enumerate analyzable files under `root`.
    pub fn inspect(&self, root: &Path) -> Result<SourceFiles> {
        let skip: Vec<String> = VENDOR_DIRS.iter().map(|dir| dir.to_string()).collect();
        let mut selected = SourceFiles::default();

        for path in self.fs.list_files(root, &skip)? {
            let Some(language) = LanguageType::from_path(&path, &self.config) else {
                continue;
            };
            if !self.languages.contains(&language) {
                continue;
            }
            if is_generated_file(&path) || self.has_generated_header(&path)? {
                selected.skipped_generated.push(path);
                continue;
            }
            selected.files.push(path);
        }

        debug!(
            "{}: {} source file(s), {} generated",
            root.display(),
            selected.files.len(),
            selected.skipped_generated.len()
        );
        Ok(selected)
    }

    /// Enumerate `root` and fail when nothing is left to analyze.
    pub fn target(&self, root: &Path) -> Result<Target> {
        let selected = self.inspect(root)?;
        if selected.files.is_empty() {
            return Err(ReportCardError::NoFiles);
        }
        Ok(selected.into_target(root))
    }

    // Go marks generated files with a `// Code generated ... DO NOT EDIT.` line.
    // Such a header is always UTF-8, so undecodable files are plain sources.
    fn has_generated_header(&self, path: &Path) -> Result<bool> {
        let contents = match self.fs.read_to_string(path) {
            Ok(contents) => contents,
            Err(ReportCardError::Io(err)) if err.kind() == ErrorKind::InvalidData => {
                debug!("{}: not UTF-8, assuming hand-written", path.display());
                return Ok(false);
            }
            Err(err) => return Err(err),
        };
        Ok(contents
            .lines()
            .take_while(|line| !line.trim_start().starts_with("package "))
            .any(|line| line.starts_with("// Code generated") && line.contains("DO NOT EDIT")))
    }
}

/// Whether `path` names a generated source by its suffix.
pub fn is_generated_file(path: &Path) -> bool {
    let name = path.to_string_lossy();
    GENERATED_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

// SPDX-License-Identifier: Apache-2.0

//! File discovery strategies.
//!
//! A finder produces the current list of files to tail. Two strategies are
//! available, one per [`Selection`] variant: shell-glob expansion and a
//! recursive directory walk. Both yield plain files only, since a directory
//! reaching the reader would fail an entire pass with EISDIR.

use std::path::PathBuf;

use glob::glob;
use walkdir::WalkDir;

use crate::config::Selection;
use crate::error::{Error, Result};

/// Produces the current set of files to tail.
pub trait FileFinder {
    fn find_files(&self) -> Result<Vec<PathBuf>>;
}

/// Finds files by re-evaluating a shell-glob pattern.
#[derive(Debug, Clone)]
pub struct GlobFinder {
    pattern: String,
}

impl GlobFinder {
    /// Create a finder, validating the pattern up front so a typo fails at
    /// startup rather than on every refresh.
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        glob::Pattern::new(&pattern).map_err(|e| Error::InvalidGlob(e.to_string()))?;

        Ok(Self { pattern })
    }
}

impl FileFinder for GlobFinder {
    fn find_files(&self) -> Result<Vec<PathBuf>> {
        let matches = glob(&self.pattern).map_err(|e| Error::InvalidGlob(e.to_string()))?;

        let mut paths = Vec::new();
        for entry in matches {
            let path = entry.map_err(|e| Error::Io(e.into_error()))?;
            if path.is_dir() {
                continue;
            }
            paths.push(path);
        }

        Ok(paths)
    }
}

/// Finds files by walking a directory tree.
#[derive(Debug, Clone)]
pub struct WalkFinder {
    root: PathBuf,
}

impl WalkFinder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileFinder for WalkFinder {
    fn find_files(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            let path = entry.into_path();
            if path.is_dir() {
                continue;
            }
            paths.push(path);
        }

        Ok(paths)
    }
}

/// Build the finder for a configured selection.
pub fn create_finder(selection: &Selection) -> Result<Box<dyn FileFinder + Send + Sync>> {
    match selection {
        Selection::Glob(pattern) => Ok(Box::new(GlobFinder::new(pattern.clone())?)),
        Selection::Walk(root) => Ok(Box::new(WalkFinder::new(root.clone()))),
    }
}

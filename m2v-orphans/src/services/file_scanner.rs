//! Recording file scanner
//!
//! Lists regular files directly under a recordings directory whose names
//! match a glob. Symlinks are followed and judged by their targets.

use glob::Pattern;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Recording scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Filename glob does not compile
    #[error("Invalid filename pattern {0}: {1}")]
    InvalidPattern(String, String),

    /// Cannot access file
    #[error("File access error {0}: {1}")]
    FileAccessError(PathBuf, String),
}

/// Scanner for one directory level of recording files
pub struct FileScanner {
    pattern: Pattern,
}

impl FileScanner {
    /// Create a scanner matching filenames against `pattern` (e.g. `*.mpg`)
    pub fn new(pattern: &str) -> Result<Self, ScanError> {
        let pattern = Pattern::new(pattern)
            .map_err(|e| ScanError::InvalidPattern(pattern.to_string(), e.to_string()))?;
        Ok(Self { pattern })
    }

    /// Matching regular files in `root_path`, sorted by filename
    pub fn scan(&self, root_path: &Path) -> Result<Vec<PathBuf>, ScanError> {
        if !root_path.exists() {
            return Err(ScanError::PathNotFound(root_path.to_path_buf()));
        }

        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory(root_path.to_path_buf()));
        }

        let walker = WalkDir::new(root_path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        let mut files = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    if self.matches(&entry.file_name().to_string_lossy()) {
                        files.push(entry.path().to_path_buf());
                    }
                }
                Err(e) => {
                    // Dangling symlinks land here
                    tracing::warn!("Error accessing entry: {}", e);
                }
            }
        }

        tracing::debug!(
            directory = %root_path.display(),
            pattern = %self.pattern,
            matched = files.len(),
            "Recording scan complete"
        );

        Ok(files)
    }

    /// True if a bare filename matches the scanner's glob
    pub fn matches(&self, filename: &str) -> bool {
        self.pattern.matches(filename)
    }

    /// Size in bytes, following symlinks
    pub fn file_size(&self, path: &Path) -> Result<u64, ScanError> {
        let metadata = std::fs::metadata(path)
            .map_err(|e| ScanError::FileAccessError(path.to_path_buf(), e.to_string()))?;
        Ok(metadata.len())
    }
}

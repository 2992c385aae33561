use crate::config::ScanConfig;
use crate::error::{PdfConvError, Result};
use crate::scanner::file_filter::FileFilter;
use crate::ui::format_bytes;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone)]
pub struct PdfFile {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
    pub modified: SystemTime,
}

impl PdfFile {
    pub fn new(path: PathBuf, size: u64, modified: SystemTime) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            path,
            file_name,
            size,
            modified,
        }
    }

    pub fn format_size(&self) -> String {
        format_bytes(self.size)
    }
}

/// Lists the direct children of a directory that look like source PDFs.
pub struct PdfScanner {
    filter: FileFilter,
}

impl PdfScanner {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            filter: FileFilter::new(config),
        }
    }

    /// Non-recursive. An empty result is not an error.
    pub fn scan_directory<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PdfFile>> {
        let dir = dir.as_ref();

        if !dir.exists() {
            return Err(PdfConvError::InputNotFound {
                path: dir.display().to_string(),
            });
        }

        if !dir.is_dir() {
            return Err(PdfConvError::InvalidPath {
                path: format!("{} is not a directory", dir.display()),
            });
        }

        // Fail early when the directory itself is unreadable.
        std::fs::read_dir(dir).map_err(|e| crate::error::io_error_for(dir, e))?;

        let mut files = Vec::new();

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false);

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    log::warn!("Skipping unreadable entry: {}", err);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            match self.process_file(&entry) {
                Ok(Some(file)) => files.push(file),
                Ok(None) => {}
                Err(err) => {
                    log::warn!("Error reading {}: {}", entry.path().display(), err);
                }
            }
        }

        files.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        log::debug!(
            "Found {} .{} file(s) in {}",
            files.len(),
            self.filter.extension(),
            dir.display()
        );

        Ok(files)
    }

    fn process_file(&self, entry: &DirEntry) -> Result<Option<PdfFile>> {
        let path = entry.path();

        if !self.filter.is_source_file(path) {
            return Ok(None);
        }

        let metadata = entry.metadata()?;
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);

        Ok(Some(PdfFile::new(path.to_path_buf(), metadata.len(), modified)))
    }
}

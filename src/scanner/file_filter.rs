use crate::config::ScanConfig;
use regex::Regex;
use std::path::Path;

pub struct FileFilter {
    extension: String,
    exclude_patterns: Vec<Regex>,
}

impl FileFilter {
    pub fn new(config: &ScanConfig) -> Self {
        let exclude_patterns = config
            .exclude_patterns
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    log::warn!("Ignoring invalid exclude pattern '{}': {}", pattern, e);
                    None
                }
            })
            .collect();

        Self {
            extension: config.extension.trim_start_matches('.').to_lowercase(),
            exclude_patterns,
        }
    }

    /// Extension match is case-insensitive: `a.PDF` and `b.pdf` both count.
    pub fn is_source_file(&self, path: &Path) -> bool {
        let matches_extension = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.to_lowercase() == self.extension);

        if !matches_extension {
            return false;
        }

        match path.file_name().and_then(|s| s.to_str()) {
            Some(name) => !self.matches_any_pattern(name),
            None => false,
        }
    }

    pub fn matches_any_pattern(&self, text: &str) -> bool {
        self.exclude_patterns
            .iter()
            .any(|pattern| pattern.is_match(text))
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }
}

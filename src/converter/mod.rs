pub mod docx;
pub mod guard;
pub mod pdf_check;
pub mod xlsx;

pub use docx::DocxConverter;
pub use guard::{GuardDecision, OverwriteGuard, OverwritePrompt};
pub use pdf_check::check_pdf;
pub use xlsx::{Extraction, XlsxConverter};

use crate::error::{io_error_for, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    Docx,
    Xlsx,
}

impl TargetFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TargetFormat::Docx => "docx",
            TargetFormat::Xlsx => "xlsx",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TargetFormat::Docx => "Word (DOCX)",
            TargetFormat::Xlsx => "Excel (XLSX)",
        }
    }
}

/// Same directory and base name, only the extension replaced.
pub fn output_path_for(input: &Path, target: TargetFormat) -> PathBuf {
    input.with_extension(target.extension())
}

#[derive(Debug, Clone)]
pub struct ConversionJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub target: TargetFormat,
}

impl ConversionJob {
    pub fn new(input: impl Into<PathBuf>, target: TargetFormat) -> Self {
        let input = input.into();
        let output = output_path_for(&input, target);
        Self {
            input,
            output,
            target,
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn file_name(&self) -> String {
        self.input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.input.display().to_string())
    }

    pub fn output_name(&self) -> String {
        self.output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.output.display().to_string())
    }
}

/// What a successful conversion reports back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionOutcome {
    pub tables: Option<usize>,
    pub rows: Option<usize>,
    pub strategy: Option<String>,
}

pub trait Converter {
    fn target(&self) -> TargetFormat;
    fn convert(&self, job: &ConversionJob) -> Result<ConversionOutcome>;
}

/// Temporary file next to `output`, removed on drop unless persisted.
pub(crate) fn staging_file(output: &Path) -> Result<NamedTempFile> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let suffix = output
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    tempfile::Builder::new()
        .prefix(".pdfconv-")
        .suffix(&suffix)
        .tempfile_in(&dir)
        .map_err(|e| io_error_for(&dir, e))
}

pub(crate) fn persist(staging: NamedTempFile, output: &Path) -> Result<()> {
    staging
        .persist(output)
        .map_err(|e| io_error_for(output, e.error))?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_output_path_replaces_only_extension() {
        let input = Path::new("/data/reports/q1.final.PDF");
        assert_eq!(
            output_path_for(input, TargetFormat::Xlsx),
            PathBuf::from("/data/reports/q1.final.xlsx")
        );
        assert_eq!(
            output_path_for(Path::new("scan.pdf"), TargetFormat::Docx),
            PathBuf::from("scan.docx")
        );
    }

    #[test]
    fn test_job_names() {
        let job = ConversionJob::new("/in/report.pdf", TargetFormat::Docx);
        assert_eq!(job.file_name(), "report.pdf");
        assert_eq!(job.output_name(), "report.docx");

        let job = job.with_output("/out/custom.docx");
        assert_eq!(job.output, PathBuf::from("/out/custom.docx"));
    }

    #[test]
    fn test_staging_file_is_next_to_output() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("report.xlsx");

        let staging = staging_file(&output).unwrap();
        assert_eq!(staging.path().parent(), Some(temp_dir.path()));
        assert!(staging.path().to_string_lossy().ends_with(".xlsx"));

        std::fs::write(staging.path(), b"data").unwrap();
        persist(staging, &output).unwrap();
        assert_eq!(std::fs::read(&output).unwrap(), b"data");
    }

    #[test]
    fn test_dropped_staging_file_leaves_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("report.docx");
        {
            let staging = staging_file(&output).unwrap();
            std::fs::write(staging.path(), b"partial").unwrap();
        }
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }
}

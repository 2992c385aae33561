use crate::engines::{run_command, DocxEngine};
use anyhow::Context;
use std::ffi::OsStr;
use std::path::Path;

/// The `pdf2docx` command-line converter.
pub struct Pdf2DocxEngine {
    program: String,
}

impl Pdf2DocxEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Pdf2DocxEngine {
    fn default() -> Self {
        Self::new("pdf2docx")
    }
}

impl DocxEngine for Pdf2DocxEngine {
    fn name(&self) -> &str {
        "pdf2docx"
    }

    fn convert(&self, pdf: &Path, docx: &Path) -> anyhow::Result<()> {
        let args = [OsStr::new("convert"), pdf.as_os_str(), docx.as_os_str()];
        let output = run_command(&self.program, args)
            .with_context(|| format!("pdf2docx on {}", pdf.display()))?;

        // pdf2docx logs progress on stderr even when it succeeds.
        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            log::trace!("pdf2docx: {}", line);
        }

        Ok(())
    }
}

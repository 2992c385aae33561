use crate::engines::{run_command, FallbackExtractor};
use crate::tables::{tables_from_layout_text, RawTable};
use anyhow::Context;
use std::ffi::OsStr;
use std::path::Path;

/// Fallback extractor built on `pdftotext -layout` from poppler-utils.
///
/// The layout mode keeps column alignment as runs of spaces, which
/// [`tables_from_layout_text`] splits back into cells.
pub struct PdftotextExtractor {
    program: String,
}

impl PdftotextExtractor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn layout_text(&self, pdf: &Path) -> anyhow::Result<String> {
        let args = [
            OsStr::new("-layout"),
            OsStr::new("-enc"),
            OsStr::new("UTF-8"),
            pdf.as_os_str(),
            OsStr::new("-"),
        ];
        let output = run_command(&self.program, args)
            .with_context(|| format!("pdftotext on {}", pdf.display()))?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self::new("pdftotext")
    }
}

impl FallbackExtractor for PdftotextExtractor {
    fn name(&self) -> &str {
        "pdftotext"
    }

    fn extract(&self, pdf: &Path) -> anyhow::Result<Vec<RawTable>> {
        let text = self.layout_text(pdf)?;
        let tables = tables_from_layout_text(&text);
        log::debug!(
            "pdftotext found {} table-like block(s) in {}",
            tables.len(),
            pdf.display()
        );
        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::EngineError;

    #[test]
    fn test_missing_binary() {
        let extractor = PdftotextExtractor::new("pdfconv-missing-pdftotext-xyz");
        let err = extractor.extract(Path::new("in.pdf")).unwrap_err();
        assert!(EngineError::is_not_found(&err));
        assert_eq!(extractor.name(), "pdftotext");
    }
}

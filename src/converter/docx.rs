use crate::converter::{
    check_pdf, persist, staging_file, ConversionJob, ConversionOutcome, Converter, TargetFormat,
};
use crate::engines::{DocxEngine, EngineError};
use crate::error::{PdfConvError, Result};
use std::path::Path;

/// One PDF in, one DOCX out, through an external engine.
pub struct DocxConverter {
    engine: Box<dyn DocxEngine>,
}

impl DocxConverter {
    pub fn new(engine: Box<dyn DocxEngine>) -> Self {
        Self { engine }
    }
}

impl Converter for DocxConverter {
    fn target(&self) -> TargetFormat {
        TargetFormat::Docx
    }

    fn convert(&self, job: &ConversionJob) -> Result<ConversionOutcome> {
        check_pdf(&job.input)?;

        let staging = staging_file(&job.output)?;
        log::debug!(
            "Converting {} via {} into {}",
            job.input.display(),
            self.engine.name(),
            staging.path().display()
        );

        self.engine
            .convert(&job.input, staging.path())
            .map_err(|e| classify_failure(&job.input, self.engine.name(), e))?;

        let size = std::fs::metadata(staging.path())
            .map(|m| m.len())
            .unwrap_or(0);
        if size == 0 {
            return Err(PdfConvError::EmptyOutput {
                path: job.output.display().to_string(),
            });
        }

        persist(staging, &job.output)?;
        log::info!("Wrote {} ({} bytes)", job.output.display(), size);

        Ok(ConversionOutcome::default())
    }
}

/// Sorts an engine failure into the error the user can act on.
fn classify_failure(pdf: &Path, engine: &str, error: anyhow::Error) -> PdfConvError {
    if EngineError::is_not_found(&error) {
        return PdfConvError::EngineNotFound {
            engine: engine.to_string(),
        };
    }

    let message = format!("{:#}", error);
    let lower = message.to_lowercase();
    let path = pdf.display().to_string();

    if lower.contains("password") || lower.contains("encrypted") {
        PdfConvError::PasswordProtected { path }
    } else if lower.contains("corrupt") || lower.contains("invalid") || lower.contains("damaged") {
        PdfConvError::InvalidPdf {
            path,
            reason: "the converter reported a corrupted or damaged file".to_string(),
        }
    } else if lower.contains("unsupported") {
        PdfConvError::UnsupportedPdf { path }
    } else {
        PdfConvError::Engine {
            engine: engine.to_string(),
            message,
        }
    }
}

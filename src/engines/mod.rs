//! Adapters around the external conversion tools.
//!
//! Every engine runs as a child process. Failures are reported as
//! [`anyhow::Error`] values wrapping an [`EngineError`], so callers can add
//! context freely and still classify the root cause with `downcast_ref`.

pub mod pdf2docx;
pub mod pdftotext;
pub mod preflight;
pub mod tabula;

pub use pdf2docx::Pdf2DocxEngine;
pub use pdftotext::PdftotextExtractor;
pub use preflight::{DependencyCheck, DependencyReport, Preflight};
pub use tabula::TabulaEngine;

use crate::tables::RawTable;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Output};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{program} not found")]
    NotFound { program: String },

    #[error("{program} exited with code {code}: {stderr}")]
    Failed {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("could not run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected output from {program}: {message}")]
    BadOutput { program: String, message: String },
}

impl EngineError {
    pub fn is_not_found(error: &anyhow::Error) -> bool {
        matches!(
            error.downcast_ref::<EngineError>(),
            Some(EngineError::NotFound { .. })
        )
    }
}

/// One pass of the primary table engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Area guessing with the engine's default detection
    Default,
    /// Ruled-line detection for bordered tables
    Lattice,
    /// Whitespace detection for borderless tables
    Stream,
    /// No area guessing and no header row
    Text,
}

impl Strategy {
    pub fn default_order() -> Vec<Strategy> {
        vec![
            Strategy::Default,
            Strategy::Lattice,
            Strategy::Stream,
            Strategy::Text,
        ]
    }

    /// Name recorded on the conversion result.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Default => "tabula-default",
            Strategy::Lattice => "tabula-lattice",
            Strategy::Stream => "tabula-stream",
            Strategy::Text => "tabula-text",
        }
    }

    pub fn assumes_header(&self) -> bool {
        !matches!(self, Strategy::Text)
    }
}

/// Primary, strategy-aware table extraction.
pub trait TableEngine {
    fn name(&self) -> &str;
    fn extract(&self, pdf: &Path, strategy: Strategy) -> anyhow::Result<Vec<RawTable>>;
}

/// Secondary extraction used when every strategy came back empty.
pub trait FallbackExtractor {
    fn name(&self) -> &str;
    fn extract(&self, pdf: &Path) -> anyhow::Result<Vec<RawTable>>;
}

/// PDF to DOCX conversion.
pub trait DocxEngine {
    fn name(&self) -> &str;
    fn convert(&self, pdf: &Path, docx: &Path) -> anyhow::Result<()>;
}

/// Runs `program` to completion and returns its output if it exited cleanly.
pub(crate) fn run_command<I, S>(program: &str, args: I) -> Result<Output, EngineError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command.args(args);
    log::debug!("Running {:?}", command);

    let output = command.output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            EngineError::NotFound {
                program: program.to_string(),
            }
        } else {
            EngineError::Spawn {
                program: program.to_string(),
                source: e,
            }
        }
    })?;

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(EngineError::Failed {
            program: program.to_string(),
            code,
            stderr,
        });
    }

    Ok(output)
}

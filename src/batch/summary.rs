use crate::converter::{ConversionJob, ConversionOutcome, TargetFormat};
use crate::error::{PdfConvError, Result, UserFriendlyError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionStatus {
    Success,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversionResult {
    pub file_name: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub status: ConversionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    pub duration_ms: u64,
}

impl ConversionResult {
    fn base(job: &ConversionJob, status: ConversionStatus, duration: Duration) -> Self {
        Self {
            file_name: job.file_name(),
            input: job.input.clone(),
            output: job.output.clone(),
            status,
            message: None,
            suggestion: None,
            tables: None,
            rows: None,
            strategy: None,
            duration_ms: duration.as_millis() as u64,
        }
    }

    pub fn success(job: &ConversionJob, outcome: ConversionOutcome, duration: Duration) -> Self {
        Self {
            tables: outcome.tables,
            rows: outcome.rows,
            strategy: outcome.strategy,
            ..Self::base(job, ConversionStatus::Success, duration)
        }
    }

    pub fn failed(job: &ConversionJob, error: &PdfConvError, duration: Duration) -> Self {
        Self {
            message: Some(error.user_message()),
            suggestion: error.suggestion(),
            ..Self::base(job, ConversionStatus::Failed, duration)
        }
    }

    pub fn skipped(job: &ConversionJob, reason: &str) -> Self {
        Self {
            message: Some(reason.to_string()),
            ..Self::base(job, ConversionStatus::Skipped, Duration::ZERO)
        }
    }
}

/// Tally of one run. `successful + failed + skipped == total` always holds.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub target: TargetFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    pub success_rate: f64,
    pub cancelled: bool,
    pub results: Vec<ConversionResult>,
}

impl RunSummary {
    pub fn new(target: TargetFormat, directory: Option<PathBuf>) -> Self {
        Self {
            target,
            directory,
            started_at: Utc::now(),
            duration_ms: 0,
            total: 0,
            successful: 0,
            failed: 0,
            skipped: 0,
            success_rate: 0.0,
            cancelled: false,
            results: Vec::new(),
        }
    }

    pub fn record(&mut self, result: ConversionResult) {
        match result.status {
            ConversionStatus::Success => self.successful += 1,
            ConversionStatus::Failed => self.failed += 1,
            ConversionStatus::Skipped => self.skipped += 1,
        }
        self.total += 1;
        self.success_rate = self.compute_success_rate();
        self.results.push(result);
    }

    pub fn finish(&mut self, duration: Duration) {
        self.duration_ms = duration.as_millis() as u64;
    }

    fn compute_success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.successful as f64 / self.total as f64 * 100.0
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &ConversionResult> {
        self.results
            .iter()
            .filter(|r| r.status == ConversionStatus::Failed)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn write_report<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json())
            .map_err(|e| crate::error::io_error_for(path, e))?;
        log::info!("Wrote run report to {}", path.display());
        Ok(())
    }
}

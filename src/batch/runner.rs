use crate::batch::{ConversionResult, RunSummary};
use crate::converter::{ConversionJob, Converter, GuardDecision, OverwriteGuard};
use crate::ui::progress::{finish_progress_with_summary, update_file_progress};
use crate::ui::{GracefulShutdown, OutputFormatter, OutputMode, ProgressAwareOutput, ProgressManager};
use indicatif::ProgressBar;
use std::path::PathBuf;
use std::time::Instant;

const CANCELLED: &str = "cancelled";
const KEPT_EXISTING: &str = "output exists, not overwritten";

/// Drives a list of jobs through one converter, strictly one file at a time.
/// A failing file is recorded and the loop moves on; only a shutdown
/// request stops it early.
pub struct BatchRunner<'a> {
    converter: &'a dyn Converter,
    guard: &'a OverwriteGuard,
    shutdown: &'a GracefulShutdown,
    formatter: &'a OutputFormatter,
    progress: &'a ProgressManager,
}

impl<'a> BatchRunner<'a> {
    pub fn new(
        converter: &'a dyn Converter,
        guard: &'a OverwriteGuard,
        shutdown: &'a GracefulShutdown,
        formatter: &'a OutputFormatter,
        progress: &'a ProgressManager,
    ) -> Self {
        Self {
            converter,
            guard,
            shutdown,
            formatter,
            progress,
        }
    }

    pub fn run(&self, jobs: &[ConversionJob], directory: Option<PathBuf>) -> RunSummary {
        let start_time = Instant::now();
        let mut summary = RunSummary::new(self.converter.target(), directory);
        let total = jobs.len();

        self.formatter.print_file_count(total);
        if total == 0 {
            summary.finish(start_time.elapsed());
            return summary;
        }

        let pb = self.progress.create_file_progress(total as u64);
        let output = ProgressAwareOutput::new(self.formatter, Some(self.progress));
        let print_lines = wants_progress_lines(&pb, self.formatter.mode());

        for (index, job) in jobs.iter().enumerate() {
            if self.shutdown.check_shutdown().is_err() {
                log::info!("Shutdown requested, skipping {} remaining file(s)", total - index);
                for remaining in &jobs[index..] {
                    summary.record(ConversionResult::skipped(remaining, CANCELLED));
                }
                summary.cancelled = true;
                break;
            }

            let file_name = job.file_name();
            update_file_progress(&pb, index, &file_name);
            if print_lines {
                self.formatter.print_file_progress(index + 1, total, &file_name);
            }

            let result = self.process(job);
            output.result(&result);
            summary.record(result);
            pb.set_position((index + 1) as u64);
        }

        summary.finish(start_time.elapsed());
        if summary.cancelled {
            pb.abandon_with_message("Cancelled");
        } else {
            finish_progress_with_summary(
                &pb,
                &format!("{} file(s) processed", summary.total),
                start_time.elapsed(),
            );
        }
        self.progress.clear();

        summary
    }

    fn process(&self, job: &ConversionJob) -> ConversionResult {
        let decision = self.progress.suspend(|| self.guard.check(&job.output));
        if decision == GuardDecision::Skip {
            log::info!("Keeping existing {}", job.output.display());
            return ConversionResult::skipped(job, KEPT_EXISTING);
        }

        let started = Instant::now();
        match self.converter.convert(job) {
            Ok(outcome) => ConversionResult::success(job, outcome, started.elapsed()),
            Err(e) => {
                log::debug!("Conversion of {} failed: {:?}", job.input.display(), e);
                ConversionResult::failed(job, &e, started.elapsed())
            }
        }
    }
}

/// Indicatif hides the bar when stderr is not a terminal or progress is
/// switched off; plain per-file lines stand in for it then.
fn wants_progress_lines(pb: &ProgressBar, mode: OutputMode) -> bool {
    pb.is_hidden() && mode != OutputMode::Json
}

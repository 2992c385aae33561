pub mod batch;
pub mod cli;
pub mod config;
pub mod converter;
pub mod engines;
pub mod error;
pub mod scanner;
pub mod tables;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, Command, OutputFormat};
pub use config::{CliOverrides, Config, OverwritePolicy, SheetLayout};
pub use error::{PdfConvError, Result, UserFriendlyError};

// Core functionality re-exports
pub use batch::{BatchRunner, ConversionResult, ConversionStatus, RunSummary};
pub use converter::{
    ConversionJob, ConversionOutcome, Converter, DocxConverter, OverwriteGuard, OverwritePrompt,
    TargetFormat, XlsxConverter,
};
pub use engines::{DependencyReport, Preflight, Strategy};
pub use scanner::{PdfFile, PdfScanner};
pub use ui::{DialoguerPrompt, GracefulShutdown, OutputFormatter, OutputMode, ProgressManager};

use engines::preflight::{PDFTOTEXT, TABULA};
use engines::{Pdf2DocxEngine, PdftotextExtractor, TabulaEngine};
use std::path::{Path, PathBuf};

/// Where the jobs of a run come from.
#[derive(Debug, Clone)]
pub enum InputSelection {
    /// Every matching PDF directly inside a directory
    Directory(PathBuf),
    /// One PDF, optionally with an explicit output path
    File {
        input: PathBuf,
        output: Option<PathBuf>,
    },
}

impl InputSelection {
    pub fn from_cli(cli: &Cli) -> Self {
        let common = cli.common();
        match common.file {
            Some(ref file) => InputSelection::File {
                input: file.clone(),
                output: common.output.clone(),
            },
            None => InputSelection::Directory(common.dir.clone()),
        }
    }

    pub fn directory(&self) -> Option<PathBuf> {
        match self {
            InputSelection::Directory(dir) => Some(dir.clone()),
            InputSelection::File { .. } => None,
        }
    }
}

/// Main library interface: one conversion target, one configuration.
pub struct PdfConv {
    config: Config,
    target: TargetFormat,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
}

impl PdfConv {
    pub fn new(
        config: Config,
        target: TargetFormat,
        output_mode: OutputMode,
        verbose: u8,
        quiet: bool,
    ) -> Result<Self> {
        let shutdown = GracefulShutdown::new()?;
        Ok(Self::with_shutdown(
            config,
            target,
            output_mode,
            verbose,
            quiet,
            shutdown,
        ))
    }

    /// Same as [`PdfConv::new`] without installing a Ctrl+C handler.
    pub fn new_for_test(
        config: Config,
        target: TargetFormat,
        output_mode: OutputMode,
        verbose: u8,
        quiet: bool,
    ) -> Self {
        Self::with_shutdown(
            config,
            target,
            output_mode,
            verbose,
            quiet,
            GracefulShutdown::new_for_test(),
        )
    }

    fn with_shutdown(
        config: Config,
        target: TargetFormat,
        output_mode: OutputMode,
        verbose: u8,
        quiet: bool,
        shutdown: GracefulShutdown,
    ) -> Self {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);

        Self {
            config,
            target,
            output_formatter,
            progress_manager,
            shutdown,
        }
    }

    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        Self::new(
            config,
            cli_args.target(),
            cli_args.output_mode(),
            cli_args.verbosity_level(),
            cli_args.common().quiet,
        )
    }

    /// Probes the external tools for this target. Fails with
    /// `MissingDependency` before any file is looked at.
    pub async fn preflight(&self) -> Result<DependencyReport> {
        let spinner = self.progress_manager.create_spinner("Checking dependencies");
        let report = Preflight::new(&self.config.engines, self.config.probe_timeout_duration())
            .check(self.target, self.config.xlsx.secondary_fallback)
            .await;
        spinner.finish_and_clear();

        self.output_formatter.print_dependency_report(&report);
        report.into_result()
    }

    pub fn plan_jobs(&self, selection: &InputSelection) -> Result<Vec<ConversionJob>> {
        match selection {
            InputSelection::File { input, output } => {
                if !input.exists() {
                    return Err(PdfConvError::InputNotFound {
                        path: input.display().to_string(),
                    });
                }
                if !input.is_file() {
                    return Err(PdfConvError::InvalidPath {
                        path: input.display().to_string(),
                    });
                }

                let job = ConversionJob::new(input.clone(), self.target);
                let job = match output {
                    Some(out) if out.is_dir() => {
                        let name = job.output_name();
                        job.with_output(out.join(name))
                    }
                    Some(out) => job.with_output(out.clone()),
                    None => job,
                };
                Ok(vec![job])
            }
            InputSelection::Directory(dir) => {
                let files = PdfScanner::new(&self.config.scan).scan_directory(dir)?;
                for file in &files {
                    self.output_formatter
                        .debug(&format!("{} ({})", file.file_name, file.format_size()));
                }
                Ok(files
                    .into_iter()
                    .map(|file| ConversionJob::new(file.path, self.target))
                    .collect())
            }
        }
    }

    /// Wires the real engines for this target, honouring what pre-flight found.
    pub fn build_converter(&self, report: &DependencyReport) -> Result<Box<dyn Converter>> {
        let engines = &self.config.engines;

        match self.target {
            TargetFormat::Docx => Ok(Box::new(DocxConverter::new(Box::new(
                Pdf2DocxEngine::new(engines.pdf2docx.clone()),
            )))),
            TargetFormat::Xlsx => {
                let jar = engines
                    .tabula_jar
                    .clone()
                    .ok_or_else(|| PdfConvError::MissingDependency {
                        missing: vec![TABULA.to_string()],
                    })?;
                let primary = TabulaEngine::new(engines.java.clone(), jar);

                let mut converter = XlsxConverter::new(Box::new(primary), &self.config.xlsx)
                    .with_validation(self.config.output.validate_output);

                if self.config.xlsx.secondary_fallback && report.has(PDFTOTEXT) {
                    converter = converter.with_fallback(Box::new(PdftotextExtractor::new(
                        engines.pdftotext.clone(),
                    )));
                } else if self.config.xlsx.secondary_fallback {
                    log::warn!("pdftotext unavailable, secondary extraction disabled");
                }

                Ok(Box::new(converter))
            }
        }
    }

    /// Runs planned jobs through `converter`, asking `guard` before each
    /// overwrite.
    pub fn run_with(
        &self,
        converter: &dyn Converter,
        guard: &OverwriteGuard,
        jobs: &[ConversionJob],
        directory: Option<PathBuf>,
    ) -> RunSummary {
        BatchRunner::new(
            converter,
            guard,
            &self.shutdown,
            &self.output_formatter,
            &self.progress_manager,
        )
        .run(jobs, directory)
    }

    /// Full pipeline: pre-flight, discovery, conversion. Engines are blocking
    /// child processes, so the batch leaves the async worker for its duration.
    /// Needs the multi-threaded runtime.
    pub async fn convert(&self, selection: &InputSelection) -> Result<RunSummary> {
        self.shutdown.check_shutdown()?;

        let report = self.preflight().await?;
        let jobs = self.plan_jobs(selection)?;
        let converter = self.build_converter(&report)?;
        let guard = OverwriteGuard::new(self.config.output.overwrite, Box::new(DialoguerPrompt));

        self.output_formatter.debug(&format!(
            "Converting to {} with overwrite policy {:?}",
            self.target.label(),
            guard.policy()
        ));

        let summary = tokio::task::block_in_place(|| {
            self.run_with(converter.as_ref(), &guard, &jobs, selection.directory())
        });
        Ok(summary)
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let path = output_path.as_ref();
        std::fs::write(path, Config::create_sample_config())
            .map_err(|e| error::io_error_for(path, e))?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn target(&self) -> TargetFormat {
        self.target
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    pub fn is_running(&self) -> bool {
        self.shutdown.is_running()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.request_shutdown();
    }

    pub fn handle_error(&self, error: &PdfConvError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

use clap::Parser;
use pdfconv::{
    Cli, InputSelection, OutputFormatter, PdfConv, PdfConvError, RunSummary, UserFriendlyError,
};
use std::process;

#[tokio::main]
async fn main() {
    let exit_code = run().await;
    process::exit(exit_code);
}

async fn run() -> i32 {
    let cli = Cli::parse();
    setup_logging(cli.verbosity_level());

    if cli.common().generate_config {
        return handle_generate_config(&cli);
    }

    let app = match PdfConv::from_cli(&cli) {
        Ok(app) => app,
        Err(e) => {
            print_startup_error(&cli, &e);
            return exit_code_for(&e);
        }
    };

    let selection = InputSelection::from_cli(&cli);

    if cli.common().dry_run {
        return handle_dry_run(&app, &selection).await;
    }

    match app.convert(&selection).await {
        Ok(summary) => {
            app.output_formatter().print_run_summary(&summary);

            if let Some(ref report_path) = cli.common().report {
                if let Err(e) = summary.write_report(report_path) {
                    app.handle_error(&e);
                }
            }

            summary_exit_code(&summary)
        }
        Err(e) => {
            app.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn summary_exit_code(summary: &RunSummary) -> i32 {
    if summary.cancelled {
        130
    } else if summary.has_failures() {
        2
    } else {
        0
    }
}

fn exit_code_for(error: &PdfConvError) -> i32 {
    match error {
        PdfConvError::Cancelled => 130, // Interrupted (SIGINT)
        PdfConvError::MissingDependency { .. } => 3,
        PdfConvError::InputNotFound { .. } | PdfConvError::InvalidPath { .. } => 4,
        PdfConvError::Config { .. } => 5,
        _ => 1,
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .common()
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "pdfconv.toml".to_string());

    match PdfConv::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  pdfconv xlsx --config {}", config_path);
            println!("\nEdit the file to customize settings for your needs.");
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

async fn handle_dry_run(app: &PdfConv, selection: &InputSelection) -> i32 {
    let formatter = app.output_formatter();

    formatter.info("DRY RUN MODE - No files will be converted");
    formatter.print_separator();

    if let Err(e) = app.preflight().await {
        app.handle_error(&e);
        return exit_code_for(&e);
    }
    formatter.success("All required dependencies are available");

    let config = app.config();
    formatter.info("Configuration that would be used:");
    println!("  Target: {}", app.target().label());
    println!("  Overwrite policy: {:?}", config.output.overwrite);
    if app.target() == pdfconv::TargetFormat::Xlsx {
        let strategies: Vec<&str> = config.xlsx.strategies.iter().map(|s| s.name()).collect();
        println!("  Strategies: {}", strategies.join(", "));
        println!("  Secondary fallback: {}", config.xlsx.secondary_fallback);
        println!("  Sheet layout: {:?}", config.xlsx.sheet_layout);
    }
    formatter.print_separator();

    let jobs = match app.plan_jobs(selection) {
        Ok(jobs) => jobs,
        Err(e) => {
            app.handle_error(&e);
            return exit_code_for(&e);
        }
    };

    formatter.print_file_count(jobs.len());
    for job in &jobs {
        let marker = if job.output.exists() { " (exists)" } else { "" };
        println!(
            "  {} -> {}{}",
            job.input.display(),
            job.output.display(),
            marker
        );
    }

    formatter.print_separator();
    formatter.success("Dry run completed successfully");
    formatter.info("Run without --dry-run to perform the conversion");

    0
}

fn print_startup_error(cli: &Cli, error: &PdfConvError) {
    let formatter = OutputFormatter::new(cli.output_mode(), 0, false);
    formatter.print_user_friendly_error(error);
}

/// `-v` raises the crate's log level to info, `-vv` to debug. `RUST_LOG`
/// wins when set.
fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };

    let mut builder = env_logger::Builder::new();
    builder
        .filter_module("pdfconv", level)
        .format_timestamp(None)
        .parse_env("RUST_LOG");
    // A second init (tests) is harmless
    builder.try_init().ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfconv::{Config, OutputMode, TargetFormat};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_generate_config_command() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let cli = Cli::try_parse_from([
            "pdfconv",
            "xlsx",
            "--generate-config",
            "--config",
            config_path.to_str().unwrap(),
        ])
        .unwrap();

        assert_eq!(handle_generate_config(&cli), 0);
        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[xlsx]"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code_for(&PdfConvError::Cancelled), 130);
        assert_eq!(
            exit_code_for(&PdfConvError::MissingDependency {
                missing: vec!["Java runtime".to_string()]
            }),
            3
        );
        assert_eq!(
            exit_code_for(&PdfConvError::InputNotFound {
                path: "x.pdf".to_string()
            }),
            4
        );
        assert_eq!(
            exit_code_for(&PdfConvError::Config {
                message: "bad".to_string()
            }),
            5
        );
        assert_eq!(
            exit_code_for(&PdfConvError::Workbook {
                message: "bad".to_string()
            }),
            1
        );
    }

    #[test]
    fn test_summary_exit_codes() {
        let mut summary = RunSummary::new(TargetFormat::Docx, None);
        assert_eq!(summary_exit_code(&summary), 0);

        summary.failed = 1;
        assert_eq!(summary_exit_code(&summary), 2);

        summary.cancelled = true;
        assert_eq!(summary_exit_code(&summary), 130);
    }

    #[tokio::test]
    async fn test_dry_run_with_missing_dependency() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.engines.pdf2docx = "/nonexistent/pdf2docx".to_string();
        let app = PdfConv::new_for_test(config, TargetFormat::Docx, OutputMode::Plain, 0, true);

        let selection = InputSelection::Directory(temp_dir.path().to_path_buf());
        assert_eq!(handle_dry_run(&app, &selection).await, 3);
    }
}

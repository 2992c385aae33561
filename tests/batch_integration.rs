use assert_cmd::Command;
use pdfconv::{
    Config, ConversionJob, ConversionOutcome, ConversionStatus, Converter, InputSelection,
    OutputMode, OverwriteGuard, OverwritePolicy, OverwritePrompt, PdfConv, PdfConvError,
    TargetFormat,
};
use predicates::prelude::*;
use std::cell::Cell;
use std::path::Path;
use tempfile::TempDir;

/// Writes a small workbook stand-in; refuses files named `broken*`.
struct FakeConverter {
    calls: Cell<usize>,
}

impl Converter for FakeConverter {
    fn target(&self) -> TargetFormat {
        TargetFormat::Xlsx
    }

    fn convert(&self, job: &ConversionJob) -> pdfconv::Result<ConversionOutcome> {
        self.calls.set(self.calls.get() + 1);
        if job.file_name().starts_with("broken") {
            return Err(PdfConvError::NoTablesFound {
                path: job.input.display().to_string(),
                tried: vec!["tabula-default".to_string(), "pdftotext".to_string()],
            });
        }
        std::fs::write(&job.output, b"new workbook")?;
        Ok(ConversionOutcome {
            tables: Some(2),
            rows: Some(8),
            strategy: Some("tabula-lattice".to_string()),
        })
    }
}

struct AnswerNo;

impl OverwritePrompt for AnswerNo {
    fn confirm_overwrite(&self, _path: &Path) -> std::io::Result<bool> {
        Ok(false)
    }
}

fn write_pdf(path: &Path) {
    let mut bytes = b"%PDF-1.5\n1 0 obj\n<< /Type /Catalog >>\nendobj\n".to_vec();
    bytes.extend(std::iter::repeat(b' ').take(200));
    bytes.extend_from_slice(b"\n%%EOF\n");
    std::fs::write(path, bytes).unwrap();
}

fn quiet_app(target: TargetFormat, config: Config) -> PdfConv {
    PdfConv::new_for_test(config, target, OutputMode::Plain, 0, true)
}

#[test]
fn every_discovered_file_is_accounted_for() {
    let temp_dir = TempDir::new().unwrap();
    for name in ["a.pdf", "broken.pdf", "c.pdf", "d.pdf"] {
        write_pdf(&temp_dir.path().join(name));
    }
    std::fs::write(temp_dir.path().join("readme.txt"), "not a pdf").unwrap();
    std::fs::write(temp_dir.path().join("c.xlsx"), b"keep me").unwrap();

    let app = quiet_app(TargetFormat::Xlsx, Config::default());
    let selection = InputSelection::Directory(temp_dir.path().to_path_buf());
    let jobs = app.plan_jobs(&selection).unwrap();
    assert_eq!(jobs.len(), 4);

    let converter = FakeConverter { calls: Cell::new(0) };
    let guard = OverwriteGuard::new(OverwritePolicy::Ask, Box::new(AnswerNo));
    let summary = app.run_with(&converter, &guard, &jobs, selection.directory());

    assert_eq!(summary.total, jobs.len());
    assert_eq!(
        summary.successful + summary.failed + summary.skipped,
        summary.total
    );
    assert_eq!(summary.successful, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(converter.calls.get(), 3);

    // Declined overwrite leaves the original bytes alone
    assert_eq!(
        std::fs::read(temp_dir.path().join("c.xlsx")).unwrap(),
        b"keep me"
    );
    assert!(!temp_dir.path().join("broken.xlsx").exists());

    let failed = summary
        .results
        .iter()
        .find(|r| r.status == ConversionStatus::Failed)
        .unwrap();
    assert_eq!(failed.file_name, "broken.pdf");
    assert!(failed
        .message
        .as_deref()
        .unwrap()
        .contains("No tables found"));
}

#[test]
fn always_policy_replaces_existing_output() {
    let temp_dir = TempDir::new().unwrap();
    write_pdf(&temp_dir.path().join("a.pdf"));
    std::fs::write(temp_dir.path().join("a.xlsx"), b"stale").unwrap();

    let app = quiet_app(TargetFormat::Xlsx, Config::default());
    let jobs = app
        .plan_jobs(&InputSelection::Directory(temp_dir.path().to_path_buf()))
        .unwrap();
    let converter = FakeConverter { calls: Cell::new(0) };
    let guard = OverwriteGuard::new(OverwritePolicy::Always, Box::new(AnswerNo));

    let summary = app.run_with(&converter, &guard, &jobs, None);
    assert_eq!(summary.successful, 1);
    assert_eq!(
        std::fs::read(temp_dir.path().join("a.xlsx")).unwrap(),
        b"new workbook"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_java_stops_before_any_conversion() {
    let temp_dir = TempDir::new().unwrap();
    write_pdf(&temp_dir.path().join("a.pdf"));

    let mut config = Config::default();
    config.engines.java = "/nonexistent/bin/java".to_string();
    config.engines.tabula_jar = Some(temp_dir.path().join("tabula.jar"));
    config.engines.probe_timeout = 5;
    let app = quiet_app(TargetFormat::Xlsx, config);

    let err = app
        .convert(&InputSelection::Directory(temp_dir.path().to_path_buf()))
        .await
        .unwrap_err();

    match err {
        PdfConvError::MissingDependency { missing } => {
            assert!(missing.iter().any(|m| m.contains("Java")));
        }
        other => panic!("expected a dependency error, got {:?}", other),
    }
    assert!(!temp_dir.path().join("a.xlsx").exists());
}

// `echo` passes the `--help` availability check and exits cleanly without writing a
// document, so the whole pipeline runs and the file fails as empty output.
#[cfg(unix)]
#[tokio::test(flavor = "multi_thread")]
async fn full_pipeline_runs_blocking_engines_to_completion() {
    let temp_dir = TempDir::new().unwrap();
    write_pdf(&temp_dir.path().join("letter.pdf"));

    let mut config = Config::default();
    config.engines.pdf2docx = "echo".to_string();
    let app = quiet_app(TargetFormat::Docx, config);

    let summary = app
        .convert(&InputSelection::Directory(temp_dir.path().to_path_buf()))
        .await
        .unwrap();

    assert_eq!(summary.total, 1);
    assert_eq!(summary.failed, 1);
    assert!(summary.results[0]
        .message
        .as_deref()
        .unwrap()
        .to_lowercase()
        .contains("empty"));
    assert!(!temp_dir.path().join("letter.docx").exists());
}

fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("pdfconv.toml");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn cli_reports_missing_dependency_with_exit_code_3() {
    let temp_dir = TempDir::new().unwrap();
    write_pdf(&temp_dir.path().join("a.pdf"));
    let config = write_config(
        temp_dir.path(),
        "[engines]\njava = \"/nonexistent/bin/java\"\ntabula_jar = \"/nonexistent/tabula.jar\"\n",
    );

    Command::cargo_bin("pdfconv")
        .unwrap()
        .args(["xlsx", "--output-format", "plain", "--dir"])
        .arg(temp_dir.path())
        .arg("--config")
        .arg(&config)
        .env_remove("TABULA_JAR")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Java"));

    assert!(!temp_dir.path().join("a.xlsx").exists());
}

#[test]
fn cli_rejects_invalid_config_with_exit_code_5() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path(), "[xlsx]\nstrategies = []\n");

    Command::cargo_bin("pdfconv")
        .unwrap()
        .args(["xlsx", "--dir"])
        .arg(temp_dir.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .code(5);
}

#[test]
fn cli_generates_sample_config() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("generated.toml");

    Command::cargo_bin("pdfconv")
        .unwrap()
        .args(["docx", "--generate-config", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated sample configuration file"));

    let content = std::fs::read_to_string(&config).unwrap();
    assert!(content.contains("sheet_layout = \"per-table\""));
}

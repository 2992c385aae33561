use crate::config::EngineConfig;
use crate::converter::TargetFormat;
use crate::error::{PdfConvError, Result};
use serde::Serialize;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

#[derive(Debug, Clone, Serialize)]
pub struct DependencyCheck {
    pub name: String,
    pub required: bool,
    pub available: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DependencyReport {
    pub checks: Vec<DependencyCheck>,
}

impl DependencyReport {
    pub fn missing(&self) -> Vec<String> {
        self.checks
            .iter()
            .filter(|c| c.required && !c.available)
            .map(|c| c.name.clone())
            .collect()
    }

    /// True when an optional dependency is present.
    pub fn has(&self, name: &str) -> bool {
        self.checks.iter().any(|c| c.name == name && c.available)
    }

    pub fn into_result(self) -> Result<Self> {
        let missing = self.missing();
        if missing.is_empty() {
            Ok(self)
        } else {
            Err(PdfConvError::MissingDependency { missing })
        }
    }
}

pub const JAVA: &str = "Java runtime";
pub const TABULA: &str = "tabula-java jar";
pub const PDFTOTEXT: &str = "pdftotext";
pub const PDF2DOCX: &str = "pdf2docx";

/// Verifies the external tools a pipeline needs before any file is touched.
pub struct Preflight {
    engines: EngineConfig,
    timeout: Duration,
}

impl Preflight {
    pub fn new(engines: &EngineConfig, timeout: Duration) -> Self {
        Self {
            engines: engines.clone(),
            timeout,
        }
    }

    pub async fn check(&self, target: TargetFormat, secondary_fallback: bool) -> DependencyReport {
        let mut report = DependencyReport::default();

        match target {
            TargetFormat::Docx => {
                report.checks.push(self.check_pdf2docx().await);
            }
            TargetFormat::Xlsx => {
                report.checks.push(self.check_java().await);
                report.checks.push(self.check_tabula_jar());
                if secondary_fallback {
                    report.checks.push(self.check_pdftotext().await);
                }
            }
        }

        for check in &report.checks {
            log::info!(
                "{}: {} ({})",
                check.name,
                if check.available { "ok" } else { "missing" },
                check.detail
            );
        }

        report
    }

    async fn check_java(&self) -> DependencyCheck {
        let (available, detail) = match self.probe(&self.engines.java, &["-version"]).await {
            Ok(output) if output.status.success() => {
                // `java -version` reports on stderr.
                let text = String::from_utf8_lossy(&output.stderr);
                let first_line = text
                    .lines()
                    .next()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .unwrap_or("Java is installed");
                (true, first_line.to_string())
            }
            Ok(_) => (false, "java command failed to execute".to_string()),
            Err(reason) => (false, reason),
        };

        DependencyCheck {
            name: JAVA.to_string(),
            required: true,
            available,
            detail,
        }
    }

    fn check_tabula_jar(&self) -> DependencyCheck {
        let (available, detail) = match self.engines.tabula_jar {
            Some(ref jar) if jar.is_file() => (true, jar.display().to_string()),
            Some(ref jar) => (false, format!("{} does not exist", jar.display())),
            None => (
                false,
                "not configured (set engines.tabula_jar, --tabula-jar or TABULA_JAR)".to_string(),
            ),
        };

        DependencyCheck {
            name: TABULA.to_string(),
            required: true,
            available,
            detail,
        }
    }

    async fn check_pdftotext(&self) -> DependencyCheck {
        let (available, detail) = match self.probe(&self.engines.pdftotext, &["-v"]).await {
            // Older poppler builds print the version and exit non-zero.
            Ok(output) if output.status.success() || !output.stderr.is_empty() => {
                (true, first_line(&output))
            }
            Ok(_) => (false, "pdftotext did not report a version".to_string()),
            Err(reason) => (false, reason),
        };

        DependencyCheck {
            name: PDFTOTEXT.to_string(),
            required: false,
            available,
            detail,
        }
    }

    async fn check_pdf2docx(&self) -> DependencyCheck {
        let (available, detail) = match self.probe(&self.engines.pdf2docx, &["--help"]).await {
            Ok(output) if output.status.success() || !output.stdout.is_empty() => {
                (true, "pdf2docx is available".to_string())
            }
            Ok(_) => (false, "pdf2docx failed to start".to_string()),
            Err(reason) => (false, reason),
        };

        DependencyCheck {
            name: PDF2DOCX.to_string(),
            required: true,
            available,
            detail,
        }
    }

    async fn probe(&self, program: &str, args: &[&str]) -> std::result::Result<Output, String> {
        let mut command = Command::new(program);
        command.args(args).kill_on_drop(true);

        match tokio::time::timeout(self.timeout, command.output()).await {
            Err(_) => Err(format!(
                "{} did not respond within {} seconds",
                program,
                self.timeout.as_secs()
            )),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(format!("{} command not found", program))
            }
            Ok(Err(e)) => Err(format!("error running {}: {}", program, e)),
            Ok(Ok(output)) => Ok(output),
        }
    }
}

fn first_line(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    stderr
        .lines()
        .chain(stdout.lines())
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("available")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn engines_with(java: &str, jar: Option<PathBuf>) -> EngineConfig {
        EngineConfig {
            java: java.to_string(),
            tabula_jar: jar,
            pdftotext: "pdfconv-missing-pdftotext-xyz".to_string(),
            pdf2docx: "pdfconv-missing-pdf2docx-xyz".to_string(),
            probe_timeout: 5,
        }
    }

    #[tokio::test]
    async fn test_missing_java_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let jar = temp_dir.path().join("tabula.jar");
        std::fs::write(&jar, b"jar").unwrap();

        let preflight = Preflight::new(
            &engines_with("pdfconv-missing-java-xyz", Some(jar)),
            Duration::from_secs(5),
        );
        let report = preflight.check(TargetFormat::Xlsx, true).await;

        assert_eq!(report.missing(), vec![JAVA.to_string()]);
        assert!(!report.has(PDFTOTEXT));

        let err = report.into_result().unwrap_err();
        assert!(matches!(err, PdfConvError::MissingDependency { ref missing } if missing.len() == 1));
    }

    #[tokio::test]
    async fn test_optional_fallback_not_required() {
        let preflight = Preflight::new(
            &engines_with("pdfconv-missing-java-xyz", None),
            Duration::from_secs(5),
        );
        let report = preflight.check(TargetFormat::Xlsx, true).await;

        let missing = report.missing();
        assert!(missing.contains(&JAVA.to_string()));
        assert!(missing.contains(&TABULA.to_string()));
        assert!(!missing.contains(&PDFTOTEXT.to_string()));
    }

    #[tokio::test]
    async fn test_fallback_not_probed_when_disabled() {
        let preflight = Preflight::new(
            &engines_with("pdfconv-missing-java-xyz", None),
            Duration::from_secs(5),
        );
        let report = preflight.check(TargetFormat::Xlsx, false).await;
        assert!(report.checks.iter().all(|c| c.name != PDFTOTEXT));
    }

    #[tokio::test]
    async fn test_docx_requires_pdf2docx() {
        let preflight = Preflight::new(&engines_with("java", None), Duration::from_secs(5));
        let report = preflight.check(TargetFormat::Docx, true).await;
        assert_eq!(report.missing(), vec![PDF2DOCX.to_string()]);
    }
}

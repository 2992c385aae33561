use crate::engines::{run_command, EngineError, Strategy, TableEngine};
use crate::tables::RawTable;
use anyhow::Context;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// tabula-java driven through the Java runtime, JSON output.
pub struct TabulaEngine {
    java: String,
    jar: PathBuf,
}

#[derive(Debug, Deserialize)]
struct TabulaTable {
    #[serde(default)]
    data: Vec<Vec<TabulaCell>>,
}

#[derive(Debug, Deserialize)]
struct TabulaCell {
    #[serde(default)]
    text: String,
}

impl TabulaEngine {
    pub fn new(java: impl Into<String>, jar: impl Into<PathBuf>) -> Self {
        Self {
            java: java.into(),
            jar: jar.into(),
        }
    }

    fn arguments(&self, pdf: &Path, strategy: Strategy) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-Dfile.encoding=UTF8".into(),
            "-jar".into(),
            self.jar.clone().into_os_string(),
            "--pages".into(),
            "all".into(),
            "--format".into(),
            "JSON".into(),
            "--silent".into(),
        ];

        match strategy {
            Strategy::Default => args.push("--guess".into()),
            Strategy::Lattice => args.push("--lattice".into()),
            Strategy::Stream => args.push("--stream".into()),
            Strategy::Text => {}
        }

        args.push(pdf.as_os_str().to_os_string());
        args
    }
}

impl TableEngine for TabulaEngine {
    fn name(&self) -> &str {
        "tabula"
    }

    fn extract(&self, pdf: &Path, strategy: Strategy) -> anyhow::Result<Vec<RawTable>> {
        let output = run_command(&self.java, self.arguments(pdf, strategy))
            .with_context(|| format!("{} on {}", strategy.name(), pdf.display()))?;

        let json = String::from_utf8_lossy(&output.stdout);
        parse_tabula_json(&json).with_context(|| format!("{} output", strategy.name()))
    }
}

/// Parses tabula's `--format JSON` output into raw cell grids.
pub fn parse_tabula_json(json: &str) -> anyhow::Result<Vec<RawTable>> {
    let trimmed = json.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let tables: Vec<TabulaTable> =
        serde_json::from_str(trimmed).map_err(|e| EngineError::BadOutput {
            program: "tabula".to_string(),
            message: e.to_string(),
        })?;

    Ok(tables
        .into_iter()
        .map(|table| {
            table
                .data
                .into_iter()
                .map(|row| row.into_iter().map(|cell| cell.text).collect())
                .collect()
        })
        .filter(|grid: &RawTable| !grid.is_empty())
        .collect())
}

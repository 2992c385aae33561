use crate::engines::Strategy;
use crate::error::{PdfConvError, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
    pub output: OutputConfig,
    pub xlsx: XlsxConfig,
    pub engines: EngineConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanConfig {
    pub extension: String,
    pub exclude_patterns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub overwrite: OverwritePolicy,
    pub validate_output: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct XlsxConfig {
    pub strategies: Vec<Strategy>,
    pub secondary_fallback: bool,
    pub sheet_layout: SheetLayout,
    pub min_fill_ratio: f64,
    pub convert_numbers: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    pub java: String,
    pub tabula_jar: Option<PathBuf>,
    pub pdftotext: String,
    pub pdf2docx: String,
    pub probe_timeout: u64,
}

/// What to do when the output file is already there.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OverwritePolicy {
    #[default]
    Ask,
    Always,
    Never,
}

/// How extracted tables are distributed over worksheets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SheetLayout {
    /// One worksheet per table
    #[default]
    PerTable,
    /// All tables stacked on a single worksheet
    SingleSheet,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extension: "pdf".to_string(),
            exclude_patterns: Vec::new(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            overwrite: OverwritePolicy::Ask,
            validate_output: true,
        }
    }
}

impl Default for XlsxConfig {
    fn default() -> Self {
        Self {
            strategies: Strategy::default_order(),
            secondary_fallback: true,
            sheet_layout: SheetLayout::PerTable,
            min_fill_ratio: 0.1,
            convert_numbers: true,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            java: "java".to_string(),
            tabula_jar: None,
            pdftotext: "pdftotext".to_string(),
            pdf2docx: "pdf2docx".to_string(),
            probe_timeout: 10,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(PdfConvError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| PdfConvError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| PdfConvError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["pdfconv.toml", ".pdfconv.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        log::debug!("Loading configuration from {}", default_path);
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(overwrite) = cli_args.overwrite {
            self.output.overwrite = overwrite;
        }

        if let Some(ref exclude) = cli_args.exclude {
            self.scan.exclude_patterns.extend(exclude.iter().cloned());
        }

        if let Some(ref strategies) = cli_args.strategies {
            self.xlsx.strategies = strategies.clone();
        }

        if let Some(fallback) = cli_args.secondary_fallback {
            self.xlsx.secondary_fallback = fallback;
        }

        if let Some(layout) = cli_args.sheet_layout {
            self.xlsx.sheet_layout = layout;
        }

        if let Some(ref jar) = cli_args.tabula_jar {
            self.engines.tabula_jar = Some(jar.clone());
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.scan.extension.trim().is_empty() {
            return Err(PdfConvError::Config {
                message: "Source file extension must not be empty".to_string(),
            });
        }

        for pattern in &self.scan.exclude_patterns {
            if let Err(e) = regex::Regex::new(pattern) {
                return Err(PdfConvError::Config {
                    message: format!("Invalid exclude pattern '{}': {}", pattern, e),
                });
            }
        }

        if self.xlsx.strategies.is_empty() {
            return Err(PdfConvError::Config {
                message: "At least one table extraction strategy must be specified".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&self.xlsx.min_fill_ratio) {
            return Err(PdfConvError::Config {
                message: format!(
                    "min_fill_ratio must be between 0 and 1, got {}",
                    self.xlsx.min_fill_ratio
                ),
            });
        }

        if self.engines.probe_timeout == 0 {
            return Err(PdfConvError::Config {
                message: "Dependency probe timeout must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    pub fn probe_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.engines.probe_timeout)
    }

    pub fn create_sample_config() -> String {
        let mut sample_config = Self::default();
        sample_config.engines.tabula_jar = Some(PathBuf::from("/opt/tabula/tabula.jar"));
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub overwrite: Option<OverwritePolicy>,
    pub exclude: Option<Vec<String>>,
    pub strategies: Option<Vec<Strategy>>,
    pub secondary_fallback: Option<bool>,
    pub sheet_layout: Option<SheetLayout>,
    pub tabula_jar: Option<PathBuf>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overwrite(mut self, overwrite: Option<OverwritePolicy>) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_exclude(mut self, exclude: Option<Vec<String>>) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn with_strategies(mut self, strategies: Option<Vec<Strategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn with_secondary_fallback(mut self, fallback: Option<bool>) -> Self {
        self.secondary_fallback = fallback;
        self
    }

    pub fn with_sheet_layout(mut self, layout: Option<SheetLayout>) -> Self {
        self.sheet_layout = layout;
        self
    }

    pub fn with_tabula_jar(mut self, jar: Option<PathBuf>) -> Self {
        self.tabula_jar = jar;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scan.extension, "pdf");
        assert_eq!(config.output.overwrite, OverwritePolicy::Ask);
        assert_eq!(config.xlsx.strategies.len(), 4);
        assert_eq!(config.xlsx.sheet_layout, SheetLayout::PerTable);
        assert_eq!(config.engines.probe_timeout, 10);
        assert!(config.engines.tabula_jar.is_none());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.xlsx.strategies.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.xlsx.min_fill_ratio = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.scan.exclude_patterns.push("([unclosed".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sample_config_loads_back() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", Config::create_sample_config()).unwrap();

        let loaded_config = Config::load_from_file(temp_file.path()).unwrap();
        assert_eq!(
            loaded_config.engines.tabula_jar,
            Some(PathBuf::from("/opt/tabula/tabula.jar"))
        );
        assert_eq!(loaded_config.xlsx.strategies, Strategy::default_order());
        assert!(loaded_config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            "[output]\noverwrite = \"never\"\n\n[xlsx]\nstrategies = [\"stream\", \"text\"]\nsheet_layout = \"single-sheet\""
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).unwrap();
        assert_eq!(config.output.overwrite, OverwritePolicy::Never);
        assert_eq!(config.xlsx.strategies, vec![Strategy::Stream, Strategy::Text]);
        assert_eq!(config.xlsx.sheet_layout, SheetLayout::SingleSheet);
        assert_eq!(config.engines.java, "java");
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[xlsx]\nstrategies = [\"magic\"]").unwrap();
        assert!(Config::load_from_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = Config::default();

        let overrides = CliOverrides::new()
            .with_overwrite(Some(OverwritePolicy::Always))
            .with_strategies(Some(vec![Strategy::Lattice]))
            .with_secondary_fallback(Some(false))
            .with_tabula_jar(Some(PathBuf::from("tabula.jar")));

        config.merge_with_cli_args(&overrides);

        assert_eq!(config.output.overwrite, OverwritePolicy::Always);
        assert_eq!(config.xlsx.strategies, vec![Strategy::Lattice]);
        assert!(!config.xlsx.secondary_fallback);
        assert_eq!(config.engines.tabula_jar, Some(PathBuf::from("tabula.jar")));
    }

    #[test]
    fn test_sample_config_generation() {
        let sample = Config::create_sample_config();
        assert!(sample.contains("[scan]"));
        assert!(sample.contains("[xlsx]"));
        assert!(sample.contains("[engines]"));
        assert!(sample.contains("tabula_jar"));
    }
}

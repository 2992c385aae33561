use crate::config::{CliOverrides, Config, OverwritePolicy, SheetLayout};
use crate::converter::TargetFormat;
use crate::engines::Strategy;
use crate::error::Result;
use crate::ui::OutputMode;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pdfconv")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Batch convert PDF documents to Word (DOCX) and Excel (XLSX)")]
#[command(
    long_about = "pdfconv converts every PDF in a directory (or a single PDF) into an editable \
                  Word document, or extracts the tables it contains into an Excel workbook."
)]
#[command(before_help = "📄 pdfconv - PDF to DOCX / XLSX converter")]
#[command(after_help = "EXAMPLES:\n  \
    pdfconv docx\n  \
    pdfconv docx report.pdf --output final.docx\n  \
    pdfconv xlsx --dir invoices --overwrite never\n  \
    pdfconv xlsx statement.pdf --strategies lattice,stream --sheet-layout single-sheet\n  \
    pdfconv xlsx --config pdfconv.toml --report run.json")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert PDF files to Word documents
    Docx(DocxArgs),
    /// Extract tables from PDF files into Excel workbooks
    Xlsx(XlsxArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Single PDF to convert (batch mode over --dir when omitted)
    pub file: Option<PathBuf>,

    /// Directory to scan for PDF files
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,

    /// Output file path (single-file mode only)
    #[arg(short, long, requires = "file")]
    pub output: Option<PathBuf>,

    /// What to do when the output file already exists
    #[arg(long, value_enum)]
    pub overwrite: Option<OverwritePolicy>,

    /// Skip PDF files whose name matches this regex (repeatable)
    #[arg(short, long)]
    pub exclude: Option<Vec<String>>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write the JSON run summary to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Dry run (check dependencies and list planned conversions)
    #[arg(long, help = "Show what would be converted without converting anything")]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DocxArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Debug, Clone)]
pub struct XlsxArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Table extraction strategies to try, in order (comma-separated)
    #[arg(long, value_enum, value_delimiter = ',')]
    pub strategies: Option<Vec<Strategy>>,

    /// Do not fall back to pdftotext when tabula finds nothing
    #[arg(long)]
    pub no_fallback: bool,

    /// How tables are laid out over worksheets
    #[arg(long, value_enum)]
    pub sheet_layout: Option<SheetLayout>,

    /// Path to the tabula-java jar
    #[arg(long, env = "TABULA_JAR")]
    pub tabula_jar: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn target(&self) -> TargetFormat {
        match self.command {
            Command::Docx(_) => TargetFormat::Docx,
            Command::Xlsx(_) => TargetFormat::Xlsx,
        }
    }

    pub fn common(&self) -> &CommonArgs {
        match &self.command {
            Command::Docx(args) => &args.common,
            Command::Xlsx(args) => &args.common,
        }
    }

    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.common().config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        let common = self.common();
        let overrides = CliOverrides::new()
            .with_overwrite(common.overwrite)
            .with_exclude(common.exclude.clone());

        match &self.command {
            Command::Docx(_) => overrides,
            Command::Xlsx(args) => overrides
                .with_strategies(args.strategies.clone())
                .with_secondary_fallback(args.no_fallback.then_some(false))
                .with_sheet_layout(args.sheet_layout)
                .with_tabula_jar(args.tabula_jar.clone()),
        }
    }

    pub fn output_mode(&self) -> OutputMode {
        match self.common().output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        }
    }

    pub fn verbosity_level(&self) -> u8 {
        let common = self.common();
        if common.quiet {
            0
        } else {
            common.verbose
        }
    }
}

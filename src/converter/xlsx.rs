use crate::config::XlsxConfig;
use crate::converter::{
    check_pdf, persist, staging_file, ConversionJob, ConversionOutcome, Converter, TargetFormat,
};
use crate::engines::{EngineError, FallbackExtractor, Strategy, TableEngine};
use crate::error::{PdfConvError, Result};
use crate::tables::{clean_table, validate_workbook, CleanOptions, RawTable, Table, WorkbookWriter};
use std::path::Path;

/// Tables pulled from one PDF and the strategy that found them.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub tables: Vec<Table>,
    pub strategy: String,
}

pub struct XlsxConverter {
    primary: Box<dyn TableEngine>,
    fallback: Option<Box<dyn FallbackExtractor>>,
    strategies: Vec<Strategy>,
    min_fill_ratio: f64,
    writer: WorkbookWriter,
    validate_output: bool,
}

impl XlsxConverter {
    pub fn new(primary: Box<dyn TableEngine>, config: &XlsxConfig) -> Self {
        Self {
            primary,
            fallback: None,
            strategies: config.strategies.clone(),
            min_fill_ratio: config.min_fill_ratio,
            writer: WorkbookWriter::new(config.sheet_layout, config.convert_numbers),
            validate_output: true,
        }
    }

    pub fn with_fallback(mut self, fallback: Box<dyn FallbackExtractor>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_validation(mut self, validate_output: bool) -> Self {
        self.validate_output = validate_output;
        self
    }

    /// Tries each strategy in order and stops at the first one that yields
    /// a usable table. The fallback extractor runs only after every
    /// strategy came back empty.
    pub fn extract_tables(&self, pdf: &Path) -> Result<Extraction> {
        let mut tried = Vec::new();
        let mut primary_missing = false;

        for strategy in &self.strategies {
            tried.push(strategy.name().to_string());
            log::info!("Trying {} on {}", strategy.name(), pdf.display());

            match self.primary.extract(pdf, *strategy) {
                Ok(raw) => {
                    let options = if strategy.assumes_header() {
                        CleanOptions::with_header(self.min_fill_ratio)
                    } else {
                        CleanOptions::without_header(self.min_fill_ratio)
                    };
                    let tables = clean_all(raw, &options);
                    if !tables.is_empty() {
                        log::info!("{} found {} table(s)", strategy.name(), tables.len());
                        return Ok(Extraction {
                            tables,
                            strategy: strategy.name().to_string(),
                        });
                    }
                    log::debug!("{} found no usable tables", strategy.name());
                }
                Err(e) if EngineError::is_not_found(&e) => {
                    log::warn!("{} is unavailable: {:#}", self.primary.name(), e);
                    primary_missing = true;
                    break;
                }
                Err(e) => {
                    log::warn!("{} extraction failed: {:#}", strategy.name(), e);
                }
            }
        }

        if let Some(ref fallback) = self.fallback {
            tried.push(fallback.name().to_string());
            log::info!("Trying fallback {} on {}", fallback.name(), pdf.display());

            match fallback.extract(pdf) {
                Ok(raw) => {
                    // The fallback grids already carry their header row.
                    let options = CleanOptions {
                        header_row: true,
                        min_data_rows: 1,
                        min_fill_ratio: self.min_fill_ratio,
                    };
                    let tables = clean_all(raw, &options);
                    if !tables.is_empty() {
                        return Ok(Extraction {
                            tables,
                            strategy: fallback.name().to_string(),
                        });
                    }
                }
                Err(e) => log::warn!("{} extraction failed: {:#}", fallback.name(), e),
            }
        }

        if primary_missing {
            return Err(PdfConvError::EngineNotFound {
                engine: self.primary.name().to_string(),
            });
        }

        Err(PdfConvError::NoTablesFound {
            path: pdf.display().to_string(),
            tried,
        })
    }
}

fn clean_all(raw: Vec<RawTable>, options: &CleanOptions) -> Vec<Table> {
    raw.iter()
        .filter_map(|grid| clean_table(grid, options))
        .collect()
}

impl Converter for XlsxConverter {
    fn target(&self) -> TargetFormat {
        TargetFormat::Xlsx
    }

    fn convert(&self, job: &ConversionJob) -> Result<ConversionOutcome> {
        check_pdf(&job.input)?;

        let extraction = self.extract_tables(&job.input)?;
        let staging = staging_file(&job.output)?;

        self.writer
            .write(&extraction.tables, staging.path(), &job.file_name())?;

        if self.validate_output {
            validate_workbook(staging.path(), self.writer.expected_sheets(&extraction.tables))
                .map_err(|e| match e {
                    PdfConvError::OutputValidation { reason, .. } => PdfConvError::OutputValidation {
                        path: job.output.display().to_string(),
                        reason,
                    },
                    other => other,
                })?;
        }

        persist(staging, &job.output)?;

        let rows = extraction.tables.iter().map(Table::row_count).sum();
        log::info!(
            "Wrote {} table(s), {} row(s) to {}",
            extraction.tables.len(),
            rows,
            job.output.display()
        );

        Ok(ConversionOutcome {
            tables: Some(extraction.tables.len()),
            rows: Some(rows),
            strategy: Some(extraction.strategy),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::test_support::write_minimal_pdf;
    use calamine::{open_workbook, Reader, Xlsx};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;
    use tempfile::TempDir;

    type Calls = Rc<RefCell<Vec<Strategy>>>;

    /// Answers per strategy; unlisted strategies return no tables.
    struct ScriptedEngine {
        answers: HashMap<Strategy, std::result::Result<Vec<RawTable>, &'static str>>,
        missing: bool,
        calls: Calls,
    }

    impl ScriptedEngine {
        fn new() -> (Self, Calls) {
            let calls: Calls = Rc::new(RefCell::new(Vec::new()));
            let engine = Self {
                answers: HashMap::new(),
                missing: false,
                calls: calls.clone(),
            };
            (engine, calls)
        }

        fn answer(mut self, strategy: Strategy, tables: Vec<RawTable>) -> Self {
            self.answers.insert(strategy, Ok(tables));
            self
        }

        fn fail(mut self, strategy: Strategy, message: &'static str) -> Self {
            self.answers.insert(strategy, Err(message));
            self
        }
    }

    impl TableEngine for ScriptedEngine {
        fn name(&self) -> &str {
            "scripted"
        }

        fn extract(&self, _pdf: &Path, strategy: Strategy) -> anyhow::Result<Vec<RawTable>> {
            self.calls.borrow_mut().push(strategy);
            if self.missing {
                return Err(EngineError::NotFound {
                    program: "java".to_string(),
                }
                .into());
            }
            match self.answers.get(&strategy) {
                Some(Ok(tables)) => Ok(tables.clone()),
                Some(Err(message)) => Err(anyhow::anyhow!(*message)),
                None => Ok(Vec::new()),
            }
        }
    }

    struct FixedFallback(Vec<RawTable>);

    impl FallbackExtractor for FixedFallback {
        fn name(&self) -> &str {
            "pdftotext"
        }

        fn extract(&self, _pdf: &Path) -> anyhow::Result<Vec<RawTable>> {
            Ok(self.0.clone())
        }
    }

    fn grid(rows: &[&[&str]]) -> RawTable {
        rows.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn sample_table() -> RawTable {
        grid(&[&["Item", "Qty"], &["Bolt", "10"], &["Nut", "20"]])
    }

    fn setup() -> (TempDir, ConversionJob) {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("invoice.pdf");
        write_minimal_pdf(&input);
        (temp_dir, ConversionJob::new(input, TargetFormat::Xlsx))
    }

    #[test]
    fn test_first_successful_strategy_wins() {
        let (_temp_dir, job) = setup();
        let (engine, calls) = ScriptedEngine::new();
        let engine = engine
            .fail(Strategy::Default, "java.lang.OutOfMemoryError")
            .answer(Strategy::Stream, vec![sample_table()])
            .answer(Strategy::Text, vec![sample_table()]);

        let converter = XlsxConverter::new(Box::new(engine), &XlsxConfig::default());
        let extraction = converter.extract_tables(&job.input).unwrap();

        assert_eq!(extraction.strategy, "tabula-stream");
        assert_eq!(
            *calls.borrow(),
            vec![Strategy::Default, Strategy::Lattice, Strategy::Stream]
        );
    }

    #[test]
    fn test_fallback_used_after_all_strategies() {
        let (_temp_dir, job) = setup();
        let (engine, calls) = ScriptedEngine::new();

        let converter = XlsxConverter::new(Box::new(engine), &XlsxConfig::default())
            .with_fallback(Box::new(FixedFallback(vec![grid(&[
                &["Region", "Sales"],
                &["North", "1,200"],
            ])])));

        let extraction = converter.extract_tables(&job.input).unwrap();
        assert_eq!(extraction.strategy, "pdftotext");
        assert_eq!(calls.borrow().len(), 4);
        assert_eq!(extraction.tables[0].headers, vec!["Region", "Sales"]);
    }

    #[test]
    fn test_no_tables_is_failure_without_output() {
        let (temp_dir, job) = setup();
        let (engine, _) = ScriptedEngine::new();
        let converter = XlsxConverter::new(Box::new(engine), &XlsxConfig::default())
            .with_fallback(Box::new(FixedFallback(Vec::new())));

        let err = converter.convert(&job).unwrap_err();
        match err {
            PdfConvError::NoTablesFound { ref tried, .. } => assert_eq!(tried.len(), 5),
            ref other => panic!("unexpected error {:?}", other),
        }
        assert!(err.to_string().contains("No tables found"));
        assert!(!job.output.exists());
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_two_tables_give_two_worksheets() {
        let (_temp_dir, job) = setup();
        let (engine, _) = ScriptedEngine::new();
        let engine = engine.answer(
            Strategy::Default,
            vec![
                sample_table(),
                grid(&[&["Region", "Share"], &["North", "40%"], &["South", "60%"]]),
            ],
        );

        let converter = XlsxConverter::new(Box::new(engine), &XlsxConfig::default());
        let outcome = converter.convert(&job).unwrap();

        assert_eq!(outcome.tables, Some(2));
        assert_eq!(outcome.rows, Some(4));
        assert_eq!(outcome.strategy.as_deref(), Some("tabula-default"));

        let workbook: Xlsx<_> = open_workbook(&job.output).unwrap();
        assert_eq!(workbook.sheet_names().len(), 2);
    }

    #[test]
    fn test_missing_primary_without_fallback() {
        let (_temp_dir, job) = setup();
        let (mut engine, calls) = ScriptedEngine::new();
        engine.missing = true;

        let converter = XlsxConverter::new(Box::new(engine), &XlsxConfig::default());
        let err = converter.extract_tables(&job.input).unwrap_err();

        assert!(matches!(err, PdfConvError::EngineNotFound { .. }));
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn test_missing_primary_falls_back() {
        let (_temp_dir, job) = setup();
        let (mut engine, _) = ScriptedEngine::new();
        engine.missing = true;

        let converter = XlsxConverter::new(Box::new(engine), &XlsxConfig::default())
            .with_fallback(Box::new(FixedFallback(vec![sample_table()])));
        let extraction = converter.extract_tables(&job.input).unwrap();
        assert_eq!(extraction.strategy, "pdftotext");
    }

    #[test]
    fn test_text_strategy_has_generated_headers() {
        let (_temp_dir, job) = setup();
        let (engine, _) = ScriptedEngine::new();
        let engine = engine.answer(Strategy::Text, vec![grid(&[&["a", "b"]])]);

        let mut config = XlsxConfig::default();
        config.strategies = vec![Strategy::Text];
        let converter = XlsxConverter::new(Box::new(engine), &config);

        let extraction = converter.extract_tables(&job.input).unwrap();
        assert_eq!(extraction.tables[0].headers, vec!["Column_1", "Column_2"]);
        assert_eq!(extraction.tables[0].rows, vec![vec!["a", "b"]]);
    }

    #[test]
    fn test_invalid_pdf_is_rejected_before_extraction() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("broken.pdf");
        std::fs::write(&input, "garbage").unwrap();

        let (engine, calls) = ScriptedEngine::new();
        let converter = XlsxConverter::new(Box::new(engine), &XlsxConfig::default());
        let err = converter
            .convert(&ConversionJob::new(input, TargetFormat::Xlsx))
            .unwrap_err();

        assert!(matches!(err, PdfConvError::InvalidPdf { .. }));
        assert!(calls.borrow().is_empty());
    }
}

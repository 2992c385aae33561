use crate::config::SheetLayout;
use crate::error::{PdfConvError, Result};
use crate::tables::Table;
use calamine::{open_workbook, Reader, Xlsx};
use rust_xlsxwriter::{
    Color, Format, FormatAlign, FormatBorder, FormatPattern, Note, Workbook, Worksheet,
};
use std::path::Path;

const MAX_SHEET_NAME_LEN: usize = 31;
const MIN_COLUMN_WIDTH: usize = 10;
const MAX_COLUMN_WIDTH: usize = 50;
const MIN_WORKBOOK_BYTES: u64 = 1000;
const NOTE_AUTHOR: &str = "PDF Converter";

struct Styles {
    header: Format,
    text: Format,
    percent: Format,
}

impl Styles {
    fn new() -> Self {
        let border = Format::new().set_border(FormatBorder::Thin);

        Self {
            header: border
                .clone()
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(0x366092))
                .set_pattern(FormatPattern::Solid)
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter),
            percent: border.clone().set_num_format("0.0%"),
            text: border,
        }
    }
}

/// A data cell after numeric coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Percent(f64),
    Blank,
}

/// Turns `1,234.5` into 1234.5 and `12.5%` into 0.125. Anything that does
/// not parse stays text.
pub fn coerce_cell(value: &str) -> CellValue {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return CellValue::Blank;
    }

    let stripped: String = trimmed
        .chars()
        .filter(|c| !matches!(c, '.' | '-' | '%' | ','))
        .collect();

    if stripped.is_empty() || !stripped.chars().all(|c| c.is_ascii_digit()) {
        return CellValue::Text(trimmed.to_string());
    }

    let without_commas = trimmed.replace(',', "");
    if trimmed.contains('%') {
        match without_commas.replace('%', "").parse::<f64>() {
            Ok(number) => CellValue::Percent(number / 100.0),
            Err(_) => CellValue::Text(trimmed.to_string()),
        }
    } else {
        match without_commas.parse::<f64>() {
            Ok(number) => CellValue::Number(number),
            Err(_) => CellValue::Text(trimmed.to_string()),
        }
    }
}

/// Replaces characters Excel forbids in sheet names and truncates to 31.
pub fn clean_sheet_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '\\' | '/' | '?' | '*' | '[' | ']' | ':' => '_',
            other => other,
        })
        .take(MAX_SHEET_NAME_LEN)
        .collect();

    if replaced.is_empty() {
        "Sheet".to_string()
    } else {
        replaced
    }
}

fn sheet_name_for(index: usize, total: usize) -> String {
    if total == 1 {
        "Table".to_string()
    } else {
        format!("Table_{}", index + 1)
    }
}

pub struct WorkbookWriter {
    layout: SheetLayout,
    convert_numbers: bool,
}

impl WorkbookWriter {
    pub fn new(layout: SheetLayout, convert_numbers: bool) -> Self {
        Self {
            layout,
            convert_numbers,
        }
    }

    /// Number of worksheets [`write`](Self::write) produces for `tables`.
    pub fn expected_sheets(&self, tables: &[Table]) -> usize {
        match self.layout {
            SheetLayout::PerTable => tables.len(),
            SheetLayout::SingleSheet => usize::from(!tables.is_empty()),
        }
    }

    pub fn write(&self, tables: &[Table], path: &Path, source_name: &str) -> Result<()> {
        if tables.is_empty() {
            return Err(PdfConvError::Workbook {
                message: "no tables to write".to_string(),
            });
        }

        let styles = Styles::new();
        let mut workbook = Workbook::new();

        match self.layout {
            SheetLayout::PerTable => {
                for (index, table) in tables.iter().enumerate() {
                    let worksheet = workbook.add_worksheet();
                    worksheet.set_name(clean_sheet_name(&sheet_name_for(index, tables.len())))?;
                    self.write_table(worksheet, table, 0, &styles)?;
                    autofit_columns(worksheet, std::slice::from_ref(table))?;
                    add_source_note(worksheet, source_name)?;
                }
            }
            SheetLayout::SingleSheet => {
                let worksheet = workbook.add_worksheet();
                worksheet.set_name("Tables")?;

                let mut row = 0u32;
                for table in tables {
                    row = self.write_table(worksheet, table, row, &styles)? + 1;
                }
                autofit_columns(worksheet, tables)?;
                add_source_note(worksheet, source_name)?;
            }
        }

        workbook.save(path)?;
        log::debug!("Wrote {} table(s) to {}", tables.len(), path.display());
        Ok(())
    }

    /// Writes header and rows starting at `first_row`; returns the next free row.
    fn write_table(
        &self,
        worksheet: &mut Worksheet,
        table: &Table,
        first_row: u32,
        styles: &Styles,
    ) -> Result<u32> {
        for (col, header) in table.headers.iter().enumerate() {
            worksheet.write_string_with_format(first_row, col as u16, header, &styles.header)?;
        }

        let mut row = first_row + 1;
        for cells in &table.rows {
            for (col, cell) in cells.iter().enumerate() {
                let col = col as u16;
                let value = if self.convert_numbers {
                    coerce_cell(cell)
                } else if cell.trim().is_empty() {
                    CellValue::Blank
                } else {
                    CellValue::Text(cell.clone())
                };

                match value {
                    CellValue::Number(n) => {
                        worksheet.write_number_with_format(row, col, n, &styles.text)?;
                    }
                    CellValue::Percent(n) => {
                        worksheet.write_number_with_format(row, col, n, &styles.percent)?;
                    }
                    CellValue::Text(s) => {
                        worksheet.write_string_with_format(row, col, s, &styles.text)?;
                    }
                    CellValue::Blank => {
                        worksheet.write_blank(row, col, &styles.text)?;
                    }
                }
            }
            row += 1;
        }

        Ok(row)
    }
}

fn autofit_columns(worksheet: &mut Worksheet, tables: &[Table]) -> Result<()> {
    let width = tables.iter().map(Table::width).max().unwrap_or(0);

    for col in 0..width {
        let longest = tables
            .iter()
            .flat_map(|t| std::iter::once(&t.headers).chain(t.rows.iter()))
            .filter_map(|row| row.get(col))
            .map(|cell| cell.chars().count())
            .max()
            .unwrap_or(0);

        let adjusted = (longest + 2).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH);
        worksheet.set_column_width(col as u16, adjusted as f64)?;
    }

    Ok(())
}

fn add_source_note(worksheet: &mut Worksheet, source_name: &str) -> Result<()> {
    if source_name.is_empty() {
        return Ok(());
    }

    let note = Note::new(format!("Extracted from: {}", source_name)).set_author(NOTE_AUTHOR);
    worksheet.insert_note(0, 0, &note)?;
    Ok(())
}

/// Checks that a written workbook is plausible and readable.
pub fn validate_workbook(path: &Path, expected_sheets: usize) -> Result<()> {
    let invalid = |reason: String| PdfConvError::OutputValidation {
        path: path.display().to_string(),
        reason,
    };

    let metadata = std::fs::metadata(path).map_err(|e| invalid(e.to_string()))?;
    if metadata.len() < MIN_WORKBOOK_BYTES {
        return Err(invalid(format!(
            "file is only {} bytes",
            metadata.len()
        )));
    }

    let mut workbook: Xlsx<_> =
        open_workbook(path).map_err(|e| invalid(format!("cannot be opened: {}", e)))?;

    let names = workbook.sheet_names();
    if names.len() != expected_sheets {
        return Err(invalid(format!(
            "expected {} worksheet(s), found {}",
            expected_sheets,
            names.len()
        )));
    }

    if let Some(first) = names.first() {
        workbook
            .worksheet_range(first)
            .map_err(|e| invalid(format!("worksheet '{}' unreadable: {}", first, e)))?;
    }

    Ok(())
}

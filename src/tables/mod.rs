pub mod workbook;

pub use workbook::{clean_sheet_name, validate_workbook, WorkbookWriter};

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Cell grid as an engine returns it, before cleaning.
pub type RawTable = Vec<Vec<String>>;

/// A cleaned table: one header row plus data rows of equal width.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// How a raw grid is turned into a [`Table`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleanOptions {
    /// Take the first non-empty row as the header.
    pub header_row: bool,
    pub min_data_rows: usize,
    pub min_fill_ratio: f64,
}

impl CleanOptions {
    pub fn with_header(min_fill_ratio: f64) -> Self {
        Self {
            header_row: true,
            min_data_rows: 2,
            min_fill_ratio,
        }
    }

    pub fn without_header(min_fill_ratio: f64) -> Self {
        Self {
            header_row: false,
            min_data_rows: 1,
            min_fill_ratio,
        }
    }
}

/// Cleans a raw grid. Returns `None` when nothing table-like is left.
pub fn clean_table(raw: &[Vec<String>], options: &CleanOptions) -> Option<Table> {
    let width = raw.iter().map(|row| row.len()).max().unwrap_or(0);
    if width == 0 {
        return None;
    }

    let mut grid: Vec<Vec<String>> = raw
        .iter()
        .map(|row| {
            let mut cells: Vec<String> = row.iter().map(|c| c.trim().to_string()).collect();
            cells.resize(width, String::new());
            cells
        })
        .filter(|row| row.iter().any(|c| !c.is_empty()))
        .collect();

    if grid.is_empty() {
        return None;
    }

    let keep: Vec<usize> = (0..width)
        .filter(|&col| grid.iter().any(|row| !row[col].is_empty()))
        .collect();

    if keep.len() < width {
        grid = grid
            .into_iter()
            .map(|row| keep.iter().map(|&col| row[col].clone()).collect())
            .collect();
    }

    let (headers, rows) = if options.header_row {
        let mut iter = grid.into_iter();
        let header = iter.next().unwrap_or_default();
        (normalize_headers(header), iter.collect::<Vec<_>>())
    } else {
        let headers = (1..=keep.len()).map(|i| format!("Column_{}", i)).collect();
        (headers, grid)
    };

    if rows.len() < options.min_data_rows {
        return None;
    }

    let total_cells = rows.len() * headers.len();
    let filled = rows
        .iter()
        .flat_map(|row| row.iter())
        .filter(|c| !c.is_empty())
        .count();

    if total_cells > 0 && (filled as f64 / total_cells as f64) < options.min_fill_ratio {
        return None;
    }

    Some(Table { headers, rows })
}

fn normalize_headers(header: Vec<String>) -> Vec<String> {
    header
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            if name.is_empty() || name.contains("Unnamed") {
                format!("Column_{}", i + 1)
            } else {
                name
            }
        })
        .collect()
}

fn column_separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new(r"\t| {2,}").expect("valid separator regex"))
}

/// Finds table-like blocks in layout-preserving text.
///
/// Pages are separated by form feeds. A line is a row when a tab or a run of
/// two or more spaces splits it into at least two cells; a page with at least
/// two such rows yields one grid whose first row is the header. Rows are
/// padded to the widest row.
pub fn tables_from_layout_text(text: &str) -> Vec<RawTable> {
    let mut tables = Vec::new();

    for page in text.split('\x0c') {
        let rows: Vec<Vec<String>> = page
            .lines()
            .filter(|line| line.contains('\t') || line.contains("  "))
            .map(|line| {
                column_separator()
                    .split(line)
                    .map(str::trim)
                    .filter(|cell| !cell.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|cells| cells.len() > 1)
            .collect();

        if rows.len() < 2 {
            continue;
        }

        let max_cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        let padded = rows
            .into_iter()
            .map(|mut row| {
                row.resize(max_cols, String::new());
                row
            })
            .collect();

        tables.push(padded);
    }

    tables
}

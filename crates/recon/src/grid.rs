//! Row-major cell arena for the first sheet of an uploaded workbook.
//!
//! The extractor never copies cells: shipments are expressed as [`Span`]s
//! (row index pairs) into the shared [`Grid`].

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

static EMPTY: Cell = Cell::Empty;

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Display text. Integral numbers print without a fraction so that
    /// numeric tracking numbers survive as typed.
    pub fn text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    /// Numeric value, parsing text when needed.
    pub fn number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

// ---------------------------------------------------------------------------
// Merges + spans
// ---------------------------------------------------------------------------

/// A merged region, zero-based and inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRange {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

impl MergeRange {
    pub fn new(start_row: usize, start_col: usize, end_row: usize, end_col: usize) -> Self {
        Self { start_row, start_col, end_row, end_col }
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.start_row && row <= self.end_row && col >= self.start_col && col <= self.end_col
    }
}

/// Inclusive row range of one shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn single(row: usize) -> Self {
        Self { start: row, end: row }
    }

    pub fn rows(&self) -> std::ops::RangeInclusive<usize> {
        self.start..=self.end
    }
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    rows: Vec<Vec<Cell>>,
    merges: Vec<MergeRange>,
}

impl Grid {
    pub fn new(rows: Vec<Vec<Cell>>, merges: Vec<MergeRange>) -> Self {
        Self { rows, merges }
    }

    /// Build a text-only grid, mostly for tests and CSV-like sources.
    pub fn from_text_rows(rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|r| r.iter().map(|s| Cell::from(*s)).collect())
            .collect();
        Self { rows, merges: Vec::new() }
    }

    pub fn with_merge(mut self, merge: MergeRange) -> Self {
        self.merges.push(merge);
        self
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, row: usize) -> &[Cell] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cell at (row, col); out-of-range reads are empty.
    pub fn get(&self, row: usize, col: usize) -> &Cell {
        self.rows.get(row).and_then(|r| r.get(col)).unwrap_or(&EMPTY)
    }

    pub fn text(&self, row: usize, col: usize) -> String {
        self.get(row, col).text()
    }

    pub fn merges(&self) -> &[MergeRange] {
        &self.merges
    }

    /// The merged region covering (row, col), if any.
    pub fn merge_at(&self, row: usize, col: usize) -> Option<&MergeRange> {
        self.merges.iter().find(|m| m.contains(row, col))
    }
}

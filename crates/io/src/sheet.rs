//! First-sheet loading for returns exports (xlsx, xls, xlsb, ods).
//!
//! Cell values come from calamine. Merged ranges are read separately from
//! the XLSX package; for other formats every shipment is a single row.

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::NaiveDate;

use returnscan_recon::{Cell, Grid};

use crate::error::LoadError;
use crate::merges::read_merges;

/// The first worksheet of a workbook as an in-memory grid.
#[derive(Debug, Clone)]
pub struct LoadedSheet {
    pub sheet_name: String,
    pub grid: Grid,
    /// Non-fatal problems (e.g. merges unavailable for this format).
    pub warnings: Vec<String>,
}

pub fn load_grid(path: &Path) -> Result<LoadedSheet, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Read { path: path.to_path_buf(), source })?;
    log::info!("loading {} ({} bytes)", path.display(), bytes.len());
    load_grid_from_bytes(&bytes)
}

pub fn load_grid_from_bytes(bytes: &[u8]) -> Result<LoadedSheet, LoadError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| LoadError::Open(e.to_string()))?;

    let sheet_name = workbook.sheet_names().first().cloned().ok_or(LoadError::NoSheets)?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| LoadError::Sheet { name: sheet_name.clone(), message: e.to_string() })?;

    // Range start offset (data may not begin at A1); merges use absolute refs.
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; start_col as usize];
        cells.extend(row.iter().map(convert_cell));
        rows.push(cells);
    }

    let mut warnings = Vec::new();
    let merges = match read_merges(Cursor::new(bytes), &sheet_name) {
        Ok(m) => m,
        Err(msg) => {
            log::warn!("merged cells unavailable: {msg}");
            warnings.push(format!("merged cells not read ({msg}); each shipment is treated as a single row"));
            Vec::new()
        }
    };

    log::debug!("sheet '{}': {} rows, {} merges", sheet_name, rows.len(), merges.len());
    Ok(LoadedSheet { sheet_name, grid: Grid::new(rows, merges), warnings })
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::from(s.as_str()),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(e) => Cell::Text(format!("#{e:?}")),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            serial_to_date(serial).map(Cell::Date).unwrap_or(Cell::Number(serial))
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::from(s.as_str()),
    }
}

/// Excel 1900-system serial to a calendar date. Time-only serials have no date.
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !(1.0..2_958_466.0).contains(&serial) {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(chrono::Duration::days(serial.floor() as i64))
}

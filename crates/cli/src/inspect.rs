//! `rscan inspect`: show what the extractor sees in an export.

use std::path::Path;

use serde::Serialize;

use returnscan_config::Settings;
use returnscan_recon::{ColumnWarning, Progress, ShipmentRecord};

use crate::util;
use crate::workbook::load_returns;
use crate::CliError;

#[derive(Serialize)]
struct InspectOutput<'a> {
    file: String,
    sheet: &'a str,
    /// 1-based, as shown in a spreadsheet.
    header_row: usize,
    warnings: &'a [String],
    column_warnings: &'a [ColumnWarning],
    progress: Progress,
    records: &'a [ShipmentRecord],
}

pub fn cmd_inspect(file: &Path, json: bool, settings: &Settings) -> Result<(), CliError> {
    let loaded = load_returns(file, &settings.sheet)?;
    let ex = &loaded.extraction;

    if json {
        let out = InspectOutput {
            file: file.display().to_string(),
            sheet: &loaded.sheet_name,
            header_row: ex.header_row + 1,
            warnings: &loaded.warnings,
            column_warnings: &ex.warnings,
            progress: Progress::of(&ex.records),
            records: &ex.records,
        };
        let json_str = serde_json::to_string_pretty(&out)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
        return Ok(());
    }

    for w in &loaded.warnings {
        eprintln!("warning: {w}");
    }
    util::print_table(&ex.records).map_err(|e| CliError::io(e.to_string()))?;

    let shipments: std::collections::HashSet<_> = ex.records.iter().map(|r| r.awb.as_str()).collect();
    eprintln!(
        "{} records ({} shipments) from sheet '{}', header at row {}",
        ex.records.len(),
        shipments.len(),
        loaded.sheet_name,
        ex.header_row + 1
    );
    Ok(())
}

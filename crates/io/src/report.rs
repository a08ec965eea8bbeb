// XLSX report writer.

use std::path::Path;

use chrono::NaiveDate;
use rust_xlsxwriter::{Color, Format, FormatPattern, Workbook};

use returnscan_recon::Report;

use crate::error::ReportError;

/// Upper bound on auto-sized column widths, in characters.
const MAX_COLUMN_WIDTH: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportStyle {
    pub sheet_name: String,
    /// Fill for rows still pending, as 0xRRGGBB.
    pub highlight_rgb: u32,
}

impl Default for ReportStyle {
    fn default() -> Self {
        Self {
            sheet_name: "Returns Report".into(),
            highlight_rgb: 0xFFC7CE,
        }
    }
}

/// `{prefix}-YYYY-MM-DD.xlsx`
pub fn report_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{}-{}.xlsx", prefix, date.format("%Y-%m-%d"))
}

pub fn write_report(report: &Report, path: &Path, style: &ReportStyle) -> Result<(), ReportError> {
    let mut workbook = build_workbook(report, style)?;
    workbook.save(path)?;
    log::info!("wrote report with {} rows to {}", report.rows.len(), path.display());
    Ok(())
}

pub fn report_to_buffer(report: &Report, style: &ReportStyle) -> Result<Vec<u8>, ReportError> {
    let mut workbook = build_workbook(report, style)?;
    Ok(workbook.save_to_buffer()?)
}

fn build_workbook(report: &Report, style: &ReportStyle) -> Result<Workbook, ReportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&style.sheet_name)?;

    let header_format = Format::new().set_bold();
    let pending_format = Format::new()
        .set_pattern(FormatPattern::Solid)
        .set_background_color(Color::RGB(style.highlight_rgb));

    for (col, header) in report.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &header_format)?;
    }

    for (i, row) in report.rows.iter().enumerate() {
        let r = (i + 1) as u32;
        for (col, value) in row.cells.iter().enumerate() {
            if row.highlight {
                worksheet.write_string_with_format(r, col as u16, value, &pending_format)?;
            } else {
                worksheet.write_string(r, col as u16, value)?;
            }
        }
    }

    for (col, width) in report.column_widths.iter().enumerate() {
        let chars = (*width).min(MAX_COLUMN_WIDTH) + 2;
        worksheet.set_column_width(col as u16, chars as f64)?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    Ok(workbook)
}

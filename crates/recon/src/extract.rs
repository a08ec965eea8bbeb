//! Shipment record extraction from the returns export sheet.
//!
//! The sheet is human-formatted: one shipment spans several rows held
//! together by a merged grouping-key cell, the product column carries one
//! `Label: value` fragment per row, and the courier name sits on the row
//! directly below the tracking number.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::cell_text::DetailFields;
use crate::config::ExtractOptions;
use crate::error::{column_letter, ExtractError};
use crate::grid::{Cell, Grid, Span};
use crate::model::{DeliveredOn, ReturnType, ShipmentRecord, Status, PLACEHOLDER, UNKNOWN_COURIER};

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    ProductDetails,
    ReturnReason,
    ReturnShippingFee,
    DeliveredOn,
}

impl std::fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProductDetails => write!(f, "product details"),
            Self::ReturnReason => write!(f, "return reason"),
            Self::ReturnShippingFee => write!(f, "return shipping fee"),
            Self::DeliveredOn => write!(f, "delivered on"),
        }
    }
}

/// An optional column the header search could not find. Extraction continues
/// with placeholder values for that role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnWarning {
    pub role: ColumnRole,
    pub keyword: String,
    /// Column used instead, if the role has a positional fallback.
    pub fallback_column: Option<usize>,
}

impl std::fmt::Display for ColumnWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} column not found (no header containing '{}')", self.role, self.keyword)?;
        match self.fallback_column {
            Some(col) => write!(f, "; using column {}", column_letter(col)),
            None => write!(f, "; values default to '{PLACEHOLDER}'"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Extraction {
    pub records: Vec<ShipmentRecord>,
    /// Row span of each record, parallel to `records`.
    pub spans: Vec<Span>,
    pub header_row: usize,
    pub warnings: Vec<ColumnWarning>,
}

// ---------------------------------------------------------------------------
// Column resolution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Columns {
    awb: usize,
    group: usize,
    detail: usize,
    reason: Option<usize>,
    fee: Option<usize>,
    delivered: Option<usize>,
}

fn find_header_row(grid: &Grid, marker: &str) -> Option<usize> {
    let marker = marker.to_lowercase();
    (0..grid.height()).find(|&r| {
        grid.row(r)
            .iter()
            .any(|cell| cell.text().to_lowercase().contains(&marker))
    })
}

fn find_column(grid: &Grid, header_row: usize, keyword: &str, skip: &[usize]) -> Option<usize> {
    let keyword = keyword.to_lowercase();
    grid.row(header_row)
        .iter()
        .enumerate()
        .filter(|(c, _)| !skip.contains(c))
        .find(|(_, cell)| cell.text().to_lowercase().contains(&keyword))
        .map(|(c, _)| c)
}

fn check_fixed(grid: &Grid, header_row: usize, column: usize, expected: &str) -> Result<(), ExtractError> {
    let found = grid.text(header_row, column);
    if found.to_lowercase().contains(&expected.to_lowercase()) {
        Ok(())
    } else {
        Err(ExtractError::ColumnMismatch {
            column,
            expected: expected.to_string(),
            found: found.trim().to_string(),
        })
    }
}

fn resolve_columns(
    grid: &Grid,
    header_row: usize,
    opts: &ExtractOptions,
    warnings: &mut Vec<ColumnWarning>,
) -> Result<Columns, ExtractError> {
    check_fixed(grid, header_row, opts.awb_column, &opts.awb_header)?;
    check_fixed(grid, header_row, opts.group_column, &opts.group_header)?;

    let fixed = [opts.awb_column, opts.group_column];
    let mut optional = |role: ColumnRole, keyword: &str| {
        let found = find_column(grid, header_row, keyword, &fixed);
        if found.is_none() {
            log::warn!("{role} column not found by header '{keyword}'");
            warnings.push(ColumnWarning { role, keyword: keyword.to_string(), fallback_column: None });
        }
        found
    };

    let reason = optional(ColumnRole::ReturnReason, &opts.reason_header);
    let fee = optional(ColumnRole::ReturnShippingFee, &opts.fee_header);
    let delivered = optional(ColumnRole::DeliveredOn, &opts.delivered_header);

    let detail = match find_column(grid, header_row, &opts.detail_header, &fixed) {
        Some(col) => col,
        None => {
            log::warn!(
                "product details column not found by header '{}', using column {}",
                opts.detail_header,
                column_letter(opts.detail_column)
            );
            warnings.push(ColumnWarning {
                role: ColumnRole::ProductDetails,
                keyword: opts.detail_header.clone(),
                fallback_column: Some(opts.detail_column),
            });
            opts.detail_column
        }
    };

    Ok(Columns {
        awb: opts.awb_column,
        group: opts.group_column,
        detail,
        reason,
        fee,
        delivered,
    })
}

// ---------------------------------------------------------------------------
// Row walk
// ---------------------------------------------------------------------------

/// Extract shipment records from the first sheet's grid.
pub fn extract_records(grid: &Grid, opts: &ExtractOptions) -> Result<Extraction, ExtractError> {
    let header_row = find_header_row(grid, &opts.header_marker).ok_or_else(|| {
        ExtractError::HeaderNotFound { marker: opts.header_marker.clone() }
    })?;
    log::debug!("header row found at {}", header_row + 1);

    let mut warnings = Vec::new();
    let cols = resolve_columns(grid, header_row, opts, &mut warnings)?;

    let height = grid.height();
    let mut consumed = vec![false; height];
    let mut records = Vec::new();
    let mut spans = Vec::new();

    for row in (header_row + 1)..height {
        if consumed[row] {
            continue;
        }
        let awb = grid.text(row, cols.awb).trim().to_string();
        if !is_candidate(&awb) {
            continue;
        }
        consumed[row] = true;

        // The courier row is always the next one, whatever it holds.
        let courier = if row + 1 < height {
            consumed[row + 1] = true;
            non_blank(grid.text(row + 1, cols.awb)).unwrap_or_else(|| UNKNOWN_COURIER.to_string())
        } else {
            UNKNOWN_COURIER.to_string()
        };

        let span = shipment_span(grid, row, cols.group, header_row);
        records.push(build_record(grid, &cols, span, awb, courier));
        spans.push(span);
    }

    if records.is_empty() {
        return Err(ExtractError::NoRecords);
    }
    log::info!("extracted {} shipment records ({} column warnings)", records.len(), warnings.len());

    Ok(Extraction { records, spans, header_row, warnings })
}

fn is_candidate(awb: &str) -> bool {
    !awb.is_empty() && awb.chars().any(|c| c.is_ascii_digit())
}

fn non_blank(s: String) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

/// Row span for the candidate row: the grouping-key merge covering it, or the
/// row alone when there is no merge or the merge is out of bounds.
fn shipment_span(grid: &Grid, row: usize, group_col: usize, header_row: usize) -> Span {
    let Some(merge) = grid.merge_at(row, group_col) else {
        return Span::single(row);
    };
    let span = Span { start: merge.start_row, end: merge.end_row };
    if span.start <= header_row || span.end >= grid.height() || span.start > row || span.end < row {
        log::debug!("clamping merge {:?} at row {} to a single row", merge, row + 1);
        return Span::single(row);
    }
    span
}

fn build_record(grid: &Grid, cols: &Columns, span: Span, awb: String, courier: String) -> ShipmentRecord {
    let mut details = DetailFields::default();
    for r in span.rows() {
        details.scan_line(&grid.text(r, cols.detail));
        if details.is_complete() {
            break;
        }
    }
    let (sku, category, qty, size) = details.finish();

    let first = span.start;
    let optional_text = |col: Option<usize>| {
        col.and_then(|c| non_blank(grid.text(first, c)))
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    };

    let fee_cell = cols.fee.map(|c| grid.get(first, c));
    ShipmentRecord {
        awb,
        suborder_id: optional_text(Some(cols.group)),
        sku,
        category,
        qty,
        size,
        return_reason: optional_text(cols.reason),
        return_shipping_fee: optional_text(cols.fee),
        delivered_on: cols
            .delivered
            .map(|c| parse_delivered(grid.get(first, c)))
            .unwrap_or(DeliveredOn::Missing),
        courier_partner: courier,
        return_type: classify_return(fee_cell),
        status: Status::Pending,
    }
}

/// Zero return-shipping fee means the parcel came back undelivered (RTO).
fn classify_return(fee: Option<&Cell>) -> ReturnType {
    let Some(cell) = fee else {
        return ReturnType::CustomerReturn;
    };
    let is_zero = match cell.number() {
        Some(n) => n == 0.0,
        None => cell.text().trim() == "0",
    };
    if is_zero {
        ReturnType::Rto
    } else {
        ReturnType::CustomerReturn
    }
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%d %b %Y", "%d %B %Y", "%d-%b-%Y", "%b %d, %Y", "%d %b, %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%d-%m-%Y %H:%M"];

/// Best-effort delivery date: a real date when parseable, else the raw text.
pub fn parse_delivered(cell: &Cell) -> DeliveredOn {
    match cell {
        Cell::Date(d) => DeliveredOn::Date(*d),
        Cell::Empty => DeliveredOn::Missing,
        other => {
            let Some(text) = non_blank(other.text()) else {
                return DeliveredOn::Missing;
            };
            let date = DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(&text, f).ok())
                .or_else(|| {
                    DATETIME_FORMATS
                        .iter()
                        .find_map(|f| NaiveDateTime::parse_from_str(&text, f).ok())
                        .map(|dt| dt.date())
                });
            match date {
                Some(d) => DeliveredOn::Date(d),
                None => DeliveredOn::Raw(text),
            }
        }
    }
}

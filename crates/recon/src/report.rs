//! Tabular projection of the record list for export.

use serde::Serialize;

use crate::model::{ShipmentRecord, Status};

pub const REPORT_HEADERS: [&str; 12] = [
    "AWB Number",
    "Suborder ID",
    "SKU",
    "Category",
    "Qty",
    "Size",
    "Return Reason",
    "Return Shipping Fee",
    "Delivered On",
    "Courier Partner",
    "Return Type",
    "Status",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub cells: Vec<String>,
    /// Still pending: rendered with the highlight fill.
    pub highlight: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub headers: Vec<String>,
    pub rows: Vec<ReportRow>,
    /// Widest cell per column, header included, in characters.
    pub column_widths: Vec<usize>,
}

impl Report {
    pub fn pending_rows(&self) -> usize {
        self.rows.iter().filter(|r| r.highlight).count()
    }
}

fn row_cells(r: &ShipmentRecord) -> Vec<String> {
    vec![
        r.awb.clone(),
        r.suborder_id.clone(),
        r.sku.clone(),
        r.category.clone(),
        r.qty.clone(),
        r.size.clone(),
        r.return_reason.clone(),
        r.return_shipping_fee.clone(),
        r.delivered_on.to_string(),
        r.courier_partner.clone(),
        r.return_type.to_string(),
        r.status.to_string(),
    ]
}

/// One row per record in list order, every record included.
pub fn project_report(records: &[ShipmentRecord]) -> Report {
    let headers: Vec<String> = REPORT_HEADERS.iter().map(|h| h.to_string()).collect();
    let mut column_widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();

    let rows: Vec<ReportRow> = records
        .iter()
        .map(|r| {
            let cells = row_cells(r);
            for (w, c) in column_widths.iter_mut().zip(&cells) {
                *w = (*w).max(c.chars().count());
            }
            ReportRow { cells, highlight: r.status == Status::Pending }
        })
        .collect();

    log::debug!("projected report: {} rows", rows.len());
    Report { headers, rows, column_widths }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::record;
    use crate::model::DeliveredOn;
    use chrono::NaiveDate;

    #[test]
    fn one_row_per_record_in_order() {
        let mut a = record("1234567890", "Ekart");
        a.delivered_on = DeliveredOn::Date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        let mut b = record("1234567890", "Ekart");
        b.suborder_id = "SO-2".into();
        b.status = Status::Done;
        let report = project_report(&[a, b]);

        assert_eq!(report.headers.len(), 12);
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].cells[8], "05-01-2024");
        assert_eq!(report.rows[0].cells[11], "Pending");
        assert_eq!(report.rows[1].cells[1], "SO-2");
        assert_eq!(report.rows[1].cells[11], "Done");
        assert!(report.rows[0].highlight);
        assert!(!report.rows[1].highlight);
        assert_eq!(report.pending_rows(), 1);
    }

    #[test]
    fn widths_cover_header_and_content() {
        let mut a = record("1", "Ekart");
        a.return_reason = "Received a completely different product".into();
        let report = project_report(&[a]);
        assert_eq!(report.column_widths[0], "AWB Number".len());
        assert_eq!(report.column_widths[6], "Received a completely different product".len());
    }

    #[test]
    fn empty_list_still_has_headers() {
        let report = project_report(&[]);
        assert!(report.rows.is_empty());
        assert_eq!(report.column_widths.len(), report.headers.len());
    }
}

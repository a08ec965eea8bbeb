use std::io::{self, Write};

use unicode_width::UnicodeWidthStr;

use returnscan_recon::ShipmentRecord;

/// Display width of a string, accounting for CJK double-width, emoji, etc.
pub(crate) fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate a string to fit within `width` display columns, adding ".." if truncated.
pub(crate) fn truncate_display(s: &str, width: usize) -> String {
    if width < 3 {
        for ch in s.chars() {
            let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
            if cw <= width {
                return ch.to_string();
            }
        }
        return String::new();
    }

    if display_width(s) <= width {
        return s.to_string();
    }

    let budget = width - 2;
    let mut used = 0;
    let mut end_byte = 0;
    for (i, ch) in s.char_indices() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + cw > budget {
            end_byte = i;
            break;
        }
        used += cw;
        end_byte = i + ch.len_utf8();
    }

    format!("{}..", &s[..end_byte])
}

/// Pad or truncate a string to exactly `width` display columns.
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let sw = display_width(s);
    if sw > width {
        truncate_display(s, width)
    } else {
        format!("{}{}", s, " ".repeat(width - sw))
    }
}

// ---------------------------------------------------------------------------
// Record table
// ---------------------------------------------------------------------------

/// Column headers and display widths for record listings.
pub(crate) const RECORD_COLUMNS: [(&str, usize); 7] = [
    ("AWB", 16),
    ("Suborder", 14),
    ("Courier", 12),
    ("Type", 15),
    ("Delivered", 10),
    ("Reason", 22),
    ("Product", 40),
];

pub(crate) fn record_cells(r: &ShipmentRecord) -> [String; 7] {
    [
        r.awb.clone(),
        r.suborder_id.clone(),
        r.courier_partner.clone(),
        r.return_type.to_string(),
        r.delivered_on.to_string(),
        r.return_reason.clone(),
        r.product_details(),
    ]
}

pub(crate) fn table_header() -> String {
    RECORD_COLUMNS
        .iter()
        .map(|(name, w)| pad_right(name, *w))
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn table_row(r: &ShipmentRecord) -> String {
    record_cells(r)
        .iter()
        .zip(RECORD_COLUMNS.iter())
        .map(|(value, (_, w))| pad_right(value, *w))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Plain-text record table to stdout.
pub(crate) fn print_table<'a>(records: impl IntoIterator<Item = &'a ShipmentRecord>) -> io::Result<()> {
    let out = io::stdout();
    let mut w = out.lock();
    writeln!(w, "{}", table_header())?;
    for r in records {
        writeln!(w, "{}", table_row(r).trim_end())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use returnscan_recon::{DeliveredOn, ReturnType, Status};

    #[test]
    fn display_width_cjk() {
        assert_eq!(display_width("\u{4e16}\u{754c}"), 4);
    }

    #[test]
    fn truncate_cuts() {
        assert_eq!(truncate_display("abcdef", 5), "abc..");
        assert_eq!(truncate_display("abc", 2), "a");
        assert_eq!(truncate_display("", 0), "");
    }

    #[test]
    fn pad_right_pads_and_truncates() {
        assert_eq!(pad_right("ab", 5), "ab   ");
        assert_eq!(pad_right("abcdef", 5), "abc..");
    }

    #[test]
    fn table_row_aligns_with_header() {
        let r = ShipmentRecord {
            awb: "1234567890".into(),
            suborder_id: "S-1".into(),
            sku: "A".into(),
            category: "-".into(),
            qty: "1".into(),
            size: "M".into(),
            return_reason: "Size issue".into(),
            return_shipping_fee: "45".into(),
            delivered_on: DeliveredOn::Missing,
            courier_partner: "Ekart".into(),
            return_type: ReturnType::Rto,
            status: Status::Pending,
        };
        let row = table_row(&r);
        assert_eq!(display_width(&row), display_width(&table_header()));
        assert!(row.starts_with("1234567890"));
        assert!(row.contains("RTO"));
    }
}

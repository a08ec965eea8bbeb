//! Labeled-value scanning for free-text product detail cells.

use crate::model::PLACEHOLDER;

/// Pull the value following `label` out of `cell_text`.
///
/// Returns `""` when the label is absent (caller tries the next label or row)
/// and `"-"` when the label is present but its value is blank.
pub fn extract_labeled_value(cell_text: &str, label: &str) -> String {
    if label.is_empty() {
        return String::new();
    }
    let Some(end) = find_ignore_case(cell_text, label) else {
        return String::new();
    };

    let rest = &cell_text[end..];
    let rest = rest.trim_start();
    let rest = rest
        .strip_prefix(|c: char| matches!(c, ':' | '-' | '=' | '.'))
        .unwrap_or(rest);

    let value = rest.trim();
    if value.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        value.to_string()
    }
}

/// Byte offset just past the first case-insensitive occurrence of `needle`.
fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack.char_indices().find_map(|(start, _)| {
        let mut chars = haystack[start..].chars();
        let mut end = start;
        let matched = needle.chars().all(|nc| match chars.next() {
            Some(hc) => {
                end += hc.len_utf8();
                hc.to_lowercase().eq(nc.to_lowercase())
            }
            None => false,
        });
        matched.then_some(end)
    })
}

/// Detail fields scanned from the product column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailField {
    Sku,
    Category,
    Qty,
    Size,
}

/// Ordered `(field, candidate labels)` table. Longer spellings come first so
/// that `SKU ID: X` is not read as `ID: X` through the shorter label.
pub const DETAIL_LABELS: &[(DetailField, &[&str])] = &[
    (DetailField::Sku, &["SKU ID", "SKU"]),
    (DetailField::Category, &["Category"]),
    (DetailField::Qty, &["Quantity", "Qty"]),
    (DetailField::Size, &["Size"]),
];

/// Values found so far for one shipment span.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFields {
    pub sku: Option<String>,
    pub category: Option<String>,
    pub qty: Option<String>,
    pub size: Option<String>,
}

impl DetailFields {
    fn slot(&mut self, field: DetailField) -> &mut Option<String> {
        match field {
            DetailField::Sku => &mut self.sku,
            DetailField::Category => &mut self.category,
            DetailField::Qty => &mut self.qty,
            DetailField::Size => &mut self.size,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.sku.is_some() && self.category.is_some() && self.qty.is_some() && self.size.is_some()
    }

    /// Feed one line of detail text. Fields already found are never overwritten.
    pub fn scan_line(&mut self, text: &str) {
        for (field, labels) in DETAIL_LABELS {
            let slot = self.slot(*field);
            if slot.is_some() {
                continue;
            }
            if let Some(value) = labels
                .iter()
                .map(|label| extract_labeled_value(text, label))
                .find(|v| !v.is_empty())
            {
                *slot = Some(value);
            }
        }
    }

    /// Resolve into `(sku, category, qty, size)` with placeholders for misses.
    pub fn finish(self) -> (String, String, String, String) {
        let or_dash = |v: Option<String>| v.unwrap_or_else(|| PLACEHOLDER.to_string());
        (or_dash(self.sku), or_dash(self.category), or_dash(self.qty), or_dash(self.size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_after_colon() {
        assert_eq!(extract_labeled_value("SKU: ABC-12", "sku"), "ABC-12");
        assert_eq!(extract_labeled_value("  category :  Saree ", "Category"), "Saree");
    }

    #[test]
    fn missing_label_is_empty_blank_value_is_placeholder() {
        assert_eq!(extract_labeled_value("Size: L", "Qty"), "");
        assert_eq!(extract_labeled_value("Qty:", "Qty"), "-");
        assert_eq!(extract_labeled_value("Qty:   ", "qty"), "-");
    }

    #[test]
    fn strips_only_one_separator() {
        assert_eq!(extract_labeled_value("Size:: XL", "Size"), ": XL");
    }

    #[test]
    fn long_label_preferred_over_prefix() {
        let mut fields = DetailFields::default();
        fields.scan_line("SKU ID: KURTI-RED-01");
        assert_eq!(fields.sku.as_deref(), Some("KURTI-RED-01"));
    }

    #[test]
    fn first_value_wins_across_lines() {
        let mut fields = DetailFields::default();
        fields.scan_line("Qty: 2");
        fields.scan_line("Quantity: 5");
        fields.scan_line("Size: M");
        assert_eq!(fields.qty.as_deref(), Some("2"));
        assert!(!fields.is_complete());
        let (sku, category, qty, size) = fields.finish();
        assert_eq!((sku.as_str(), category.as_str(), qty.as_str(), size.as_str()), ("-", "-", "2", "M"));
    }

    #[test]
    fn non_ascii_text_is_safe() {
        assert_eq!(extract_labeled_value("İtem Size: S", "size"), "S");
    }
}

use chrono::NaiveDate;
use serde::Serialize;

/// Placeholder for a field that is blank in the sheet or could not be located.
pub const PLACEHOLDER: &str = "-";

/// Courier name used when the row below the tracking number is unreadable.
pub const UNKNOWN_COURIER: &str = "Unknown";

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One physical return shipment extracted from the export sheet.
///
/// Several records may share an `awb` when one shipment carries multiple
/// suborders. Only `status` changes after extraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipmentRecord {
    pub awb: String,
    pub suborder_id: String,
    pub sku: String,
    pub category: String,
    pub qty: String,
    pub size: String,
    pub return_reason: String,
    pub return_shipping_fee: String,
    pub delivered_on: DeliveredOn,
    pub courier_partner: String,
    pub return_type: ReturnType,
    pub status: Status,
}

impl ShipmentRecord {
    pub fn is_pending(&self) -> bool {
        self.status == Status::Pending
    }

    /// Product detail line used for display and substring filtering.
    pub fn product_details(&self) -> String {
        format!(
            "SKU: {} | Category: {} | Qty: {} | Size: {}",
            self.sku, self.category, self.qty, self.size
        )
    }

    /// Quantity as an integer, when the free text holds one.
    pub fn quantity(&self) -> Option<i64> {
        self.qty.trim().parse().ok()
    }
}

/// Normalize a tracking number for matching: trimmed, case-folded.
pub fn normalize_awb(awb: &str) -> String {
    awb.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ReturnType {
    #[serde(rename = "RTO")]
    Rto,
    #[serde(rename = "Customer Return")]
    CustomerReturn,
}

impl ReturnType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Rto => "RTO",
            Self::CustomerReturn => "Customer Return",
        }
    }

    /// Accepts the display label or a short form (`rto`, `customer`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "rto" => Some(Self::Rto),
            "customer return" | "customer" | "customer_return" => Some(Self::CustomerReturn),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReturnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Status {
    Pending,
    Done,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Done => write!(f, "Done"),
        }
    }
}

/// Delivery date as read from the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DeliveredOn {
    Date(NaiveDate),
    Raw(String),
    Missing,
}

/// Display format shared by the filter view and the report.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

impl std::fmt::Display for DeliveredOn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Self::Raw(s) => f.write_str(s),
            Self::Missing => f.write_str(PLACEHOLDER),
        }
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Progress {
    pub total: usize,
    pub done: usize,
    pub pending: usize,
}

impl Progress {
    pub fn of(records: &[ShipmentRecord]) -> Self {
        let done = records.iter().filter(|r| r.status == Status::Done).count();
        Self {
            total: records.len(),
            done,
            pending: records.len() - done,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A pending record with placeholder details.
    pub fn record(awb: &str, courier: &str) -> ShipmentRecord {
        ShipmentRecord {
            awb: awb.into(),
            suborder_id: format!("SO-{awb}"),
            sku: "SKU-1".into(),
            category: "Kurti".into(),
            qty: "1".into(),
            size: "M".into(),
            return_reason: "Size too small".into(),
            return_shipping_fee: "45".into(),
            delivered_on: DeliveredOn::Missing,
            courier_partner: courier.into(),
            return_type: ReturnType::CustomerReturn,
            status: Status::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_folds_case() {
        assert_eq!(normalize_awb("  ab12CD \t"), "ab12cd");
    }

    #[test]
    fn delivered_on_display() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(DeliveredOn::Date(d).to_string(), "09-03-2024");
        assert_eq!(DeliveredOn::Raw("soon".into()).to_string(), "soon");
        assert_eq!(DeliveredOn::Missing.to_string(), "-");
    }

    #[test]
    fn return_type_parse_accepts_short_forms() {
        assert_eq!(ReturnType::parse("RTO"), Some(ReturnType::Rto));
        assert_eq!(ReturnType::parse("customer"), Some(ReturnType::CustomerReturn));
        assert_eq!(ReturnType::parse("Customer Return"), Some(ReturnType::CustomerReturn));
        assert_eq!(ReturnType::parse("exchange"), None);
    }

    #[test]
    fn progress_counts() {
        let mut records = vec![fixtures::record("111111", "X"), fixtures::record("222222", "Y")];
        records[1].status = Status::Done;
        let p = Progress::of(&records);
        assert_eq!(p, Progress { total: 2, done: 1, pending: 1 });
    }
}

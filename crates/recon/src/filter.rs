use std::collections::BTreeSet;

use crate::model::{ReturnType, ShipmentRecord, Status};

/// Filters for the pending view. Empty sets and `None` text filters do not
/// restrict their dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    /// Courier names, compared case-insensitively.
    pub couriers: BTreeSet<String>,
    pub return_types: BTreeSet<ReturnType>,
    /// Delivery dates in their display form (see `DeliveredOn`'s `Display`).
    pub delivered_on: BTreeSet<String>,
    pub awb: Option<String>,
    pub suborder: Option<String>,
    pub product: Option<String>,
    pub reason: Option<String>,
    /// Words that must each appear somewhere in the product details.
    pub keywords: Vec<String>,
}

fn contains_ci(haystack: &str, needle: &Option<String>) -> bool {
    match needle.as_deref().map(str::trim) {
        None | Some("") => true,
        Some(n) => haystack.to_lowercase().contains(&n.to_lowercase()),
    }
}

fn same_courier(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

impl FilterSet {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn accepts(&self, record: &ShipmentRecord) -> bool {
        (self.couriers.is_empty() || self.couriers.iter().any(|c| same_courier(c, &record.courier_partner)))
            && (self.return_types.is_empty() || self.return_types.contains(&record.return_type))
            && (self.delivered_on.is_empty() || self.delivered_on.contains(&record.delivered_on.to_string()))
            && contains_ci(&record.awb, &self.awb)
            && contains_ci(&record.suborder_id, &self.suborder)
            && contains_ci(&record.product_details(), &self.product)
            && contains_ci(&record.return_reason, &self.reason)
            && self.has_keywords(&record.product_details())
    }

    fn has_keywords(&self, product: &str) -> bool {
        let product = product.to_lowercase();
        self.keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .all(|k| product.contains(&k.to_lowercase()))
    }
}

/// Records still pending that pass every filter, with their list positions.
pub fn pending_view<'a>(records: &'a [ShipmentRecord], filters: &FilterSet) -> Vec<(usize, &'a ShipmentRecord)> {
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.status == Status::Pending && filters.accepts(r))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Courier,
    ReturnType,
    DeliveredOn,
}

/// Distinct values of one discrete dimension, in first-seen order.
pub fn distinct_values(records: &[ShipmentRecord], facet: Facet) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for r in records {
        let value = match facet {
            Facet::Courier => r.courier_partner.clone(),
            Facet::ReturnType => r.return_type.to_string(),
            Facet::DeliveredOn => r.delivered_on.to_string(),
        };
        if seen.insert(value.clone()) {
            out.push(value);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::record;
    use crate::model::DeliveredOn;
    use chrono::NaiveDate;

    fn records() -> Vec<ShipmentRecord> {
        let mut a = record("1111100001", "Ekart");
        a.delivered_on = DeliveredOn::Date(NaiveDate::from_ymd_opt(2024, 4, 2).unwrap());
        let mut b = record("2222200002", "Delhivery");
        b.return_type = ReturnType::Rto;
        b.return_reason = "Customer unavailable".into();
        let mut c = record("3333300003", "Ekart");
        c.status = Status::Done;
        let mut d = record("4444400004", "Shadowfax");
        d.sku = "BLUE-SAREE".into();
        vec![a, b, c, d]
    }

    #[test]
    fn empty_filter_shows_all_pending() {
        let recs = records();
        let view = pending_view(&recs, &FilterSet::default());
        let positions: Vec<_> = view.iter().map(|(p, _)| *p).collect();
        assert_eq!(positions, [0, 1, 3]);
    }

    #[test]
    fn discrete_sets_combine() {
        let recs = records();
        let filters = FilterSet {
            couriers: ["ekart".to_string(), "Delhivery".to_string()].into(),
            return_types: [ReturnType::CustomerReturn].into(),
            ..Default::default()
        };
        let view = pending_view(&recs, &filters);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].1.awb, "1111100001");
    }

    #[test]
    fn delivered_filter_uses_display_form() {
        let recs = records();
        let filters = FilterSet { delivered_on: ["02-04-2024".to_string()].into(), ..Default::default() };
        assert_eq!(pending_view(&recs, &filters).len(), 1);
    }

    #[test]
    fn text_filters_are_case_insensitive_substrings() {
        let recs = records();
        let filters = FilterSet { product: Some("blue-saree".into()), ..Default::default() };
        assert_eq!(pending_view(&recs, &filters)[0].0, 3);

        let filters = FilterSet { reason: Some("UNAVAILABLE".into()), awb: Some("22222".into()), ..Default::default() };
        assert_eq!(pending_view(&recs, &filters)[0].0, 1);

        let blank = FilterSet { suborder: Some("  ".into()), ..Default::default() };
        assert_eq!(pending_view(&recs, &blank).len(), 3);
    }

    #[test]
    fn keywords_match_independently() {
        let recs = records();
        let words = |ws: &[&str]| FilterSet { keywords: ws.iter().map(|w| w.to_string()).collect(), ..Default::default() };

        // both words present, neither adjacent nor in order
        assert_eq!(pending_view(&recs, &words(&["saree", "blue"]))[0].0, 3);
        assert!(pending_view(&recs, &words(&["saree", "green"])).is_empty());

        let contiguous = FilterSet { product: Some("saree blue".into()), ..Default::default() };
        assert!(pending_view(&recs, &contiguous).is_empty());
    }

    #[test]
    fn done_records_never_shown() {
        let recs = records();
        let filters = FilterSet { awb: Some("33333".into()), ..Default::default() };
        assert!(pending_view(&recs, &filters).is_empty());
    }

    #[test]
    fn facets_in_first_seen_order() {
        let recs = records();
        assert_eq!(distinct_values(&recs, Facet::Courier), ["Ekart", "Delhivery", "Shadowfax"]);
        assert_eq!(distinct_values(&recs, Facet::ReturnType), ["Customer Return", "RTO"]);
        assert_eq!(distinct_values(&recs, Facet::DeliveredOn), ["02-04-2024", "-"]);
    }
}

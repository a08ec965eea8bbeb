use std::collections::HashMap;

use serde::Serialize;

use crate::model::{normalize_awb, ShipmentRecord};

/// Lookup tables over one record list. Rebuilt whole whenever the list is
/// replaced; never patched.
#[derive(Debug, Clone, Default)]
pub struct MatchIndex {
    /// Normalized tracking number -> record positions.
    exact: HashMap<String, Vec<usize>>,
    /// Tracking number minus its final character -> positions, for the
    /// fuzzy carrier only. Keys are all-digit.
    prefix: HashMap<String, Vec<usize>>,
}

/// How a lookup found its records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Prefix,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub kind: MatchKind,
    pub positions: Vec<usize>,
}

impl MatchIndex {
    pub fn build(records: &[ShipmentRecord], fuzzy_carrier_marker: &str) -> Self {
        let marker = fuzzy_carrier_marker.trim().to_lowercase();
        let mut exact: HashMap<String, Vec<usize>> = HashMap::new();
        let mut prefix: HashMap<String, Vec<usize>> = HashMap::new();

        for (pos, record) in records.iter().enumerate() {
            let key = normalize_awb(&record.awb);
            if key.is_empty() {
                continue;
            }
            exact.entry(key.clone()).or_default().push(pos);

            if marker.is_empty() || !record.courier_partner.to_lowercase().contains(&marker) {
                continue;
            }
            if let Some(p) = numeric_prefix(&key) {
                prefix.entry(p.to_string()).or_default().push(pos);
            }
        }

        log::debug!("match index: {} exact keys, {} prefix keys", exact.len(), prefix.len());
        Self { exact, prefix }
    }

    /// Exact match first; the prefix table is consulted only when that is empty.
    ///
    /// The fallback tries the input minus its last character (last digit
    /// altered) and then the whole input (last digit omitted). Both keys must
    /// be all-digit.
    pub fn lookup(&self, input: &str) -> Option<Lookup> {
        let key = normalize_awb(input);
        if let Some(positions) = self.exact.get(&key) {
            return Some(Lookup { kind: MatchKind::Exact, positions: positions.clone() });
        }
        if key.chars().count() <= 1 {
            return None;
        }
        let p = numeric_prefix(&key)?;
        let positions = self.prefix.get(p).or_else(|| {
            if key.chars().all(|c| c.is_ascii_digit()) {
                self.prefix.get(&key)
            } else {
                None
            }
        })?;
        Some(Lookup { kind: MatchKind::Prefix, positions: positions.clone() })
    }

    pub fn exact_len(&self) -> usize {
        self.exact.len()
    }

    pub fn prefix_len(&self) -> usize {
        self.prefix.len()
    }
}

/// `key` without its final character, when that remainder is all digits.
fn numeric_prefix(key: &str) -> Option<&str> {
    let (last_idx, _) = key.char_indices().last()?;
    let p = &key[..last_idx];
    if !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()) {
        Some(p)
    } else {
        None
    }
}

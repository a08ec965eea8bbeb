use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Sheet layout
// ---------------------------------------------------------------------------

/// Where the extractor looks for each column role.
///
/// Column indices are zero-based. The tracking-number and grouping-key
/// columns are fixed and must carry their header text; the others are
/// located by header keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractOptions {
    /// Lowercase phrase identifying the header row.
    pub header_marker: String,
    pub awb_column: usize,
    pub awb_header: String,
    pub group_column: usize,
    pub group_header: String,
    /// Fallback position of the product detail column when no header matches.
    pub detail_column: usize,
    pub detail_header: String,
    pub reason_header: String,
    pub fee_header: String,
    pub delivered_header: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            header_marker: "awb".into(),
            awb_column: 5,
            awb_header: "awb".into(),
            group_column: 1,
            group_header: "suborder".into(),
            detail_column: 0,
            detail_header: "product".into(),
            reason_header: "reason".into(),
            fee_header: "fee".into(),
            delivered_header: "delivered".into(),
        }
    }
}

impl ExtractOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.header_marker.trim().is_empty() {
            return Err(ConfigError("sheet.header_marker must not be empty".into()));
        }
        if self.awb_column == self.group_column {
            return Err(ConfigError(format!(
                "sheet.awb_column and sheet.group_column are both {}",
                self.awb_column
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchOptions {
    /// Inputs shorter than this (after trimming) are never looked up.
    pub min_input_len: usize,
    /// Courier-name substring of the one carrier whose tracking numbers
    /// may match with the final character missing or altered.
    pub fuzzy_carrier_marker: String,
    /// Return-reason substrings that flag a quality-related return.
    pub quality_keywords: Vec<String>,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            min_input_len: 5,
            fuzzy_carrier_marker: "delhivery".into(),
            quality_keywords: [
                "damaged", "defective", "wrong", "missing", "quality", "torn", "used", "stain",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl MatchOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_input_len < 2 {
            return Err(ConfigError(format!(
                "matching.min_input_len must be at least 2, got {}",
                self.min_input_len
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingOptions {
    pub debounce_ms: u64,
    pub auto_clear_ms: u64,
    pub success_toast_ms: u64,
    pub failure_toast_ms: u64,
}

impl Default for TimingOptions {
    fn default() -> Self {
        Self {
            debounce_ms: 50,
            auto_clear_ms: 3000,
            success_toast_ms: 2500,
            failure_toast_ms: 3000,
        }
    }
}

impl TimingOptions {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn auto_clear(&self) -> Duration {
        Duration::from_millis(self.auto_clear_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auto_clear_ms <= self.debounce_ms {
            return Err(ConfigError(format!(
                "timing.auto_clear_ms ({}) must exceed timing.debounce_ms ({})",
                self.auto_clear_ms, self.debounce_ms
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let opts: MatchOptions = toml::from_str(
            r#"
fuzzy_carrier_marker = "ecom express"
"#,
        )
        .unwrap();
        assert_eq!(opts.fuzzy_carrier_marker, "ecom express");
        assert_eq!(opts.min_input_len, 5);
        assert!(opts.quality_keywords.iter().any(|k| k == "damaged"));
    }

    #[test]
    fn unknown_key_rejected() {
        let err = toml::from_str::<ExtractOptions>("awb_colum = 3");
        assert!(err.is_err(), "typo in key should fail deserialization");
    }

    #[test]
    fn reject_same_fixed_columns() {
        let opts = ExtractOptions { awb_column: 1, group_column: 1, ..Default::default() };
        let err = opts.validate().unwrap_err();
        assert!(err.to_string().contains("both 1"));
    }

    #[test]
    fn reject_short_auto_clear() {
        let opts = TimingOptions { debounce_ms: 100, auto_clear_ms: 50, ..Default::default() };
        assert!(opts.validate().is_err());
        assert!(TimingOptions::default().validate().is_ok());
    }

    #[test]
    fn reject_tiny_min_len() {
        let opts = MatchOptions { min_input_len: 1, ..Default::default() };
        assert!(opts.validate().is_err());
    }
}

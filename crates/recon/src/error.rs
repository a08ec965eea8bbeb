use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// No row contains the tracking-number header marker.
    HeaderNotFound { marker: String },
    /// A fixed-position column does not carry its expected header text.
    ColumnMismatch { column: usize, expected: String, found: String },
    /// Header located but no row yielded a tracking number.
    NoRecords,
}

impl ExtractError {
    /// Structural failures abort parsing; `NoRecords` is a data outcome.
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::NoRecords)
    }
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeaderNotFound { marker } => {
                write!(f, "header row not found: no cell contains '{marker}'")
            }
            Self::ColumnMismatch { column, expected, found } => write!(
                f,
                "column {} header is '{found}', expected text containing '{expected}'",
                column_letter(*column)
            ),
            Self::NoRecords => write!(f, "no shipments found below the header row"),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Invalid settings value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(pub String);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config validation error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

/// Convert column index to spreadsheet letter (0 = A, 26 = AA).
pub fn column_letter(col: usize) -> String {
    let mut result = String::new();
    let mut n = col + 1;
    while n > 0 {
        n -= 1;
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    result
}

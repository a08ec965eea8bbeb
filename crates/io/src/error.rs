use std::fmt;
use std::path::PathBuf;

/// Failure to turn a file into a grid. Never fatal to a running session:
/// the caller keeps whatever list it had before.
#[derive(Debug)]
pub enum LoadError {
    Read { path: PathBuf, source: std::io::Error },
    Open(String),
    NoSheets,
    Sheet { name: String, message: String },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Read { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            LoadError::Open(msg) => write!(f, "not a readable spreadsheet: {msg}"),
            LoadError::NoSheets => write!(f, "workbook contains no sheets"),
            LoadError::Sheet { name, message } => write!(f, "failed to read sheet '{name}': {message}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Read { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum ReportError {
    Write(String),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Write(msg) => write!(f, "failed to write report: {msg}"),
        }
    }
}

impl std::error::Error for ReportError {}

impl From<rust_xlsxwriter::XlsxError> for ReportError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        ReportError::Write(e.to_string())
    }
}

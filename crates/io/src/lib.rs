// File I/O: returns export loading and report writing

pub mod error;
pub mod merges;
pub mod report;
pub mod sheet;

pub use error::{LoadError, ReportError};
pub use report::{report_file_name, report_to_buffer, write_report, ReportStyle};
pub use sheet::{load_grid, load_grid_from_bytes, LoadedSheet};

//! `returnscan-recon`: return shipment extraction and scan verification.
//!
//! Pure engine crate: receives an in-memory grid, extracts shipment records,
//! and verifies scanned tracking numbers against them. No file or terminal
//! IO happens here.

pub mod cell_text;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod filter;
pub mod grid;
pub mod matcher;
pub mod model;
pub mod notify;
pub mod report;
pub mod timer;

pub use config::{ExtractOptions, MatchOptions, TimingOptions};
pub use engine::{ScanEvent, Verifier};
pub use error::{ConfigError, ExtractError};
pub use extract::{extract_records, ColumnWarning, Extraction};
pub use filter::{distinct_values, pending_view, Facet, FilterSet};
pub use grid::{Cell, Grid, MergeRange};
pub use model::{DeliveredOn, Progress, ReturnType, ShipmentRecord, Status};
pub use notify::{Cue, CuePlayer, Notification, Notifier, Outcome};
pub use report::{project_report, Report, ReportRow};

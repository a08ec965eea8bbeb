// Configuration loading

pub mod settings;

pub use settings::{ReportSettings, Settings, SettingsError};

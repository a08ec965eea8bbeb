// Operator settings (settings.toml)

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use returnscan_recon::{ConfigError, ExtractOptions, MatchOptions, TimingOptions};

/// Report output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportSettings {
    /// File name prefix; the date and `.xlsx` are appended.
    pub file_prefix: String,
    pub sheet_name: String,
    /// Fill for pending rows, `#RRGGBB`.
    pub highlight_color: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            file_prefix: "returns-report".into(),
            sheet_name: "Returns Report".into(),
            highlight_color: "#FFC7CE".into(),
        }
    }
}

impl ReportSettings {
    pub fn highlight_rgb(&self) -> Result<u32, ConfigError> {
        let hex = self.highlight_color.trim().trim_start_matches('#');
        if hex.len() != 6 {
            return Err(ConfigError(format!(
                "report.highlight_color must be #RRGGBB, got '{}'",
                self.highlight_color
            )));
        }
        u32::from_str_radix(hex, 16)
            .map_err(|_| ConfigError(format!("report.highlight_color is not hex: '{}'", self.highlight_color)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub sheet: ExtractOptions,
    pub matching: MatchOptions,
    pub timing: TimingOptions,
    pub report: ReportSettings,
}

#[derive(Debug)]
pub enum SettingsError {
    Read { path: PathBuf, source: std::io::Error },
    Parse { path: Option<PathBuf>, message: String },
    Invalid(ConfigError),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Read { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            SettingsError::Parse { path: Some(path), message } => {
                write!(f, "invalid settings in {}: {message}", path.display())
            }
            SettingsError::Parse { path: None, message } => write!(f, "invalid settings: {message}"),
            SettingsError::Invalid(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<ConfigError> for SettingsError {
    fn from(e: ConfigError) -> Self {
        SettingsError::Invalid(e)
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("returnscan");
        config_dir.join("settings.toml")
    }

    /// Load settings from the default location. A missing file yields
    /// defaults and a commented template is written for the operator.
    pub fn load() -> Result<Self, SettingsError> {
        let path = Self::config_path();
        if !path.exists() {
            create_default_file(&path);
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load settings from an explicit path; the file must exist.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path)
            .map_err(|source| SettingsError::Read { path: path.to_path_buf(), source })?;
        let settings: Settings = toml::from_str(&contents).map_err(|e| SettingsError::Parse {
            path: Some(path.to_path_buf()),
            message: e.to_string(),
        })?;
        settings.validate()?;
        log::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn from_toml(s: &str) -> Result<Self, SettingsError> {
        let settings: Settings =
            toml::from_str(s).map_err(|e| SettingsError::Parse { path: None, message: e.to_string() })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_toml(&self) -> String {
        // Every field is a plain scalar or list, so serialization cannot fail.
        toml::to_string_pretty(self).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sheet.validate()?;
        self.matching.validate()?;
        self.timing.validate()?;
        self.report.highlight_rgb()?;
        if self.report.file_prefix.trim().is_empty() {
            return Err(ConfigError("report.file_prefix must not be empty".into()));
        }
        Ok(())
    }

    /// Get the config file path for display
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}

const DEFAULT_FILE: &str = r##"# returnscan settings
# Column indices are zero-based (A = 0).

[sheet]
header_marker = "awb"
awb_column = 5
awb_header = "awb"
group_column = 1
group_header = "suborder"
detail_column = 0
detail_header = "product"
reason_header = "reason"
fee_header = "fee"
delivered_header = "delivered"

[matching]
min_input_len = 5
# Courier whose tracking numbers may be scanned with the last digit missing or altered
fuzzy_carrier_marker = "delhivery"
quality_keywords = ["damaged", "defective", "wrong", "missing", "quality", "torn", "used", "stain"]

[timing]
debounce_ms = 50
auto_clear_ms = 3000
success_toast_ms = 2500
failure_toast_ms = 3000

[report]
file_prefix = "returns-report"
sheet_name = "Returns Report"
highlight_color = "#FFC7CE"
"##;

fn create_default_file(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            log::warn!("cannot create config directory {}: {e}", parent.display());
            return;
        }
    }
    if let Err(e) = fs::write(path, DEFAULT_FILE) {
        log::warn!("cannot write default settings to {}: {e}", path.display());
    }
}

//! Loading an export into records, shared by every command.

use std::path::{Path, PathBuf};

use returnscan_config::Settings;
use returnscan_io::{load_grid, report_file_name, write_report, LoadError, ReportStyle};
use returnscan_recon::{extract_records, project_report, ExtractOptions, Extraction, ShipmentRecord};

use crate::exit_codes::EXIT_CONFIG;
use crate::CliError;

pub struct LoadedReturns {
    pub sheet_name: String,
    pub extraction: Extraction,
    /// Loader warnings followed by column warnings, ready for display.
    pub warnings: Vec<String>,
}

pub fn load_returns(path: &Path, opts: &ExtractOptions) -> Result<LoadedReturns, CliError> {
    let loaded = load_grid(path).map_err(|e| {
        let hint = matches!(e, LoadError::Open(_)).then_some("expected an .xlsx/.xls/.ods returns export");
        let err = CliError::load(e);
        match hint {
            Some(h) => err.with_hint(h),
            None => err,
        }
    })?;
    let extraction = extract_records(&loaded.grid, opts).map_err(CliError::extract)?;

    let mut warnings = loaded.warnings;
    warnings.extend(extraction.warnings.iter().map(|w| w.to_string()));
    Ok(LoadedReturns { sheet_name: loaded.sheet_name, extraction, warnings })
}

pub fn report_style(settings: &Settings) -> Result<ReportStyle, CliError> {
    let highlight_rgb = settings
        .report
        .highlight_rgb()
        .map_err(|e| CliError::new(EXIT_CONFIG, e.to_string()))?;
    Ok(ReportStyle { sheet_name: settings.report.sheet_name.clone(), highlight_rgb })
}

/// Dated report path inside `dir`, using today's local date.
pub fn dated_report_path(dir: &Path, settings: &Settings) -> PathBuf {
    let today = chrono::Local::now().date_naive();
    dir.join(report_file_name(&settings.report.file_prefix, today))
}

pub fn save_report(records: &[ShipmentRecord], path: &Path, settings: &Settings) -> Result<(), CliError> {
    let style = report_style(settings)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| CliError::io(format!("cannot create {}: {e}", parent.display())))?;
    }
    write_report(&project_report(records), path, &style).map_err(CliError::report)
}

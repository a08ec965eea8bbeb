//! `rscan verify`: batch verification of scanned tracking numbers.
//!
//! Each input goes through the same lookup as the scan screen, in order, so
//! a repeated tracking number reports "already received" the second time.

use std::io::BufRead;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use serde::Serialize;

use returnscan_config::Settings;
use returnscan_recon::{pending_view, FilterSet, Notification, Outcome, Progress, ReturnType, ShipmentRecord, Verifier};

use crate::exit_codes::EXIT_VERIFY_UNMATCHED;
use crate::util;
use crate::workbook::{dated_report_path, load_returns, save_report};
use crate::CliError;

/// Pending-list filters shared by `verify`.
#[derive(Args, Debug, Default, Clone)]
pub struct FilterArgs {
    /// Only list shipments from this courier (repeatable)
    #[arg(long = "courier", value_name = "NAME")]
    pub couriers: Vec<String>,

    /// Only list this return type: rto or customer (repeatable)
    #[arg(long = "return-type", value_name = "TYPE")]
    pub return_types: Vec<String>,

    /// Only list shipments delivered on this date, DD-MM-YYYY (repeatable)
    #[arg(long = "delivered", value_name = "DATE")]
    pub delivered_on: Vec<String>,

    /// Tracking number contains
    #[arg(long, value_name = "TEXT")]
    pub awb: Option<String>,

    /// Suborder ID contains
    #[arg(long, value_name = "TEXT")]
    pub suborder: Option<String>,

    /// Product details contain
    #[arg(long, value_name = "TEXT")]
    pub product: Option<String>,

    /// Return reason contains
    #[arg(long, value_name = "TEXT")]
    pub reason: Option<String>,
}

impl FilterArgs {
    pub fn to_filter_set(&self) -> Result<FilterSet, CliError> {
        let mut return_types = std::collections::BTreeSet::new();
        for raw in &self.return_types {
            let rt = ReturnType::parse(raw).ok_or_else(|| {
                CliError::args(format!("unknown return type '{raw}'")).with_hint("use rto or customer")
            })?;
            return_types.insert(rt);
        }
        Ok(FilterSet {
            couriers: self.couriers.iter().map(|c| c.trim().to_string()).collect(),
            return_types,
            delivered_on: self.delivered_on.iter().map(|d| d.trim().to_string()).collect(),
            awb: self.awb.clone(),
            suborder: self.suborder.clone(),
            product: self.product.clone(),
            reason: self.reason.clone(),
            keywords: Vec::new(),
        })
    }
}

pub struct VerifyArgs {
    pub file: PathBuf,
    pub awbs: Vec<String>,
    pub stdin: bool,
    pub report: Option<PathBuf>,
    pub report_dir: Option<PathBuf>,
    pub filters: FilterArgs,
    pub json: bool,
}

#[derive(Serialize)]
struct ScanEntry {
    input: String,
    /// Shorter than the minimum input length; never looked up.
    skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notification: Option<Notification>,
}

#[derive(Serialize)]
struct VerifyOutput<'a> {
    results: &'a [ScanEntry],
    progress: Progress,
    pending: Vec<&'a ShipmentRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<String>,
}

fn gather_inputs(args: &VerifyArgs) -> Result<Vec<String>, CliError> {
    let mut inputs: Vec<String> = args.awbs.iter().map(|a| a.trim().to_string()).collect();
    if args.stdin {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = line.map_err(|e| CliError::io(format!("reading stdin: {e}")))?;
            let line = line.trim();
            if !line.is_empty() {
                inputs.push(line.to_string());
            }
        }
    }
    inputs.retain(|i| !i.is_empty());
    if inputs.is_empty() {
        return Err(CliError::args("no tracking numbers given")
            .with_hint("pass them as arguments or use --stdin"));
    }
    Ok(inputs)
}

pub fn cmd_verify(args: VerifyArgs, settings: &Settings) -> Result<(), CliError> {
    let filters = args.filters.to_filter_set()?;
    let inputs = gather_inputs(&args)?;
    let loaded = load_returns(&args.file, &settings.sheet)?;

    let mut verifier = Verifier::new(settings.matching.clone(), settings.timing.clone());
    verifier.load(loaded.extraction.records);

    let min_len = settings.matching.min_input_len;
    let mut entries = Vec::with_capacity(inputs.len());
    for input in inputs {
        if input.chars().count() < min_len {
            log::debug!("skipping short input '{input}'");
            entries.push(ScanEntry { input, skipped: true, result: None, notification: None });
            continue;
        }
        let outcome = verifier.submit(&input, Instant::now());
        let notification = outcome.notification(verifier.timing());
        entries.push(ScanEntry { input, skipped: false, result: Some(outcome), notification: Some(notification) });
    }
    verifier.teardown();

    let report_path = match (&args.report, &args.report_dir) {
        (Some(path), _) => Some(path.clone()),
        (None, Some(dir)) => Some(dated_report_path(dir, settings)),
        (None, None) => None,
    };
    if let Some(path) = &report_path {
        save_report(verifier.records(), path, settings)?;
        log::info!("report written to {}", path.display());
    }

    let progress = verifier.progress();
    let pending: Vec<&ShipmentRecord> = pending_view(verifier.records(), &filters)
        .into_iter()
        .map(|(_, r)| r)
        .collect();
    let unmatched = entries
        .iter()
        .filter(|e| matches!(e.result, Some(Outcome::Error { .. })))
        .count();

    if args.json {
        let out = VerifyOutput {
            results: &entries,
            progress,
            pending,
            report: report_path.as_ref().map(|p| p.display().to_string()),
        };
        let json_str = serde_json::to_string_pretty(&out)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        for w in &loaded.warnings {
            eprintln!("warning: {w}");
        }
        for entry in &entries {
            match &entry.notification {
                Some(n) => eprintln!("{}: {}", entry.input, n.title),
                None => eprintln!("{}: skipped (shorter than {min_len} characters)", entry.input),
            }
        }
        if !pending.is_empty() {
            util::print_table(pending.iter().copied()).map_err(|e| CliError::io(e.to_string()))?;
        }
        let shown = if filters.is_empty() { String::new() } else { format!(", {} shown", pending.len()) };
        eprintln!(
            "{} of {} received, {} pending{shown}",
            progress.done, progress.total, progress.pending
        );
        if let Some(path) = &report_path {
            eprintln!("report: {}", path.display());
        }
    }

    if unmatched > 0 {
        return Err(CliError::new(
            EXIT_VERIFY_UNMATCHED,
            format!("{unmatched} scanned tracking number(s) matched nothing"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_args_build_a_filter_set() {
        let args = FilterArgs {
            couriers: vec![" Ekart ".into()],
            return_types: vec!["rto".into(), "Customer Return".into()],
            delivered_on: vec!["02-05-2024".into()],
            reason: Some("damaged".into()),
            ..Default::default()
        };
        let set = args.to_filter_set().unwrap();
        assert!(set.couriers.contains("Ekart"));
        assert_eq!(set.return_types.len(), 2);
        assert!(set.delivered_on.contains("02-05-2024"));
        assert_eq!(set.reason.as_deref(), Some("damaged"));
    }

    #[test]
    fn unknown_return_type_is_a_usage_error() {
        let args = FilterArgs { return_types: vec!["exchange".into()], ..Default::default() };
        let err = args.to_filter_set().unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_USAGE);
        assert!(err.hint.is_some());
    }

    #[test]
    fn empty_filter_args_restrict_nothing() {
        assert!(FilterArgs::default().to_filter_set().unwrap().is_empty());
    }
}

// Integration tests for the `rscan` binary: exit codes, JSON output, report files.
// Run with: cargo test -p returnscan-cli --test cli_tests -- --nocapture

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use rust_xlsxwriter::{Format, Workbook};

struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        // empty file = all defaults, and keeps the real user config out of the way
        std::fs::write(dir.path().join("settings.toml"), "").unwrap();
        let fx = Self { dir };
        write_export(&fx.export());
        fx
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn export(&self) -> PathBuf {
        self.path("returns.xlsx")
    }

    fn rscan(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_rscan"));
        cmd.env_remove("RUST_LOG");
        cmd.arg("--config").arg(self.path("settings.toml"));
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.rscan().args(args).output().expect("run rscan")
    }
}

fn arg(p: &Path) -> &str {
    p.to_str().unwrap()
}

fn json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("valid JSON on stdout")
}

const HEADER: [&str; 6] = [
    "Product Details",
    "Suborder ID",
    "Return Reason",
    "Return Shipping Fee",
    "Delivered On",
    "AWB Number",
];

/// Two shipments: a Delhivery RTO with qty 2 and an Ekart customer return.
fn write_export(path: &Path) {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.write_string(0, 0, "Returns export").unwrap();
    for (col, h) in HEADER.iter().enumerate() {
        ws.write_string(2, col as u16, *h).unwrap();
    }

    let blank = Format::new();
    ws.merge_range(3, 1, 6, 1, "", &blank).unwrap();
    ws.write_number(3, 1, 70011.0).unwrap();
    ws.write_string(3, 0, "SKU ID: KR-9").unwrap();
    ws.write_string(4, 0, "Category: Kurta").unwrap();
    ws.write_string(5, 0, "Qty: 2").unwrap();
    ws.write_string(6, 0, "Size: XL").unwrap();
    ws.write_string(3, 2, "Wrong product").unwrap();
    ws.write_number(3, 3, 0.0).unwrap();
    ws.write_string(3, 4, "2024-05-01").unwrap();
    ws.write_number(3, 5, 1234567890.0).unwrap();
    ws.write_string(4, 5, "Delhivery").unwrap();

    ws.merge_range(7, 1, 8, 1, "", &blank).unwrap();
    ws.write_string(7, 1, "S-2").unwrap();
    ws.write_string(7, 0, "SKU: TS-1").unwrap();
    ws.write_string(8, 0, "Size: M").unwrap();
    ws.write_string(7, 2, "Size issue").unwrap();
    ws.write_number(7, 3, 62.0).unwrap();
    ws.write_string(7, 5, "AB-55501").unwrap();
    ws.write_string(8, 5, "Ekart").unwrap();

    wb.save(path).unwrap();
}

// ---------------------------------------------------------------------------
// inspect
// ---------------------------------------------------------------------------

#[test]
fn inspect_json_lists_records() {
    let fx = Fixture::new();
    let out = fx.run(&["inspect", arg(&fx.export()), "--json"]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let v = json(&out);
    assert_eq!(v["header_row"], 3);
    assert_eq!(v["progress"]["total"], 2);
    assert_eq!(v["progress"]["pending"], 2);
    let records = v["records"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["awb"], "1234567890");
    assert_eq!(records[0]["return_type"], "RTO");
    assert_eq!(records[0]["status"], "Pending");
    assert_eq!(records[1]["courier_partner"], "Ekart");
}

#[test]
fn inspect_table_goes_to_stdout() {
    let fx = Fixture::new();
    let out = fx.run(&["inspect", arg(&fx.export())]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("AWB"));
    assert!(stdout.contains("AB-55501"));
    assert!(String::from_utf8_lossy(&out.stderr).contains("2 records (2 shipments)"));
}

// ---------------------------------------------------------------------------
// verify
// ---------------------------------------------------------------------------

#[test]
fn verify_all_matched_exits_zero() {
    let fx = Fixture::new();
    let out = fx.run(&["verify", arg(&fx.export()), "1234567890", "AB-55501", "--json"]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let v = json(&out);
    let results = v["results"].as_array().unwrap();
    assert_eq!(results[0]["result"]["outcome"], "success");
    assert_eq!(results[0]["result"]["kind"], "exact");
    // qty 2 and a "wrong" reason
    assert_eq!(results[0]["result"]["emphasized"], true);
    assert_eq!(results[0]["notification"]["title"], "Received 1234567890");
    assert_eq!(v["progress"]["done"], 2);
    assert!(v["pending"].as_array().unwrap().is_empty());
    assert!(v.get("report").is_none());
}

#[test]
fn verify_repeat_scan_is_info() {
    let fx = Fixture::new();
    let out = fx.run(&["verify", arg(&fx.export()), "AB-55501", "ab-55501", "--json"]);
    assert!(out.status.success());
    let v = json(&out);
    assert_eq!(v["results"][1]["result"]["outcome"], "info");
    assert_eq!(v["results"][1]["notification"]["title"], "Already received");
}

#[test]
fn verify_prefix_match_for_fuzzy_carrier() {
    let fx = Fixture::new();
    let out = fx.run(&["verify", arg(&fx.export()), "1234567899", "--json"]);
    assert!(out.status.success());
    let v = json(&out);
    assert_eq!(v["results"][0]["result"]["kind"], "prefix");
    assert_eq!(v["results"][0]["result"]["record"]["awb"], "1234567890");
}

#[test]
fn verify_unmatched_exits_10_and_skips_short_input() {
    let fx = Fixture::new();
    let out = fx.run(&["verify", arg(&fx.export()), "0000000000", "123", "--json"]);
    assert_eq!(out.status.code(), Some(10));

    let v = json(&out);
    assert_eq!(v["results"][0]["result"]["outcome"], "error");
    assert_eq!(v["results"][1]["skipped"], true);
    assert!(v["results"][1].get("result").is_none());
    assert_eq!(v["pending"].as_array().unwrap().len(), 2);
}

#[test]
fn verify_reads_stdin_and_filters_pending() {
    let fx = Fixture::new();
    let mut child = fx
        .rscan()
        .args(["verify", arg(&fx.export()), "--stdin", "--courier", "EKART", "--json"])
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .spawn()
        .unwrap();
    {
        use std::io::Write;
        let mut stdin = child.stdin.take().unwrap();
        writeln!(stdin, "1234567890").unwrap();
        writeln!(stdin).unwrap();
    }
    let out = child.wait_with_output().unwrap();
    assert!(out.status.success());

    let v = json(&out);
    assert_eq!(v["results"].as_array().unwrap().len(), 1);
    let pending = v["pending"].as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["awb"], "AB-55501");
}

#[test]
fn verify_writes_dated_report() {
    let fx = Fixture::new();
    let reports = fx.path("reports");
    let out = fx.run(&["verify", arg(&fx.export()), "AB-55501", "--report-dir", arg(&reports), "--json"]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let v = json(&out);
    let report = PathBuf::from(v["report"].as_str().unwrap());
    assert!(report.exists());
    let name = report.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("returns-report-") && name.ends_with(".xlsx"), "{name}");
    assert_eq!(report.parent().unwrap(), reports);
}

#[test]
fn verify_report_path_and_dir_conflict() {
    let fx = Fixture::new();
    let out = fx.run(&["verify", arg(&fx.export()), "AB-55501", "--report", "a.xlsx", "--report-dir", "."]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn verify_without_scans_is_usage_error() {
    let fx = Fixture::new();
    let out = fx.run(&["verify", arg(&fx.export())]);
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("--stdin"));
}

#[test]
fn verify_unknown_return_type_is_usage_error() {
    let fx = Fixture::new();
    let out = fx.run(&["verify", arg(&fx.export()), "AB-55501", "--return-type", "exchange"]);
    assert_eq!(out.status.code(), Some(2));
}

// ---------------------------------------------------------------------------
// load failures
// ---------------------------------------------------------------------------

#[test]
fn missing_file_exits_3() {
    let fx = Fixture::new();
    let out = fx.run(&["inspect", arg(&fx.path("nope.xlsx"))]);
    assert_eq!(out.status.code(), Some(3));
}

#[test]
fn non_spreadsheet_exits_3_with_hint() {
    let fx = Fixture::new();
    let bogus = fx.path("notes.xlsx");
    std::fs::write(&bogus, "not a workbook").unwrap();
    let out = fx.run(&["inspect", arg(&bogus)]);
    assert_eq!(out.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&out.stderr).contains("hint:"));
}

#[test]
fn sheet_without_header_exits_4() {
    let fx = Fixture::new();
    let path = fx.path("other.xlsx");
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.write_string(0, 0, "Order ID").unwrap();
    ws.write_string(1, 0, "O-1").unwrap();
    wb.save(&path).unwrap();

    let out = fx.run(&["verify", arg(&path), "1234567890"]);
    assert_eq!(out.status.code(), Some(4));
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

#[test]
fn config_path_prints_override() {
    let fx = Fixture::new();
    let out = fx.run(&["config", "--path"]);
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), arg(&fx.path("settings.toml")));
}

#[test]
fn config_prints_effective_settings() {
    let fx = Fixture::new();
    let out = fx.run(&["config"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("min_input_len = 5"));
    assert!(stdout.contains("[report]"));
}

#[test]
fn invalid_settings_exit_6() {
    let fx = Fixture::new();
    std::fs::write(fx.path("settings.toml"), "[matching]\nmin_input_len = 1\n").unwrap();
    let out = fx.run(&["inspect", arg(&fx.export())]);
    assert_eq!(out.status.code(), Some(6));

    std::fs::write(fx.path("settings.toml"), "[matching]\ncolour = 1\n").unwrap();
    let out = fx.run(&["inspect", arg(&fx.export())]);
    assert_eq!(out.status.code(), Some(6));
    assert!(String::from_utf8_lossy(&out.stderr).contains("config --path"));
}

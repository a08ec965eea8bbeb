use std::time::{Duration, Instant};

use returnscan_recon::grid::MergeRange;
use returnscan_recon::matcher::MatchKind;
use returnscan_recon::notify::{dispatch, Cue, CuePlayer, Notification, Notifier};
use returnscan_recon::{
    extract_records, pending_view, project_report, ExtractOptions, FilterSet, Grid, MatchOptions, Outcome,
    ReturnType, ScanEvent, Status, TimingOptions, Verifier,
};

const MS: Duration = Duration::from_millis(1);

fn export_sheet() -> Grid {
    Grid::from_text_rows(&[
        &["Product Details", "Suborder ID", "Return Reason", "Return Shipping Fee", "Delivered On", "AWB Number"],
        &["SKU: A-1", "S-1", "Damaged product", "0", "2024-05-01", "1234567890"],
        &["Size: M", "", "", "", "", "Ekart"],
        &["SKU: A-2", "S-2", "Size issue", "55", "2024-05-01", "1234567890"],
        &["Qty: 2", "", "", "", "", "Ekart"],
        &["SKU: B-1", "S-3", "Changed mind", "60", "02-05-2024", "99988877701"],
        &["Category: Saree", "", "", "", "", "Delhivery"],
    ])
    .with_merge(MergeRange::new(1, 1, 2, 1))
    .with_merge(MergeRange::new(3, 1, 4, 1))
    .with_merge(MergeRange::new(5, 1, 6, 1))
}

fn loaded() -> Verifier {
    let ex = extract_records(&export_sheet(), &ExtractOptions::default()).unwrap();
    let mut v = Verifier::new(MatchOptions::default(), TimingOptions::default());
    v.load(ex.records);
    v
}

/// Type `value` at `at` and poll once the debounce has elapsed.
fn scan(v: &mut Verifier, value: &str, at: Instant) -> Vec<ScanEvent> {
    v.on_input(value, at);
    v.poll(at + 50 * MS)
}

fn outcome(events: &[ScanEvent]) -> &Outcome {
    match events.first() {
        Some(ScanEvent::Verified(o)) => o,
        other => panic!("expected a verification, got {other:?}"),
    }
}

#[test]
fn extraction_of_export_layout() {
    let ex = extract_records(&export_sheet(), &ExtractOptions::default()).unwrap();
    assert!(ex.warnings.is_empty());
    assert_eq!(ex.records.len(), 3);

    let first = &ex.records[0];
    assert_eq!(first.suborder_id, "S-1");
    assert_eq!((first.sku.as_str(), first.size.as_str()), ("A-1", "M"));
    assert_eq!(first.return_type, ReturnType::Rto);
    assert_eq!(ex.records[1].qty, "2");
    assert_eq!(ex.records[2].category, "Saree");
    assert_eq!(ex.records[2].courier_partner, "Delhivery");
}

#[test]
fn one_scan_flips_every_suborder_of_a_shipment() {
    let t0 = Instant::now();
    let mut v = loaded();
    let events = scan(&mut v, "1234567890", t0);

    match outcome(&events) {
        Outcome::Success { position, flipped, matched, kind, emphasized, .. } => {
            assert_eq!((*position, *flipped, *matched), (0, 2, 2));
            assert_eq!(*kind, MatchKind::Exact);
            assert!(*emphasized);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(events[1], ScanEvent::InputCleared);
    assert_eq!(v.input(), "");
    assert_eq!(v.progress().done, 2);
    assert_eq!(v.progress().pending, 1);
}

#[test]
fn rescan_reports_already_received_and_clears_later() {
    let t0 = Instant::now();
    let mut v = loaded();
    scan(&mut v, "1234567890", t0);

    let t1 = t0 + 1000 * MS;
    let events = scan(&mut v, "1234567890", t1);
    match outcome(&events) {
        Outcome::Info { awbs, matched, .. } => {
            assert_eq!(awbs, &["1234567890".to_string()]);
            assert_eq!(*matched, 2);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(events.len(), 1);
    assert_eq!(v.input(), "1234567890");
    assert_eq!(v.progress().done, 2);

    assert!(v.poll(t1 + 3000 * MS).is_empty());
    assert_eq!(v.poll(t1 + 3050 * MS), vec![ScanEvent::InputCleared]);
    assert_eq!(v.input(), "");
}

#[test]
fn unknown_awb_auto_clears_only_if_untouched() {
    let t0 = Instant::now();
    let mut v = loaded();
    let events = scan(&mut v, "0000000000", t0);
    assert!(matches!(outcome(&events), Outcome::Error { .. }));
    assert_eq!(v.poll(t0 + 3050 * MS), vec![ScanEvent::InputCleared]);

    let t1 = t0 + 5000 * MS;
    scan(&mut v, "0000000000", t1);
    // operator edits the field before the clear fires
    v.on_input("000", t1 + 1000 * MS);
    assert!(v.poll(t1 + 3050 * MS).is_empty());
    assert_eq!(v.input(), "000");
}

#[test]
fn designated_carrier_matches_with_last_digit_missing() {
    let t0 = Instant::now();
    let mut v = loaded();
    let events = scan(&mut v, "9998887770", t0);
    match outcome(&events) {
        Outcome::Success { record, kind, .. } => {
            assert_eq!(record.awb, "99988877701");
            assert_eq!(*kind, MatchKind::Prefix);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn reload_mid_debounce_drops_lookup() {
    let t0 = Instant::now();
    let mut v = loaded();
    v.on_input("1234567890", t0);
    let ex = extract_records(&export_sheet(), &ExtractOptions::default()).unwrap();
    v.load(ex.records);
    assert!(v.poll(t0 + 100 * MS).is_empty());
    assert_eq!(v.progress().done, 0);
}

#[derive(Default)]
struct Sink {
    notes: Vec<Notification>,
    cues: Vec<Cue>,
}

impl Notifier for Sink {
    fn notify(&mut self, n: Notification) {
        self.notes.push(n);
    }
}

impl CuePlayer for Sink {
    fn play(&mut self, cue: Cue) {
        self.cues.push(cue);
    }
}

#[test]
fn outcomes_reach_notifier_and_cues() {
    let t0 = Instant::now();
    let mut v = loaded();
    let mut notes = Sink::default();
    let mut cues = Sink::default();

    for (i, value) in ["99988877701", "99988877701", "4242424242"].iter().enumerate() {
        let events = scan(&mut v, value, t0 + (i as u32) * 5000 * MS);
        dispatch(outcome(&events), v.timing(), &mut notes, &mut cues);
    }

    assert_eq!(cues.cues, [Cue::Success, Cue::ErrorOrInfo, Cue::ErrorOrInfo]);
    assert_eq!(notes.notes[0].duration_ms, 2500);
    assert_eq!(notes.notes[1].title, "Already received");
    assert_eq!(notes.notes[2].title, "Not found");
    assert_eq!(notes.notes[2].duration_ms, 3000);
}

#[test]
fn filtered_view_and_report_after_scanning() {
    let t0 = Instant::now();
    let mut v = loaded();
    scan(&mut v, "99988877701", t0);

    let view = pending_view(v.records(), &FilterSet::default());
    let positions: Vec<_> = view.iter().map(|(p, _)| *p).collect();
    assert_eq!(positions, [0, 1]);

    let rto_only = FilterSet { return_types: [ReturnType::Rto].into(), ..Default::default() };
    assert_eq!(pending_view(v.records(), &rto_only).len(), 1);

    let report = project_report(v.records());
    assert_eq!(report.rows.len(), 3);
    let highlighted: Vec<bool> = report.rows.iter().map(|r| r.highlight).collect();
    assert_eq!(highlighted, [true, true, false]);
    assert_eq!(report.rows[2].cells[8], "02-05-2024");
    assert_eq!(report.rows[2].cells[11], Status::Done.to_string());
}

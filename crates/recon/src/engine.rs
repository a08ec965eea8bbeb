//! Live verification state for one loaded record list.
//!
//! Input arrives one keystroke at a time through [`Verifier::on_input`].
//! Lookups run when the debounce timer fires inside [`Verifier::poll`]; an
//! unsuccessful result schedules the input field to clear itself later.
//! Both timers carry the list generation they were scheduled against, so a
//! reload silently invalidates anything still in flight.

use std::time::Instant;

use crate::config::{MatchOptions, TimingOptions};
use crate::matcher::MatchIndex;
use crate::model::{normalize_awb, Progress, ShipmentRecord, Status};
use crate::notify::{is_emphasized, Outcome};
use crate::timer::TimerSlot;

#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    Verified(Outcome),
    /// The input field was emptied (after a success or by auto-clear).
    InputCleared,
}

#[derive(Debug)]
struct PendingLookup {
    generation: u64,
    value: String,
}

#[derive(Debug)]
struct ClearRequest {
    generation: u64,
    value: String,
}

#[derive(Debug)]
pub struct Verifier {
    records: Vec<ShipmentRecord>,
    index: MatchIndex,
    generation: u64,
    input: String,
    debounce: TimerSlot<PendingLookup>,
    auto_clear: TimerSlot<ClearRequest>,
    matching: MatchOptions,
    timing: TimingOptions,
}

impl Verifier {
    pub fn new(matching: MatchOptions, timing: TimingOptions) -> Self {
        Self {
            records: Vec::new(),
            index: MatchIndex::default(),
            generation: 0,
            input: String::new(),
            debounce: TimerSlot::new(),
            auto_clear: TimerSlot::new(),
            matching,
            timing,
        }
    }

    /// Replace the record list wholesale. Outstanding timers are cancelled
    /// before the new list becomes visible.
    pub fn load(&mut self, records: Vec<ShipmentRecord>) {
        self.debounce.cancel();
        self.auto_clear.cancel();
        self.generation += 1;
        self.index = MatchIndex::build(&records, &self.matching.fuzzy_carrier_marker);
        self.records = records;
        log::info!(
            "loaded {} records (generation {}, {} distinct AWBs)",
            self.records.len(),
            self.generation,
            self.index.exact_len()
        );
    }

    /// Cancel all deferred work.
    pub fn teardown(&mut self) {
        self.debounce.cancel();
        self.auto_clear.cancel();
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// The operator's field changed to `raw`.
    pub fn on_input(&mut self, raw: &str, now: Instant) {
        self.input = raw.to_string();
        let value = raw.trim();
        if value.chars().count() < self.matching.min_input_len || self.records.is_empty() {
            self.debounce.cancel();
            return;
        }
        self.debounce.schedule(
            now,
            self.timing.debounce(),
            PendingLookup { generation: self.generation, value: value.to_string() },
        );
    }

    /// Fire whichever timers are due at `now`.
    pub fn poll(&mut self, now: Instant) -> Vec<ScanEvent> {
        let mut events = Vec::new();

        if let Some(task) = self.debounce.take_due(now) {
            if task.generation == self.generation && self.input.trim() == task.value {
                let outcome = self.submit(&task.value, now);
                let cleared = outcome.is_success();
                events.push(ScanEvent::Verified(outcome));
                if cleared {
                    events.push(ScanEvent::InputCleared);
                }
            } else {
                log::debug!("dropping stale lookup for '{}'", task.value);
            }
        }

        if let Some(req) = self.auto_clear.take_due(now) {
            if req.generation == self.generation && self.input == req.value {
                self.input.clear();
                events.push(ScanEvent::InputCleared);
            }
        }

        events
    }

    /// Earliest instant at which [`poll`](Self::poll) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.debounce.deadline(), self.auto_clear.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // -----------------------------------------------------------------------
    // Matching
    // -----------------------------------------------------------------------

    /// Look up `value` immediately and apply the result.
    pub fn submit(&mut self, value: &str, now: Instant) -> Outcome {
        let value = value.trim();
        let Some(hit) = self.index.lookup(value) else {
            log::info!("no match for '{value}'");
            self.schedule_clear(now);
            return Outcome::Error { input: value.to_string() };
        };

        let (done, pending): (Vec<usize>, Vec<usize>) = hit
            .positions
            .iter()
            .copied()
            .partition(|&p| self.records[p].status == Status::Done);
        let matched = hit.positions.len();

        if pending.is_empty() {
            let mut awbs: Vec<String> = Vec::new();
            for &p in &done {
                let awb = &self.records[p].awb;
                if !awbs.iter().any(|a| normalize_awb(a) == normalize_awb(awb)) {
                    awbs.push(awb.clone());
                }
            }
            let emphasized = is_emphasized(&self.records[done[0]], &self.matching.quality_keywords);
            log::info!("'{value}' already received ({matched} records)");
            self.schedule_clear(now);
            return Outcome::Info { awbs, matched, emphasized };
        }

        for &p in &pending {
            self.records[p].status = Status::Done;
        }
        let first = pending[0];
        let record = self.records[first].clone();
        let emphasized = is_emphasized(&record, &self.matching.quality_keywords);
        log::info!("marked {} of {} record(s) for AWB {} as received", pending.len(), matched, record.awb);

        self.auto_clear.cancel();
        self.input.clear();
        Outcome::Success {
            position: first,
            record,
            flipped: pending.len(),
            matched,
            kind: hit.kind,
            emphasized,
        }
    }

    fn schedule_clear(&mut self, now: Instant) {
        self.auto_clear.schedule(
            now,
            self.timing.auto_clear(),
            ClearRequest { generation: self.generation, value: self.input.clone() },
        );
    }

    /// Bulk-mark the given positions as received. Returns how many flipped.
    pub fn mark_selected(&mut self, positions: &[usize]) -> usize {
        let mut flipped = 0;
        for &p in positions {
            if let Some(record) = self.records.get_mut(p) {
                if record.status == Status::Pending {
                    record.status = Status::Done;
                    flipped += 1;
                }
            }
        }
        log::info!("marked {flipped} selected record(s) as received");
        flipped
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn records(&self) -> &[ShipmentRecord] {
        &self.records
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn progress(&self) -> Progress {
        Progress::of(&self.records)
    }

    pub fn is_debouncing(&self) -> bool {
        self.debounce.is_scheduled()
    }

    pub fn is_clear_scheduled(&self) -> bool {
        self.auto_clear.is_scheduled()
    }

    pub fn timing(&self) -> &TimingOptions {
        &self.timing
    }
}

//! Scan screen state, independent of the terminal.
//!
//! Every method takes the current `Instant` so the whole screen can be
//! driven from tests without sleeping.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use returnscan_config::Settings;
use returnscan_recon::notify::dispatch;
use returnscan_recon::timer::TimerSlot;
use returnscan_recon::{
    pending_view, Cue, CuePlayer, FilterSet, Notification, Notifier, Outcome, ReturnType, ScanEvent,
    ShipmentRecord, Verifier,
};

use crate::workbook::{dated_report_path, load_returns, save_report, LoadedReturns};

pub(crate) const PAGE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Focus {
    Scan,
    Filter,
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// The toast panel. A notification is stamped with its expiry on the next
/// [`settle`](Self::settle), since `notify` has no clock.
#[derive(Debug, Default)]
pub(crate) struct ToastSlot {
    incoming: Option<Notification>,
    shown: Option<(Notification, Cue)>,
    last_cue: Option<Cue>,
    expiry: TimerSlot<()>,
}

impl ToastSlot {
    pub(crate) fn settle(&mut self, now: Instant) {
        if let Some(n) = self.incoming.take() {
            let cue = self.last_cue.unwrap_or(Cue::ErrorOrInfo);
            self.expiry.schedule(now, std::time::Duration::from_millis(n.duration_ms), ());
            self.shown = Some((n, cue));
        } else if self.expiry.take_due(now).is_some() {
            self.shown = None;
        }
    }

    pub(crate) fn current(&self) -> Option<&(Notification, Cue)> {
        self.shown.as_ref()
    }

    fn deadline(&self) -> Option<Instant> {
        self.expiry.deadline()
    }
}

impl Notifier for ToastSlot {
    fn notify(&mut self, notification: Notification) {
        self.incoming = Some(notification);
    }
}

/// Terminal bell. Rings are counted here and emitted by the draw loop.
#[derive(Debug, Default)]
pub(crate) struct Bell {
    rings: usize,
}

impl Bell {
    pub(crate) fn take(&mut self) -> usize {
        std::mem::take(&mut self.rings)
    }
}

impl CuePlayer for Bell {
    fn play(&mut self, cue: Cue) {
        self.rings += match cue {
            Cue::Success => 1,
            Cue::SuccessEmphasized => 2,
            Cue::ErrorOrInfo => 3,
        };
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub(crate) struct ScanApp {
    pub(crate) verifier: Verifier,
    pub(crate) filters: FilterSet,
    pub(crate) focus: Focus,
    pub(crate) filter_query: String,
    pub(crate) filter_error: Option<String>,
    /// Row in the filtered pending view.
    pub(crate) cursor: usize,
    pub(crate) scroll: usize,
    /// Selected record positions.
    pub(crate) selected: BTreeSet<usize>,
    pub(crate) toast: ToastSlot,
    pub(crate) bell: Bell,
    pub(crate) status: Option<String>,
    /// Records were marked since the last export.
    pub(crate) unexported: bool,
    quit_armed: bool,
    pub(crate) should_quit: bool,
    pub(crate) path: PathBuf,
    pub(crate) sheet_name: String,
    report_dir: PathBuf,
    settings: Settings,
}

impl ScanApp {
    pub(crate) fn new(path: PathBuf, report_dir: PathBuf, settings: Settings, loaded: LoadedReturns) -> Self {
        let mut verifier = Verifier::new(settings.matching.clone(), settings.timing.clone());
        verifier.load(loaded.extraction.records);
        let status = (!loaded.warnings.is_empty()).then(|| loaded.warnings.join("; "));
        Self {
            verifier,
            filters: FilterSet::default(),
            focus: Focus::Scan,
            filter_query: String::new(),
            filter_error: None,
            cursor: 0,
            scroll: 0,
            selected: BTreeSet::new(),
            toast: ToastSlot::default(),
            bell: Bell::default(),
            status,
            unexported: false,
            quit_armed: false,
            should_quit: false,
            path,
            sheet_name: loaded.sheet_name,
            report_dir,
            settings,
        }
    }

    pub(crate) fn pending(&self) -> Vec<(usize, &ShipmentRecord)> {
        pending_view(self.verifier.records(), &self.filters)
    }

    // -----------------------------------------------------------------------
    // Keys
    // -----------------------------------------------------------------------

    pub(crate) fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if !(ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))) {
            self.quit_armed = false;
        }

        if ctrl {
            match key.code {
                KeyCode::Char('c') | KeyCode::Char('q') => self.request_quit(),
                KeyCode::Char('f') => self.focus = Focus::Filter,
                KeyCode::Char('x') => self.toggle_selected(),
                KeyCode::Char('d') => self.mark_selected(),
                KeyCode::Char('e') => self.export(),
                KeyCode::Char('o') => self.reload(),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Up => self.move_cursor(-1),
            KeyCode::Down => self.move_cursor(1),
            KeyCode::PageUp => self.move_cursor(-(PAGE as isize)),
            KeyCode::PageDown => self.move_cursor(PAGE as isize),
            _ => match self.focus {
                Focus::Scan => self.scan_key(key.code, now),
                Focus::Filter => self.filter_key(key.code),
            },
        }
    }

    fn scan_key(&mut self, code: KeyCode, now: Instant) {
        match code {
            KeyCode::Char(c) => {
                let mut value = self.verifier.input().to_string();
                value.push(c);
                self.verifier.on_input(&value, now);
            }
            KeyCode::Backspace => {
                let mut value = self.verifier.input().to_string();
                value.pop();
                self.verifier.on_input(&value, now);
            }
            KeyCode::Esc => self.verifier.on_input("", now),
            // Scanners terminate with Enter; the debounce already handles it.
            _ => {}
        }
    }

    fn filter_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(c) => self.filter_query.push(c),
            KeyCode::Backspace => {
                self.filter_query.pop();
            }
            KeyCode::Enter => {
                match parse_filter_query(&self.filter_query) {
                    Ok(filters) => {
                        self.filters = filters;
                        self.filter_error = None;
                        self.focus = Focus::Scan;
                        self.cursor = 0;
                        self.scroll = 0;
                    }
                    Err(e) => self.filter_error = Some(e),
                }
            }
            KeyCode::Esc => {
                self.filter_error = None;
                self.focus = Focus::Scan;
            }
            _ => {}
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.pending().len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        self.cursor = self.cursor.saturating_add_signed(delta).min(len - 1);
    }

    fn clamp_cursor(&mut self) {
        let len = self.pending().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    fn toggle_selected(&mut self) {
        let Some(&(pos, _)) = self.pending().get(self.cursor) else { return };
        if !self.selected.remove(&pos) {
            self.selected.insert(pos);
        }
    }

    fn mark_selected(&mut self) {
        let positions: Vec<usize> = if self.selected.is_empty() {
            self.pending().get(self.cursor).map(|&(p, _)| p).into_iter().collect()
        } else {
            self.selected.iter().copied().collect()
        };
        if positions.is_empty() {
            return;
        }
        let flipped = self.verifier.mark_selected(&positions);
        self.selected.clear();
        if flipped > 0 {
            self.unexported = true;
        }
        self.status = Some(format!("marked {flipped} record(s) as received"));
        self.clamp_cursor();
    }

    fn export(&mut self) {
        let path = dated_report_path(&self.report_dir, &self.settings);
        match save_report(self.verifier.records(), &path, &self.settings) {
            Ok(()) => {
                self.unexported = false;
                self.status = Some(format!("report saved to {}", path.display()));
            }
            Err(e) => self.status = Some(format!("export failed: {}", e.message)),
        }
    }

    /// Reload the export from disk. The current list stays if it fails.
    fn reload(&mut self) {
        match load_returns(&self.path, &self.settings.sheet) {
            Ok(loaded) => {
                let count = loaded.extraction.records.len();
                self.verifier.load(loaded.extraction.records);
                self.sheet_name = loaded.sheet_name;
                self.selected.clear();
                self.cursor = 0;
                self.scroll = 0;
                self.unexported = false;
                self.status = Some(format!("reloaded {count} records"));
            }
            Err(e) => {
                log::warn!("reload failed: {}", e.message);
                self.status = Some(format!("reload failed, keeping current list: {}", e.message));
            }
        }
    }

    fn request_quit(&mut self) {
        if self.unexported && !self.quit_armed {
            self.quit_armed = true;
            self.status = Some("unexported results; press Ctrl-C again to quit (Ctrl-E exports)".into());
            return;
        }
        self.verifier.teardown();
        self.should_quit = true;
    }

    // -----------------------------------------------------------------------
    // Clock
    // -----------------------------------------------------------------------

    /// Fire due timers and route outcomes to the toast panel and bell.
    pub(crate) fn tick(&mut self, now: Instant) -> Option<Outcome> {
        let mut last = None;
        for event in self.verifier.poll(now) {
            if let ScanEvent::Verified(outcome) = event {
                if outcome.is_success() {
                    self.unexported = true;
                }
                self.toast.last_cue = Some(outcome.cue());
                dispatch(&outcome, self.verifier.timing(), &mut self.toast, &mut self.bell);
                last = Some(outcome);
            }
        }
        if last.is_some() {
            self.clamp_cursor();
        }
        self.toast.settle(now);
        last
    }

    /// When the event loop should wake up next even without input.
    pub(crate) fn next_wakeup(&self) -> Option<Instant> {
        match (self.verifier.next_deadline(), self.toast.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub(crate) fn selected_count(&self) -> usize {
        self.selected.len()
    }
}

// ---------------------------------------------------------------------------
// Filter query
// ---------------------------------------------------------------------------

/// Split on whitespace, keeping double-quoted runs together.
fn tokenize(query: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for ch in query.chars() {
        match ch {
            '"' => quoted = !quoted,
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if quoted {
        return Err("unterminated quote".into());
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

fn append(slot: &mut Option<String>, value: &str) {
    match slot {
        Some(s) => {
            s.push(' ');
            s.push_str(value);
        }
        None => *slot = Some(value.to_string()),
    }
}

/// Parse `courier:ekart type:rto reason:"size issue"` into a filter set.
///
/// Set-valued keys (courier, type, date) may repeat. Each word without a key
/// must appear somewhere in the product details, in any order.
pub(crate) fn parse_filter_query(query: &str) -> Result<FilterSet, String> {
    let mut set = FilterSet::default();
    for token in tokenize(query)? {
        let Some((key, value)) = token.split_once(':') else {
            set.keywords.push(token);
            continue;
        };
        if value.is_empty() {
            return Err(format!("'{key}:' needs a value"));
        }
        match key.to_lowercase().as_str() {
            "courier" | "c" => {
                set.couriers.insert(value.to_string());
            }
            "type" | "t" => {
                let rt = ReturnType::parse(value).ok_or_else(|| format!("unknown return type '{value}'"))?;
                set.return_types.insert(rt);
            }
            "date" | "delivered" | "d" => {
                set.delivered_on.insert(value.to_string());
            }
            "awb" => append(&mut set.awb, value),
            "suborder" | "so" => append(&mut set.suborder, value),
            "product" | "p" => append(&mut set.product, value),
            "reason" | "r" => append(&mut set.reason, value),
            other => return Err(format!("unknown filter key '{other}'")),
        }
    }
    Ok(set)
}

//! `rscan scan`: the interactive scan screen.

mod state;

use std::io::{stdout, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyEventKind},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};

use returnscan_config::Settings;
use returnscan_recon::{distinct_values, Cue, Facet};

use crate::util;
use crate::workbook::load_returns;
use crate::CliError;
use state::{Focus, ScanApp};

/// Upper bound on how long the loop sleeps with nothing scheduled.
const IDLE_POLL: Duration = Duration::from_millis(250);

/// Title, input box, toast panel, filter line, table header, status bar.
const CHROME_ROWS: u16 = 1 + 3 + 4 + 1 + 1 + 1;

impl ScanApp {
    fn ensure_visible(&mut self, visible_rows: usize) {
        if self.cursor < self.scroll {
            self.scroll = self.cursor;
        }
        if visible_rows > 0 && self.cursor >= self.scroll + visible_rows {
            self.scroll = self.cursor - visible_rows + 1;
        }
    }

    fn draw(&self, frame: &mut Frame) {
        let chunks = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Length(1),
            Constraint::Min(2),
            Constraint::Length(1),
        ])
        .split(frame.area());

        self.draw_title(frame, chunks[0]);
        self.draw_input(frame, chunks[1]);
        self.draw_toast(frame, chunks[2]);
        self.draw_filter(frame, chunks[3]);
        self.draw_table(frame, chunks[4]);
        self.draw_status(frame, chunks[5]);
    }

    fn draw_title(&self, frame: &mut Frame, area: Rect) {
        let progress = self.verifier.progress();
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let title = format!(
            " rscan: {} [{}] | {}/{} received, {} pending ",
            file_name, self.sheet_name, progress.done, progress.total, progress.pending
        );
        let para = Paragraph::new(Line::from(vec![Span::styled(
            title,
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )]))
        .style(Style::default().bg(Color::Cyan));
        frame.render_widget(para, area);
    }

    fn draw_input(&self, frame: &mut Frame, area: Rect) {
        let border = if self.focus == Focus::Scan { Color::Yellow } else { Color::DarkGray };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(" Scan AWB ");
        let mut spans = vec![Span::styled(
            self.verifier.input().to_string(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )];
        if self.focus == Focus::Scan {
            spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
    }

    fn draw_toast(&self, frame: &mut Frame, area: Rect) {
        let Some((toast, cue)) = self.toast.current() else {
            let hint = Paragraph::new(" Scan a tracking number. Ctrl-F filter, Ctrl-E export, Ctrl-C quit.")
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(hint, area);
            return;
        };
        let color = match cue {
            Cue::Success => Color::Green,
            Cue::SuccessEmphasized => Color::Magenta,
            Cue::ErrorOrInfo => Color::Red,
        };
        let mut lines: Vec<Line> = toast
            .body
            .lines()
            .map(|l| Line::from(Span::raw(l.to_string())))
            .collect();
        if toast.emphasized {
            lines.insert(
                0,
                Line::from(Span::styled(
                    "CHECK THIS RETURN",
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                )),
            );
        }
        let block = Block::default()
            .borders(Borders::LEFT)
            .border_style(Style::default().fg(color))
            .title(Span::styled(
                format!(" {} ", toast.title),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ));
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_filter(&self, frame: &mut Frame, area: Rect) {
        let line = match (self.focus, &self.filter_error) {
            (Focus::Filter, Some(err)) => Line::from(vec![
                Span::styled(" filter> ", Style::default().fg(Color::Yellow)),
                Span::raw(self.filter_query.clone()),
                Span::styled(format!("  ({err})"), Style::default().fg(Color::Red)),
            ]),
            (Focus::Filter, None) if self.filter_query.is_empty() => {
                let couriers = distinct_values(self.verifier.records(), Facet::Courier).join(", ");
                Line::from(vec![
                    Span::styled(" filter> ", Style::default().fg(Color::Yellow)),
                    Span::styled("_", Style::default().fg(Color::Yellow)),
                    Span::styled(
                        format!("  courier: type: date: awb: suborder: product: reason:  [{couriers}]"),
                        Style::default().fg(Color::DarkGray),
                    ),
                ])
            }
            (Focus::Filter, None) => Line::from(vec![
                Span::styled(" filter> ", Style::default().fg(Color::Yellow)),
                Span::raw(self.filter_query.clone()),
                Span::styled("_", Style::default().fg(Color::Yellow)),
            ]),
            (Focus::Scan, _) if self.filters.is_empty() => {
                Line::from(Span::styled(" no filter", Style::default().fg(Color::DarkGray)))
            }
            (Focus::Scan, _) => Line::from(Span::styled(
                format!(" filter: {}", self.filter_query),
                Style::default().fg(Color::Cyan),
            )),
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_table(&self, frame: &mut Frame, area: Rect) {
        let pending = self.pending();
        if pending.is_empty() {
            let msg = if self.verifier.progress().pending == 0 {
                "(all shipments received)"
            } else {
                "(no pending shipments match the filter)"
            };
            frame.render_widget(Paragraph::new(msg).style(Style::default().fg(Color::DarkGray)), area);
            return;
        }

        let visible_rows = area.height.saturating_sub(1) as usize;
        let end = (self.scroll + visible_rows).min(pending.len());

        let mut lines: Vec<Line> = Vec::with_capacity(visible_rows + 1);
        lines.push(Line::from(Span::styled(
            format!("    {}", util::table_header()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )));

        for (row, (pos, record)) in pending.iter().enumerate().take(end).skip(self.scroll) {
            let is_cursor = row == self.cursor;
            let marker = if self.selected.contains(pos) { "[x] " } else { "[ ] " };
            let style = if is_cursor {
                Style::default().fg(Color::Black).bg(Color::White)
            } else if self.selected.contains(pos) {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::Gray)
            };
            let text = util::truncate_display(
                &format!("{marker}{}", util::table_row(record)),
                area.width as usize,
            );
            lines.push(Line::from(Span::styled(text, style)));
        }

        frame.render_widget(Paragraph::new(lines), area);
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let left = format!(" {}", self.status.as_deref().unwrap_or(""));
        let mut right = String::new();
        if self.selected_count() > 0 {
            right.push_str(&format!("{} selected  ", self.selected_count()));
        }
        if self.unexported {
            right.push_str("unexported  ");
        }
        let shown = self.pending().len();
        right.push_str(&format!("Row {}/{} ", (self.cursor + 1).min(shown), shown));

        let width = area.width as usize;
        let left = util::truncate_display(&left, width.saturating_sub(util::display_width(&right)));
        let padding = width.saturating_sub(util::display_width(&left) + util::display_width(&right));
        let status = format!("{}{:pad$}{}", left, "", right, pad = padding);

        let para = Paragraph::new(Line::from(vec![Span::styled(
            status,
            Style::default().fg(Color::Black).bg(Color::DarkGray),
        )]))
        .style(Style::default().bg(Color::DarkGray));
        frame.render_widget(para, area);
    }
}

/// Load the export and run the scan screen until the operator quits.
pub fn cmd_scan(file: PathBuf, report_dir: PathBuf, settings: Settings) -> Result<(), CliError> {
    let loaded = load_returns(&file, &settings.sheet)?;
    let app = ScanApp::new(file, report_dir, settings, loaded);
    run_app(app).map_err(CliError::io)
}

fn run_app(mut app: ScanApp) -> Result<(), String> {
    terminal::enable_raw_mode()
        .map_err(|e| format!("failed to enable raw mode: {}", e))?;
    stdout()
        .execute(EnterAlternateScreen)
        .map_err(|e| format!("failed to enter alternate screen: {}", e))?;

    struct Cleanup;
    impl Drop for Cleanup {
        fn drop(&mut self) {
            let _ = stdout().execute(LeaveAlternateScreen);
            let _ = terminal::disable_raw_mode();
        }
    }
    let _cleanup = Cleanup;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| format!("failed to create terminal: {}", e))?;

    loop {
        let now = Instant::now();
        app.tick(now);

        let rings = app.bell.take();
        if rings > 0 {
            let mut out = stdout();
            let _ = out.write_all("\x07".repeat(rings).as_bytes());
            let _ = out.flush();
        }

        let height = terminal.size().map(|s| s.height).unwrap_or_default();
        app.ensure_visible(height.saturating_sub(CHROME_ROWS) as usize);

        terminal
            .draw(|frame| app.draw(frame))
            .map_err(|e| format!("draw error: {}", e))?;

        let timeout = app
            .next_wakeup()
            .map(|at| at.saturating_duration_since(Instant::now()))
            .unwrap_or(IDLE_POLL)
            .min(IDLE_POLL);

        if event::poll(timeout).map_err(|e| format!("event poll error: {}", e))? {
            if let Event::Key(key) = event::read().map_err(|e| format!("event read error: {}", e))? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key, Instant::now());
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

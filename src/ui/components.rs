//! UI Components for the terminal interface

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, Paragraph};
use ratatui::Frame;

use super::{Phase, Progress};
use crate::import::{Outcome, Summary};

/// Status panel: phase, mode and running outcome counts
pub struct StatusPanel {
    phase: Phase,
    info: String,
    dry_run: bool,
    counts: Summary,
}

impl StatusPanel {
    pub fn new(dry_run: bool) -> Self {
        Self {
            phase: Phase::Extracting,
            info: String::new(),
            dry_run,
            counts: Summary::default(),
        }
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub fn set_info(&mut self, info: impl Into<String>) {
        self.info = info.into();
    }

    pub fn count(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Created => self.counts.created += 1,
            Outcome::Replaced => self.counts.replaced += 1,
            Outcome::Unchanged => self.counts.unchanged += 1,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let phase_style = match self.phase {
            Phase::Complete => Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            _ => Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        };

        let phase_indicator = match self.phase {
            Phase::Extracting => "⤷",
            Phase::Parsing => "◐",
            Phase::Reconciling => "⚙",
            Phase::ImportingFiles => "↓",
            Phase::Complete => "✓",
        };

        let mut header = vec![
            Span::styled(format!(" {} ", phase_indicator), phase_style),
            Span::styled(self.phase.to_string(), phase_style),
        ];
        if self.dry_run {
            header.push(Span::raw("  "));
            header.push(Span::styled(
                " DRY RUN ",
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ));
        }

        let lines = vec![
            Line::from(header),
            Line::from(vec![
                Span::raw("   "),
                Span::styled(
                    format!("{} new", self.counts.created),
                    outcome_style(Outcome::Created),
                ),
                Span::raw("  "),
                Span::styled(
                    format!("{} replaced", self.counts.replaced),
                    outcome_style(Outcome::Replaced),
                ),
                Span::raw("  "),
                Span::styled(
                    format!("{} unchanged", self.counts.unchanged),
                    outcome_style(Outcome::Unchanged),
                ),
            ]),
            Line::from(vec![
                Span::raw("   "),
                Span::styled(&self.info, Style::default().fg(Color::Gray)),
            ]),
        ];

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Elements Import ")
            .border_style(Style::default().fg(Color::Blue));

        let paragraph = Paragraph::new(lines).block(block);
        frame.render_widget(paragraph, area);
    }
}

/// Progress bar for the current table or file pass
pub struct ProgressPanel {
    progress: Option<Progress>,
}

impl ProgressPanel {
    pub fn new() -> Self {
        Self { progress: None }
    }

    pub fn set_progress(&mut self, progress: Progress) {
        self.progress = Some(progress);
    }

    pub fn clear(&mut self) {
        self.progress = None;
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::LEFT | Borders::RIGHT)
            .border_style(Style::default().fg(Color::Blue));

        let Some(progress) = &self.progress else {
            frame.render_widget(Paragraph::new("").block(block), area);
            return;
        };

        let label = if progress.total > 0 {
            format!("{}: {}/{}", progress.label, progress.current, progress.total)
        } else {
            progress.label.clone()
        };

        let gauge = Gauge::default()
            .block(block)
            .gauge_style(Style::default().fg(Color::Cyan).bg(Color::DarkGray))
            .ratio(progress.ratio().min(1.0))
            .label(label);

        frame.render_widget(gauge, area);
    }
}

fn outcome_style(outcome: Outcome) -> Style {
    match outcome {
        Outcome::Created => Style::default().fg(Color::Green),
        Outcome::Replaced => Style::default().fg(Color::Yellow),
        Outcome::Unchanged => Style::default().fg(Color::DarkGray),
    }
}

struct LogEntry {
    message: String,
    outcome: Option<Outcome>,
}

/// Result log, newest entries at the bottom
pub struct LogPanel {
    entries: Vec<LogEntry>,
    max_entries: usize,
}

impl LogPanel {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            max_entries: 500,
        }
    }

    pub fn add(&mut self, message: impl Into<String>, outcome: Option<Outcome>) {
        self.entries.push(LogEntry {
            message: message.into(),
            outcome,
        });
        if self.entries.len() > self.max_entries {
            self.entries.remove(0);
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Results ")
            .border_style(Style::default().fg(Color::Blue));

        let visible_height = area.height.saturating_sub(2) as usize; // -2 for borders
        let start = self.entries.len().saturating_sub(visible_height);

        let items: Vec<ListItem> = self.entries[start..]
            .iter()
            .map(|entry| {
                let style = entry
                    .outcome
                    .map(outcome_style)
                    .unwrap_or_else(|| Style::default().fg(Color::White));
                ListItem::new(Span::styled(format!(" {}", entry.message), style))
            })
            .collect();

        let list = List::new(items).block(block);
        frame.render_widget(list, area);
    }
}

//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Modifier, Style},
    widgets::{Block, Borders, List, ListItem, Padding, Paragraph, Wrap},
};
use std::time::Duration;

use crate::app::App;
use crate::config::UiSettings;
use crate::library::SyncStatus;
use crate::playback::{NowPlaying, PlaybackState};

const CONTROLS: &[(&str, &str)] = &[
    ("j/k", "up/down"),
    ("gg/G", "top/bottom"),
    ("enter", "play/pause selected"),
    ("space/p", "pause/resume"),
    ("s", "stop"),
    ("f", "favorite"),
    ("tab", "library/favorites"),
    ("r", "rescan"),
    ("q", "quit"),
];

fn controls_text() -> String {
    CONTROLS
        .iter()
        .map(|(k, v)| format!("[{}] {}", k, v))
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format a `Duration` as `MM:SS`.
pub(crate) fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Status line: playback state, current record and time, sync state, messages.
pub(crate) fn status_text(app: &App, now: &NowPlaying, sync: &SyncStatus) -> String {
    let mut parts: Vec<String> = Vec::new();

    match &now.state {
        PlaybackState::Idle => parts.push(" Stopped".to_string()),
        PlaybackState::Playing(record) | PlaybackState::Paused(record) => {
            parts.push(format!(" {}", now.state.label()));
            parts.push(format!(
                "Song: {} - {} ({}) [{}/{}]",
                record.title,
                record.artist,
                record.album,
                format_mmss(now.elapsed),
                format_mmss(record.duration())
            ));
            parts.push(format!(
                "Art: {}",
                record.artwork_ref.as_deref().unwrap_or("none")
            ));
        }
    }

    if sync.running {
        parts.push("Scanning...".to_string());
    } else if let Some(report) = &sync.last_report {
        if report.failed > 0 {
            parts.push(format!("Synced {} ({} failed)", report.upserted, report.failed));
        }
    }

    if let Some(dir) = &app.current_dir {
        parts.push(format!("Dir: {}", dir));
    }

    if let Some(msg) = &app.status_message {
        parts.push(msg.clone());
    }
    if let Some(err) = &now.last_error {
        parts.push(format!("Error: {}", err));
    }

    parts.join(" • ")
}

/// Render the entire UI into the provided `frame`.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    now: &NowPlaying,
    sync: &SyncStatus,
    ui_settings: &UiSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" molanco ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let status_par = Paragraph::new(status_text(app, now, sync))
        .block(
            Block::bordered()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .title(" status "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[1]);

    // Main list
    {
        let current = now.state.record().map(|r| r.path.as_str());

        // Only build ListItems for the visible window, centered on the selection.
        let total = app.records.len();
        let list_height = chunks[2].height.saturating_sub(2) as usize;
        let sel_pos = app.selected.min(total.saturating_sub(1));
        let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
            (0, total, sel_pos)
        } else {
            let half = list_height / 2;
            let mut start = sel_pos.saturating_sub(half);
            if start + list_height > total {
                start = total - list_height;
            }
            (start, start + list_height, sel_pos - start)
        };

        let visible_items: Vec<ListItem> = (start..end)
            .map(|i| {
                let record = &app.records[i];
                let playing = if current == Some(record.path.as_str()) { "♪" } else { " " };
                let favorite = if record.is_favorite { "★" } else { " " };
                ListItem::new(format!("{}{} {}", playing, favorite, app.label(i)))
            })
            .collect();

        let title = if total == 0 {
            format!("{}(empty) ", app.view.title())
        } else {
            format!("{}({}) ", app.view.title(), total)
        };

        let list = List::new(visible_items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ratatui::widgets::ListState::default();
        if total > 0 {
            state.select(Some(selected_pos_in_visible));
        }
        frame.render_stateful_widget(list, chunks[2], &mut state);
    }

    let footer = Paragraph::new(controls_text())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(footer, chunks[3]);
}

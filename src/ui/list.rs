//! The note list screen: searchable, sorted by recency, with previews and
//! relative timestamps.

use chrono::{DateTime, Utc};
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use super::theme::Palette;
use super::Workspace;

pub(crate) fn render(frame: &mut Frame, ws: &Workspace, palette: &Palette, status: Option<&str>) {
    let area = frame.size();
    frame.render_widget(Block::default().style(palette.base()), area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let user = ws.notebook.owner();
    frame.render_widget(
        Paragraph::new(vec![
            Line::from(vec![
                Span::styled("My Notes", palette.title()),
                Span::styled(format!("  {}", user.email), palette.dim()),
            ]),
            Line::styled(
                "n new \u{2022} Enter open \u{2022} d delete \u{2022} / search \u{2022} t theme \u{2022} L sign out \u{2022} q quit",
                palette.dim(),
            ),
        ]),
        rows[0],
    );

    let search_line = if ws.searching {
        Line::from(vec![
            Span::styled("/ ", palette.accent()),
            Span::styled(format!("{}\u{258f}", ws.search), palette.base()),
        ])
    } else if !ws.search.is_empty() {
        Line::from(vec![
            Span::styled("filter: ", palette.dim()),
            Span::styled(ws.search.clone(), palette.accent()),
        ])
    } else {
        Line::default()
    };
    frame.render_widget(Paragraph::new(search_line), rows[1]);

    let visible = ws.notebook.visible_notes(&ws.search);
    if ws.notebook.is_loading() {
        frame.render_widget(
            Paragraph::new(Line::styled("Loading notes...", palette.dim()))
                .alignment(Alignment::Center),
            rows[2],
        );
    } else if visible.is_empty() {
        let message = if ws.search.is_empty() {
            vec![
                Line::default(),
                Line::styled(
                    format!("Welcome back, {}", user.first_name()),
                    palette.title(),
                )
                .alignment(Alignment::Center),
                Line::default(),
                Line::styled(
                    "Press n to create a new note and capture your thoughts.",
                    palette.dim(),
                )
                .alignment(Alignment::Center),
            ]
        } else {
            vec![
                Line::default(),
                Line::styled("No notes match your search.", palette.dim())
                    .alignment(Alignment::Center),
            ]
        };
        frame.render_widget(Paragraph::new(message), rows[2]);
    } else {
        let items: Vec<ListItem> = visible
            .iter()
            .map(|note| {
                let title = if note.title.trim().is_empty() {
                    Span::styled("Untitled Note", palette.dim())
                } else {
                    Span::styled(note.title.clone(), palette.base())
                };
                let preview = match note.content.lines().next() {
                    Some(line) if !line.trim().is_empty() => {
                        Span::styled(truncate(line, 60), palette.dim())
                    }
                    _ => Span::styled("No content...", palette.dim()),
                };
                let stamp = Span::styled(relative_time(note.updated_at), palette.dim());
                ListItem::new(Text::from(vec![
                    Line::from(title),
                    Line::from(preview),
                    Line::from(stamp),
                ]))
            })
            .collect();
        let mut state = ListState::default().with_selected(Some(ws.selected));
        frame.render_stateful_widget(
            List::new(items).highlight_style(palette.selected()),
            rows[2],
            &mut state,
        );
    }

    let footer = match status {
        Some(message) => Line::styled(message, palette.error()),
        None if ws.searching => Line::styled(
            "Enter keep filter \u{2022} Esc clear",
            palette.dim(),
        ),
        None => Line::default(),
    };
    frame.render_widget(Paragraph::new(footer), rows[3]);
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let cut: String = text.chars().take(limit).collect();
        format!("{}\u{2026}", cut)
    }
}

/// "x ago" stamp for the list footer line of each note.
fn relative_time(t: DateTime<Utc>) -> String {
    let delta = Utc::now().signed_duration_since(t);
    let minutes = delta.num_minutes();
    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if delta.num_hours() < 24 {
        format!("{}h ago", delta.num_hours())
    } else if delta.num_days() < 7 {
        format!("{}d ago", delta.num_days())
    } else {
        t.format("%b %e, %Y").to_string()
    }
}

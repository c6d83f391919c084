//! The editor screen: title and body of the open note, word count, and the
//! AI assist menu.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::assist::AssistAction;

use super::theme::Palette;
use super::{Focus, Workspace};

pub(crate) fn render(frame: &mut Frame, ws: &Workspace, palette: &Palette, status: Option<&str>) {
    let Some(editor) = &ws.editor else {
        return;
    };
    let area = frame.size();
    frame.render_widget(Block::default().style(palette.base()), area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let words = editor.word_count();
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(
                "Esc back \u{2022} Tab switch field \u{2022} Ctrl-A assist",
                palette.dim(),
            ),
            Span::styled(format!("  {} words", words), palette.dim()),
        ])),
        rows[0],
    );

    let title_cursor = if ws.focus == Focus::Title { "\u{258f}" } else { "" };
    let title_text = if editor.title().is_empty() && ws.focus != Focus::Title {
        Span::styled("Note Title", palette.dim())
    } else {
        Span::styled(
            format!("{}{}", editor.title(), title_cursor),
            palette.title(),
        )
    };
    frame.render_widget(
        Paragraph::new(vec![Line::from(title_text), Line::default()]),
        rows[1],
    );

    let content_cursor = if ws.focus == Focus::Content { "\u{258f}" } else { "" };
    let content = if editor.content().is_empty() && ws.focus != Focus::Content {
        Paragraph::new(Line::styled("Start writing...", palette.dim()))
    } else {
        Paragraph::new(format!("{}{}", editor.content(), content_cursor))
            .style(palette.base())
            .wrap(Wrap { trim: false })
    };
    frame.render_widget(content, rows[2]);

    let footer = match status {
        Some(message) => Line::styled(message, palette.error()),
        None if ws.assist_busy => Line::styled("AI assist is working...", palette.accent()),
        None => Line::default(),
    };
    frame.render_widget(Paragraph::new(footer), rows[3]);

    if let Some(selected) = ws.assist_menu {
        render_assist_menu(frame, selected, palette);
    }
}

fn render_assist_menu(frame: &mut Frame, selected: usize, palette: &Palette) {
    let area = frame.size();
    let width = 28.min(area.width);
    let height = (AssistAction::ALL.len() as u16 + 2).min(area.height);
    let popup = Rect {
        x: area.width.saturating_sub(width) / 2,
        y: area.height.saturating_sub(height) / 2,
        width,
        height,
    };
    frame.render_widget(Clear, popup);

    let items: Vec<ListItem> = AssistAction::ALL
        .iter()
        .map(|action| ListItem::new(action.label()))
        .collect();
    let mut state = ListState::default().with_selected(Some(selected));
    frame.render_stateful_widget(
        List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(palette.accent())
                    .title("AI Assist")
                    .style(palette.base()),
            )
            .highlight_style(palette.selected()),
        popup,
        &mut state,
    );
}

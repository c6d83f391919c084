//! Auth screens: login, signup, and email-verification code entry.

use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Padding, Paragraph, Wrap};
use ratatui::Frame;

use super::theme::Palette;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AuthView {
    Login,
    Signup,
    Otp,
}

/// State of the auth screens. One instance exists while no user is
/// signed in; it is discarded on login.
pub(crate) struct AuthScreen {
    pub view: AuthView,
    pub email: String,
    pub password: String,
    pub name: String,
    pub code: String,
    pub focus: usize,
    pub error: Option<String>,
    pub notice: Option<String>,
}

/// Field labels per view, in focus order.
const LOGIN_FIELDS: [&str; 2] = ["Email address", "Password"];
const SIGNUP_FIELDS: [&str; 3] = ["Full Name", "Email address", "Password"];
const OTP_FIELDS: [&str; 1] = ["Confirmation Code"];

impl AuthScreen {
    pub fn new() -> Self {
        Self {
            view: AuthView::Login,
            email: String::new(),
            password: String::new(),
            name: String::new(),
            code: String::new(),
            focus: 0,
            error: None,
            notice: None,
        }
    }

    /// Switch views, clearing messages and focus. Entered field values are
    /// kept so a login → signup switch does not retype the email.
    pub fn switch(&mut self, view: AuthView) {
        self.view = view;
        self.focus = 0;
        self.error = None;
        self.notice = None;
    }

    pub fn field_labels(&self) -> &'static [&'static str] {
        match self.view {
            AuthView::Login => &LOGIN_FIELDS,
            AuthView::Signup => &SIGNUP_FIELDS,
            AuthView::Otp => &OTP_FIELDS,
        }
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.field_labels().len();
    }

    pub fn prev_field(&mut self) {
        let len = self.field_labels().len();
        self.focus = (self.focus + len - 1) % len;
    }

    pub fn focused_value_mut(&mut self) -> &mut String {
        match (self.view, self.focus) {
            (AuthView::Login, 0) => &mut self.email,
            (AuthView::Login, _) => &mut self.password,
            (AuthView::Signup, 0) => &mut self.name,
            (AuthView::Signup, 1) => &mut self.email,
            (AuthView::Signup, _) => &mut self.password,
            (AuthView::Otp, _) => &mut self.code,
        }
    }

    fn field_value(&self, index: usize) -> String {
        let raw = match (self.view, index) {
            (AuthView::Login, 0) => &self.email,
            (AuthView::Login, _) => &self.password,
            (AuthView::Signup, 0) => &self.name,
            (AuthView::Signup, 1) => &self.email,
            (AuthView::Signup, _) => &self.password,
            (AuthView::Otp, _) => &self.code,
        };
        let masked = matches!(
            (self.view, index),
            (AuthView::Login, 1) | (AuthView::Signup, 2)
        );
        if masked {
            "\u{2022}".repeat(raw.chars().count())
        } else {
            raw.clone()
        }
    }

    /// The login failed because the account's email is unverified; offer
    /// the code-entry shortcut.
    pub fn unverified_error(&self) -> bool {
        self.error
            .as_deref()
            .is_some_and(|e| e.contains("confirm") || e.contains("not confirmed"))
    }
}

pub(crate) fn render(frame: &mut Frame, screen: &AuthScreen, palette: &Palette) {
    let area = frame.size();
    frame.render_widget(Block::default().style(palette.base()), area);

    let box_width = 52.min(area.width.saturating_sub(2));
    let box_height = 16.min(area.height);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(box_width),
            Constraint::Min(0),
        ])
        .split(area);
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(box_height),
            Constraint::Min(0),
        ])
        .split(horizontal[1]);
    let card = vertical[1];

    let heading = match screen.view {
        AuthView::Login => "Sign in to your account",
        AuthView::Signup => "Create your account",
        AuthView::Otp => "Verify your email",
    };
    let subtitle = match screen.view {
        AuthView::Otp => format!("We sent a code to {}", screen.email),
        _ => "Simple, clean note taking for everyone".to_string(),
    };

    let mut lines: Vec<Line> = vec![
        Line::styled("My Notes", palette.title()).alignment(Alignment::Center),
        Line::styled(heading, palette.base()).alignment(Alignment::Center),
        Line::styled(subtitle, palette.dim()).alignment(Alignment::Center),
        Line::default(),
    ];

    if let Some(error) = &screen.error {
        lines.push(Line::styled(format!("! {}", error), palette.error()));
        if screen.unverified_error() && screen.view != AuthView::Otp {
            lines.push(Line::styled("  [F3] enter confirmation code", palette.accent()));
        }
        lines.push(Line::default());
    }
    if let Some(notice) = &screen.notice {
        lines.push(Line::styled(format!("* {}", notice), palette.notice()));
        lines.push(Line::default());
    }

    for (i, label) in screen.field_labels().iter().enumerate() {
        let focused = i == screen.focus;
        let marker = if focused { "> " } else { "  " };
        let value = screen.field_value(i);
        let cursor = if focused { "\u{258f}" } else { "" };
        lines.push(Line::from(vec![
            Span::styled(
                format!("{}{:<18}", marker, format!("{}:", label)),
                if focused { palette.accent() } else { palette.dim() },
            ),
            Span::styled(format!("{}{}", value, cursor), palette.base()),
        ]));
    }

    lines.push(Line::default());
    let hints = match screen.view {
        AuthView::Login => "Enter sign in \u{2022} Tab next field \u{2022} F2 create account \u{2022} Esc quit",
        AuthView::Signup => "Enter create account \u{2022} Tab next field \u{2022} F2 sign in instead \u{2022} Esc back",
        AuthView::Otp => "Enter verify \u{2022} Ctrl-R resend code \u{2022} Esc change email",
    };
    lines.push(Line::styled(hints, palette.dim()).alignment(Alignment::Center));

    let card_block = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.accent())
        .padding(Padding::uniform(1))
        .style(palette.base());
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).block(card_block),
        card,
    );
}

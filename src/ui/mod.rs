//! Terminal UI: auth screens, note list, and editor, driven by a single
//! async event loop. Rendering is pure: each screen draws from controller
//! state and nothing else. Terminal input runs on a dedicated thread and is
//! multiplexed with the editor's debounce channel, assist results, and the
//! auth-state stream via `tokio::select!`.

mod auth;
mod editor;
mod list;
mod theme;

use std::io::{stdout, Stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::{Frame, Terminal};
use tokio::sync::{mpsc, watch};

use crate::assist::{AssistAction, AssistClient, AssistError};
use crate::backend::{
    AuthClient, BackendConfig, HostedNoteStore, MemoryNoteStore, NoteStore, SessionManager,
};
use crate::config::{self, AppConfig, Theme};
use crate::models::{Note, SignupOutcome, User};
use crate::notebook::editor::{EditorSession, FlushDue};
use crate::notebook::Notebook;

use auth::{AuthScreen, AuthView};
use theme::Palette;

/// Result of a spawned assist call, delivered back to the event loop.
struct AssistDone {
    note_id: String,
    action: AssistAction,
    result: Result<String, AssistError>,
}

/// Which editor field receives keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Focus {
    Title,
    Content,
}

impl Focus {
    fn toggled(self) -> Self {
        match self {
            Self::Title => Self::Content,
            Self::Content => Self::Title,
        }
    }
}

/// Per-login state: the notebook plus list/editor view state. Dropped
/// wholesale on logout so nothing leaks across sessions.
pub(crate) struct Workspace {
    pub notebook: Notebook,
    pub editor: Option<EditorSession>,
    pub focus: Focus,
    pub search: String,
    pub searching: bool,
    pub selected: usize,
    pub assist_busy: bool,
    pub assist_menu: Option<usize>,
}

impl Workspace {
    fn new(notebook: Notebook) -> Self {
        Self {
            notebook,
            editor: None,
            focus: Focus::Content,
            search: String::new(),
            searching: false,
            selected: 0,
            assist_busy: false,
            assist_menu: None,
        }
    }

    fn open_editor(&mut self, note: &Note, flush_tx: &mpsc::UnboundedSender<FlushDue>) {
        self.focus = if note.title.is_empty() {
            Focus::Title
        } else {
            Focus::Content
        };
        self.editor = Some(EditorSession::open(note, flush_tx.clone()));
    }
}

pub(crate) enum Screen {
    Auth(AuthScreen),
    Notes,
}

struct App {
    config: AppConfig,
    theme: Theme,
    backend: BackendConfig,
    assist: AssistClient,
    session: SessionManager,
    demo: bool,
    screen: Screen,
    workspace: Option<Workspace>,
    status: Option<String>,
    flush_tx: mpsc::UnboundedSender<FlushDue>,
    assist_tx: mpsc::UnboundedSender<AssistDone>,
    should_quit: bool,
}

/// Launch the terminal UI. With `demo` set, skips auth and runs against an
/// in-memory store so the app can be tried without any backend.
pub async fn run(demo: bool) -> Result<()> {
    let config = AppConfig::load();
    let theme = config.effective_theme();
    let backend = BackendConfig::from_env();
    let assist = AssistClient::from_env();

    let mut session = SessionManager::new(AuthClient::new(backend.clone()), config::session_path()?);
    // Subscribe before restore so the restored session is observed.
    let mut auth_rx = session.subscribe();
    if !demo {
        session.restore().await;
    }

    let (flush_tx, mut flush_rx) = mpsc::unbounded_channel();
    let (assist_tx, mut assist_rx) = mpsc::unbounded_channel();

    let mut app = App {
        config,
        theme,
        backend,
        assist,
        session,
        demo,
        screen: Screen::Auth(AuthScreen::new()),
        workspace: None,
        status: None,
        flush_tx,
        assist_tx,
        should_quit: false,
    };

    if demo {
        let user = User::new(
            "demo".to_string(),
            "demo@quillpad.local".to_string(),
            Some("Demo".to_string()),
        );
        let store: Arc<dyn NoteStore> = Arc::new(MemoryNoteStore::new());
        let mut notebook = Notebook::new(store, user);
        notebook.load().await;
        app.workspace = Some(Workspace::new(notebook));
        app.screen = Screen::Notes;
    }

    let (input_tx, mut input_rx) = mpsc::unbounded_channel();
    spawn_input_thread(input_tx);

    let mut terminal = setup_terminal()?;
    let result = event_loop(
        &mut app,
        &mut terminal,
        &mut input_rx,
        &mut flush_rx,
        &mut assist_rx,
        &mut auth_rx,
    )
    .await;
    teardown_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(out))?)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Forward crossterm events into the async loop. Crossterm's blocking read
/// lives on its own thread; the poll timeout bounds how long the thread
/// lingers after the receiver is gone.
fn spawn_input_thread(tx: mpsc::UnboundedSender<Event>) {
    std::thread::spawn(move || loop {
        if tx.is_closed() {
            break;
        }
        match event::poll(Duration::from_millis(100)) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    if tx.send(ev).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {}
            Err(_) => break,
        }
    });
}

async fn event_loop(
    app: &mut App,
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    input_rx: &mut mpsc::UnboundedReceiver<Event>,
    flush_rx: &mut mpsc::UnboundedReceiver<FlushDue>,
    assist_rx: &mut mpsc::UnboundedReceiver<AssistDone>,
    auth_rx: &mut watch::Receiver<Option<User>>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| app.render(frame))?;
        tokio::select! {
            maybe_event = input_rx.recv() => match maybe_event {
                Some(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    app.handle_key(key).await;
                }
                Some(_) => {}
                None => break,
            },
            Some(flush) = flush_rx.recv() => app.handle_flush(flush).await,
            Some(done) = assist_rx.recv() => app.apply_assist(done),
            changed = auth_rx.changed() => {
                if changed.is_ok() {
                    let user = auth_rx.borrow_and_update().clone();
                    app.handle_auth_change(user).await;
                }
            }
        }
        if app.should_quit {
            break;
        }
    }
    Ok(())
}

impl App {
    fn render(&mut self, frame: &mut Frame) {
        let palette = Palette::for_theme(self.theme);
        match &self.screen {
            Screen::Auth(screen) => auth::render(frame, screen, &palette),
            Screen::Notes => {
                if let Some(ws) = &self.workspace {
                    if ws.editor.is_some() && ws.notebook.active_note().is_some() {
                        editor::render(frame, ws, &palette, self.status.as_deref());
                    } else {
                        list::render(frame, ws, &palette, self.status.as_deref());
                    }
                }
            }
        }
    }

    async fn handle_key(&mut self, key: KeyEvent) {
        // Transient status: any keypress clears it.
        self.status = None;

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit_flushing().await;
            return;
        }

        match &self.screen {
            Screen::Auth(_) => self.handle_auth_key(key).await,
            Screen::Notes => {
                let in_editor = self
                    .workspace
                    .as_ref()
                    .is_some_and(|w| w.editor.is_some() && w.notebook.active_note().is_some());
                if in_editor {
                    self.handle_editor_key(key).await;
                } else {
                    self.handle_list_key(key).await;
                }
            }
        }
    }

    /// Flush a dirty draft before quitting so the last edits are not lost.
    async fn quit_flushing(&mut self) {
        if let Some(ws) = self.workspace.as_mut() {
            if let Some(editor) = &mut ws.editor {
                if let Some(committed) = ws.notebook.note(editor.note_id()).cloned() {
                    if let Some(merged) = editor.flush_now(&committed) {
                        ws.notebook.update(merged).await;
                    }
                }
            }
        }
        self.should_quit = true;
    }

    // ============================================================
    // Auth screen
    // ============================================================

    async fn handle_auth_key(&mut self, key: KeyEvent) {
        let Screen::Auth(auth) = &mut self.screen else {
            return;
        };
        match key.code {
            KeyCode::Esc => match auth.view {
                AuthView::Login => self.should_quit = true,
                AuthView::Signup | AuthView::Otp => auth.switch(AuthView::Login),
            },
            KeyCode::Tab => auth.next_field(),
            KeyCode::BackTab => auth.prev_field(),
            KeyCode::F(2) => match auth.view {
                AuthView::Login => auth.switch(AuthView::Signup),
                AuthView::Signup => auth.switch(AuthView::Login),
                AuthView::Otp => {}
            },
            KeyCode::F(3) if auth.unverified_error() => {
                auth.switch(AuthView::Otp);
            }
            KeyCode::Char('t') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.toggle_theme_fields();
            }
            KeyCode::Char('r')
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && auth.view == AuthView::Otp =>
            {
                if auth.email.trim().is_empty() {
                    auth.error = Some("Please enter your email address first.".to_string());
                } else {
                    match self.session.resend_verification(&auth.email).await {
                        Ok(()) => {
                            auth.error = None;
                            auth.notice =
                                Some("Code resent! Please check your inbox.".to_string());
                        }
                        Err(e) => auth.error = Some(e.message()),
                    }
                }
            }
            KeyCode::Enter => self.submit_auth().await,
            KeyCode::Backspace => {
                auth.focused_value_mut().pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                auth.focused_value_mut().push(c);
            }
            _ => {}
        }
    }

    async fn submit_auth(&mut self) {
        let Screen::Auth(auth) = &mut self.screen else {
            return;
        };
        auth.error = None;
        auth.notice = None;
        match auth.view {
            AuthView::Login => {
                if let Err(e) = self.session.login(&auth.email, &auth.password).await {
                    auth.error = Some(e.message());
                }
            }
            AuthView::Signup => {
                if auth.name.trim().is_empty() {
                    auth.error = Some("Name is required".to_string());
                    return;
                }
                match self
                    .session
                    .signup(&auth.email, &auth.password, &auth.name)
                    .await
                {
                    Ok(SignupOutcome::SignedIn(_)) => {}
                    Ok(SignupOutcome::VerificationRequired { .. }) => {
                        auth.switch(AuthView::Otp);
                        auth.notice = Some(
                            "Account created! Please enter the code sent to your email."
                                .to_string(),
                        );
                    }
                    Err(e) => auth.error = Some(e.message()),
                }
            }
            AuthView::Otp => {
                if let Err(e) = self.session.verify_code(&auth.email, &auth.code).await {
                    auth.error = Some(e.message());
                }
            }
        }
    }

    // ============================================================
    // List screen
    // ============================================================

    async fn handle_list_key(&mut self, key: KeyEvent) {
        let Some(ws) = self.workspace.as_mut() else {
            return;
        };
        if ws.searching {
            match key.code {
                KeyCode::Esc => {
                    ws.searching = false;
                    ws.search.clear();
                    ws.selected = 0;
                }
                KeyCode::Enter => ws.searching = false,
                KeyCode::Backspace => {
                    ws.search.pop();
                    ws.selected = 0;
                }
                KeyCode::Char(c) => {
                    ws.search.push(c);
                    ws.selected = 0;
                }
                _ => {}
            }
            return;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('/') => ws.searching = true,
            KeyCode::Down | KeyCode::Char('j') => {
                let len = ws.notebook.visible_notes(&ws.search).len();
                if len > 0 {
                    ws.selected = (ws.selected + 1).min(len - 1);
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                ws.selected = ws.selected.saturating_sub(1);
            }
            KeyCode::Enter => {
                let id = ws
                    .notebook
                    .visible_notes(&ws.search)
                    .get(ws.selected)
                    .map(|n| n.id.clone());
                if let Some(id) = id {
                    ws.notebook.select(&id).await;
                    if let Some(note) = ws.notebook.note(&id).cloned() {
                        ws.open_editor(&note, &self.flush_tx);
                    }
                }
            }
            KeyCode::Char('n') => match ws.notebook.add().await {
                Some(note) => ws.open_editor(&note, &self.flush_tx),
                None => self.status = Some("Could not create a new note".to_string()),
            },
            KeyCode::Char('d') => {
                let id = ws
                    .notebook
                    .visible_notes(&ws.search)
                    .get(ws.selected)
                    .map(|n| n.id.clone());
                if let Some(id) = id {
                    if let Err(e) = ws.notebook.delete(&id).await {
                        self.status = Some(format!(
                            "Failed to delete note: {}. Please check your internet \
                             connection or account permissions.",
                            e.message()
                        ));
                    }
                    let len = ws.notebook.visible_notes(&ws.search).len();
                    if len > 0 && ws.selected >= len {
                        ws.selected = len - 1;
                    }
                }
            }
            KeyCode::Char('t') => self.toggle_theme_fields(),
            KeyCode::Char('L') => {
                if self.demo {
                    self.should_quit = true;
                } else {
                    self.session.logout().await;
                }
            }
            _ => {}
        }
    }

    // ============================================================
    // Editor screen
    // ============================================================

    async fn handle_editor_key(&mut self, key: KeyEvent) {
        let menu_open = self
            .workspace
            .as_ref()
            .is_some_and(|w| w.assist_menu.is_some());
        if key.code == KeyCode::Esc && !menu_open {
            self.editor_back().await;
            return;
        }

        let Some(ws) = self.workspace.as_mut() else {
            return;
        };

        if let Some(idx) = ws.assist_menu {
            match key.code {
                KeyCode::Esc => ws.assist_menu = None,
                KeyCode::Down | KeyCode::Char('j') => {
                    ws.assist_menu = Some((idx + 1) % AssistAction::ALL.len());
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    ws.assist_menu =
                        Some((idx + AssistAction::ALL.len() - 1) % AssistAction::ALL.len());
                }
                KeyCode::Enter => {
                    ws.assist_menu = None;
                    let action = AssistAction::ALL[idx];
                    Self::launch_assist(ws, &self.assist, &self.assist_tx, action);
                }
                _ => {}
            }
            return;
        }

        if ws.assist_busy {
            self.status = Some("AI assist is working...".to_string());
            return;
        }

        let Some(editor) = &mut ws.editor else {
            return;
        };
        match key.code {
            KeyCode::Tab => ws.focus = ws.focus.toggled(),
            KeyCode::Char('a') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                ws.assist_menu = Some(0);
            }
            KeyCode::Enter => match ws.focus {
                Focus::Title => ws.focus = Focus::Content,
                Focus::Content => {
                    let mut content = editor.content().to_string();
                    content.push('\n');
                    editor.set_content(content);
                }
            },
            KeyCode::Backspace => match ws.focus {
                Focus::Title => {
                    let mut title = editor.title().to_string();
                    title.pop();
                    editor.set_title(title);
                }
                Focus::Content => {
                    let mut content = editor.content().to_string();
                    content.pop();
                    editor.set_content(content);
                }
            },
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                match ws.focus {
                    Focus::Title => {
                        let mut title = editor.title().to_string();
                        title.push(c);
                        editor.set_title(title);
                    }
                    Focus::Content => {
                        let mut content = editor.content().to_string();
                        content.push(c);
                        editor.set_content(content);
                    }
                }
            }
            _ => {}
        }
    }

    /// Back to the list: forced flush first so the cleanup's vacancy check
    /// sees the latest draft, then the lifecycle's back (which cleans up a
    /// vacant active note).
    async fn editor_back(&mut self) {
        let Some(ws) = self.workspace.as_mut() else {
            return;
        };
        if let Some(editor) = &mut ws.editor {
            if let Some(committed) = ws.notebook.note(editor.note_id()).cloned() {
                if let Some(merged) = editor.flush_now(&committed) {
                    ws.notebook.update(merged).await;
                }
            }
        }
        ws.editor = None;
        ws.assist_menu = None;
        ws.assist_busy = false;
        ws.notebook.back().await;
        ws.selected = 0;
    }

    fn launch_assist(
        ws: &mut Workspace,
        assist: &AssistClient,
        assist_tx: &mpsc::UnboundedSender<AssistDone>,
        action: AssistAction,
    ) {
        let Some(editor) = &ws.editor else {
            return;
        };
        ws.assist_busy = true;
        let client = assist.clone();
        let tx = assist_tx.clone();
        let note_id = editor.note_id().to_string();
        let content = editor.content().to_string();
        tokio::spawn(async move {
            let result = match action {
                AssistAction::GenerateTitle => Ok(client.generate_title(&content).await),
                AssistAction::Summarize => client.summarize(&content).await,
                AssistAction::Improve => client.improve(&content).await,
                AssistAction::FixGrammar => client.fix_grammar(&content).await,
                AssistAction::Continue => client.continue_writing(&content).await,
            };
            let _ = tx.send(AssistDone {
                note_id,
                action,
                result,
            });
        });
    }

    /// Write an assist result into the draft; it then follows the same
    /// debounce path as manual typing. Results for a note that is no longer
    /// open are dropped.
    fn apply_assist(&mut self, done: AssistDone) {
        let Some(ws) = self.workspace.as_mut() else {
            return;
        };
        ws.assist_busy = false;
        let Some(editor) = &mut ws.editor else {
            return;
        };
        if editor.note_id() != done.note_id {
            return;
        }
        match done.result {
            Ok(text) => match done.action {
                AssistAction::GenerateTitle => editor.set_title(text),
                AssistAction::Continue => editor.append_content(&text),
                AssistAction::Summarize | AssistAction::Improve | AssistAction::FixGrammar => {
                    if !text.is_empty() {
                        editor.set_content(text);
                    }
                }
            },
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    // ============================================================
    // Cross-cutting
    // ============================================================

    async fn handle_flush(&mut self, flush: FlushDue) {
        let Some(ws) = self.workspace.as_mut() else {
            return;
        };
        let Some(editor) = &mut ws.editor else {
            return;
        };
        if editor.note_id() != flush.note_id {
            return;
        }
        let Some(committed) = ws.notebook.note(&flush.note_id).cloned() else {
            return;
        };
        if let Some(merged) = editor.take_flush(&committed) {
            ws.notebook.update(merged).await;
        }
    }

    async fn handle_auth_change(&mut self, user: Option<User>) {
        match user {
            Some(user) => {
                let token = self.session.access_token().unwrap_or_default().to_string();
                let store: Arc<dyn NoteStore> =
                    Arc::new(HostedNoteStore::new(self.backend.clone(), token));
                let mut notebook = Notebook::new(store, user);
                notebook.load().await;
                self.workspace = Some(Workspace::new(notebook));
                self.screen = Screen::Notes;
            }
            None => {
                self.workspace = None;
                if !self.demo {
                    self.screen = Screen::Auth(AuthScreen::new());
                }
            }
        }
    }

    fn toggle_theme_fields(&mut self) {
        self.theme = self.theme.toggled();
        self.config.theme = Some(self.theme);
        if let Err(e) = self.config.save() {
            tracing::warn!("failed to save theme preference: {}", e);
        }
    }
}

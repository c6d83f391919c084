use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quillpad::backend::{AuthClient, BackendConfig, HostedNoteStore, SessionManager};
use quillpad::notebook::Notebook;
use quillpad::{config, ui};

#[derive(Parser)]
#[command(name = "quill")]
#[command(about = "Terminal client for your hosted notes, with AI-assisted editing")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the terminal UI (the default)
    Tui {
        /// Run against an in-memory store with a local user; no account or
        /// backend needed
        #[arg(long)]
        demo: bool,
    },
    /// Print your notes, most recently updated first
    List,
    /// Show the signed-in account
    Whoami,
    /// Clear the stored session
    Logout,
}

/// Initialize tracing. The TUI owns the terminal, so its logs go to a file
/// under the data dir; plain CLI commands log to stderr.
fn init_tracing(to_file: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "quillpad=debug".into()),
    );

    if to_file {
        let file = config::log_path().ok().and_then(|path| {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).ok()?;
            }
            std::fs::File::create(path).ok()
        });
        match file {
            Some(file) => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .with_ansi(false)
                            .with_writer(Arc::new(file)),
                    )
                    .init();
            }
            None => {
                // No usable log file; swallow output rather than corrupt
                // the alternate screen.
                tracing_subscriber::registry()
                    .with(filter)
                    .with(tracing_subscriber::fmt::layer().with_writer(std::io::sink))
                    .init();
            }
        }
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Tui { demo: false });

    let to_file = matches!(command, Commands::Tui { .. });
    init_tracing(to_file);

    match command {
        Commands::Tui { demo } => ui::run(demo).await,
        Commands::List => list_notes().await,
        Commands::Whoami => whoami().await,
        Commands::Logout => logout().await,
    }
}

async fn restored_session(backend: &BackendConfig) -> anyhow::Result<SessionManager> {
    let mut session = SessionManager::new(AuthClient::new(backend.clone()), config::session_path()?);
    session.restore().await;
    Ok(session)
}

async fn list_notes() -> anyhow::Result<()> {
    let backend = BackendConfig::from_env();
    let session = restored_session(&backend).await?;
    let Some(user) = session.current_user().cloned() else {
        println!("Not signed in. Run `quill` to log in.");
        return Ok(());
    };
    let token = session.access_token().unwrap_or_default().to_string();
    let store = Arc::new(HostedNoteStore::new(backend, token));
    let mut notebook = Notebook::new(store, user);
    notebook.load().await;

    let notes = notebook.visible_notes("");
    if notes.is_empty() {
        println!("No notes yet.");
        return Ok(());
    }
    for note in notes {
        let title = if note.title.trim().is_empty() {
            "Untitled Note"
        } else {
            note.title.as_str()
        };
        println!("{}  {}", note.updated_at.format("%Y-%m-%d %H:%M"), title);
    }
    Ok(())
}

async fn whoami() -> anyhow::Result<()> {
    let backend = BackendConfig::from_env();
    let session = restored_session(&backend).await?;
    match session.current_user() {
        Some(user) => println!("{} <{}>", user.name, user.email),
        None => println!("Not signed in."),
    }
    Ok(())
}

async fn logout() -> anyhow::Result<()> {
    let backend = BackendConfig::from_env();
    let mut session = restored_session(&backend).await?;
    if session.current_user().is_none() {
        println!("Not signed in.");
        return Ok(());
    }
    session.logout().await;
    println!("Signed out.");
    Ok(())
}

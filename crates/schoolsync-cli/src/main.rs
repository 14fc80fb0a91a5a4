//! schoolsync - keep a school dashboard in sync from the terminal.
//!
//! Thin front end over `schoolsync-core`: builds the engine from the
//! configuration, prints read-only projections of its state and exposes the
//! few state-changing calls the dashboard makes.

mod render;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use schoolsync_core::cache::{FileSessionStore, SessionStore, SnapshotCache};
use schoolsync_core::models::NewEvent;
use schoolsync_core::sync::{NoReload, ReloadHook, SyncOrchestrator};
use schoolsync_core::{ApiClient, Config, CycleOutcome, DashboardApi};
use tokio::sync::Notify;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "schoolsync", version)]
#[command(about = "Keep a school administration dashboard in sync", long_about = None)]
struct Cli {
    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one sync cycle and print the dashboard
    Sync {
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the cached dashboard, sync, then keep polling notifications
    Watch,
    /// Mark a notification as read
    MarkRead { id: String },
    /// Manage calendar entries
    #[command(subcommand)]
    Event(EventCommands),
    /// Inspect the session snapshot cache
    #[command(subcommand)]
    Cache(CacheCommands),
    /// Manage the current session
    #[command(subcommand)]
    Session(SessionCommands),
}

#[derive(Subcommand)]
enum EventCommands {
    /// Create a calendar entry
    Add {
        title: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a calendar entry
    Remove { id: String },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Print the cached snapshot
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Drop the cached snapshot
    Clear,
}

#[derive(Subcommand)]
enum SessionCommands {
    /// End the session, discarding its cache and reload marker
    End,
}

/// Initialize the tracing subscriber for logging.
///
/// Use RUST_LOG to control the level (e.g. RUST_LOG=schoolsync_core=debug).
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("Log file path has no file name: {}", path.display()))?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            Ok(None)
        }
    }
}

/// Reload requests from the engine, consumed by `watch`.
#[derive(Default)]
struct ReloadSignal {
    notify: Notify,
}

impl ReloadHook for ReloadSignal {
    fn reload(&self) {
        self.notify.notify_one();
    }
}

struct App {
    config: Config,
    store: Arc<FileSessionStore>,
    api: ApiClient,
}

impl App {
    fn load() -> Result<Self> {
        let config = Config::load()?;
        let store = Arc::new(FileSessionStore::new(config.session_root()?, &config.session_id)?);
        let mut api = ApiClient::new(&config.base_url, config.request_timeout())?;
        if let Some(ref token) = config.api_token {
            api.set_token(token.clone());
        }
        Ok(Self { config, store, api })
    }

    fn cache(&self) -> SnapshotCache {
        SnapshotCache::new(Arc::clone(&self.store) as Arc<dyn SessionStore>)
    }

    fn orchestrator(&self, reload: Arc<dyn ReloadHook>) -> Arc<SyncOrchestrator> {
        Arc::new(SyncOrchestrator::new(
            Arc::new(self.api.clone()) as Arc<dyn DashboardApi>,
            self.cache(),
            reload,
            self.config.sync_options(),
        ))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_file.as_deref())?;
    info!("schoolsync starting");

    let app = App::load()?;
    match cli.command {
        Commands::Sync { json } => sync_once(&app, json).await,
        Commands::Watch => watch(&app).await,
        Commands::MarkRead { id } => mark_read(&app, &id).await,
        Commands::Event(EventCommands::Add {
            title,
            start,
            end,
            location,
            description,
        }) => {
            let event = NewEvent {
                title,
                start,
                end,
                location,
                description,
            };
            let created = app.api.create_event(&event).await?;
            println!("Created: {}", serde_json::to_string_pretty(&created)?);
            Ok(())
        }
        Commands::Event(EventCommands::Remove { id }) => {
            app.api.delete_event(&id).await?;
            println!("Deleted event {}", id);
            Ok(())
        }
        Commands::Cache(CacheCommands::Show { json }) => show_cache(&app, json),
        Commands::Cache(CacheCommands::Clear) => {
            app.cache().clear();
            println!("Cached snapshot cleared");
            Ok(())
        }
        Commands::Session(SessionCommands::End) => {
            app.store.end_session()?;
            println!("Session '{}' ended", app.config.session_id);
            Ok(())
        }
    }
}

async fn sync_once(app: &App, json: bool) -> Result<()> {
    let engine = app.orchestrator(Arc::new(NoReload));
    engine.hydrate_from_cache();
    let outcome = engine.run_cycle().await;
    let state = engine.state();

    if json {
        println!("{}", serde_json::to_string_pretty(state.snapshot.as_ref())?);
    } else {
        render::dashboard(&mut io::stdout().lock(), &state)?;
    }

    if outcome == CycleOutcome::Failed {
        anyhow::bail!(state.error.clone().unwrap_or_else(|| "Sync failed".to_string()));
    }
    Ok(())
}

async fn watch(app: &App) -> Result<()> {
    let reload = Arc::new(ReloadSignal::default());

    loop {
        let engine = app.orchestrator(Arc::clone(&reload) as Arc<dyn ReloadHook>);
        if engine.hydrate_from_cache() {
            render::dashboard(&mut io::stdout().lock(), &engine.state())?;
        }

        let (outcome, poller) = engine.start().await;
        info!(?outcome, "Initial sync finished");
        let mut shown = engine.state();
        render::dashboard(&mut io::stdout().lock(), &shown)?;

        let mut updates = engine.subscribe();
        let restart = loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break false,
                _ = reload.notify.notified() => break true,
                changed = updates.changed() => {
                    if changed.is_err() {
                        break false;
                    }
                    let state = updates.borrow_and_update().clone();
                    if state.snapshot.notifications != shown.snapshot.notifications {
                        println!();
                        println!("Notifications ({})", render::status_line(&state));
                        render::notifications(&mut io::stdout().lock(), &state.snapshot.notifications)?;
                    }
                    shown = state;
                }
            }
        };

        poller.stop().await;
        engine.shutdown();
        if !restart {
            return Ok(());
        }
        println!();
        println!("New notifications arrived, reloading...");
    }
}

async fn mark_read(app: &App, id: &str) -> Result<()> {
    // Keep the session snapshot in step so the next start shows it read.
    if let Some(mut snapshot) = app.cache().read() {
        if let Some(n) = snapshot.notifications.iter_mut().find(|n| n.id == id) {
            n.read = true;
            app.cache().write(&snapshot);
        }
    }
    match app.api.mark_read(id).await {
        Ok(()) => println!("Marked {} as read", id),
        Err(e) => warn!(id = id, error = %e, "Mark-read call failed"),
    }
    Ok(())
}

fn show_cache(app: &App, json: bool) -> Result<()> {
    let Some(cached) = app.cache().read_cached() else {
        println!("No cached snapshot for session '{}'", app.config.session_id);
        return Ok(());
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&cached)?);
        return Ok(());
    }
    println!("Cached {} ({})", cached.age_display(), schoolsync_core::utils::format_datetime(&cached.cached_at));
    if cached.is_stale() {
        println!("This snapshot is over an hour old.");
    }
    let state = schoolsync_core::DashboardState {
        snapshot: Arc::new(cached.data),
        cached_at: Some(cached.cached_at),
        phase: schoolsync_core::SyncPhase::CacheHydrated,
        ..Default::default()
    };
    render::dashboard(&mut io::stdout().lock(), &state)?;
    Ok(())
}

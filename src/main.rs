mod api;
mod app;
mod cards;
mod cli;
mod event;
mod help;
mod keys;
mod logging;
mod settings;
mod storage;
mod theme;
mod time;
mod tui;
mod viewport;
mod views;

#[cfg(test)]
mod test_utils;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use ratatui::layout::Rect;
use tracing::{info, warn};

use app::App;
use cli::{Cli, Commands, ConfigCommands};
use event::Event;
use settings::Settings;
use storage::{Storage, StorageLocation};
use theme::{ResolvedTheme, ThemeVariant, detect_terminal_theme};
use tui::EventHandler;

const TICK_MS: u64 = 100;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Config(command)) = &cli.command {
        return handle_config_command(command, cli.config_dir.as_ref());
    }
    run_tui(cli).await
}

fn handle_config_command(
    command: &ConfigCommands,
    custom_config_dir: Option<&PathBuf>,
) -> Result<()> {
    let config_dir =
        settings::config_dir(custom_config_dir).context("Could not determine config directory")?;
    let path = settings::settings_path(&config_dir);
    match command {
        ConfigCommands::Path => println!("{}", path.display()),
        ConfigCommands::Show => {
            let settings = Settings::load(&path)?;
            let toml = toml::to_string_pretty(&settings).context("Failed to serialize settings")?;
            print!("{toml}");
        }
    }
    Ok(())
}

fn resolve_theme(cli: &Cli, settings: &Settings) -> ResolvedTheme {
    // Priority: CLI flag > settings file > terminal detection
    let variant = if cli.dark {
        ThemeVariant::Dark
    } else if cli.light {
        ThemeVariant::Light
    } else if let Some(variant) = settings.theme {
        variant
    } else {
        detect_terminal_theme()
    };
    ResolvedTheme::for_variant(variant)
}

/// Loads the settings file. `None` when there is no config dir or the file
/// could not be used; such a file is never written back.
fn load_settings(config_dir: Option<&Path>) -> Option<Settings> {
    let path = settings::settings_path(config_dir?);
    match Settings::load(&path) {
        Ok(settings) => Some(settings),
        Err(e) => {
            warn!("using default settings: {e:#}");
            eprintln!("Warning: {e:#}");
            None
        }
    }
}

fn open_storage(config_dir: Option<&Path>) -> Option<Storage> {
    let dir = config_dir?;
    match Storage::open(StorageLocation::Path(settings::db_path(dir))) {
        Ok(storage) => Some(storage),
        Err(e) => {
            warn!(error = %e, "storage disabled");
            eprintln!("Storage disabled: {e}");
            None
        }
    }
}

async fn run_tui(cli: Cli) -> Result<()> {
    let config_dir = settings::config_dir(cli.config_dir.as_ref());

    // Keep the guard until exit so buffered log lines are flushed.
    let _log_guard = match &config_dir {
        Some(dir) => {
            let log_path = settings::log_path(dir);
            if cli.verbose {
                eprintln!("Logging to {}", log_path.display());
            }
            Some(logging::init(&log_path, cli.verbose)?)
        }
        None => None,
    };

    let loaded = load_settings(config_dir.as_deref());
    let writable = loaded.is_some();
    let mut settings = loaded.unwrap_or_default();
    let storage = open_storage(config_dir.as_deref());
    let seen = match &storage {
        Some(storage) => storage.seen_ids().await.unwrap_or_else(|e| {
            warn!(error = %e, "could not load seen articles");
            Default::default()
        }),
        None => Default::default(),
    };
    let resolved_theme = resolve_theme(&cli, &settings);

    let mut app = App::new(resolved_theme, &settings.viewport, storage);
    app.seen = seen;
    app.feed = cli.feed.or(settings.feed).unwrap_or_default();
    info!(feed = app.feed.label(), seen = app.seen.len(), "starting");

    let mut terminal = tui::init()?;
    let mut events = EventHandler::new(TICK_MS);
    app.load_articles();

    let result = run_loop(&mut terminal, &mut app, &mut events).await;
    tui::restore()?;
    result?;

    // Remember the last feed for the next start
    if let Some(dir) = &config_dir
        && writable
        && settings.feed != Some(app.feed)
    {
        settings.feed = Some(app.feed);
        settings.save(&settings::settings_path(dir))?;
    }
    Ok(())
}

async fn run_loop(
    terminal: &mut tui::Tui,
    app: &mut App,
    events: &mut EventHandler,
) -> Result<()> {
    loop {
        // Poll async results (non-blocking)
        while let Ok(result) = app.result_rx.try_recv() {
            app.handle_async_result(result);
        }

        // Lay out before drawing so the viewport sees the frame the user will see
        let size = terminal.size()?;
        let screen = Rect::new(0, 0, size.width, size.height);
        let list = views::list_area(screen, app.debug.visible);
        app.layout_pass(list.width, list.height);
        app.drain_messages();

        terminal.draw(|frame| views::render(app, frame))?;

        if app.should_quit {
            break;
        }

        match events.next().await? {
            Event::Key(key) => {
                if let Some(msg) = keys::handle_key(key, app) {
                    app.update(msg);
                }
            }
            Event::Tick | Event::Resize => {}
        }
    }
    Ok(())
}

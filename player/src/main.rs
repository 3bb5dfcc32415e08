use anyhow::{Context, Result};
use basestream_core::Config;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend, style::Color};
use std::{
    fs::OpenOptions,
    io::{self, Write},
    path::PathBuf,
    time::{Duration, Instant},
};
use tokio::sync::mpsc;

mod app;
mod commands;
mod events;
mod mpv;
mod tasks;
mod ui;

use app::App;
use events::event_utils;

// Debug logger to file for development
fn debug_log(message: &str) {
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open("basestream_debug.log")
    {
        let datetime = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let thread_id = std::thread::current().id();

        let backtrace = if message.contains("ERROR") || message.contains("PANIC") {
            format!("\n    at {}", std::backtrace::Backtrace::capture())
        } else {
            String::new()
        };

        let _ = writeln!(file, "[{} {:?}] {}{}", datetime, thread_id, message, backtrace);
    }
}

/// Browse movies and shows, and play public-domain films through mpv
#[derive(Parser, Debug)]
#[command(name = "basestream", version, about)]
struct Args {
    /// Config file (defaults to the platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Resolve a title against the catalog at startup
    #[arg(short, long)]
    title: Option<String>,

    /// Release year used with --title
    #[arg(short, long)]
    year: Option<i32>,

    /// Metadata id used with --title
    #[arg(long)]
    id: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    debug_log("Application starting");

    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;

    let (tx, mut rx) = mpsc::channel(64);
    let mut app = App::new(config, tx)?;
    debug_log("App initialized");

    // Restore the terminal before the default hook prints
    let orig_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        debug_log(&format!("PANIC: {}", panic_info));
        orig_hook(panic_info);
    }));

    enable_raw_mode().map_err(|e| {
        debug_log(&format!("Failed to enable raw mode: {}", e));
        anyhow::anyhow!("Failed to enable raw mode: {}", e)
    })?;

    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture) {
        let _ = disable_raw_mode();
        debug_log(&format!("Failed to setup terminal: {}", e));
        return Err(anyhow::anyhow!("Failed to setup terminal: {}", e));
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(term) => term,
        Err(e) => {
            let _ = disable_raw_mode();
            debug_log(&format!("Failed to create terminal: {}", e));
            return Err(anyhow::anyhow!("Failed to create terminal: {}", e));
        }
    };
    debug_log("Terminal setup complete");

    app.start();
    if let Some(title) = &args.title {
        app.resolve_request(title, args.year, args.id);
    }

    let result = run(&mut terminal, &mut app, &mut rx).await;
    if let Err(e) = &result {
        debug_log(&format!("ERROR: {:#}", e));
    }

    debug_log("Shutting down application");
    app.close_player();

    let cleanup_result = (|| -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    })();

    if let Err(e) = cleanup_result {
        debug_log(&format!("Error during cleanup: {}", e));
        eprintln!("Error during cleanup: {}", e);
    }

    debug_log("Application terminated");
    result
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    rx: &mut mpsc::Receiver<tasks::UiMessage>,
) -> Result<()> {
    let tick_rate = Duration::from_millis(50);
    let mut last_draw = redraw_now(tick_rate);

    debug_log("Entering main loop");
    while !app.should_quit {
        if last_draw.elapsed() >= tick_rate {
            if let Err(e) = terminal.draw(|f| {
                if let Err(e) = ui::draw_ui(f, app) {
                    debug_log(&format!("ERROR: UI draw function error: {}", e));
                }
            }) {
                debug_log(&format!("ERROR: Terminal draw error: {}", e));
            }
            last_draw = Instant::now();
        }

        // Input is polled off the runtime threads so background tasks keep running
        let event = tokio::task::block_in_place(|| -> io::Result<Option<Event>> {
            if event::poll(Duration::from_millis(10))? {
                event::read().map(Some)
            } else {
                Ok(None)
            }
        })?;

        match event {
            Some(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                if event_utils::is_terminate_event(&Event::Key(key)) {
                    debug_log("ACTION: Quit key pressed, exiting application");
                    app.should_quit = true;
                    break;
                }

                if key.code == event::KeyCode::Char(':') && !app.is_command_mode() && accepts_command_key(app) {
                    app.enter_command_mode();
                } else if app.is_command_mode() && key.code == event::KeyCode::Enter {
                    let cmd = app.get_command_buffer().to_string();
                    debug_log(&format!("Executing command: {}", cmd));
                    app.exit_command_mode();

                    if let Err(e) = commands::handle_command(app, &cmd) {
                        debug_log(&format!("Command error: {}", e));
                        app.set_status(format!("Error: {}", e), Color::Red);
                    }
                } else if let Err(e) = app.handle_key_event(key) {
                    debug_log(&format!("Key handler error: {}", e));
                    app.set_status(format!("Key error: {}", e), Color::Red);
                }
                last_draw = redraw_now(tick_rate);
            }
            Some(Event::Mouse(mouse)) => app.handle_mouse_event(mouse),
            Some(Event::Resize(w, h)) => {
                debug_log(&format!("Resize event: {}x{}", w, h));
                last_draw = redraw_now(tick_rate);
            }
            _ => {}
        }

        while let Ok(message) = rx.try_recv() {
            app.handle_message(message);
            last_draw = redraw_now(tick_rate);
        }

        app.update();
    }

    Ok(())
}

/// ':' is text once the search or catalog input has content
fn accepts_command_key(app: &App) -> bool {
    match app.view {
        app::AppView::Search => app.search.input.is_empty(),
        app::AppView::Catalog => app.catalog.filter.is_empty(),
        _ => true,
    }
}

fn redraw_now(tick_rate: Duration) -> Instant {
    Instant::now().checked_sub(tick_rate).unwrap_or_else(Instant::now)
}

use anyhow::{Result, anyhow};
use basestream_core::metadata::MediaType;
use basestream_core::playback::PlaybackMode;
use ratatui::style::Color;

use crate::app::{App, AppView};

/// Command handler for the application
pub struct CommandHandler;

impl CommandHandler {
    /// Parse and execute a command
    pub fn execute(app: &mut App, command_str: &str) -> Result<()> {
        let parts: Vec<&str> = command_str.trim().splitn(2, ' ').collect();
        let cmd = parts[0].to_lowercase();
        let args = parts.get(1).map(|s| s.trim()).filter(|s| !s.is_empty());

        match cmd.as_str() {
            "seek" | "s" => {
                let args = args.ok_or_else(|| anyhow!("Seek command requires a position argument"))?;
                let position = parse_position(args).ok_or_else(|| anyhow!("Invalid position: {}", args))?;
                app.with_controller(|c| c.seek(position));
            }
            "play" | "p" => match args {
                Some(asset) => app.play_asset(asset),
                None => app.with_controller(|c| {
                    if !c.session().playing {
                        c.toggle_playback();
                    }
                }),
            },
            "pause" => app.with_controller(|c| {
                if c.session().playing {
                    c.toggle_playback();
                }
            }),
            "toggle" | "t" => app.with_controller(|c| c.toggle_playback()),
            "volume" | "vol" | "v" => {
                let args = args.ok_or_else(|| anyhow!("Volume command requires a level argument (0-100)"))?;
                let volume = args
                    .parse::<u8>()
                    .ok()
                    .filter(|v| *v <= 100)
                    .ok_or_else(|| anyhow!("Invalid volume: {}", args))?;
                app.with_controller(|c| c.set_volume(f64::from(volume) / 100.0));
                app.set_status(format!("Volume set to {}", volume), Color::Yellow);
            }
            "mute" | "m" => app.with_controller(|c| c.toggle_mute()),
            "fullscreen" | "fs" => app.with_controller(|c| c.toggle_fullscreen()),
            "mode" => {
                let mode = match args.map(str::to_lowercase).as_deref() {
                    Some("trailer") => PlaybackMode::Trailer,
                    Some("full") | Some("movie") => PlaybackMode::FullAsset,
                    Some(other) => return Err(anyhow!("Unknown mode: {}", other)),
                    None => return Err(anyhow!("Mode command requires 'trailer' or 'full'")),
                };
                app.select_mode(mode);
            }
            "search" | "find" | "/" => app.open_search(args),
            "open" | "o" => {
                let args = args.ok_or_else(|| anyhow!("Usage: open <movie|tv> <id>"))?;
                let (kind, id) = parse_title_ref(args).ok_or_else(|| anyhow!("Invalid title: {}", args))?;
                app.open_title(kind, id);
            }
            "watch" | "w" => {
                let args = args.ok_or_else(|| anyhow!("Usage: watch <movie|tv> <id>"))?;
                let (kind, id) = parse_title_ref(args).ok_or_else(|| anyhow!("Invalid title: {}", args))?;
                app.watch(kind, id);
            }
            "resolve" | "r" => {
                let args = args.ok_or_else(|| anyhow!("Usage: resolve <title> [year]"))?;
                let (title, year) = split_year(args);
                app.resolve_request(title, year, None);
            }
            "catalog" | "c" => app.open_catalog(),
            "menu" | "home" | "main" => {
                app.close_player();
                app.view = AppView::Home;
                app.set_status("Home", Color::Blue);
            }
            "reload" => app.reload_home(),
            "connect" => app.connect_wallet(),
            "disconnect" => app.disconnect_wallet(),
            "help" | "h" | "?" => {
                app.show_help = true;
            }
            "quit" | "exit" | "q" => {
                if app.view == AppView::Player {
                    app.close_player();
                    app.set_status("Playback closed", Color::Blue);
                } else {
                    app.should_quit = true;
                }
            }
            "" => {}
            _ => {
                return Err(anyhow!("Unknown command: {}", cmd));
            }
        }

        Ok(())
    }
}

/// Handle a command string entered by the user
pub fn handle_command(app: &mut App, command: &str) -> Result<()> {
    CommandHandler::execute(app, command)
}

/// Seconds, or `mm:ss` / `h:mm:ss`
fn parse_position(value: &str) -> Option<f64> {
    if !value.contains(':') {
        return value.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0);
    }
    value.split(':').try_fold(0.0, |total, part| {
        let part = part.parse::<u32>().ok()?;
        Some(total * 60.0 + f64::from(part))
    })
}

/// `movie 19`, `tv 1399`, or a bare id for a movie
fn parse_title_ref(value: &str) -> Option<(MediaType, u64)> {
    let mut parts = value.split_whitespace();
    let first = parts.next()?;
    match parts.next() {
        Some(id) => Some((MediaType::parse(first)?, id.parse().ok()?)),
        None => Some((MediaType::Movie, first.parse().ok()?)),
    }
}

/// Split a trailing four digit year off a title
fn split_year(value: &str) -> (&str, Option<i32>) {
    if let Some((title, last)) = value.rsplit_once(' ') {
        if last.len() == 4 {
            if let Ok(year) = last.parse::<i32>() {
                return (title.trim(), Some(year));
            }
        }
    }
    (value, None)
}

pub mod app;
pub mod components;

pub use components::*;

use crate::app::{App, AppView};
use anyhow::Result;
use ratatui::Frame;

/// Draw the main UI
pub fn draw_ui(f: &mut Frame, app: &mut App) -> Result<()> {
    let size = f.area();

    match app.view {
        AppView::Home => app::draw_home_view(f, app, size),
        AppView::Search => app::draw_search_view(f, app, size),
        AppView::Title => app::draw_title_view(f, app, size),
        AppView::Player => app::draw_player_view(f, app, size),
        AppView::Catalog => app::draw_catalog_view(f, app, size),
    }

    if let Some((msg, time, color)) = &app.status_message {
        app::draw_status_message(f, msg, *color, time.elapsed());
    }

    if app.is_command_mode() {
        app::draw_command_prompt(f, app.get_command_buffer());
    }

    if app.show_help {
        app::draw_help_dialog(f);
    }

    Ok(())
}

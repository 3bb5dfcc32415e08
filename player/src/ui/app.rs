use crate::app::{App, AppView, PlayerView};
use crate::ui::components::*;
use basestream_core::metadata::ContentSummary;
use basestream_core::playback::PlaybackState;
use basestream_core::wallet::short_address;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

/// Width of one card in a home row
const CARD_WIDTH: u16 = 24;

fn spinner() -> &'static str {
    get_spinner_frame(chrono::Local::now().timestamp_millis().max(0) as u128)
}

/// Frame shared by the browsing views: title bar, body, key hints
fn browse_layout(f: &mut Frame, app: &App, area: Rect, title: &str, hints: &str) -> Rect {
    f.render_widget(Block::default().style(Style::default().bg(Color::Black)), area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Menu bar
            Constraint::Min(2),    // Body
            Constraint::Length(1), // Key hints
        ])
        .split(area);

    let title_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" BaseStream | {} ", title))
        .title_alignment(Alignment::Left)
        .style(Style::default().bg(Color::Black));
    f.render_widget(title_block, chunks[0]);
    draw_menu_bar(f, app, chunks[0]);

    let status = Paragraph::new(Text::from(hints)).style(Style::default().fg(Color::White).bg(Color::DarkGray));
    f.render_widget(status, chunks[2]);

    chunks[1]
}

/// Draw the view tabs and the wallet badge
pub fn draw_menu_bar(f: &mut Frame, app: &App, area: Rect) {
    let inner_area = Block::default().borders(Borders::ALL).inner(area);

    let tab = |label: &'static str, view: AppView| {
        Span::styled(
            label,
            Style::default().fg(if app.view == view { Color::Yellow } else { Color::White }),
        )
    };
    let menu_tabs = Paragraph::new(Line::from(vec![
        tab("Home", AppView::Home),
        Span::raw(" | "),
        tab("[/] Search", AppView::Search),
        Span::raw(" | "),
        tab("[c] Catalog", AppView::Catalog),
        Span::raw(" | "),
        Span::styled(
            "[F1] Help",
            Style::default().fg(if app.show_help { Color::Yellow } else { Color::White }),
        ),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(menu_tabs, inner_area);

    let badge = wallet_badge(app);
    let width = badge.width() as u16;
    let badge_area = Rect::new(
        inner_area.right().saturating_sub(width),
        inner_area.y,
        width.min(inner_area.width),
        1,
    );
    f.render_widget(badge, badge_area);
}

fn wallet_badge(app: &App) -> Line<'static> {
    if app.wallet_busy {
        return Line::from(Span::styled(
            format!("{} Wallet", spinner()),
            Style::default().fg(Color::Yellow),
        ));
    }
    match app.wallet_state.address.as_deref() {
        Some(address) => {
            let balance = app.wallet_state.balance.as_deref().unwrap_or("0.0000");
            Line::from(Span::styled(
                format!("● {} {} ETH", short_address(address), balance),
                Style::default().fg(Color::Green),
            ))
        }
        None if app.wallet_error.is_some() => Line::from(Span::styled(
            "✕ Wallet error [w] Retry",
            Style::default().fg(Color::Red),
        )),
        None => Line::from(Span::styled("○ [w] Connect Wallet", Style::default().fg(Color::DarkGray))),
    }
}

/// Draw the home rows
pub fn draw_home_view(f: &mut Frame, app: &App, area: Rect) {
    let body = browse_layout(
        f,
        app,
        area,
        "Home",
        "Arrows: Navigate | Enter: Open | /: Search | c: Catalog | w: Wallet | r: Reload | :: Command | q: Quit",
    );

    if app.home.loading && app.home.rows.is_empty() {
        let loading = Paragraph::new(format!("{} Loading titles...", spinner()))
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
        f.render_widget(loading, body);
        return;
    }
    if app.home.rows.is_empty() {
        let empty = Paragraph::new("Nothing to show. Press c to browse the catalog.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray));
        f.render_widget(empty, body);
        return;
    }

    // Rows scroll so the selected one stays on screen
    let row_height = 5;
    let visible = (body.height / row_height).max(1) as usize;
    let first = app.home.row.saturating_sub(visible - 1);
    let constraints: Vec<Constraint> = (0..visible).map(|_| Constraint::Length(row_height)).collect();
    let slots = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(body);

    for (slot, (index, row)) in slots.iter().zip(app.home.rows.iter().enumerate().skip(first)) {
        let active = index == app.home.row;
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", row.title))
            .border_style(Style::default().fg(if active { Color::Cyan } else { Color::DarkGray }));
        let inner = block.inner(*slot);
        f.render_widget(block, *slot);

        let per_row = (inner.width / CARD_WIDTH).max(1) as usize;
        let start = if active { app.home.col.saturating_sub(per_row - 1) } else { 0 };
        for (n, (col, item)) in row.items.iter().enumerate().skip(start).take(per_row).enumerate() {
            let card = Rect::new(inner.x + n as u16 * CARD_WIDTH, inner.y, CARD_WIDTH.min(inner.width), inner.height);
            draw_card(f, item, active && col == app.home.col, card);
        }
    }
}

fn draw_card(f: &mut Frame, item: &ContentSummary, selected: bool, area: Rect) {
    let style = if selected {
        Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let year = item.release_year().map(|y| y.to_string()).unwrap_or_default();
    let lines = vec![
        Line::from(Span::styled(item.display_title().to_string(), style)),
        Line::from(Span::styled(
            format!("★ {}  {}", item.rating(), year),
            Style::default().fg(Color::Yellow),
        )),
    ];
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
}

/// Draw the search view
pub fn draw_search_view(f: &mut Frame, app: &App, area: Rect) {
    let body = browse_layout(f, app, area, "Search", "Type: Query | Enter: Search/Open | ↑/↓: Select | Esc: Back");
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(body);

    let title = if app.search.searching {
        format!(" {} Searching... ", spinner())
    } else {
        " Search movies and TV shows ".to_string()
    };
    let input = Paragraph::new(Text::from(app.search.input.clone())).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(title)
            .style(Style::default().bg(Color::Black)),
    );
    f.render_widget(input, chunks[0]);

    let before_cursor: String = app.search.input.chars().take(app.search.cursor).collect();
    if !app.is_command_mode() {
        f.set_cursor_position((chunks[0].x + before_cursor.width() as u16 + 1, chunks[0].y + 1));
    }

    let items: Vec<ListItem> = app
        .search
        .results
        .iter()
        .map(|hit| {
            let year = hit.item.release_year().map(|y| format!(" ({})", y)).unwrap_or_default();
            let mut spans = vec![
                Span::styled(
                    format!("{}{}", hit.item.display_title(), year),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("  {} ★ {}", hit.item.kind().as_path(), hit.item.rating()),
                    Style::default().fg(Color::Gray),
                ),
            ];
            if hit.streaming_available {
                spans.push(Span::styled("  ▶ Streaming", Style::default().fg(Color::Green)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let title = if app.search.query.is_empty() {
        " Results ".to_string()
    } else {
        format!(" Results for '{}' ({}) ", app.search.query, app.search.results.len())
    };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::Blue).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(app.search.selected);
    f.render_stateful_widget(list, chunks[1], &mut state);
}

/// Draw the title page
pub fn draw_title_view(f: &mut Frame, app: &App, area: Rect) {
    let body = browse_layout(f, app, area, "Title", "Enter/p: Watch | w: Wallet | Esc: Back");

    let Some(page) = &app.title else {
        let text = if app.title_loading {
            format!("{} Loading title...", spinner())
        } else {
            "Title unavailable".to_string()
        };
        f.render_widget(Paragraph::new(text).alignment(Alignment::Center), body);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(body);

    let details = &page.details;
    let mut facts = Vec::new();
    if let Some(year) = details.summary.release_year() {
        facts.push(year.to_string());
    }
    if let Some(runtime) = details.runtime_label() {
        facts.push(runtime);
    }
    if let Some(seasons) = details.number_of_seasons {
        facts.push(format!("{} seasons", seasons));
    }
    facts.push(format!("★ {}", details.summary.rating()));

    let mut lines = vec![
        Line::from(Span::styled(
            details.display_title().to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(facts.join("  ·  "), Style::default().fg(Color::Gray))),
    ];
    let genres = details.genre_names();
    if !genres.is_empty() {
        lines.push(Line::from(Span::styled(genres.join(", "), Style::default().fg(Color::Magenta))));
    }
    if let Some(tagline) = details.tagline.as_deref().filter(|t| !t.is_empty()) {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            tagline.to_string(),
            Style::default().add_modifier(Modifier::ITALIC),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(details.summary.overview.clone().unwrap_or_default()));
    lines.push(Line::from(""));

    let availability = if page.streaming_available {
        Span::styled("▶ Full movie available", Style::default().fg(Color::Green))
    } else {
        Span::styled("Not in the streaming catalog", Style::default().fg(Color::DarkGray))
    };
    lines.push(Line::from(availability));
    let trailer = if details.trailer_key().is_some() { "Trailer available" } else { "No trailer" };
    lines.push(Line::from(Span::styled(trailer, Style::default().fg(Color::Gray))));
    if !app.wallet_state.is_connected() {
        lines.push(Line::from(Span::styled(
            "Connect a wallet (w) to watch",
            Style::default().fg(Color::Yellow),
        )));
    }

    let info = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    f.render_widget(info, chunks[0]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    let cast: Vec<ListItem> = page
        .credits
        .cast
        .iter()
        .take(10)
        .map(|member| {
            let role = member.character.as_deref().unwrap_or("");
            ListItem::new(Line::from(vec![
                Span::raw(member.name.clone()),
                Span::styled(format!("  {}", role), Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();
    f.render_widget(List::new(cast).block(Block::default().borders(Borders::ALL).title(" Cast ")), side[0]);

    let similar: Vec<ListItem> = page
        .similar
        .iter()
        .take(10)
        .map(|item| ListItem::new(item.display_title().to_string()))
        .collect();
    f.render_widget(
        List::new(similar).block(Block::default().borders(Borders::ALL).title(" More Like This ")),
        side[1],
    );
}

/// Draw the catalog browser
pub fn draw_catalog_view(f: &mut Frame, app: &App, area: Rect) {
    let body = browse_layout(f, app, area, "Catalog", "Type: Filter | ↑/↓: Select | Enter: Play | Esc: Clear/Back");
    let has_resolution = app.catalog.resolution.is_some();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(if has_resolution { 4 } else { 0 }),
        ])
        .split(body);

    let filter = Paragraph::new(app.catalog.filter.clone()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Filter "),
    );
    f.render_widget(filter, chunks[0]);

    let catalog = app.resolver.catalog();
    let items: Vec<ListItem> = app
        .catalog
        .matches
        .iter()
        .filter_map(|&i| catalog.get(i))
        .map(|entry| {
            ListItem::new(Line::from(vec![
                Span::styled(entry.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(
                    format!("  {} · {}", entry.source, entry.license),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Public domain films ({}) ", app.catalog.matches.len())),
        )
        .highlight_style(Style::default().bg(Color::Blue).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(app.catalog.selected);
    f.render_stateful_widget(list, chunks[1], &mut state);

    if let Some(result) = &app.catalog.resolution {
        let line = match &result.entry {
            Some(entry) => Line::from(Span::styled(
                format!("Matched: {} ({})", entry.title, entry.external_id),
                Style::default().fg(Color::Green),
            )),
            None if result.suggestions.is_empty() => {
                Line::from(Span::styled("No match and no suggestions", Style::default().fg(Color::Yellow)))
            }
            None => {
                let names: Vec<&str> = result.suggestions.iter().map(|e| e.title.as_str()).collect();
                Line::from(Span::styled(
                    format!("No match. Did you mean: {}", names.join(", ")),
                    Style::default().fg(Color::Yellow),
                ))
            }
        };
        f.render_widget(
            Paragraph::new(line)
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).title(" Resolution ")),
            chunks[2],
        );
    }
}

/// Draw the player view
pub fn draw_player_view(f: &mut Frame, app: &App, area: Rect) {
    f.render_widget(Block::default().style(Style::default().bg(Color::Black)), area);
    let Some(player) = &app.player else {
        return;
    };

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title and mode tabs
            Constraint::Min(1),    // Video plays in the mpv window
            Constraint::Length(7), // Controls
        ])
        .split(area);

    let header = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(format!(" {} ", player.title))
        .title_alignment(Alignment::Left);
    let header_inner = header.inner(vertical[0]);
    f.render_widget(header, vertical[0]);
    f.render_widget(
        ModeTabs::new(player.controller.mode(), player.controller.trailer_available()),
        header_inner,
    );

    draw_stage(f, player, vertical[1]);

    if player.controller.controls_visible() {
        draw_player_controls(f, player, vertical[2]);
    } else {
        let hint = Paragraph::new("Press any key to show controls")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        let bottom = Rect::new(vertical[2].x, vertical[2].bottom().saturating_sub(1), vertical[2].width, 1);
        f.render_widget(hint, bottom);
    }
}

/// Middle of the player: what mpv is showing, or why it is not
fn draw_stage(f: &mut Frame, player: &PlayerView, area: Rect) {
    let controller = &player.controller;

    if controller.state() == PlaybackState::Errored {
        let message = controller.error_message().unwrap_or("Playback failed");
        let alert = ErrorAlert::new(message);
        let alert_area = alert.area(area);
        f.render_widget(alert, alert_area);
        return;
    }

    let mut lines = Vec::new();
    match controller.state() {
        PlaybackState::Loading if controller.pending_autoplay().is_some() => {
            lines.push(Line::from(Span::styled(
                format!("{} Starting {}...", spinner(), controller.mode().label()),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
        }
        PlaybackState::Loading => lines.push(Line::from(Span::styled(
            format!("{} Buffering...", spinner()),
            Style::default().fg(Color::Yellow),
        ))),
        PlaybackState::Paused => lines.push(Line::from("⏸ Paused")),
        PlaybackState::Playing => lines.push(Line::from(Span::styled(
            "Playing in the mpv window",
            Style::default().fg(Color::Gray),
        ))),
        PlaybackState::Idle | PlaybackState::Errored => {}
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("Source: {} ({})", player.source.title, player.source.source),
        Style::default().fg(Color::DarkGray),
    )));
    if !player.source_matched {
        lines.push(Line::from(Span::styled(
            "This title is not in the catalog; a catalog film plays instead",
            Style::default().fg(Color::Yellow),
        )));
    }

    let top = area.y + area.height.saturating_sub(lines.len() as u16) / 2;
    let stage = Rect::new(area.x, top, area.width, (lines.len() as u16).min(area.height));
    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), stage);
}

/// Draw the progress bar, buttons and volume
pub fn draw_player_controls(f: &mut Frame, player: &PlayerView, area: Rect) {
    let controller = &player.controller;
    let session = controller.session();

    let controls = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Progress bar and volume
            Constraint::Length(3), // Playback controls
            Constraint::Length(1),
        ])
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(14)])
        .split(controls[0]);

    let progress_bar = ProgressBar::new(session)
        .buffering(controller.state() == PlaybackState::Loading)
        .title(Some(controller.mode().label()));
    f.render_widget(progress_bar, top[0]);
    f.render_widget(VolumeIndicator::new(session.volume, session.muted), top[1]);

    let buttons = PlaybackControls::new(session.playing)
        .muted(session.muted)
        .fullscreen(controller.is_fullscreen())
        .focused(controller.controls().focused());
    f.render_widget(buttons, controls[1]);
}

/// Draw the status message
pub fn draw_status_message(f: &mut Frame, message: &str, color: Color, age: Duration) {
    let status_message = StatusMessage::new(message, color, age).max_age(Duration::from_secs(5));

    let area = f.area();
    let message_width = (message.width() as u16 + 4).min(area.width);
    let message_area = Rect {
        x: area.x + (area.width.saturating_sub(message_width)) / 2,
        y: area.y + area.height.saturating_sub(10),
        width: message_width,
        height: 3.min(area.height),
    };

    f.render_widget(status_message, message_area);
}

/// Draw command prompt
pub fn draw_command_prompt(f: &mut Frame, command: &str) {
    let screen = f.area();
    let area = Rect::new(0, screen.height.saturating_sub(3), screen.width, 3.min(screen.height));

    let prompt_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));
    let inner_area = prompt_block.inner(area);
    f.render_widget(Clear, area);
    f.render_widget(prompt_block, area);

    let command_para = Paragraph::new(Text::from(format!(":{}", command)))
        .style(Style::default().fg(Color::Yellow).bg(Color::Black).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Left);
    f.render_widget(command_para, inner_area);

    f.set_cursor_position((inner_area.x + 1 + command.width() as u16, inner_area.y));
}

/// Draw help dialog
pub fn draw_help_dialog(f: &mut Frame) {
    let area = centered_rect(60, 80, f.area());
    f.render_widget(Clear, area);
    f.render_widget(HelpOverlay, area);
}

/// Helper function to create a centered rect
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect() {
        let outer = Rect::new(0, 0, 100, 50);
        let inner = centered_rect(60, 80, outer);
        assert_eq!(inner.width, 60);
        assert_eq!(inner.height, 40);
        assert_eq!(inner.x, 20);
        assert_eq!(inner.y, 5);
    }
}

use basestream_core::playback::{PlaybackMode, PlaybackSession, format_time};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Widget, Wrap},
};
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

/// Progress bar with a position label
pub struct ProgressBar<'a> {
    position: f64,
    duration: f64,
    ratio: f64,
    is_paused: bool,
    buffering: bool,
    title: Option<&'a str>,
}

impl<'a> ProgressBar<'a> {
    pub fn new(session: &PlaybackSession) -> Self {
        Self {
            position: session.current_time,
            duration: session.duration,
            ratio: session.progress(),
            is_paused: !session.playing,
            buffering: false,
            title: None,
        }
    }

    pub fn buffering(mut self, buffering: bool) -> Self {
        self.buffering = buffering;
        self
    }

    pub fn title(mut self, title: Option<&'a str>) -> Self {
        self.title = title;
        self
    }
}

impl Widget for ProgressBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Unknown durations render as 00:00
        let label = format!("{} / {}", format_time(self.position), format_time(self.duration));

        let icon = if self.buffering {
            "⧗"
        } else if self.is_paused {
            "⏸"
        } else {
            "▶"
        };
        let display_title = match self.title {
            Some(title) => format!("{}  {} ", icon, title),
            None if self.is_paused => format!("{}  Paused ", icon),
            None => format!("{}  Playing ", icon),
        };

        Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(display_title))
            .gauge_style(
                Style::default()
                    .fg(Color::Blue)
                    .bg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            )
            .ratio(self.ratio)
            .label(label)
            .render(area, buf);
    }
}

/// Transport button row
pub struct PlaybackControls {
    is_playing: bool,
    muted: bool,
    fullscreen: bool,
    focused: bool,
}

impl PlaybackControls {
    pub fn new(is_playing: bool) -> Self {
        Self {
            is_playing,
            muted: false,
            fullscreen: false,
            focused: false,
        }
    }

    pub fn muted(mut self, muted: bool) -> Self {
        self.muted = muted;
        self
    }

    pub fn fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    /// Highlight the row while the controls hold focus
    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

impl Widget for PlaybackControls {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let buttons = [
            ("◀◀", "Back 10s", "←"),
            (
                if self.is_playing { "⏸" } else { "▶" },
                if self.is_playing { "Pause" } else { "Play" },
                "Space",
            ),
            ("▶▶", "Forward 10s", "→"),
            (
                if self.muted { "🔇" } else { "🔊" },
                if self.muted { "Unmute" } else { "Mute" },
                "m",
            ),
            (
                "⛶",
                if self.fullscreen { "Exit Fullscreen" } else { "Fullscreen" },
                "f",
            ),
        ];

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Percentage(20); buttons.len()])
            .split(area);

        let border = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };

        for ((symbol, tooltip, key), chunk) in buttons.into_iter().zip(chunks.iter()) {
            let style = Style::default().fg(Color::White);
            Paragraph::new(Line::from(vec![
                Span::styled(symbol, style.add_modifier(Modifier::BOLD)),
                Span::styled(format!(" {} ({})", tooltip, key), style),
            ]))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).border_style(border))
            .render(*chunk, buf);
        }
    }
}

/// Trailer / Full Movie selector
pub struct ModeTabs {
    active: PlaybackMode,
    trailer_available: bool,
}

impl ModeTabs {
    pub fn new(active: PlaybackMode, trailer_available: bool) -> Self {
        Self {
            active,
            trailer_available,
        }
    }
}

impl Widget for ModeTabs {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let tab = |mode: PlaybackMode, key: &str, enabled: bool| {
            let style = if mode == self.active {
                Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else if enabled {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Span::styled(format!(" [{}] {} ", key, mode.label()), style)
        };

        let line = Line::from(vec![
            tab(PlaybackMode::Trailer, "1", self.trailer_available),
            Span::raw("  "),
            tab(PlaybackMode::FullAsset, "2", true),
        ]);
        Paragraph::new(line).alignment(Alignment::Center).render(area, buf);
    }
}

/// Display a status message with fade effect
pub struct StatusMessage<'a> {
    message: &'a str,
    color: Color,
    age: Duration,
    max_age: Duration,
}

impl<'a> StatusMessage<'a> {
    pub fn new(message: &'a str, color: Color, age: Duration) -> Self {
        Self {
            message,
            color,
            age,
            max_age: Duration::from_secs(3),
        }
    }

    pub fn max_age(mut self, duration: Duration) -> Self {
        self.max_age = duration;
        self
    }
}

impl Widget for StatusMessage<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let fade_factor = if self.age > self.max_age {
            0.0
        } else {
            1.0 - (self.age.as_secs_f32() / self.max_age.as_secs_f32())
        };
        if fade_factor <= 0.0 {
            return;
        }

        // Errors stay red until they expire
        let color = match (self.color, fade_factor) {
            (Color::Red, _) => Color::Red,
            (_, f) if f > 0.7 => self.color,
            _ => Color::DarkGray,
        };

        let text = Paragraph::new(Text::from(self.message))
            .style(Style::default().fg(color))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color))
                    .style(Style::default().bg(Color::Black)),
            );

        Clear.render(area, buf);
        text.render(area, buf);
    }
}

/// Error alert shown over the player
pub struct ErrorAlert<'a> {
    message: &'a str,
}

impl<'a> ErrorAlert<'a> {
    pub fn new(message: &'a str) -> Self {
        Self { message }
    }

    /// Area the alert needs, centered in `area`
    pub fn area(&self, area: Rect) -> Rect {
        let width = (self.message.width() as u16 + 6).min(area.width);
        Rect {
            x: area.x + area.width.saturating_sub(width) / 2,
            y: area.y + area.height.saturating_sub(5) / 2,
            width,
            height: 5.min(area.height),
        }
    }
}

impl Widget for ErrorAlert<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        Paragraph::new(vec![
            Line::from(Span::styled(self.message, Style::default().fg(Color::White))),
            Line::from(""),
            Line::from(Span::styled(
                "Press 1 or 2 to retry",
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Playback error ")
                .border_style(Style::default().fg(Color::Red))
                .style(Style::default().bg(Color::Black)),
        )
        .render(area, buf);
    }
}

/// Volume indicator
pub struct VolumeIndicator {
    volume: u8,
    muted: bool,
}

impl VolumeIndicator {
    /// `volume` is a 0.0-1.0 level
    pub fn new(volume: f64, muted: bool) -> Self {
        Self {
            volume: (volume.clamp(0.0, 1.0) * 100.0).round() as u8,
            muted,
        }
    }
}

impl Widget for VolumeIndicator {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (icon, color) = if self.muted {
            ("🔇", Color::DarkGray)
        } else if self.volume == 0 {
            ("🔇", Color::White)
        } else if self.volume < 30 {
            ("🔈", Color::White)
        } else if self.volume < 70 {
            ("🔉", Color::White)
        } else {
            ("🔊", Color::White)
        };

        let vol_text = if self.muted {
            format!("{} Muted", icon)
        } else {
            format!("{} {}%", icon, self.volume)
        };

        Paragraph::new(Text::from(vol_text))
            .style(Style::default().fg(color))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Volume"))
            .render(area, buf);
    }
}

/// Key reference overlay
pub struct HelpOverlay;

fn help_line<'a>(key: &'a str, action: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::styled(key, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(" - {}", action)),
    ])
}

fn help_heading(text: &str) -> Line<'_> {
    Line::from(Span::styled(
        text,
        Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    ))
}

impl Widget for HelpOverlay {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines = vec![
            help_heading("Browsing"),
            Line::from(""),
            help_line("Arrows", "Move selection"),
            help_line("Enter", "Open title / watch"),
            help_line("/", "Search"),
            help_line("c", "Catalog"),
            help_line("w", "Connect or disconnect wallet"),
            help_line("Esc", "Back"),
            Line::from(""),
            help_heading("Player"),
            Line::from(""),
            help_line("Space", "Play/Pause"),
            help_line("←/→", "Skip 10 seconds"),
            help_line("m", "Mute"),
            help_line("f", "Fullscreen"),
            help_line("1/2", "Trailer / Full Movie"),
            help_line("+/-", "Volume"),
            help_line("Tab", "Keep controls visible"),
            Line::from(""),
            help_heading("Commands"),
            Line::from(""),
            help_line(":seek 1:30", "Jump to a position"),
            help_line(":vol 50", "Set volume"),
            help_line(":mode trailer|full", "Switch playback mode"),
            help_line(":open movie 19", "Open a title"),
            help_line(":play <url|file|youtube id>", "Play any video"),
            help_line(":resolve Nosferatu 1922", "Look up the catalog"),
            help_line(":connect / :disconnect", "Wallet"),
            help_line(":quit", "Close player or exit"),
        ];

        Clear.render(area, buf);
        Paragraph::new(Text::from(lines))
            .block(Block::default().title("Help (F1)").borders(Borders::ALL))
            .style(Style::default().fg(Color::White).bg(Color::Black))
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true })
            .render(area, buf);
    }
}

/// Get a spinner frame for loading animations
pub fn get_spinner_frame(duration_ms: u128) -> &'static str {
    const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠚", "⠞", "⠖", "⠦", "⠴", "⠲", "⠳", "⠓"];
    let frame_idx = (duration_ms / 80) % SPINNER_FRAMES.len() as u128;
    SPINNER_FRAMES[frame_idx as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_indicator_scale() {
        assert_eq!(VolumeIndicator::new(0.5, false).volume, 50);
        assert_eq!(VolumeIndicator::new(1.7, false).volume, 100);
        assert_eq!(VolumeIndicator::new(-1.0, true).volume, 0);
    }

    #[test]
    fn test_progress_bar_label() {
        let area = Rect::new(0, 0, 40, 3);
        let mut buf = Buffer::empty(area);
        let mut session = PlaybackSession::new(PlaybackMode::FullAsset);
        session.current_time = 65.0;
        ProgressBar::new(&session).render(area, &mut buf);
        let rendered: String = (0..area.width).map(|x| buf[(x, 1)].symbol().to_string()).collect();
        assert!(rendered.contains("01:05 / 00:00"));
    }

    #[test]
    fn test_progress_bar_follows_session() {
        let mut session = PlaybackSession::new(PlaybackMode::FullAsset);
        session.current_time = 30.0;
        session.duration = 120.0;
        session.playing = true;

        let bar = ProgressBar::new(&session);
        assert_eq!(bar.ratio, 0.25);
        assert!(!bar.is_paused);

        session.duration = 0.0;
        assert_eq!(ProgressBar::new(&session).ratio, 0.0);
    }

    #[test]
    fn test_error_alert_fits_area() {
        let area = Rect::new(0, 0, 20, 3);
        let alert = ErrorAlert::new("This video could not be loaded");
        let placed = alert.area(area);
        assert!(placed.width <= area.width);
        assert!(placed.height <= area.height);
    }
}

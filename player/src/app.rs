use std::sync::Arc;
use std::sync::mpsc::{self as std_mpsc, Receiver};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use basestream_core::catalog::{Catalog, CatalogEntry};
use basestream_core::error::CoreError;
use basestream_core::metadata::{ContentSummary, MediaType, MetadataSource, SearchResult};
use basestream_core::playback::{
    AssetKind, EmbeddedPlayer, PlaybackMode, PlaybackModeController, SystemClock,
    detect_asset_kind, watch_url,
};
use basestream_core::wallet::{ConnectionFlag, short_address};
use basestream_core::{
    Config, JsonRpcWallet, ResolutionResult, SourceResolver, TmdbClient, WalletProvider,
    WalletSession, WalletState, WatchPlan,
};
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use ratatui::style::Color;
use tokio::sync::{Mutex, mpsc};

use crate::events::event_utils;
use crate::mpv::{MpvElement, MpvEmbedSink, MpvEvent, MpvFullscreen, MpvIpc, SharedMpv, TaggedEvent};
use crate::tasks::{self, HomeRow, SharedWallet, TitlePage, UiMessage, WalletAction};

/// Volume change per key press
const VOLUME_STEP: f64 = 0.1;

/// How often a connected wallet is asked for its current account
const WALLET_SYNC_INTERVAL: Duration = Duration::from_secs(15);

// App state
pub struct App {
    /// Current application view
    pub view: AppView,
    /// View to return to when the current one closes
    pub previous_view: AppView,
    pub config: Config,
    /// Catalog resolution, shared with background tasks
    pub resolver: Arc<SourceResolver>,
    /// None when no TMDB key is configured
    pub metadata: Option<Arc<dyn MetadataSource>>,
    pub wallet: SharedWallet,
    /// Last wallet snapshot reported by the wallet task
    pub wallet_state: WalletState,
    pub wallet_error: Option<String>,
    pub wallet_busy: bool,
    /// Last time the wallet session reported back
    wallet_synced: Option<Instant>,
    pub home: HomeState,
    pub search: SearchState,
    /// Title page being shown
    pub title: Option<TitlePage>,
    pub title_loading: bool,
    pub catalog: CatalogBrowser,
    /// Active playback view
    pub player: Option<PlayerView>,
    /// Status message to display
    pub status_message: Option<(String, Instant, Color)>,
    /// Whether the app should exit
    pub should_quit: bool,
    /// Help dialog visibility
    pub show_help: bool,
    /// Whether command mode is active
    pub command_mode: bool,
    /// Command buffer for command mode
    pub command_buffer: String,
    tx: mpsc::Sender<UiMessage>,
}

/// Application views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppView {
    /// Trending and popular rows
    Home,
    Search,
    /// Details of one title
    Title,
    Player,
    /// The playable catalog with title resolution
    Catalog,
}

/// Home rows and the highlighted item
#[derive(Debug, Default)]
pub struct HomeState {
    pub rows: Vec<HomeRow>,
    pub row: usize,
    pub col: usize,
    pub loading: bool,
}

impl HomeState {
    pub fn selected(&self) -> Option<&ContentSummary> {
        self.rows.get(self.row).and_then(|r| r.items.get(self.col))
    }
}

/// Search view state
#[derive(Debug, Default)]
pub struct SearchState {
    /// Input field
    pub input: String,
    /// Cursor position in the input field
    pub cursor: usize,
    /// Query the results belong to
    pub query: String,
    pub results: Vec<SearchResult>,
    pub selected: Option<usize>,
    pub searching: bool,
}

/// Catalog view state
#[derive(Debug, Default)]
pub struct CatalogBrowser {
    /// Fuzzy filter typed by the user
    pub filter: String,
    /// Catalog indices matching the filter, best first
    pub matches: Vec<usize>,
    pub selected: Option<usize>,
    /// Outcome of the last explicit resolution request
    pub resolution: Option<ResolutionResult>,
}

/// A playback view: the controller and the mpv process behind it
pub struct PlayerView {
    pub controller: PlaybackModeController,
    pub title: String,
    pub source: CatalogEntry,
    /// `false` when `source` stands in for a title outside the catalog
    pub source_matched: bool,
    mpv: SharedMpv,
    events: Receiver<TaggedEvent>,
}

impl PlayerView {
    fn open(
        config: &Config,
        title: String,
        source: CatalogEntry,
        source_matched: bool,
        trailer_key: Option<String>,
        mode: PlaybackMode,
    ) -> Result<Self> {
        let (events_tx, events) = std_mpsc::channel();
        let mpv = MpvIpc::new(config.mpv_path.clone(), events_tx).shared();

        let native = MpvElement::new(mpv.clone(), source.asset_url.clone());
        let mut controller = PlaybackModeController::new(
            Box::new(native),
            Box::new(MpvFullscreen::new(mpv.clone())),
            Box::new(SystemClock),
        )
        .with_timings(config.timings());

        if let Some(key) = &trailer_key {
            let sink = MpvEmbedSink::new(mpv.clone(), watch_url(key));
            controller = controller.with_trailer(Box::new(EmbeddedPlayer::new(key.clone(), sink)));
        }

        controller
            .select_mode(mode)
            .with_context(|| format!("Cannot open {} for '{}'", mode.label(), title))?;

        Ok(Self {
            controller,
            title,
            source,
            source_matched,
            mpv,
            events,
        })
    }

    /// Feed pending mpv events to the controller, then run its timers
    fn pump(&mut self) -> Option<String> {
        let mut notice = None;
        while let Ok((generation, event)) = self.events.try_recv() {
            match event {
                MpvEvent::Media(media) => {
                    // Events of a replaced file are dropped
                    let mode = self.mpv.borrow().mode_of(generation);
                    if let Some(mode) = mode {
                        self.controller.on_media_event(mode, media);
                    }
                }
                MpvEvent::Fullscreen(fullscreen) => self.controller.on_fullscreen_change(fullscreen),
                MpvEvent::Exited => {
                    if !self.controller.is_closed() {
                        notice = Some("mpv exited".to_string());
                    }
                }
            }
        }
        self.controller.tick();
        notice
    }
}

impl App {
    /// Build the app from configuration; this is the composition root
    pub fn new(config: Config, tx: mpsc::Sender<UiMessage>) -> Result<Self> {
        let catalog: Catalog = config.catalog().context("Failed to load catalog")?;
        let resolver = Arc::new(SourceResolver::new(catalog));

        let metadata: Option<Arc<dyn MetadataSource>> = config.tmdb_api_key.as_ref().map(|key| {
            Arc::new(TmdbClient::new(key.clone()).with_base_url(config.tmdb_base_url.clone()))
                as Arc<dyn MetadataSource>
        });

        let provider: Option<Arc<dyn WalletProvider>> = config
            .wallet_rpc
            .as_ref()
            .map(|rpc| Arc::new(JsonRpcWallet::new(rpc.clone())) as Arc<dyn WalletProvider>);
        let flag = match config.data_dir() {
            Some(dir) => ConnectionFlag::in_dir(&dir),
            None => ConnectionFlag::disabled(),
        };
        let wallet = Arc::new(Mutex::new(WalletSession::new(provider, flag)));

        let mut app = Self {
            view: AppView::Home,
            previous_view: AppView::Home,
            config,
            resolver,
            metadata,
            wallet,
            wallet_state: WalletState::default(),
            wallet_error: None,
            wallet_busy: false,
            wallet_synced: None,
            home: HomeState::default(),
            search: SearchState::default(),
            title: None,
            title_loading: false,
            catalog: CatalogBrowser::default(),
            player: None,
            status_message: None,
            should_quit: false,
            show_help: false,
            command_mode: false,
            command_buffer: String::new(),
            tx,
        };
        app.refresh_catalog_filter();
        Ok(app)
    }

    /// Kick off the startup fetches
    pub fn start(&mut self) {
        self.reload_home();
        self.wallet_busy = true;
        tasks::wallet(self.wallet.clone(), WalletAction::Restore, self.tx.clone());
    }

    /// Set a status message with a color
    pub fn set_status(&mut self, message: impl Into<String>, color: Color) {
        let message_string = message.into();
        log::debug!("Status message: {} ({})", message_string, color);
        self.status_message = Some((message_string, Instant::now(), color));
    }

    pub fn reload_home(&mut self) {
        match &self.metadata {
            Some(metadata) => {
                self.home.loading = true;
                tasks::load_home(metadata.clone(), self.tx.clone());
            }
            None => self.set_status("TMDB API key not configured (set TMDB_API_KEY)", Color::Yellow),
        }
    }

    // --- Background results ---

    pub fn handle_message(&mut self, message: UiMessage) {
        match message {
            UiMessage::HomeLoaded(rows) => {
                self.home.rows = rows;
                self.home.row = 0;
                self.home.col = 0;
                self.home.loading = false;
            }
            UiMessage::SearchLoaded { query, results } => {
                // Drop answers to superseded queries
                if query != self.search.query {
                    return;
                }
                self.search.selected = if results.is_empty() { None } else { Some(0) };
                let count = results.len();
                self.search.results = results;
                self.search.searching = false;
                self.set_status(format!("Found {} results for '{}'", count, query), Color::Green);
            }
            UiMessage::TitleLoaded(page) => {
                self.title = Some(*page);
                self.title_loading = false;
            }
            UiMessage::WatchReady(plan) => self.start_watch(*plan),
            UiMessage::WalletUpdated { state, error } => {
                let was_connected = self.wallet_state.is_connected();
                let previous = self.wallet_state.address.take();
                self.wallet_state = state;
                self.wallet_busy = false;
                self.wallet_synced = Some(Instant::now());
                let address = self.wallet_state.address.clone();
                match (&error, address) {
                    (Some(e), _) => self.set_status(e.clone(), Color::Red),
                    (None, Some(address)) if !was_connected => {
                        let message = format!("Wallet connected: {}", short_address(&address));
                        self.set_status(message, Color::Green);
                    }
                    (None, Some(address)) if previous.as_deref() != Some(address.as_str()) => {
                        let message = format!("Wallet account changed: {}", short_address(&address));
                        self.set_status(message, Color::Blue);
                    }
                    (None, None) if was_connected => self.set_status("Wallet disconnected", Color::Blue),
                    _ => {}
                }
                self.wallet_error = error;
            }
            UiMessage::Failed(message) => {
                self.home.loading = false;
                self.search.searching = false;
                self.title_loading = false;
                self.set_status(message, Color::Red);
            }
        }
    }

    // --- Navigation ---

    fn switch_view(&mut self, view: AppView) {
        if self.view != view {
            self.previous_view = self.view;
            self.view = view;
        }
    }

    pub fn open_search(&mut self, query: Option<&str>) {
        self.switch_view(AppView::Search);
        if let Some(query) = query {
            self.search.input = query.to_string();
            self.search.cursor = self.search.input.chars().count();
            self.run_search();
        }
    }

    fn run_search(&mut self) {
        let query = self.search.input.trim().to_string();
        if query.is_empty() {
            return;
        }
        let Some(metadata) = self.metadata.clone() else {
            self.set_status("Search needs a TMDB API key", Color::Yellow);
            return;
        };
        self.search.query = query.clone();
        self.search.searching = true;
        self.set_status(format!("Searching for '{}'...", query), Color::Yellow);
        tasks::search(metadata, self.resolver.clone(), query, self.tx.clone());
    }

    pub fn open_title(&mut self, kind: MediaType, id: u64) {
        let Some(metadata) = self.metadata.clone() else {
            self.set_status("Title pages need a TMDB API key", Color::Yellow);
            return;
        };
        self.title = None;
        self.title_loading = true;
        self.switch_view(AppView::Title);
        tasks::load_title(metadata, self.resolver.clone(), kind, id, self.tx.clone());
    }

    pub fn open_catalog(&mut self) {
        self.switch_view(AppView::Catalog);
    }

    // --- Playback ---

    /// Ask for a watch plan; playback needs a connected wallet
    pub fn watch(&mut self, kind: MediaType, id: u64) {
        if !self.wallet_state.is_connected() {
            self.set_status(CoreError::WalletRequired.to_string(), Color::Yellow);
            return;
        }
        let Some(metadata) = self.metadata.clone() else {
            self.set_status("Watching needs a TMDB API key", Color::Yellow);
            return;
        };
        self.set_status("Preparing playback...", Color::Yellow);
        tasks::plan_watch(
            metadata,
            self.resolver.clone(),
            self.wallet_state.clone(),
            kind,
            id,
            self.tx.clone(),
        );
    }

    fn start_watch(&mut self, plan: WatchPlan) {
        let mode = plan.initial_mode();
        let title = plan.details.display_title().to_string();
        if !plan.source_matched {
            self.set_status(
                format!("'{}' is not in the catalog; playing '{}'", title, plan.source.title),
                Color::Yellow,
            );
        }
        self.open_player(title, plan.source, plan.source_matched, plan.trailer_key, mode);
    }

    /// Play a catalog entry directly
    pub fn play_entry(&mut self, entry: CatalogEntry) {
        if !self.wallet_state.is_connected() {
            self.set_status(CoreError::WalletRequired.to_string(), Color::Yellow);
            return;
        }
        let title = entry.title.clone();
        self.open_player(title, entry, true, None, PlaybackMode::FullAsset);
    }

    /// Play a YouTube link or id, a direct video URL, or a local file
    pub fn play_asset(&mut self, asset: &str) {
        if !self.wallet_state.is_connected() {
            self.set_status(CoreError::WalletRequired.to_string(), Color::Yellow);
            return;
        }
        match detect_asset_kind(asset) {
            AssetKind::Trailer(key) => {
                // Both modes show the same video
                let source = CatalogEntry::new(key.clone(), 0, 0, watch_url(&key), "YouTube", "Unknown");
                self.open_player(key.clone(), source, true, Some(key), PlaybackMode::Trailer);
            }
            AssetKind::DirectVideo => {
                let asset = asset.trim();
                let title = asset.rsplit('/').next().unwrap_or(asset).to_string();
                let source = CatalogEntry::new(title.clone(), 0, 0, asset, "Direct", "Unknown");
                self.open_player(title, source, true, None, PlaybackMode::FullAsset);
            }
            AssetKind::Unsupported => self.set_status(format!("Cannot play '{}'", asset.trim()), Color::Red),
        }
    }

    fn open_player(
        &mut self,
        title: String,
        source: CatalogEntry,
        matched: bool,
        trailer_key: Option<String>,
        mode: PlaybackMode,
    ) {
        self.close_player();
        match PlayerView::open(&self.config, title, source, matched, trailer_key, mode) {
            Ok(player) => {
                log::info!("Opened player for '{}' in {} mode", player.title, mode.label());
                self.player = Some(player);
                self.switch_view(AppView::Player);
            }
            Err(e) => self.set_status(format!("Error: {:#}", e), Color::Red),
        }
    }

    pub fn close_player(&mut self) {
        if let Some(mut player) = self.player.take() {
            player.controller.close();
            if self.view == AppView::Player {
                self.view = if self.previous_view == AppView::Player {
                    AppView::Home
                } else {
                    self.previous_view
                };
            }
        }
    }

    pub fn select_mode(&mut self, mode: PlaybackMode) {
        let Some(player) = self.player.as_mut() else {
            self.set_status("No active playback", Color::Yellow);
            return;
        };
        match player.controller.select_mode(mode) {
            Ok(()) => self.set_status(format!("Now showing: {}", mode.label()), Color::Green),
            Err(CoreError::TrailerUnavailable) => {
                self.set_status("No trailer available for this title", Color::Yellow)
            }
            Err(e) => self.set_status(format!("Error: {}", e), Color::Red),
        }
    }

    pub fn with_controller<F>(&mut self, f: F)
    where
        F: FnOnce(&mut PlaybackModeController),
    {
        match self.player.as_mut() {
            Some(player) => f(&mut player.controller),
            None => self.set_status("No active playback", Color::Yellow),
        }
    }

    // --- Wallet ---

    pub fn connect_wallet(&mut self) {
        if self.wallet_busy {
            return;
        }
        self.wallet_busy = true;
        self.set_status("Connecting wallet...", Color::Yellow);
        tasks::wallet(self.wallet.clone(), WalletAction::Connect, self.tx.clone());
    }

    pub fn disconnect_wallet(&mut self) {
        self.wallet_busy = true;
        tasks::wallet(self.wallet.clone(), WalletAction::Disconnect, self.tx.clone());
    }

    /// Follow account switches made in the wallet itself
    fn sync_wallet(&mut self) {
        if !self.wallet_state.is_connected() || self.wallet_busy {
            return;
        }
        if self.wallet_synced.is_some_and(|t| t.elapsed() < WALLET_SYNC_INTERVAL) {
            return;
        }
        self.wallet_busy = true;
        tasks::wallet(self.wallet.clone(), WalletAction::Sync, self.tx.clone());
    }

    // --- Catalog ---

    pub fn refresh_catalog_filter(&mut self) {
        self.catalog.matches = filter_catalog(self.resolver.catalog(), &self.catalog.filter);
        self.catalog.selected = if self.catalog.matches.is_empty() { None } else { Some(0) };
    }

    /// Resolve a title request and show the outcome in the catalog view
    pub fn resolve_request(&mut self, title: &str, year: Option<i32>, external_id: Option<u64>) {
        let result = self.resolver.resolve(title, year, external_id);
        self.catalog.filter.clear();
        self.refresh_catalog_filter();

        match &result.entry {
            Some(entry) => {
                self.catalog.selected = self
                    .catalog
                    .matches
                    .iter()
                    .position(|&i| self.resolver.catalog().get(i) == Some(entry));
                let message = format!("Resolved to '{}'", entry.title);
                self.set_status(message, Color::Green);
            }
            None if result.suggestions.is_empty() => {
                self.set_status(format!("No match for '{}'", title), Color::Yellow)
            }
            None => {
                let message = format!("No match for '{}', {} suggestions", title, result.suggestions.len());
                self.set_status(message, Color::Yellow);
            }
        }
        self.catalog.resolution = Some(result);
        self.open_catalog();
    }

    // --- Input ---

    /// Handle key event
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        if self.is_command_mode() {
            match key.code {
                KeyCode::Char(c) => self.add_to_command_buffer(c),
                KeyCode::Backspace => self.remove_from_command_buffer(),
                KeyCode::Esc => self.exit_command_mode(),
                _ => {}
            }
            return Ok(());
        }

        if key.code == KeyCode::F(1) {
            self.show_help = !self.show_help;
            return Ok(());
        }
        if self.show_help && key.code == KeyCode::Esc {
            self.show_help = false;
            return Ok(());
        }

        match self.view {
            AppView::Home => self.handle_home_key(key),
            AppView::Search => self.handle_search_key(key),
            AppView::Title => self.handle_title_key(key),
            AppView::Player => self.handle_player_key(key),
            AppView::Catalog => self.handle_catalog_key(key),
        }
        Ok(())
    }

    /// Pointer activity over the player reveals the controls
    pub fn handle_mouse_event(&mut self, mouse: MouseEvent) {
        if self.view != AppView::Player {
            return;
        }
        if let Some(player) = self.player.as_mut() {
            match mouse.kind {
                MouseEventKind::Down(MouseButton::Left) => player.controller.toggle_playback(),
                MouseEventKind::ScrollUp => {
                    let volume = player.controller.session().volume;
                    player.controller.set_volume(volume + VOLUME_STEP);
                }
                MouseEventKind::ScrollDown => {
                    let volume = player.controller.session().volume;
                    player.controller.set_volume(volume - VOLUME_STEP);
                }
                _ => player.controller.pointer_moved(),
            }
        }
    }

    fn handle_home_key(&mut self, key: KeyEvent) {
        let rows = self.home.rows.len();
        match key.code {
            KeyCode::Up => self.home.row = self.home.row.saturating_sub(1),
            KeyCode::Down if rows > 0 => self.home.row = (self.home.row + 1).min(rows - 1),
            KeyCode::Left => self.home.col = self.home.col.saturating_sub(1),
            KeyCode::Right => {
                let len = self.home.rows.get(self.home.row).map_or(0, |r| r.items.len());
                if len > 0 {
                    self.home.col = (self.home.col + 1).min(len - 1);
                }
            }
            KeyCode::Enter => {
                if let Some(item) = self.home.selected() {
                    let (kind, id) = (item.kind(), item.id);
                    self.open_title(kind, id);
                }
            }
            KeyCode::Char('/') | KeyCode::Char('s') => self.open_search(None),
            KeyCode::Char('c') => self.open_catalog(),
            KeyCode::Char('r') => self.reload_home(),
            KeyCode::Char('w') => self.toggle_wallet(),
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
        // Rows can differ in length
        let len = self.home.rows.get(self.home.row).map_or(0, |r| r.items.len());
        self.home.col = self.home.col.min(len.saturating_sub(1));
    }

    fn toggle_wallet(&mut self) {
        if self.wallet_state.is_connected() {
            self.disconnect_wallet();
        } else {
            self.connect_wallet();
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                if self.search.input.trim().is_empty() || self.search.input.trim() == self.search.query {
                    if let Some(hit) = self.search.selected.and_then(|i| self.search.results.get(i)) {
                        let (kind, id) = (hit.item.kind(), hit.item.id);
                        self.open_title(kind, id);
                    }
                } else {
                    self.run_search();
                }
            }
            KeyCode::Up => {
                if let Some(selected) = self.search.selected {
                    self.search.selected = Some(selected.saturating_sub(1));
                }
            }
            KeyCode::Down => {
                if let Some(selected) = self.search.selected {
                    if selected + 1 < self.search.results.len() {
                        self.search.selected = Some(selected + 1);
                    }
                }
            }
            KeyCode::Char(c) => {
                let at = byte_index(&self.search.input, self.search.cursor);
                self.search.input.insert(at, c);
                self.search.cursor += 1;
            }
            KeyCode::Backspace => {
                if self.search.cursor > 0 {
                    let at = byte_index(&self.search.input, self.search.cursor - 1);
                    self.search.input.remove(at);
                    self.search.cursor -= 1;
                }
            }
            KeyCode::Left => self.search.cursor = self.search.cursor.saturating_sub(1),
            KeyCode::Right => {
                if self.search.cursor < self.search.input.chars().count() {
                    self.search.cursor += 1;
                }
            }
            KeyCode::Esc => self.switch_view(AppView::Home),
            _ => {}
        }
    }

    fn handle_title_key(&mut self, key: KeyEvent) {
        let current = self.title.as_ref().map(|t| (t.kind, t.details.summary.id));
        match key.code {
            KeyCode::Enter | KeyCode::Char('p') => {
                if let Some((kind, id)) = current {
                    self.watch(kind, id);
                }
            }
            KeyCode::Char('w') => self.toggle_wallet(),
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Esc | KeyCode::Backspace => {
                let back = if self.previous_view == AppView::Title {
                    AppView::Home
                } else {
                    self.previous_view
                };
                self.switch_view(back);
            }
            _ => {}
        }
    }

    fn handle_player_key(&mut self, key: KeyEvent) {
        let Some(player) = self.player.as_mut() else {
            self.switch_view(AppView::Home);
            return;
        };

        if let Some(action) = event_utils::playback_action(&key) {
            player.controller.handle_key(action);
            return;
        }

        let volume = player.controller.session().volume;
        match key.code {
            KeyCode::Char('1') | KeyCode::Char('t') => self.select_mode(PlaybackMode::Trailer),
            KeyCode::Char('2') => self.select_mode(PlaybackMode::FullAsset),
            KeyCode::Char('+') | KeyCode::Char('=') => player.controller.set_volume(volume + VOLUME_STEP),
            KeyCode::Char('-') => player.controller.set_volume(volume - VOLUME_STEP),
            KeyCode::Tab => {
                let focused = player.controller.controls().focused();
                player.controller.set_controls_focused(!focused);
            }
            KeyCode::Esc | KeyCode::Char('q') => self.close_player(),
            _ => player.controller.pointer_moved(),
        }
    }

    fn handle_catalog_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => {
                if let Some(selected) = self.catalog.selected {
                    self.catalog.selected = Some(selected.saturating_sub(1));
                }
            }
            KeyCode::Down => {
                if let Some(selected) = self.catalog.selected {
                    if selected + 1 < self.catalog.matches.len() {
                        self.catalog.selected = Some(selected + 1);
                    }
                }
            }
            KeyCode::Enter => {
                let entry = self
                    .catalog
                    .selected
                    .and_then(|i| self.catalog.matches.get(i))
                    .and_then(|&i| self.resolver.catalog().get(i))
                    .cloned();
                if let Some(entry) = entry {
                    self.play_entry(entry);
                }
            }
            KeyCode::Char(c) => {
                self.catalog.filter.push(c);
                self.refresh_catalog_filter();
            }
            KeyCode::Backspace => {
                self.catalog.filter.pop();
                self.refresh_catalog_filter();
            }
            KeyCode::Esc => {
                if self.catalog.filter.is_empty() {
                    self.switch_view(AppView::Home);
                } else {
                    self.catalog.filter.clear();
                    self.refresh_catalog_filter();
                }
            }
            _ => {}
        }
    }

    // --- Command mode ---

    pub fn is_command_mode(&self) -> bool {
        self.command_mode
    }

    pub fn enter_command_mode(&mut self) {
        self.command_mode = true;
        self.command_buffer.clear();
    }

    pub fn exit_command_mode(&mut self) {
        self.command_mode = false;
    }

    pub fn get_command_buffer(&self) -> &str {
        &self.command_buffer
    }

    fn add_to_command_buffer(&mut self, c: char) {
        self.command_buffer.push(c);
    }

    fn remove_from_command_buffer(&mut self) {
        self.command_buffer.pop();
    }

    // --- Loop ---

    /// Update application state
    pub fn update(&mut self) {
        if let Some((_, time, _)) = &self.status_message {
            if time.elapsed() > Duration::from_secs(5) {
                self.status_message = None;
            }
        }
        self.sync_wallet();

        let notice = self.player.as_mut().and_then(|p| p.pump());
        if let Some(notice) = notice {
            self.set_status(notice, Color::Yellow);
        }
    }
}

/// Catalog indices matching `pattern`, best match first.
///
/// An empty pattern keeps catalog order.
pub fn filter_catalog(catalog: &Catalog, pattern: &str) -> Vec<usize> {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return (0..catalog.len()).collect();
    }

    let matcher = SkimMatcherV2::default().ignore_case();
    let mut scored: Vec<(i64, usize)> = catalog
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| matcher.fuzzy_match(&entry.title, pattern).map(|score| (score, i)))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    scored.into_iter().map(|(_, i)| i).collect()
}

fn byte_index(s: &str, char_index: usize) -> usize {
    s.char_indices().nth(char_index).map_or(s.len(), |(i, _)| i)
}

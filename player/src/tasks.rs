//! Background work. Each task reports back to the UI loop over the
//! message channel; the UI never blocks on the network.

use std::sync::Arc;

use basestream_core::metadata::{
    ContentDetails, ContentSummary, Credits, MediaType, MetadataSource, SearchResult,
    annotate_availability,
};
use basestream_core::{SourceResolver, WalletSession, WalletState, WatchPlan, WatchPlanner};
use tokio::sync::{Mutex, mpsc};

/// Items shown per home row
const ROW_ITEM_COUNT: usize = 20;

/// One horizontal row of the home view
#[derive(Debug, Clone)]
pub struct HomeRow {
    pub title: String,
    pub items: Vec<ContentSummary>,
}

/// Everything shown on a title page
#[derive(Debug, Clone)]
pub struct TitlePage {
    pub kind: MediaType,
    pub details: ContentDetails,
    pub credits: Credits,
    pub similar: Vec<ContentSummary>,
    /// Movies only: the title resolves to a catalog asset
    pub streaming_available: bool,
}

/// Results delivered to the UI loop
#[derive(Debug)]
pub enum UiMessage {
    HomeLoaded(Vec<HomeRow>),
    SearchLoaded { query: String, results: Vec<SearchResult> },
    TitleLoaded(Box<TitlePage>),
    WatchReady(Box<WatchPlan>),
    WalletUpdated { state: WalletState, error: Option<String> },
    Failed(String),
}

pub type SharedWallet = Arc<Mutex<WalletSession>>;

pub fn load_home(metadata: Arc<dyn MetadataSource>, tx: mpsc::Sender<UiMessage>) {
    tokio::spawn(async move {
        let mut rows = Vec::new();
        let mut push = |title: &str, result: basestream_core::CoreResult<Vec<ContentSummary>>| match result {
            Ok(items) if !items.is_empty() => rows.push(HomeRow {
                title: title.to_string(),
                items: items.into_iter().take(ROW_ITEM_COUNT).collect(),
            }),
            Ok(_) => {}
            Err(e) => log::warn!("Failed to load '{}': {}", title, e),
        };

        push("Trending Now", metadata.trending(MediaType::Movie).await);
        push("Popular TV Shows", metadata.trending(MediaType::Tv).await);
        push("Popular Movies", metadata.popular_movies().await);
        push("Top Rated", metadata.top_rated_movies().await);

        let message = if rows.is_empty() {
            UiMessage::Failed("Could not load any titles".to_string())
        } else {
            UiMessage::HomeLoaded(rows)
        };
        let _ = tx.send(message).await;
    });
}

pub fn search(
    metadata: Arc<dyn MetadataSource>,
    resolver: Arc<SourceResolver>,
    query: String,
    tx: mpsc::Sender<UiMessage>,
) {
    tokio::spawn(async move {
        let message = match metadata.search(&query).await {
            Ok(results) => UiMessage::SearchLoaded {
                results: annotate_availability(results, &resolver),
                query,
            },
            Err(e) => {
                log::warn!("Search for '{}' failed: {}", query, e);
                UiMessage::Failed(format!("Search failed: {}", e))
            }
        };
        let _ = tx.send(message).await;
    });
}

pub fn load_title(
    metadata: Arc<dyn MetadataSource>,
    resolver: Arc<SourceResolver>,
    kind: MediaType,
    id: u64,
    tx: mpsc::Sender<UiMessage>,
) {
    tokio::spawn(async move {
        let details = match metadata.details(kind, id).await {
            Ok(details) => details,
            Err(e) => {
                let _ = tx.send(UiMessage::Failed(format!("Title unavailable: {}", e))).await;
                return;
            }
        };

        // Secondary sections degrade to empty
        let credits = metadata.credits(kind, id).await.unwrap_or_else(|e| {
            log::warn!("Credits for {} failed: {}", id, e);
            Credits::default()
        });
        let similar = metadata.similar(kind, id).await.unwrap_or_else(|e| {
            log::warn!("Similar titles for {} failed: {}", id, e);
            Vec::new()
        });

        let streaming_available = kind == MediaType::Movie
            && resolver
                .resolve(details.display_title(), details.summary.release_year(), Some(id))
                .matched;

        let page = TitlePage {
            kind,
            details,
            credits,
            similar,
            streaming_available,
        };
        let _ = tx.send(UiMessage::TitleLoaded(Box::new(page))).await;
    });
}

pub fn plan_watch(
    metadata: Arc<dyn MetadataSource>,
    resolver: Arc<SourceResolver>,
    wallet: WalletState,
    kind: MediaType,
    id: u64,
    tx: mpsc::Sender<UiMessage>,
) {
    tokio::spawn(async move {
        let planner = WatchPlanner::new(&resolver);
        let message = match planner.plan(metadata.as_ref(), &wallet, kind, id).await {
            Ok(plan) => UiMessage::WatchReady(Box::new(plan)),
            Err(e) => UiMessage::Failed(e.to_string()),
        };
        let _ = tx.send(message).await;
    });
}

/// What to do with the wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletAction {
    Connect,
    Disconnect,
    Restore,
    /// Poll the wallet for an account switch
    Sync,
}

pub fn wallet(wallet: SharedWallet, action: WalletAction, tx: mpsc::Sender<UiMessage>) {
    tokio::spawn(async move {
        let mut session = wallet.lock().await;
        match action {
            WalletAction::Connect => {
                session.connect().await;
            }
            WalletAction::Disconnect => session.disconnect(),
            WalletAction::Restore => {
                session.restore().await;
            }
            WalletAction::Sync => session.sync().await,
        }
        let message = UiMessage::WalletUpdated {
            state: session.state().clone(),
            error: session.error().map(str::to_string),
        };
        drop(session);
        let _ = tx.send(message).await;
    });
}

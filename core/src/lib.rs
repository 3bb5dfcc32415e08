pub mod catalog;
pub mod config;
pub mod error;
pub mod metadata;
pub mod playback;
pub mod resolver;
pub mod wallet;
pub mod watch;

// Re-exports
pub use catalog::{Catalog, CatalogEntry};
pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use metadata::{ContentDetails, ContentSummary, MediaType, MetadataSource, TmdbClient};
pub use playback::{
    AssetKind, Clock, FullscreenHost, MediaEvent, PlaybackBackend, PlaybackMode,
    PlaybackModeController, PlaybackState, SystemClock, detect_asset_kind, format_time,
};
pub use resolver::{ResolutionResult, SourceResolver};
pub use wallet::{JsonRpcWallet, WalletProvider, WalletSession, WalletState};
pub use watch::{WatchPlan, WatchPlanner};

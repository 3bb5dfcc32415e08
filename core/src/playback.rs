mod controller;
mod controls;
mod embed;
mod session;
mod time;

use std::time::Instant;

pub use controller::{KeyAction, PlaybackModeController, PlaybackTimings};
pub use controls::ControlsVisibility;
pub use embed::{
    EmbedCommand, EmbedMessage, EmbeddedPlayer, MessageSink, extract_youtube_id, is_youtube_url,
    watch_url,
};
pub use session::{ErrorKind, PlaybackSession, PlaybackState};
pub use time::format_time;

use crate::error::CoreResult;

/// Which asset a playback view is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackMode {
    /// Promotional clip through the embedded player
    Trailer,
    /// The full catalog asset through the native media element
    FullAsset,
}

impl PlaybackMode {
    pub fn label(&self) -> &'static str {
        match self {
            PlaybackMode::Trailer => "Trailer",
            PlaybackMode::FullAsset => "Full Movie",
        }
    }
}

/// Common transport contract for both playback backends
pub trait PlaybackBackend {
    fn play(&mut self) -> CoreResult<()>;
    fn pause(&mut self) -> CoreResult<()>;
    /// Jump to an absolute position in seconds
    fn seek(&mut self, seconds: f64) -> CoreResult<()>;
    /// Volume in `[0, 1]`
    fn set_volume(&mut self, volume: f64) -> CoreResult<()>;
    fn set_muted(&mut self, muted: bool) -> CoreResult<()>;
    /// Release the backend; called once when the session closes
    fn detach(&mut self) {}
}

/// The surface that owns the player's visual container
pub trait FullscreenHost {
    fn request_fullscreen(&mut self) -> CoreResult<()>;
    fn exit_fullscreen(&mut self) -> CoreResult<()>;
}

/// Lifecycle events emitted by the native media element
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Metadata is known; carries the duration in seconds
    Loaded { duration: f64 },
    TimeUpdate { current: f64 },
    Ended,
    /// Buffering
    Waiting,
    Playing,
    Paused,
    Error(ErrorKind),
}

/// Source of the current time for deferred work
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Type of a requested asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetKind {
    /// YouTube trailer, carries the video id
    Trailer(String),
    /// Direct video file URL or local path
    DirectVideo,
    /// Nothing we know how to play
    Unsupported,
}

/// Classify a requested asset as a trailer key/URL or a direct video
pub fn detect_asset_kind(asset: &str) -> AssetKind {
    let asset = asset.trim();

    if is_youtube_url(asset) {
        return match extract_youtube_id(asset) {
            Some(id) => AssetKind::Trailer(id),
            None => AssetKind::Unsupported,
        };
    }

    let lower = asset.to_lowercase();
    let is_remote = lower.starts_with("http://") || lower.starts_with("https://");
    let has_video_ext = [".mp4", ".webm", ".mkv", ".mov", ".m4v", ".ogv"]
        .iter()
        .any(|ext| lower.split(&['?', '#'][..]).next().unwrap_or("").ends_with(ext));

    if (is_remote && has_video_ext) || (!is_remote && std::path::Path::new(asset).is_file()) {
        return AssetKind::DirectVideo;
    }

    // Bare YouTube video ids are 11 characters
    if asset.len() == 11 && asset.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return AssetKind::Trailer(asset.to_string());
    }

    AssetKind::Unsupported
}

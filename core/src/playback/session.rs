use super::PlaybackMode;

/// Transport state of a playback view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No mode selected, or the session was closed
    Idle,
    /// Buffering
    Loading,
    Playing,
    Paused,
    /// The backend failed; only a mode switch leaves this state
    Errored,
}

/// Why a backend gave up on a source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The source could not be loaded
    SourceUnavailable,
    /// The source loaded but could not be decoded
    DecodeFailure,
    /// The backend refused to start playback
    PlaybackRejected,
}

impl ErrorKind {
    /// Message shown to the user
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::SourceUnavailable => "Failed to load video. The source may be unavailable.",
            ErrorKind::DecodeFailure => "The video could not be decoded.",
            ErrorKind::PlaybackRejected => "Failed to play video. Please try again.",
        }
    }
}

/// Ephemeral state of one playback view
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    pub mode: PlaybackMode,
    pub current_time: f64,
    /// Zero until the backend reports it
    pub duration: f64,
    /// Always within `[0, 1]`
    pub volume: f64,
    pub muted: bool,
    pub playing: bool,
    pub error: Option<ErrorKind>,
}

impl PlaybackSession {
    pub fn new(mode: PlaybackMode) -> Self {
        Self {
            mode,
            current_time: 0.0,
            duration: 0.0,
            volume: 1.0,
            muted: false,
            playing: false,
            error: None,
        }
    }

    pub fn duration_known(&self) -> bool {
        self.duration.is_finite() && self.duration > 0.0
    }

    /// Clamp a position into `[0, duration]`, or `[0, inf)` while the
    /// duration is unknown
    pub fn clamp_time(&self, seconds: f64) -> f64 {
        let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        if self.duration_known() {
            seconds.min(self.duration)
        } else {
            seconds
        }
    }

    /// Start over in `mode`, keeping the audio preferences
    pub(crate) fn reset(&mut self, mode: PlaybackMode) {
        self.mode = mode;
        self.current_time = 0.0;
        self.duration = 0.0;
        self.playing = false;
        self.error = None;
    }

    /// Fraction of the asset already played
    pub fn progress(&self) -> f64 {
        if self.duration_known() {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_time() {
        let mut session = PlaybackSession::new(PlaybackMode::FullAsset);
        assert_eq!(session.clamp_time(-3.0), 0.0);
        assert_eq!(session.clamp_time(10_000.0), 10_000.0);

        session.duration = 120.0;
        assert_eq!(session.clamp_time(-5.0), 0.0);
        assert_eq!(session.clamp_time(500.0), 120.0);
        assert_eq!(session.clamp_time(f64::NAN), 0.0);
    }

    #[test]
    fn test_reset_keeps_audio_preferences() {
        let mut session = PlaybackSession::new(PlaybackMode::FullAsset);
        session.volume = 0.3;
        session.muted = true;
        session.current_time = 50.0;
        session.duration = 100.0;
        session.error = Some(ErrorKind::DecodeFailure);

        session.reset(PlaybackMode::Trailer);
        assert_eq!(session.mode, PlaybackMode::Trailer);
        assert_eq!(session.current_time, 0.0);
        assert_eq!(session.error, None);
        assert_eq!(session.volume, 0.3);
        assert!(session.muted);
    }

    #[test]
    fn test_progress_needs_known_duration() {
        let mut session = PlaybackSession::new(PlaybackMode::FullAsset);
        session.current_time = 40.0;
        assert_eq!(session.progress(), 0.0);

        session.duration = 160.0;
        assert_eq!(session.progress(), 0.25);
        session.current_time = 200.0;
        assert_eq!(session.progress(), 1.0);
    }
}

use std::time::{Duration, Instant};

use log::{debug, info, warn};

use super::controls::{ControlsVisibility, DEFAULT_HIDE_AFTER};
use super::session::{PlaybackSession, PlaybackState};
use super::{Clock, FullscreenHost, MediaEvent, PlaybackBackend, PlaybackMode};
use crate::error::{CoreError, CoreResult};

/// Seconds moved by the skip keys
pub const SKIP_SECONDS: f64 = 10.0;

/// Delays for the controller's deferred work
#[derive(Debug, Clone, Copy)]
pub struct PlaybackTimings {
    /// Wait after a mode switch before the automatic play attempt
    pub autoplay_delay: Duration,
    /// Inactivity period before the controls hide
    pub hide_controls_after: Duration,
}

impl Default for PlaybackTimings {
    fn default() -> Self {
        Self {
            autoplay_delay: Duration::from_secs(1),
            hide_controls_after: DEFAULT_HIDE_AFTER,
        }
    }
}

/// Keyboard shortcuts of the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    TogglePlayback,
    SkipBack,
    SkipForward,
    ToggleFullscreen,
    ToggleMute,
}

/// One transport contract over the native element and the embedded trailer.
///
/// All work happens on the caller's thread. Deferred actions (the automatic
/// play after a mode switch and the controls auto-hide) are deadlines checked
/// by [`tick`](Self::tick). Switching mode replaces the pending autoplay and
/// closing drops every deadline, so nothing fires into a torn-down session.
pub struct PlaybackModeController {
    session: PlaybackSession,
    state: PlaybackState,
    native: Box<dyn PlaybackBackend>,
    trailer: Option<Box<dyn PlaybackBackend>>,
    fullscreen_host: Box<dyn FullscreenHost>,
    fullscreen: bool,
    clock: Box<dyn Clock>,
    timings: PlaybackTimings,
    controls: ControlsVisibility,
    autoplay_at: Option<Instant>,
    closed: bool,
}

impl PlaybackModeController {
    /// Create an idle controller over the native element
    pub fn new(
        native: Box<dyn PlaybackBackend>,
        fullscreen_host: Box<dyn FullscreenHost>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let timings = PlaybackTimings::default();
        Self {
            session: PlaybackSession::new(PlaybackMode::FullAsset),
            state: PlaybackState::Idle,
            native,
            trailer: None,
            fullscreen_host,
            fullscreen: false,
            clock,
            timings,
            controls: ControlsVisibility::new(timings.hide_controls_after),
            autoplay_at: None,
            closed: false,
        }
    }

    /// Attach the embedded trailer backend
    pub fn with_trailer(mut self, trailer: Box<dyn PlaybackBackend>) -> Self {
        self.trailer = Some(trailer);
        self
    }

    pub fn with_timings(mut self, timings: PlaybackTimings) -> Self {
        self.timings = timings;
        self.controls = ControlsVisibility::new(timings.hide_controls_after);
        self
    }

    // --- Accessors ---

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn mode(&self) -> PlaybackMode {
        self.session.mode
    }

    /// Whether the trailer option can be offered at all
    pub fn trailer_available(&self) -> bool {
        self.trailer.is_some()
    }

    pub fn controls_visible(&self) -> bool {
        self.controls.visible()
    }

    pub fn controls(&self) -> &ControlsVisibility {
        &self.controls
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Shown while the session is errored
    pub fn error_message(&self) -> Option<&'static str> {
        self.session.error.map(|e| e.user_message())
    }

    /// Deadline of the scheduled automatic play, if any
    pub fn pending_autoplay(&self) -> Option<Instant> {
        self.autoplay_at
    }

    // --- Mode selection ---

    /// Select the asset to show.
    ///
    /// Always resets the session to `Loading` with time and error cleared and
    /// schedules one automatic play attempt. Trailer mode is refused when no
    /// trailer backend is attached.
    pub fn select_mode(&mut self, mode: PlaybackMode) -> CoreResult<()> {
        if self.closed {
            return Err(CoreError::SessionClosed);
        }
        if mode == PlaybackMode::Trailer && self.trailer.is_none() {
            return Err(CoreError::TrailerUnavailable);
        }

        if self.session.playing {
            // The outgoing backend keeps running otherwise
            self.dispatch("pause", |b| b.pause());
        }

        let now = self.clock.now();
        self.session.reset(mode);
        self.state = PlaybackState::Loading;
        self.autoplay_at = Some(now + self.timings.autoplay_delay);
        self.controls.cancel();
        info!("Playback mode set to {}", mode.label());
        Ok(())
    }

    // --- Transport operations ---

    /// Play or pause the active backend.
    ///
    /// The displayed state flips as soon as the backend accepts the command.
    pub fn toggle_playback(&mut self) {
        if !self.accepting() {
            return;
        }
        self.interact();

        if self.session.playing {
            if self.dispatch("pause", |b| b.pause()) {
                self.session.playing = false;
                self.state = PlaybackState::Paused;
            }
        } else {
            self.start_playback();
        }
    }

    /// Jump to `seconds`, clamped to the known duration
    pub fn seek(&mut self, seconds: f64) {
        if !self.accepting() {
            return;
        }
        self.interact();

        let target = self.session.clamp_time(seconds);
        if self.dispatch("seek", |b| b.seek(target)) {
            self.session.current_time = target;
        }
    }

    pub fn skip(&mut self, delta_seconds: f64) {
        let target = self.session.current_time + delta_seconds;
        self.seek(target);
    }

    /// Set the volume; zero also marks the session muted
    pub fn set_volume(&mut self, volume: f64) {
        if !self.accepting() {
            return;
        }
        self.interact();

        let volume = if volume.is_finite() { volume.clamp(0.0, 1.0) } else { 0.0 };
        if !self.dispatch("set_volume", |b| b.set_volume(volume)) {
            return;
        }
        self.session.volume = volume;

        // Keep the backend's mute flag in step with the session
        let muted = volume == 0.0;
        if muted != self.session.muted && self.dispatch("set_muted", |b| b.set_muted(muted)) {
            self.session.muted = muted;
        }
    }

    pub fn toggle_mute(&mut self) {
        if !self.accepting() {
            return;
        }
        self.interact();

        let muted = !self.session.muted;
        if self.dispatch("set_muted", |b| b.set_muted(muted)) {
            self.session.muted = muted;
        }
    }

    /// Ask the host to enter or leave fullscreen.
    ///
    /// The flag only changes through [`on_fullscreen_change`](Self::on_fullscreen_change).
    pub fn toggle_fullscreen(&mut self) {
        if !self.accepting() {
            return;
        }
        self.interact();

        let result = if self.fullscreen {
            self.fullscreen_host.exit_fullscreen()
        } else {
            self.fullscreen_host.request_fullscreen()
        };
        if let Err(e) = result {
            warn!("Fullscreen request failed: {}", e);
        }
    }

    pub fn handle_key(&mut self, action: KeyAction) {
        match action {
            KeyAction::TogglePlayback => self.toggle_playback(),
            KeyAction::SkipBack => self.skip(-SKIP_SECONDS),
            KeyAction::SkipForward => self.skip(SKIP_SECONDS),
            KeyAction::ToggleFullscreen => self.toggle_fullscreen(),
            KeyAction::ToggleMute => self.toggle_mute(),
        }
    }

    // --- Environment notifications ---

    /// Pointer movement over the player
    pub fn pointer_moved(&mut self) {
        if !self.closed {
            self.interact();
        }
    }

    /// Focus entering or leaving the control set
    pub fn set_controls_focused(&mut self, focused: bool) {
        if !self.closed {
            let now = self.clock.now();
            self.controls.set_focused(focused, now);
        }
    }

    /// The host entered or left fullscreen
    pub fn on_fullscreen_change(&mut self, fullscreen: bool) {
        if !self.closed {
            self.fullscreen = fullscreen;
        }
    }

    /// Feed an event emitted by the backend serving `source`.
    ///
    /// Events from a backend that is no longer active are dropped. The
    /// trailer backend only contributes progress figures and errors; its
    /// play state follows the commands we sent.
    pub fn on_media_event(&mut self, source: PlaybackMode, event: MediaEvent) {
        if self.closed || self.state == PlaybackState::Idle {
            return;
        }
        if source != self.active_source() {
            debug!("Dropping {:?} from inactive {} backend", event, source.label());
            return;
        }
        if self.state == PlaybackState::Errored {
            return;
        }

        match event {
            MediaEvent::Loaded { duration } => {
                if duration.is_finite() && duration > 0.0 {
                    self.session.duration = duration;
                    self.session.current_time = self.session.clamp_time(self.session.current_time);
                }
                if source == PlaybackMode::FullAsset && self.state == PlaybackState::Loading {
                    self.state = if self.session.playing {
                        PlaybackState::Playing
                    } else {
                        PlaybackState::Paused
                    };
                }
            }
            MediaEvent::TimeUpdate { current } => {
                self.session.current_time = self.session.clamp_time(current);
            }
            MediaEvent::Error(kind) => {
                warn!("{} backend failed: {}", source.label(), kind.user_message());
                self.session.error = Some(kind);
                self.session.playing = false;
                self.state = PlaybackState::Errored;
                self.autoplay_at = None;
                self.controls.cancel();
            }
            _ if source == PlaybackMode::Trailer => {}
            MediaEvent::Ended => {
                self.session.playing = false;
                self.state = PlaybackState::Paused;
                self.controls.cancel();
            }
            MediaEvent::Waiting => {
                self.state = PlaybackState::Loading;
            }
            MediaEvent::Playing => {
                self.session.playing = true;
                self.state = PlaybackState::Playing;
            }
            MediaEvent::Paused => {
                self.session.playing = false;
                self.state = PlaybackState::Paused;
            }
        }
    }

    /// Run due deferred work; call from the UI loop
    pub fn tick(&mut self) {
        if self.closed {
            return;
        }
        let now = self.clock.now();

        if let Some(at) = self.autoplay_at {
            if now >= at {
                self.autoplay_at = None;
                if self.accepting() && !self.session.playing {
                    debug!("Automatic play for {}", self.session.mode.label());
                    self.start_playback();
                    self.controls.touch(now);
                }
            }
        }

        if self.controls.tick(now, self.session.playing) {
            debug!("Controls hidden after inactivity");
        }
    }

    /// Tear the session down; pending deadlines are dropped and backends
    /// detached. Every later call is inert.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.autoplay_at = None;
        self.controls.cancel();
        self.native.detach();
        if let Some(trailer) = self.trailer.as_mut() {
            trailer.detach();
        }
        self.session.playing = false;
        self.state = PlaybackState::Idle;
        self.closed = true;
        info!("Playback session closed");
    }

    // --- Internals ---

    fn accepting(&self) -> bool {
        !self.closed && !matches!(self.state, PlaybackState::Idle | PlaybackState::Errored)
    }

    fn active_source(&self) -> PlaybackMode {
        match (self.session.mode, self.trailer.is_some()) {
            (PlaybackMode::Trailer, true) => PlaybackMode::Trailer,
            _ => PlaybackMode::FullAsset,
        }
    }

    fn interact(&mut self) {
        let now = self.clock.now();
        self.controls.touch(now);
    }

    fn start_playback(&mut self) {
        if self.dispatch("play", |b| b.play()) {
            self.session.playing = true;
            // The native element confirms through its own events
            if self.active_source() == PlaybackMode::Trailer || self.state != PlaybackState::Loading {
                self.state = PlaybackState::Playing;
            }
        }
    }

    /// Run `command` on the active backend; failures are logged and swallowed
    fn dispatch<F>(&mut self, name: &str, command: F) -> bool
    where
        F: FnOnce(&mut dyn PlaybackBackend) -> CoreResult<()>,
    {
        let source = self.active_source();
        let backend: &mut dyn PlaybackBackend = match (source, self.trailer.as_mut()) {
            (PlaybackMode::Trailer, Some(trailer)) => trailer.as_mut(),
            _ => self.native.as_mut(),
        };

        match command(backend) {
            Ok(()) => true,
            Err(e) => {
                warn!("{} on {} backend failed: {}", name, source.label(), e);
                false
            }
        }
    }
}

impl Drop for PlaybackModeController {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for PlaybackModeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackModeController")
            .field("session", &self.session)
            .field("state", &self.state)
            .field("trailer_available", &self.trailer.is_some())
            .field("fullscreen", &self.fullscreen)
            .field("autoplay_at", &self.autoplay_at)
            .field("closed", &self.closed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::ErrorKind;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    type CallLog = Rc<RefCell<Vec<String>>>;

    struct RecordingBackend {
        name: &'static str,
        calls: CallLog,
        fail: Rc<Cell<bool>>,
    }

    impl RecordingBackend {
        fn record(&self, call: String) -> CoreResult<()> {
            if self.fail.get() {
                return Err(CoreError::control("rejected"));
            }
            self.calls.borrow_mut().push(format!("{}:{}", self.name, call));
            Ok(())
        }
    }

    impl PlaybackBackend for RecordingBackend {
        fn play(&mut self) -> CoreResult<()> {
            self.record("play".into())
        }
        fn pause(&mut self) -> CoreResult<()> {
            self.record("pause".into())
        }
        fn seek(&mut self, seconds: f64) -> CoreResult<()> {
            self.record(format!("seek {seconds}"))
        }
        fn set_volume(&mut self, volume: f64) -> CoreResult<()> {
            self.record(format!("volume {volume}"))
        }
        fn set_muted(&mut self, muted: bool) -> CoreResult<()> {
            self.record(format!("muted {muted}"))
        }
        fn detach(&mut self) {
            self.calls.borrow_mut().push(format!("{}:detach", self.name));
        }
    }

    struct RecordingHost {
        calls: CallLog,
    }

    impl FullscreenHost for RecordingHost {
        fn request_fullscreen(&mut self) -> CoreResult<()> {
            self.calls.borrow_mut().push("host:enter".into());
            Ok(())
        }
        fn exit_fullscreen(&mut self) -> CoreResult<()> {
            self.calls.borrow_mut().push("host:exit".into());
            Ok(())
        }
    }

    #[derive(Clone)]
    struct ManualClock(Rc<Cell<Instant>>);

    impl ManualClock {
        fn advance(&self, by: Duration) {
            self.0.set(self.0.get() + by);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.0.get()
        }
    }

    struct Harness {
        controller: PlaybackModeController,
        calls: CallLog,
        native_fail: Rc<Cell<bool>>,
        clock: ManualClock,
    }

    impl Harness {
        fn new(with_trailer: bool) -> Self {
            let calls: CallLog = Rc::default();
            let native_fail = Rc::new(Cell::new(false));
            let clock = ManualClock(Rc::new(Cell::new(Instant::now())));

            let native = RecordingBackend {
                name: "native",
                calls: calls.clone(),
                fail: native_fail.clone(),
            };
            let host = RecordingHost { calls: calls.clone() };
            let mut controller =
                PlaybackModeController::new(Box::new(native), Box::new(host), Box::new(clock.clone()));
            if with_trailer {
                controller = controller.with_trailer(Box::new(RecordingBackend {
                    name: "trailer",
                    calls: calls.clone(),
                    fail: Rc::new(Cell::new(false)),
                }));
            }

            Self {
                controller,
                calls,
                native_fail,
                clock,
            }
        }

        /// Open in full-asset mode with a loaded 120 s asset, playing
        fn playing_asset() -> Self {
            let mut h = Self::new(true);
            h.controller.select_mode(PlaybackMode::FullAsset).unwrap();
            h.controller.on_media_event(PlaybackMode::FullAsset, MediaEvent::Loaded { duration: 120.0 });
            h.controller.on_media_event(PlaybackMode::FullAsset, MediaEvent::Playing);
            // Let the pending autoplay lapse; it is a no-op while playing
            h.clock.advance(Duration::from_secs(1));
            h.controller.tick();
            h.calls.borrow_mut().clear();
            h
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    #[test]
    fn test_idle_until_mode_selected() {
        let mut h = Harness::new(false);
        assert_eq!(h.controller.state(), PlaybackState::Idle);
        h.controller.toggle_playback();
        assert!(h.calls().is_empty());
    }

    #[test]
    fn test_autoplay_fires_after_delay() {
        let mut h = Harness::new(false);
        h.controller.select_mode(PlaybackMode::FullAsset).unwrap();
        assert_eq!(h.controller.state(), PlaybackState::Loading);

        h.clock.advance(Duration::from_millis(900));
        h.controller.tick();
        assert!(h.calls().is_empty());

        h.clock.advance(Duration::from_millis(100));
        h.controller.tick();
        assert_eq!(h.calls(), vec!["native:play"]);
        assert!(h.controller.session().playing);
        // Still buffering until the element confirms
        assert_eq!(h.controller.state(), PlaybackState::Loading);

        h.controller.on_media_event(PlaybackMode::FullAsset, MediaEvent::Playing);
        assert_eq!(h.controller.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_volume_controls_mute() {
        let mut h = Harness::playing_asset();
        h.controller.set_volume(0.0);
        assert!(h.controller.session().muted);
        h.controller.set_volume(0.5);
        assert!(!h.controller.session().muted);
        assert_eq!(h.controller.session().volume, 0.5);

        h.controller.set_volume(1.7);
        assert_eq!(h.controller.session().volume, 1.0);
    }

    #[test]
    fn test_volume_change_unmutes_backend() {
        let mut h = Harness::playing_asset();
        h.controller.toggle_mute();
        h.controller.set_volume(0.5);
        assert!(!h.controller.session().muted);
        assert_eq!(
            h.calls(),
            vec!["native:muted true", "native:volume 0.5", "native:muted false"]
        );

        h.calls.borrow_mut().clear();
        h.controller.set_volume(0.8);
        assert_eq!(h.calls(), vec!["native:volume 0.8"]);
    }

    #[test]
    fn test_zero_volume_mutes_backend() {
        let mut h = Harness::playing_asset();
        h.controller.set_volume(0.0);
        assert!(h.controller.session().muted);
        assert_eq!(h.calls(), vec!["native:volume 0", "native:muted true"]);

        h.calls.borrow_mut().clear();
        h.controller.toggle_mute();
        assert!(!h.controller.session().muted);
        assert_eq!(h.calls(), vec!["native:muted false"]);
    }

    #[test]
    fn test_seek_clamps_to_duration() {
        let mut h = Harness::playing_asset();
        h.controller.seek(-5.0);
        assert_eq!(h.controller.session().current_time, 0.0);
        h.controller.seek(500.0);
        assert_eq!(h.controller.session().current_time, 120.0);
        assert_eq!(h.calls(), vec!["native:seek 0", "native:seek 120"]);
    }

    #[test]
    fn test_skip_is_relative_seek() {
        let mut h = Harness::playing_asset();
        h.controller.on_media_event(PlaybackMode::FullAsset, MediaEvent::TimeUpdate { current: 30.0 });
        h.controller.handle_key(KeyAction::SkipForward);
        assert_eq!(h.controller.session().current_time, 40.0);
        h.controller.skip(-100.0);
        assert_eq!(h.controller.session().current_time, 0.0);
    }

    #[test]
    fn test_mode_switch_resets_time_and_error() {
        let mut h = Harness::playing_asset();
        h.controller.on_media_event(PlaybackMode::FullAsset, MediaEvent::TimeUpdate { current: 75.0 });
        h.controller.on_media_event(PlaybackMode::FullAsset, MediaEvent::Error(ErrorKind::DecodeFailure));
        assert_eq!(h.controller.state(), PlaybackState::Errored);
        assert!(h.controller.error_message().is_some());

        h.controller.select_mode(PlaybackMode::Trailer).unwrap();
        assert_eq!(h.controller.session().current_time, 0.0);
        assert_eq!(h.controller.session().error, None);
        assert_eq!(h.controller.state(), PlaybackState::Loading);

        h.controller.select_mode(PlaybackMode::FullAsset).unwrap();
        assert_eq!(h.controller.session().current_time, 0.0);
        assert_eq!(h.controller.session().duration, 0.0);
    }

    #[test]
    fn test_errored_session_ignores_transport() {
        let mut h = Harness::playing_asset();
        h.controller.on_media_event(PlaybackMode::FullAsset, MediaEvent::Error(ErrorKind::SourceUnavailable));
        h.calls.borrow_mut().clear();

        h.controller.toggle_playback();
        h.controller.seek(10.0);
        h.controller.set_volume(0.2);
        h.controller.toggle_mute();
        h.controller.toggle_fullscreen();
        h.clock.advance(Duration::from_secs(5));
        h.controller.tick();

        assert!(h.calls().is_empty());
        assert_eq!(h.controller.session().volume, 1.0);
        assert!(!h.controller.session().playing);
    }

    #[test]
    fn test_control_failure_keeps_state() {
        let mut h = Harness::playing_asset();
        h.native_fail.set(true);

        h.controller.toggle_playback();
        assert!(h.controller.session().playing);
        assert_eq!(h.controller.state(), PlaybackState::Playing);

        h.controller.set_volume(0.0);
        assert_eq!(h.controller.session().volume, 1.0);
        assert!(!h.controller.session().muted);
    }

    #[test]
    fn test_trailer_refused_without_key() {
        let mut h = Harness::new(false);
        assert!(!h.controller.trailer_available());
        assert!(matches!(
            h.controller.select_mode(PlaybackMode::Trailer),
            Err(CoreError::TrailerUnavailable)
        ));
        assert_eq!(h.controller.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_trailer_mode_dispatches_to_embed() {
        let mut h = Harness::new(true);
        h.controller.select_mode(PlaybackMode::Trailer).unwrap();
        h.clock.advance(Duration::from_secs(1));
        h.controller.tick();
        assert_eq!(h.controller.state(), PlaybackState::Playing);

        h.controller.toggle_mute();
        h.controller.toggle_playback();
        assert_eq!(h.calls(), vec!["trailer:play", "trailer:muted true", "trailer:pause"]);
        assert_eq!(h.controller.state(), PlaybackState::Paused);
    }

    #[test]
    fn test_trailer_seek_uses_last_known_duration() {
        let mut h = Harness::new(true);
        h.controller.select_mode(PlaybackMode::Trailer).unwrap();
        h.clock.advance(Duration::from_secs(1));
        h.controller.tick();

        h.controller.seek(500.0);
        assert_eq!(h.controller.session().current_time, 500.0);

        h.controller.on_media_event(PlaybackMode::Trailer, MediaEvent::Loaded { duration: 150.0 });
        h.controller.seek(500.0);
        assert_eq!(h.controller.session().current_time, 150.0);
    }

    #[test]
    fn test_stale_backend_events_are_dropped() {
        let mut h = Harness::playing_asset();
        h.controller.select_mode(PlaybackMode::Trailer).unwrap();

        h.controller.on_media_event(PlaybackMode::FullAsset, MediaEvent::TimeUpdate { current: 99.0 });
        h.controller.on_media_event(PlaybackMode::FullAsset, MediaEvent::Error(ErrorKind::SourceUnavailable));
        assert_eq!(h.controller.session().current_time, 0.0);
        assert_eq!(h.controller.state(), PlaybackState::Loading);
    }

    #[test]
    fn test_mode_switch_replaces_pending_autoplay() {
        let mut h = Harness::new(true);
        h.controller.select_mode(PlaybackMode::FullAsset).unwrap();
        h.clock.advance(Duration::from_millis(600));
        h.controller.select_mode(PlaybackMode::Trailer).unwrap();

        // First deadline has passed, the replacement has not
        h.clock.advance(Duration::from_millis(500));
        h.controller.tick();
        assert!(h.calls().is_empty());

        h.clock.advance(Duration::from_millis(500));
        h.controller.tick();
        assert_eq!(h.calls(), vec!["trailer:play"]);
    }

    #[test]
    fn test_close_cancels_pending_timers() {
        let mut h = Harness::new(true);
        h.controller.select_mode(PlaybackMode::FullAsset).unwrap();
        h.controller.pointer_moved();
        h.controller.close();
        assert!(h.controller.pending_autoplay().is_none());
        assert!(h.controller.controls().deadline().is_none());

        h.clock.advance(Duration::from_secs(10));
        h.controller.tick();
        h.controller.on_media_event(PlaybackMode::FullAsset, MediaEvent::Playing);
        h.controller.toggle_playback();

        assert_eq!(h.calls(), vec!["native:detach", "trailer:detach"]);
        assert_eq!(h.controller.state(), PlaybackState::Idle);
        assert!(matches!(
            h.controller.select_mode(PlaybackMode::FullAsset),
            Err(CoreError::SessionClosed)
        ));
    }

    #[test]
    fn test_controls_hide_after_inactivity_while_playing() {
        let mut h = Harness::new(false);
        h.controller.select_mode(PlaybackMode::FullAsset).unwrap();
        h.clock.advance(Duration::from_secs(1));
        h.controller.tick();
        h.controller.on_media_event(PlaybackMode::FullAsset, MediaEvent::Playing);

        h.clock.advance(Duration::from_secs(2));
        h.controller.pointer_moved();
        h.clock.advance(Duration::from_secs(2));
        h.controller.tick();
        assert!(h.controller.controls_visible());

        h.clock.advance(Duration::from_secs(1));
        h.controller.tick();
        assert!(!h.controller.controls_visible());

        h.controller.pointer_moved();
        assert!(h.controller.controls_visible());
    }

    #[test]
    fn test_paused_controls_stay_visible() {
        let mut h = Harness::playing_asset();
        h.controller.toggle_playback();
        h.clock.advance(Duration::from_secs(10));
        h.controller.tick();
        assert!(h.controller.controls_visible());
    }

    #[test]
    fn test_fullscreen_follows_host_notification() {
        let mut h = Harness::playing_asset();
        h.controller.handle_key(KeyAction::ToggleFullscreen);
        assert!(!h.controller.is_fullscreen());
        assert_eq!(h.calls(), vec!["host:enter"]);

        h.controller.on_fullscreen_change(true);
        assert!(h.controller.is_fullscreen());

        h.controller.toggle_fullscreen();
        assert_eq!(h.calls(), vec!["host:enter", "host:exit"]);
    }

    #[test]
    fn test_ended_pauses_session() {
        let mut h = Harness::playing_asset();
        h.controller.on_media_event(PlaybackMode::FullAsset, MediaEvent::Ended);
        assert!(!h.controller.session().playing);
        assert_eq!(h.controller.state(), PlaybackState::Paused);
    }

    #[test]
    fn test_waiting_returns_to_loading() {
        let mut h = Harness::playing_asset();
        h.controller.on_media_event(PlaybackMode::FullAsset, MediaEvent::Waiting);
        assert_eq!(h.controller.state(), PlaybackState::Loading);
        h.controller.on_media_event(PlaybackMode::FullAsset, MediaEvent::Playing);
        assert_eq!(h.controller.state(), PlaybackState::Playing);
    }
}

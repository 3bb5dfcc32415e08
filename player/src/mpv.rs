//! mpv over its JSON IPC socket.
//!
//! One mpv process serves a playback view. The native backend and the
//! trailer bridge share it and load their own URL on first use, so the
//! process always shows the asset of the active mode.

use std::cell::RefCell;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::rc::Rc;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::{Duration, Instant};

use basestream_core::error::{CoreError, CoreResult};
use basestream_core::playback::{
    EmbedCommand, ErrorKind, FullscreenHost, MediaEvent, MessageSink, PlaybackBackend, PlaybackMode,
};
use serde_json::{Value, json};

/// An mpv event tagged with the load it belongs to
pub type TaggedEvent = (u64, MpvEvent);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
const CONNECT_RETRY: Duration = Duration::from_millis(50);

/// Properties observed on every connection, numbered by position
const OBSERVED: [&str; 6] = ["time-pos", "duration", "pause", "paused-for-cache", "eof-reached", "fullscreen"];

/// Something mpv told us
#[derive(Debug, Clone, PartialEq)]
pub enum MpvEvent {
    Media(MediaEvent),
    Fullscreen(bool),
    /// The IPC connection closed
    Exited,
}

/// Translate one mpv IPC message
fn parse_event(msg: &Value) -> Option<MpvEvent> {
    match msg["event"].as_str()? {
        "property-change" => {
            let data = &msg["data"];
            match msg["name"].as_str()? {
                "time-pos" => data
                    .as_f64()
                    .map(|current| MpvEvent::Media(MediaEvent::TimeUpdate { current })),
                "duration" => data
                    .as_f64()
                    .map(|duration| MpvEvent::Media(MediaEvent::Loaded { duration })),
                "pause" => data.as_bool().map(|paused| {
                    MpvEvent::Media(if paused { MediaEvent::Paused } else { MediaEvent::Playing })
                }),
                "paused-for-cache" => data
                    .as_bool()
                    .filter(|waiting| *waiting)
                    .map(|_| MpvEvent::Media(MediaEvent::Waiting)),
                "eof-reached" => data
                    .as_bool()
                    .filter(|eof| *eof)
                    .map(|_| MpvEvent::Media(MediaEvent::Ended)),
                "fullscreen" => data.as_bool().map(MpvEvent::Fullscreen),
                _ => None,
            }
        }
        "end-file" if msg["reason"] == "error" => {
            let detail = msg["file_error"].as_str().unwrap_or_default();
            let kind = if detail.contains("format") || detail.contains("demux") {
                ErrorKind::DecodeFailure
            } else {
                ErrorKind::SourceUnavailable
            };
            log::warn!("mpv failed to play file: {}", detail);
            Some(MpvEvent::Media(MediaEvent::Error(kind)))
        }
        _ => None,
    }
}

/// Numbers the files mpv starts so each event can be matched to the
/// `loadfile` that produced it
struct FileTracker {
    generation: u64,
}

impl FileTracker {
    fn observe(&mut self, line: &str) -> Option<TaggedEvent> {
        let msg: Value = serde_json::from_str(line).ok()?;
        if msg["event"] == "start-file" {
            self.generation += 1;
            return None;
        }
        parse_event(&msg).map(|event| (self.generation, event))
    }
}

/// The mpv process and its command connection
pub struct MpvIpc {
    mpv_path: String,
    socket_path: PathBuf,
    process: Option<Child>,
    writer: Option<UnixStream>,
    events: Sender<TaggedEvent>,
    loaded: Option<PlaybackMode>,
    /// Files requested so far, across restarts
    generation: u64,
    request_id: u64,
}

pub type SharedMpv = Rc<RefCell<MpvIpc>>;

impl MpvIpc {
    pub fn new(mpv_path: impl Into<String>, events: Sender<TaggedEvent>) -> Self {
        let socket_path = std::env::temp_dir().join(format!("basestream-mpv-{}.sock", std::process::id()));
        Self {
            mpv_path: mpv_path.into(),
            socket_path,
            process: None,
            writer: None,
            events,
            loaded: None,
            generation: 0,
            request_id: 1,
        }
    }

    pub fn shared(self) -> SharedMpv {
        Rc::new(RefCell::new(self))
    }

    /// Mode an event of `generation` belongs to; `None` once a later file
    /// has been requested
    pub fn mode_of(&self, generation: u64) -> Option<PlaybackMode> {
        if generation == self.generation {
            self.loaded
        } else {
            None
        }
    }

    fn ensure_running(&mut self) -> CoreResult<()> {
        if self.writer.is_some() {
            return Ok(());
        }

        let _ = std::fs::remove_file(&self.socket_path);
        log::info!("Spawning {} with IPC at {}", self.mpv_path, self.socket_path.display());
        let child = Command::new(&self.mpv_path)
            .arg(format!("--input-ipc-server={}", self.socket_path.display()))
            .arg("--idle=yes")
            .arg("--force-window=yes")
            .arg("--keep-open=yes")
            .arg("--pause=yes")
            .arg("--osc=no")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| CoreError::control(format!("failed to spawn {}: {}", self.mpv_path, e)))?;
        self.process = Some(child);

        // Wait for the socket off the async workers
        let stream = tokio::task::block_in_place(|| self.connect())?;
        let reader = stream.try_clone()?;
        self.writer = Some(stream);

        let events = self.events.clone();
        let mut tracker = FileTracker {
            generation: self.generation,
        };
        thread::spawn(move || {
            for line in BufReader::new(reader).lines() {
                let Ok(line) = line else { break };
                if let Some(event) = tracker.observe(&line) {
                    if events.send(event).is_err() {
                        return;
                    }
                }
            }
            let _ = events.send((tracker.generation, MpvEvent::Exited));
        });

        for (id, property) in OBSERVED.iter().enumerate() {
            self.send(vec![json!("observe_property"), json!(id + 1), json!(property)])?;
        }
        Ok(())
    }

    fn connect(&self) -> CoreResult<UnixStream> {
        let started = Instant::now();
        loop {
            match UnixStream::connect(&self.socket_path) {
                Ok(stream) => return Ok(stream),
                Err(e) if started.elapsed() >= CONNECT_TIMEOUT => {
                    return Err(CoreError::control(format!("mpv IPC unavailable: {}", e)));
                }
                Err(_) => thread::sleep(CONNECT_RETRY),
            }
        }
    }

    fn send(&mut self, command: Vec<Value>) -> CoreResult<()> {
        let payload = json!({ "command": command, "request_id": self.request_id });
        self.request_id += 1;

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| CoreError::control("mpv is not running"))?;
        log::debug!("mpv <- {}", payload);
        writeln!(writer, "{}", payload)?;
        writer.flush()?;
        Ok(())
    }

    /// Make sure `url` is the loaded file for `mode`
    pub fn load(&mut self, mode: PlaybackMode, url: &str) -> CoreResult<()> {
        self.ensure_running()?;
        if self.loaded == Some(mode) {
            return Ok(());
        }
        log::info!("Loading {} asset {}", mode.label(), url);
        self.send(vec![json!("loadfile"), json!(url), json!("replace")])?;
        self.generation += 1;
        self.loaded = Some(mode);
        Ok(())
    }

    pub fn set_property(&mut self, name: &str, value: Value) -> CoreResult<()> {
        self.send(vec![json!("set_property"), json!(name), value])
    }

    pub fn seek(&mut self, seconds: f64) -> CoreResult<()> {
        self.send(vec![json!("seek"), json!(seconds), json!("absolute")])
    }

    /// Quit mpv; a later load starts a fresh process
    pub fn stop(&mut self) {
        if self.writer.is_some() {
            let _ = self.send(vec![json!("quit")]);
        }
        self.writer = None;
        self.loaded = None;
        if let Some(mut child) = self.process.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

impl Drop for MpvIpc {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Full-asset backend: the catalog file played directly by mpv
pub struct MpvElement {
    mpv: SharedMpv,
    url: String,
}

impl MpvElement {
    pub fn new(mpv: SharedMpv, url: impl Into<String>) -> Self {
        Self { mpv, url: url.into() }
    }

    fn with_loaded<F>(&mut self, f: F) -> CoreResult<()>
    where
        F: FnOnce(&mut MpvIpc) -> CoreResult<()>,
    {
        let mut mpv = self.mpv.borrow_mut();
        mpv.load(PlaybackMode::FullAsset, &self.url)?;
        f(&mut mpv)
    }
}

impl PlaybackBackend for MpvElement {
    fn play(&mut self) -> CoreResult<()> {
        self.with_loaded(|mpv| mpv.set_property("pause", json!(false)))
    }

    fn pause(&mut self) -> CoreResult<()> {
        self.with_loaded(|mpv| mpv.set_property("pause", json!(true)))
    }

    fn seek(&mut self, seconds: f64) -> CoreResult<()> {
        self.with_loaded(|mpv| mpv.seek(seconds))
    }

    fn set_volume(&mut self, volume: f64) -> CoreResult<()> {
        self.with_loaded(|mpv| mpv.set_property("volume", json!((volume * 100.0).round())))
    }

    fn set_muted(&mut self, muted: bool) -> CoreResult<()> {
        self.with_loaded(|mpv| mpv.set_property("mute", json!(muted)))
    }

    fn detach(&mut self) {
        self.mpv.borrow_mut().stop();
    }
}

/// Receives embed protocol messages and replays them on mpv, which plays
/// the trailer from its watch URL
pub struct MpvEmbedSink {
    mpv: SharedMpv,
    url: String,
}

impl MpvEmbedSink {
    pub fn new(mpv: SharedMpv, url: impl Into<String>) -> Self {
        Self { mpv, url: url.into() }
    }
}

impl MessageSink for MpvEmbedSink {
    fn post_message(&mut self, message: &str) -> CoreResult<()> {
        let command = EmbedCommand::from_message(message)?;
        let mut mpv = self.mpv.borrow_mut();
        mpv.load(PlaybackMode::Trailer, &self.url)?;
        match command {
            EmbedCommand::PlayVideo => mpv.set_property("pause", json!(false)),
            EmbedCommand::PauseVideo => mpv.set_property("pause", json!(true)),
            EmbedCommand::Mute => mpv.set_property("mute", json!(true)),
            EmbedCommand::UnMute => mpv.set_property("mute", json!(false)),
            EmbedCommand::SetVolume(percent) => mpv.set_property("volume", json!(percent)),
            EmbedCommand::SeekTo(seconds) => mpv.seek(seconds),
        }
    }

    fn close(&mut self) {
        self.mpv.borrow_mut().stop();
    }
}

/// Fullscreen requests go to the mpv window
pub struct MpvFullscreen {
    mpv: SharedMpv,
}

impl MpvFullscreen {
    pub fn new(mpv: SharedMpv) -> Self {
        Self { mpv }
    }
}

impl FullscreenHost for MpvFullscreen {
    fn request_fullscreen(&mut self) -> CoreResult<()> {
        self.mpv.borrow_mut().set_property("fullscreen", json!(true))
    }

    fn exit_fullscreen(&mut self) -> CoreResult<()> {
        self.mpv.borrow_mut().set_property("fullscreen", json!(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Option<MpvEvent> {
        parse_event(&serde_json::from_str(line).ok()?)
    }

    #[test]
    fn test_parse_property_changes() {
        assert_eq!(
            parse(r#"{"event":"property-change","id":1,"name":"time-pos","data":12.5}"#),
            Some(MpvEvent::Media(MediaEvent::TimeUpdate { current: 12.5 }))
        );
        assert_eq!(
            parse(r#"{"event":"property-change","id":2,"name":"duration","data":5640.0}"#),
            Some(MpvEvent::Media(MediaEvent::Loaded { duration: 5640.0 }))
        );
        assert_eq!(
            parse(r#"{"event":"property-change","id":3,"name":"pause","data":false}"#),
            Some(MpvEvent::Media(MediaEvent::Playing))
        );
        assert_eq!(
            parse(r#"{"event":"property-change","id":6,"name":"fullscreen","data":true}"#),
            Some(MpvEvent::Fullscreen(true))
        );
    }

    #[test]
    fn test_parse_ignores_noise() {
        assert_eq!(parse(r#"{"event":"property-change","name":"time-pos","data":null}"#), None);
        assert_eq!(parse(r#"{"event":"property-change","name":"eof-reached","data":false}"#), None);
        assert_eq!(parse(r#"{"request_id":3,"error":"success"}"#), None);
        assert_eq!(parse("garbage"), None);
    }

    #[test]
    fn test_parse_end_file_errors() {
        assert_eq!(
            parse(r#"{"event":"end-file","reason":"error","file_error":"loading failed"}"#),
            Some(MpvEvent::Media(MediaEvent::Error(ErrorKind::SourceUnavailable)))
        );
        assert_eq!(
            parse(r#"{"event":"end-file","reason":"error","file_error":"unrecognized file format"}"#),
            Some(MpvEvent::Media(MediaEvent::Error(ErrorKind::DecodeFailure)))
        );
        assert_eq!(parse(r#"{"event":"end-file","reason":"eof"}"#), None);
    }

    #[test]
    fn test_events_are_tagged_by_started_file() {
        let mut tracker = FileTracker { generation: 2 };
        let time = r#"{"event":"property-change","id":1,"name":"time-pos","data":40.0}"#;

        assert_eq!(
            tracker.observe(time),
            Some((2, MpvEvent::Media(MediaEvent::TimeUpdate { current: 40.0 })))
        );
        assert_eq!(tracker.observe(r#"{"event":"start-file","playlist_entry_id":3}"#), None);
        assert_eq!(
            tracker.observe(time),
            Some((3, MpvEvent::Media(MediaEvent::TimeUpdate { current: 40.0 })))
        );
        assert_eq!(tracker.observe("garbage"), None);
    }

    #[test]
    fn test_stale_generations_have_no_mode() {
        let (tx, _rx) = std::sync::mpsc::channel();
        let mut mpv = MpvIpc::new("mpv", tx);
        mpv.generation = 4;
        mpv.loaded = Some(PlaybackMode::Trailer);

        assert_eq!(mpv.mode_of(4), Some(PlaybackMode::Trailer));
        assert_eq!(mpv.mode_of(3), None);
        assert_eq!(mpv.mode_of(0), None);
    }

    #[test]
    fn test_commands_fail_without_process() {
        let (tx, _rx) = std::sync::mpsc::channel();
        let mut mpv = MpvIpc::new("mpv", tx);
        assert!(mpv.set_property("pause", json!(true)).is_err());
        assert_eq!(mpv.mode_of(0), None);
    }
}

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::PlaybackBackend;
use crate::error::{CoreError, CoreResult};

/// Remote-control commands understood by the embedded trailer player
#[derive(Debug, Clone, PartialEq)]
pub enum EmbedCommand {
    PlayVideo,
    PauseVideo,
    Mute,
    UnMute,
    /// Volume as a percentage, 0-100
    SetVolume(u8),
    /// Absolute position in seconds
    SeekTo(f64),
}

/// Wire envelope of the embed remote-control protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedMessage {
    pub event: String,
    pub func: String,
    pub args: Value,
}

impl EmbedCommand {
    fn func(&self) -> &'static str {
        match self {
            EmbedCommand::PlayVideo => "playVideo",
            EmbedCommand::PauseVideo => "pauseVideo",
            EmbedCommand::Mute => "mute",
            EmbedCommand::UnMute => "unMute",
            EmbedCommand::SetVolume(_) => "setVolume",
            EmbedCommand::SeekTo(_) => "seekTo",
        }
    }

    fn args(&self) -> Value {
        match self {
            EmbedCommand::SetVolume(percent) => json!([percent]),
            EmbedCommand::SeekTo(seconds) => json!([seconds, true]),
            _ => Value::String(String::new()),
        }
    }

    /// Build the message envelope for this command
    pub fn to_envelope(&self) -> EmbedMessage {
        EmbedMessage {
            event: "command".to_string(),
            func: self.func().to_string(),
            args: self.args(),
        }
    }

    /// Encode as the JSON string posted to the embed
    pub fn to_message(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(&self.to_envelope())?)
    }

    /// Decode a posted message back into a command.
    ///
    /// Used by hosts that bridge the embed protocol onto another player.
    pub fn from_message(message: &str) -> CoreResult<Self> {
        let envelope: EmbedMessage = serde_json::from_str(message)?;
        if envelope.event != "command" {
            return Err(CoreError::control(format!("unexpected embed event '{}'", envelope.event)));
        }

        let first_arg = || envelope.args.as_array().and_then(|a| a.first()).and_then(Value::as_f64);

        let command = match envelope.func.as_str() {
            "playVideo" => EmbedCommand::PlayVideo,
            "pauseVideo" => EmbedCommand::PauseVideo,
            "mute" => EmbedCommand::Mute,
            "unMute" => EmbedCommand::UnMute,
            "setVolume" => {
                let percent = first_arg().ok_or_else(|| CoreError::control("setVolume without a level"))?;
                EmbedCommand::SetVolume(percent.clamp(0.0, 100.0).round() as u8)
            }
            "seekTo" => {
                let seconds = first_arg().ok_or_else(|| CoreError::control("seekTo without a position"))?;
                EmbedCommand::SeekTo(seconds)
            }
            other => return Err(CoreError::control(format!("unknown embed command '{}'", other))),
        };
        Ok(command)
    }
}

/// Channel that delivers encoded messages to the embedded player
pub trait MessageSink {
    fn post_message(&mut self, message: &str) -> CoreResult<()>;

    /// Tear the channel down; further messages are dropped
    fn close(&mut self) {}
}

/// Trailer backend: turns transport calls into embed protocol messages
pub struct EmbeddedPlayer<S: MessageSink> {
    video_id: String,
    sink: S,
}

impl<S: MessageSink> EmbeddedPlayer<S> {
    pub fn new(video_id: impl Into<String>, sink: S) -> Self {
        Self {
            video_id: video_id.into(),
            sink,
        }
    }

    fn send(&mut self, command: EmbedCommand) -> CoreResult<()> {
        let message = command.to_message()?;
        debug!("Embed {} <- {}", self.video_id, message);
        self.sink.post_message(&message)
    }
}

impl<S: MessageSink> PlaybackBackend for EmbeddedPlayer<S> {
    fn play(&mut self) -> CoreResult<()> {
        self.send(EmbedCommand::PlayVideo)
    }

    fn pause(&mut self) -> CoreResult<()> {
        self.send(EmbedCommand::PauseVideo)
    }

    fn seek(&mut self, seconds: f64) -> CoreResult<()> {
        self.send(EmbedCommand::SeekTo(seconds))
    }

    fn set_volume(&mut self, volume: f64) -> CoreResult<()> {
        let percent = (volume.clamp(0.0, 1.0) * 100.0).round() as u8;
        self.send(EmbedCommand::SetVolume(percent))
    }

    fn set_muted(&mut self, muted: bool) -> CoreResult<()> {
        self.send(if muted { EmbedCommand::Mute } else { EmbedCommand::UnMute })
    }

    fn detach(&mut self) {
        self.sink.close();
    }
}

/// Canonical watch URL for a video id
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Extract the video id from a YouTube URL
pub fn extract_youtube_id(url: &str) -> Option<String> {
    for marker in ["youtube.com/watch?v=", "youtu.be/", "youtube.com/embed/"] {
        if let Some(pos) = url.find(marker) {
            let id_start = pos + marker.len();
            let id_end = url[id_start..]
                .find(&['&', '#', '?', '/'][..])
                .unwrap_or(url.len() - id_start)
                + id_start;
            let id = &url[id_start..id_end];
            return if id.is_empty() { None } else { Some(id.to_string()) };
        }
    }
    None
}

/// Check if a URL points at YouTube
pub fn is_youtube_url(url: &str) -> bool {
    url.contains("youtube.com/watch") || url.contains("youtu.be/") || url.contains("youtube.com/embed/")
}

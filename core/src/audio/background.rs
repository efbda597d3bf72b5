//! Background audio for the voice session.
//!
//! While a tool call is in flight the agent plays a "thinking" sound so the
//! caller does not sit in silence. Playback is owned by a [`ThinkingCue`]
//! guard: the sound lasts exactly as long as the guard, so dropping the turn
//! future (user barge-in, shutdown) silences it too.
//!
//! Env overrides:
//! - CUE_PLAYER (default `ffplay`)
//! - BACKGROUND_AUDIO_ASSETS_DIR (directory holding the builtin clips)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Audio file not found: {0}")]
    MissingFile(PathBuf),

    #[error("Failed to start player {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Clips shipped alongside the agent
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinClip {
    OfficeAmbience,
    KeyboardTyping,
    KeyboardTyping2,
    HoldMusic,
}

impl BuiltinClip {
    pub fn file_name(&self) -> &'static str {
        match self {
            BuiltinClip::OfficeAmbience => "office-ambience.ogg",
            BuiltinClip::KeyboardTyping => "keyboard-typing.ogg",
            BuiltinClip::KeyboardTyping2 => "keyboard-typing2.ogg",
            BuiltinClip::HoldMusic => "hold_music.ogg",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum AudioSource {
    File(PathBuf),
    Builtin(BuiltinClip),
}

impl AudioSource {
    pub fn resolve(&self, assets_dir: &Path) -> PathBuf {
        match self {
            AudioSource::File(p) => p.clone(),
            AudioSource::Builtin(clip) => assets_dir.join(clip.file_name()),
        }
    }
}

/// A sound and the volume to play it at (0.0–1.0)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioConfig {
    pub source: AudioSource,
    pub volume: f32,
}

impl AudioConfig {
    pub fn new(source: AudioSource, volume: f32) -> Self {
        Self {
            source,
            volume: volume.clamp(0.0, 1.0),
        }
    }

    pub fn file(path: impl Into<PathBuf>, volume: f32) -> Self {
        Self::new(AudioSource::File(path.into()), volume)
    }

    pub fn builtin(clip: BuiltinClip, volume: f32) -> Self {
        Self::new(AudioSource::Builtin(clip), volume)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BackgroundAudioConfig {
    pub thinking_sounds: Vec<AudioConfig>,
    pub ambient_sound: Option<AudioConfig>,
    pub assets_dir: PathBuf,
}

impl Default for BackgroundAudioConfig {
    fn default() -> Self {
        Self {
            thinking_sounds: vec![AudioConfig::file("sound/ringtone.mp3", 0.7)],
            ambient_sound: None,
            assets_dir: std::env::var("BACKGROUND_AUDIO_ASSETS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("sound")),
        }
    }
}

/// Handle to a sound that is currently playing. Stops on drop.
pub struct CuePlayback {
    stop: Option<Box<dyn FnOnce() + Send>>,
}

impl CuePlayback {
    pub fn new(stop: impl FnOnce() + Send + 'static) -> Self {
        Self {
            stop: Some(Box::new(stop)),
        }
    }

    pub fn stop(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop();
        }
    }
}

impl Drop for CuePlayback {
    fn drop(&mut self) {
        self.halt();
    }
}

/// Something that can loop a sound until told to stop
pub trait CuePlayer: Send + Sync {
    fn play(&self, path: &Path, volume: f32) -> Result<CuePlayback, AudioError>;
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CuePlayerConfig {
    pub program: String,
    pub enabled: bool,
}

impl Default for CuePlayerConfig {
    fn default() -> Self {
        Self {
            program: std::env::var("CUE_PLAYER")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "ffplay".to_string()),
            enabled: true,
        }
    }
}

/// Plays cues through an external player process
pub struct CommandCuePlayer {
    program: String,
}

impl CommandCuePlayer {
    pub fn new(config: &CuePlayerConfig) -> Self {
        Self {
            program: config.program.clone(),
        }
    }

    /// Player arguments for looping `path` at `volume`
    pub fn args_for(&self, path: &Path, volume: f32) -> Vec<String> {
        let name = Path::new(&self.program)
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let percent = (volume.clamp(0.0, 1.0) * 100.0).round() as u32;
        let file = path.to_string_lossy().into_owned();
        match name {
            "ffplay" => vec![
                "-nodisp".into(),
                "-loglevel".into(),
                "quiet".into(),
                "-loop".into(),
                "0".into(),
                "-volume".into(),
                percent.to_string(),
                file,
            ],
            "mpv" => vec![
                "--no-video".into(),
                "--really-quiet".into(),
                "--loop=inf".into(),
                format!("--volume={}", percent),
                file,
            ],
            _ => vec![file],
        }
    }
}

impl CuePlayer for CommandCuePlayer {
    fn play(&self, path: &Path, volume: f32) -> Result<CuePlayback, AudioError> {
        if !path.exists() {
            return Err(AudioError::MissingFile(path.to_path_buf()));
        }
        let mut child = Command::new(&self.program)
            .args(self.args_for(path, volume))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| AudioError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        debug!(target: "background_audio", program = %self.program, path = ?path, "Cue player started");
        Ok(CuePlayback::new(move || {
            let _ = child.start_kill();
        }))
    }
}

/// Thinking sound bound to one tool turn
#[must_use = "the cue stops as soon as it is dropped"]
pub struct ThinkingCue {
    playback: Option<CuePlayback>,
}

impl ThinkingCue {
    pub fn silent() -> Self {
        Self { playback: None }
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_some()
    }
}

/// Background audio for one session
pub struct BackgroundAudio {
    player: Arc<dyn CuePlayer>,
    config: BackgroundAudioConfig,
    next_thinking: AtomicUsize,
    ambient: Mutex<Option<CuePlayback>>,
}

impl BackgroundAudio {
    pub fn new(player: Arc<dyn CuePlayer>, config: BackgroundAudioConfig) -> Self {
        Self {
            player,
            config,
            next_thinking: AtomicUsize::new(0),
            ambient: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &BackgroundAudioConfig {
        &self.config
    }

    /// Start the next thinking sound (round-robin over the configured list).
    ///
    /// Playback problems are logged and yield a silent cue; a missing sound
    /// never fails the turn.
    pub fn thinking(&self) -> ThinkingCue {
        if self.config.thinking_sounds.is_empty() {
            return ThinkingCue::silent();
        }
        let idx = self.next_thinking.fetch_add(1, Ordering::Relaxed)
            % self.config.thinking_sounds.len();
        let sound = &self.config.thinking_sounds[idx];
        let path = sound.source.resolve(&self.config.assets_dir);
        match self.player.play(&path, sound.volume) {
            Ok(playback) => ThinkingCue {
                playback: Some(playback),
            },
            Err(e) => {
                warn!(target: "background_audio", error = %e, "Thinking cue unavailable");
                ThinkingCue::silent()
            }
        }
    }

    /// Start the ambient loop, if one is configured. Replaces a running one.
    pub fn start_ambient(&self) -> Result<(), AudioError> {
        let Some(sound) = &self.config.ambient_sound else {
            return Ok(());
        };
        let path = sound.source.resolve(&self.config.assets_dir);
        let playback = self.player.play(&path, sound.volume)?;
        info!(target: "background_audio", path = ?path, "Ambient sound started");
        if let Ok(mut slot) = self.ambient.lock() {
            *slot = Some(playback);
        }
        Ok(())
    }

    pub fn stop_ambient(&self) {
        if let Ok(mut slot) = self.ambient.lock() {
            slot.take();
        }
    }
}

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use contoso_core::audio::{AudioConfig, BackgroundAudioConfig, BuiltinClip, CuePlayerConfig};
use contoso_core::config::{ConfigError, SearchConfig};
use contoso_core::session::{
    Greeting, LlmConfig, SessionConfig, SessionPlan, SttConfig, TtsConfig,
};
use contoso_core::tools::ToolRegistry;

/// High-level configuration for the voice agent
#[derive(Clone, Debug, Default)]
pub struct VoiceAgentConfig {
    pub search: SearchConfig,
    pub stt: SttConfig,
    pub llm: LlmConfig,
    pub tts: TtsConfig,
    pub session: SessionConfig,
    pub background_audio: BackgroundAudioConfig,
    pub cue_player: CuePlayerConfig,
}

impl VoiceAgentConfig {
    /// Load configuration from a TOML file (path via VOICE_AGENT_CONFIG or ./voice_agent.toml),
    /// overlaying values onto env-driven defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var("VOICE_AGENT_CONFIG").unwrap_or_else(|_| "voice_agent.toml".into());
        Self::load_from(Path::new(&path))
    }

    /// A missing file means env-only configuration; an unreadable or
    /// malformed one is fatal.
    pub fn load_from(p: &Path) -> Result<Self, ConfigError> {
        let default = Self::default();
        if !p.exists() {
            tracing::info!(target: "voice_agent", path = %p.display(), "No TOML config found; using defaults/env");
            return Ok(default);
        }
        let raw = fs::read_to_string(p).map_err(|e| ConfigError::Read {
            path: p.display().to_string(),
            message: e.to_string(),
        })?;
        let parsed = toml::from_str::<VoiceAgentToml>(&raw).map_err(|e| ConfigError::Parse {
            path: p.display().to_string(),
            message: e.to_string(),
        })?;
        tracing::info!(target: "voice_agent", path = %p.display(), "Loaded TOML config");
        Ok(parsed.overlay(default))
    }

    /// Describe the pipeline with the tools registered so far
    pub fn session_plan(&self, registry: &ToolRegistry) -> SessionPlan {
        SessionPlan::new(
            self.stt.clone(),
            self.llm.clone(),
            self.tts.clone(),
            self.session.clone(),
            self.background_audio.clone(),
            registry,
        )
    }
}

// =========================
// TOML overlay definitions
// =========================

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct VoiceAgentToml {
    pub search: Option<SearchToml>,
    pub stt: Option<SttToml>,
    pub llm: Option<LlmToml>,
    pub tts: Option<TtsToml>,
    pub session: Option<SessionToml>,
    pub background_audio: Option<BackgroundAudioToml>,
    pub cue_player: Option<CuePlayerToml>,
}

impl VoiceAgentToml {
    fn overlay(self, mut base: VoiceAgentConfig) -> VoiceAgentConfig {
        if let Some(s) = self.search {
            s.apply(&mut base.search);
        }
        if let Some(s) = self.stt {
            s.apply(&mut base.stt);
        }
        if let Some(l) = self.llm {
            l.apply(&mut base.llm);
        }
        if let Some(t) = self.tts {
            t.apply(&mut base.tts);
        }
        if let Some(s) = self.session {
            s.apply(&mut base.session);
        }
        if let Some(b) = self.background_audio {
            b.apply(&mut base.background_audio);
        }
        if let Some(c) = self.cue_player {
            c.apply(&mut base.cue_player);
        }
        base
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct SearchToml {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub delay_secs: Option<u64>,
}
impl SearchToml {
    fn apply(self, s: &mut SearchConfig) {
        if let Some(x) = self.base_url {
            s.base_url = x;
        }
        if let Some(x) = self.api_key.filter(|k| !k.is_empty()) {
            s.api_key = Some(x);
        }
        if let Some(x) = self.delay_secs {
            s.delay = (x > 0).then(|| Duration::from_secs(x));
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct SttToml {
    pub speech_key: Option<String>,
    pub speech_region: Option<String>,
    pub language: Option<String>,
}
impl SttToml {
    fn apply(self, s: &mut SttConfig) {
        if let Some(x) = self.speech_key {
            s.speech_key = Some(x);
        }
        if let Some(x) = self.speech_region {
            s.speech_region = Some(x);
        }
        if let Some(x) = self.language {
            s.language = x;
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct LlmToml {
    pub model: Option<String>,
}
impl LlmToml {
    fn apply(self, l: &mut LlmConfig) {
        if let Some(x) = self.model {
            l.model = x;
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct TtsToml {
    pub model: Option<String>,
    pub voice: Option<String>,
}
impl TtsToml {
    fn apply(self, t: &mut TtsConfig) {
        if let Some(x) = self.model {
            t.model = x;
        }
        if let Some(x) = self.voice {
            t.voice = x;
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct SessionToml {
    pub instructions: Option<String>,
    /// Empty string disables the opening line
    pub greeting: Option<String>,
    pub allow_interruptions: Option<bool>,
    pub turn_detection: Option<String>,
    pub vad: Option<String>,
    pub preemptive_generation: Option<bool>,
    pub room_name: Option<String>,
}
impl SessionToml {
    fn apply(self, s: &mut SessionConfig) {
        if let Some(x) = self.instructions {
            s.instructions = x;
        }
        if let Some(x) = self.greeting {
            s.greeting = if x.trim().is_empty() {
                None
            } else {
                Some(Greeting {
                    text: x,
                    allow_interruptions: true,
                })
            };
        }
        if let (Some(x), Some(g)) = (self.allow_interruptions, s.greeting.as_mut()) {
            g.allow_interruptions = x;
        }
        if let Some(x) = self.turn_detection {
            s.turn_detection = x;
        }
        if let Some(x) = self.vad {
            s.vad = x;
        }
        if let Some(x) = self.preemptive_generation {
            s.preemptive_generation = x;
        }
        if let Some(x) = self.room_name {
            s.room_name = x;
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct AudioToml {
    pub file: Option<PathBuf>,
    pub builtin: Option<BuiltinClip>,
    pub volume: Option<f32>,
}
impl AudioToml {
    fn into_audio_config(self) -> Option<AudioConfig> {
        let volume = self.volume.unwrap_or(1.0);
        match (self.file, self.builtin) {
            (Some(path), _) => Some(AudioConfig::file(path, volume)),
            (None, Some(clip)) => Some(AudioConfig::builtin(clip, volume)),
            (None, None) => {
                tracing::warn!(target: "voice_agent", "Audio entry without file or builtin; skipped");
                None
            }
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct BackgroundAudioToml {
    pub assets_dir: Option<PathBuf>,
    pub thinking_sounds: Option<Vec<AudioToml>>,
    pub ambient_sound: Option<AudioToml>,
}
impl BackgroundAudioToml {
    fn apply(self, b: &mut BackgroundAudioConfig) {
        if let Some(x) = self.assets_dir {
            b.assets_dir = x;
        }
        if let Some(x) = self.thinking_sounds {
            b.thinking_sounds = x
                .into_iter()
                .filter_map(AudioToml::into_audio_config)
                .collect();
        }
        if let Some(x) = self.ambient_sound {
            b.ambient_sound = x.into_audio_config();
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct CuePlayerToml {
    pub program: Option<String>,
    pub enabled: Option<bool>,
}
impl CuePlayerToml {
    fn apply(self, c: &mut CuePlayerConfig) {
        if let Some(x) = self.program {
            c.program = x;
        }
        if let Some(x) = self.enabled {
            c.enabled = x;
        }
    }
}

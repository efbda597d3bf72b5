use crate::audio::BackgroundAudioConfig;
use crate::config::ConfigError;
use crate::tools::{ToolDescriptor, ToolRegistry};
use serde::Serialize;

pub const AZURE_SPEECH_KEY_ENV: &str = "AZURE_SPEECH_KEY";
pub const AZURE_SPEECH_REGION_ENV: &str = "AZURE_SPEECH_REGION";

const DEFAULT_INSTRUCTIONS: &str = "You are a helpful voice AI assistant. The user is interacting with you via voice, even if you perceive the conversation as text. \
You eagerly assist users with their questions by providing information from your extensive knowledge. \
Your responses are concise, to the point, and without any complex formatting or punctuation including emojis, asterisks, or other symbols. \
You are curious, friendly, and have a sense of humor.";

const DEFAULT_GREETING: &str = "สวัดดีครับ ต้องการถามอะไรเกี่ยวกับ Contoso Bank ไหมครับ";

/// Speech-to-text settings (Azure Speech)
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SttConfig {
    pub provider: String,
    #[serde(skip_serializing)]
    pub speech_key: Option<String>,
    pub speech_region: Option<String>,
    pub language: String,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            provider: "azure".to_string(),
            speech_key: std::env::var(AZURE_SPEECH_KEY_ENV)
                .ok()
                .filter(|s| !s.is_empty()),
            speech_region: std::env::var(AZURE_SPEECH_REGION_ENV)
                .ok()
                .filter(|s| !s.is_empty()),
            language: std::env::var("STT_LANGUAGE")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "th-TH".to_string()),
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct LlmConfig {
    pub model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: std::env::var("LLM_MODEL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "openai/gpt-4.1-mini".to_string()),
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TtsConfig {
    pub model: String,
    pub voice: String,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            model: std::env::var("TTS_MODEL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "cartesia/sonic-3".to_string()),
            voice: std::env::var("TTS_VOICE")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "a167e0f3-df7e-4d52-a9c3-f949145efdab".to_string()),
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Greeting {
    pub text: String,
    pub allow_interruptions: bool,
}

/// Conversation-level settings
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SessionConfig {
    pub instructions: String,
    pub greeting: Option<Greeting>,
    pub turn_detection: String,
    pub vad: String,
    pub preemptive_generation: bool,
    pub room_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            greeting: Some(Greeting {
                text: DEFAULT_GREETING.to_string(),
                allow_interruptions: true,
            }),
            turn_detection: "multilingual".to_string(),
            vad: "silero".to_string(),
            preemptive_generation: true,
            room_name: std::env::var("ROOM_NAME").unwrap_or_else(|_| "contoso-voice".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantKind {
    Standard,
    Sip,
    Agent,
    Ingress,
    Egress,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum NoiseCancellation {
    #[serde(rename = "BVC")]
    Bvc,
    #[serde(rename = "BVCTelephony")]
    BvcTelephony,
}

impl NoiseCancellation {
    /// Telephony callers get the model tuned for narrowband audio
    pub fn for_participant(kind: ParticipantKind) -> Self {
        match kind {
            ParticipantKind::Sip => NoiseCancellation::BvcTelephony,
            _ => NoiseCancellation::Bvc,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NoiseCancellationPolicy {
    pub default: NoiseCancellation,
    pub sip: NoiseCancellation,
}

/// Declarative description of the voice pipeline handed to the media framework
#[derive(Debug, Clone, Serialize)]
pub struct SessionPlan {
    pub stt: SttConfig,
    pub llm: LlmConfig,
    pub tts: TtsConfig,
    pub session: SessionConfig,
    pub noise_cancellation: NoiseCancellationPolicy,
    pub background_audio: BackgroundAudioConfig,
    pub tools: Vec<ToolDescriptor>,
}

impl SessionPlan {
    pub fn new(
        stt: SttConfig,
        llm: LlmConfig,
        tts: TtsConfig,
        session: SessionConfig,
        background_audio: BackgroundAudioConfig,
        registry: &ToolRegistry,
    ) -> Self {
        Self {
            stt,
            llm,
            tts,
            session,
            noise_cancellation: NoiseCancellationPolicy {
                default: NoiseCancellation::for_participant(ParticipantKind::Standard),
                sip: NoiseCancellation::for_participant(ParticipantKind::Sip),
            },
            background_audio,
            tools: registry.descriptors(),
        }
    }

    /// Check the credentials the speech pipeline cannot start without
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stt.speech_key.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::MissingCredential(AZURE_SPEECH_KEY_ENV));
        }
        if self.stt.speech_region.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::MissingCredential(AZURE_SPEECH_REGION_ENV));
        }
        Ok(())
    }

    /// Span carrying the session's log context; enter it around session work
    pub fn log_span(&self) -> tracing::Span {
        tracing::info_span!("session", room = %self.session.room_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stt(key: Option<&str>, region: Option<&str>) -> SttConfig {
        SttConfig {
            provider: "azure".into(),
            speech_key: key.map(String::from),
            speech_region: region.map(String::from),
            language: "th-TH".into(),
        }
    }

    fn plan(stt: SttConfig) -> SessionPlan {
        SessionPlan::new(
            stt,
            LlmConfig {
                model: "openai/gpt-4.1-mini".into(),
            },
            TtsConfig {
                model: "cartesia/sonic-3".into(),
                voice: "v".into(),
            },
            SessionConfig::default(),
            BackgroundAudioConfig::default(),
            &ToolRegistry::new(),
        )
    }

    #[test]
    fn sip_callers_get_telephony_noise_cancellation() {
        assert_eq!(
            NoiseCancellation::for_participant(ParticipantKind::Sip),
            NoiseCancellation::BvcTelephony
        );
        assert_eq!(
            NoiseCancellation::for_participant(ParticipantKind::Standard),
            NoiseCancellation::Bvc
        );
    }

    #[test]
    fn validate_requires_azure_credentials() {
        assert!(matches!(
            plan(stt(None, Some("southeastasia"))).validate(),
            Err(ConfigError::MissingCredential("AZURE_SPEECH_KEY"))
        ));
        assert!(matches!(
            plan(stt(Some("k"), None)).validate(),
            Err(ConfigError::MissingCredential("AZURE_SPEECH_REGION"))
        ));
        assert!(plan(stt(Some("k"), Some("southeastasia"))).validate().is_ok());
    }

    #[test]
    fn plan_json_hides_speech_key() {
        let v = serde_json::to_value(plan(stt(Some("secret"), Some("r")))).unwrap();
        assert!(v["stt"].get("speech_key").is_none());
        assert_eq!(v["noise_cancellation"]["sip"], "BVCTelephony");
        assert_eq!(v["session"]["preemptive_generation"], true);
    }
}

// Background audio cues played around tool calls

pub mod background;

pub use background::{
    AudioConfig, AudioError, AudioSource, BackgroundAudio, BackgroundAudioConfig, BuiltinClip,
    CommandCuePlayer, CuePlayback, CuePlayer, CuePlayerConfig, ThinkingCue,
};

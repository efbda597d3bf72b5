pub mod plan;
pub mod turn;

pub use plan::{
    Greeting, LlmConfig, NoiseCancellation, NoiseCancellationPolicy, ParticipantKind,
    SessionConfig, SessionPlan, SttConfig, TtsConfig,
};
pub use turn::{parse_tool_calls_from_chat, ToolCallOutcome, ToolCallRequest, ToolTurn};

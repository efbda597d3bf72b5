// Contoso Voice Core Library
// Web search tool, tool turns and background cues for the voice agent

pub mod audio;
pub mod config;
pub mod search;
pub mod session;
pub mod telemetry;
pub mod tools;

// Export core types
pub use audio::{BackgroundAudio, CommandCuePlayer, CuePlayer};
pub use config::{ConfigError, SearchConfig};
pub use search::{SearchClient, SearchDepth, SearchError, SearchRequest, SearchResponse, TavilyClient};
pub use session::{SessionPlan, ToolCallOutcome, ToolCallRequest, ToolTurn};
pub use tools::{Tool, ToolDescriptor, ToolError, ToolRegistry};

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContosoError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
pub type Result<T> = std::result::Result<T, ContosoError>;

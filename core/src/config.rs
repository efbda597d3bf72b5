// Configuration shared by the search client and the web search tool.
//
// Section defaults come from the environment (loaded from `.env.local` by the
// binary); the voice agent overlays its TOML file on top and then hands the
// resulting structs to constructors explicitly.

use std::time::Duration;
use thiserror::Error;
use tracing::warn;

pub const TAVILY_API_KEY_ENV: &str = "TAVILY_API_KEY";
pub const TAVILY_SEARCH_DELAY_ENV: &str = "TAVILY_SEARCH_DELAY";
pub const TAVILY_BASE_URL_ENV: &str = "TAVILY_BASE_URL";
pub const DEFAULT_TAVILY_BASE_URL: &str = "https://api.tavily.com";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required credential: {0}")]
    MissingCredential(&'static str),

    #[error("Failed to read config {path}: {message}")]
    Read { path: String, message: String },

    #[error("Failed to parse config {path}: {message}")]
    Parse { path: String, message: String },
}

/// Search API settings
#[derive(Clone, Debug, PartialEq)]
pub struct SearchConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Artificial pause after each successful search, used to make the
    /// thinking cue audible during manual testing
    pub delay: Option<Duration>,
    pub user_agent: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var(TAVILY_BASE_URL_ENV)
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_TAVILY_BASE_URL.to_string()),
            api_key: std::env::var(TAVILY_API_KEY_ENV)
                .ok()
                .filter(|s| !s.is_empty()),
            delay: parse_delay(std::env::var(TAVILY_SEARCH_DELAY_ENV).ok().as_deref()),
            user_agent: format!("contoso-voice/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl SearchConfig {
    /// The API key, or the fatal startup error when it is absent
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingCredential(TAVILY_API_KEY_ENV))
    }
}

/// Parse the delay setting (whole seconds).
///
/// Unset, blank or malformed values mean no delay; a malformed value is
/// logged and otherwise ignored.
pub fn parse_delay(raw: Option<&str>) -> Option<Duration> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match raw.parse::<u64>() {
        Ok(0) => None,
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(e) => {
            warn!(target: "config", value = %raw, error = %e, "Ignoring malformed search delay");
            None
        }
    }
}

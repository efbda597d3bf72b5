use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::audio::{BackgroundAudio, ThinkingCue};
use crate::tools::{ToolError, ToolRegistry};

/// Tool call parsed from model output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallRequest {
    pub id: Option<String>,
    pub name: String,
    pub arguments: Value,
}

impl ToolCallRequest {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: None,
            name: name.into(),
            arguments,
        }
    }
}

/// Result of one tool call, consumed by the next model turn
#[derive(Debug)]
pub struct ToolCallOutcome {
    pub call_id: Option<String>,
    pub name: String,
    pub result: Result<Value, ToolError>,
}

impl ToolCallOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Chat Completions `role: tool` message carrying the outcome.
    ///
    /// Failures are reported as such; what to say to the user is left to
    /// the model.
    pub fn to_tool_message(&self) -> Value {
        let content = match &self.result {
            Ok(v) => v.to_string(),
            Err(e) => format!("error: {}", e),
        };
        json!({
            "role": "tool",
            "tool_call_id": self.call_id.clone().unwrap_or_default(),
            "name": self.name,
            "content": content,
        })
    }
}

/// Runs the tool calls of one model turn with the thinking cue playing
pub struct ToolTurn {
    registry: ToolRegistry,
    audio: Option<Arc<BackgroundAudio>>,
}

impl ToolTurn {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            audio: None,
        }
    }

    pub fn with_background_audio(mut self, audio: Arc<BackgroundAudio>) -> Self {
        self.audio = Some(audio);
        self
    }

    /// Execute every call concurrently; outcomes come back in call order.
    ///
    /// The thinking cue starts before the first call and stops once the last
    /// one finishes, or when this future is dropped.
    #[tracing::instrument(name = "tool_turn.run", skip(self, calls), fields(call_count = calls.len()))]
    pub async fn run(&self, calls: Vec<ToolCallRequest>) -> Vec<ToolCallOutcome> {
        if calls.is_empty() {
            return Vec::new();
        }

        let _cue = self
            .audio
            .as_ref()
            .map(|a| a.thinking())
            .unwrap_or_else(ThinkingCue::silent);

        join_all(calls.into_iter().map(|call| self.run_one(call))).await
    }

    async fn run_one(&self, call: ToolCallRequest) -> ToolCallOutcome {
        let started = Instant::now();
        let result = self.registry.call(&call.name, call.arguments).await;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        match &result {
            Ok(_) => {
                info!(target: "tool_turn", tool = %call.name, latency_ms = %latency_ms, "Tool invocation finished")
            }
            Err(e) => {
                warn!(target: "tool_turn", tool = %call.name, error = %e, latency_ms = %latency_ms, "Tool invocation failed")
            }
        }

        ToolCallOutcome {
            call_id: call.id,
            name: call.name,
            result,
        }
    }
}

/// Extract tool calls from a Chat Completions response
pub fn parse_tool_calls_from_chat(v: &Value) -> Vec<ToolCallRequest> {
    let mut calls = Vec::new();
    let Some(tc_arr) = v
        .get("choices")
        .and_then(|x| x.as_array())
        .and_then(|arr| arr.first())
        .and_then(|first| first.get("message"))
        .and_then(|m| m.get("tool_calls"))
        .and_then(|x| x.as_array())
    else {
        return calls;
    };

    for tc in tc_arr {
        let id = tc.get("id").and_then(|x| x.as_str()).map(|s| s.to_string());
        let Some(func) = tc.get("function") else {
            continue;
        };
        let name = func
            .get("name")
            .and_then(|n| n.as_str())
            .unwrap_or("")
            .to_string();
        let arguments = match func.get("arguments") {
            Some(Value::String(s)) => serde_json::from_str::<Value>(s).unwrap_or(json!({})),
            Some(v) => v.clone(),
            None => json!({}),
        };
        if name.is_empty() {
            continue;
        }
        calls.push(ToolCallRequest {
            id,
            name,
            arguments,
        });
    }

    debug!(target: "tool_turn", calls = calls.len(), "Parsed tool calls");
    calls
}

use super::error::ToolResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// The core trait for every tool exposed to the language model
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name the model uses to call the tool (e.g., "search_web")
    fn name(&self) -> String;

    /// Natural-language guidance telling the model when to use the tool
    fn description(&self) -> String;

    /// The JSON Schema for the tool's arguments
    fn parameters(&self) -> Value;

    /// Execute the tool with the given arguments
    async fn call(&self, arguments: Value) -> ToolResult<Value>;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name(),
            description: self.description(),
            parameters: self.parameters(),
        }
    }
}

/// What the orchestrator needs to advertise a tool to the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDescriptor {
    /// Chat Completions `tools[]` entry
    pub fn to_openai_function(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

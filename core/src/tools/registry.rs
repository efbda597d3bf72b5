use super::error::{ToolError, ToolResult};
use super::traits::{Tool, ToolDescriptor};
use dashmap::DashMap;
use opentelemetry::{
    global,
    metrics::{Counter, Histogram, UpDownCounter},
    KeyValue,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Tools registered for a session, looked up by the name the model uses
#[derive(Clone)]
pub struct ToolRegistry {
    tools: Arc<DashMap<String, Arc<dyn Tool>>>,
    call_timeout: Option<Duration>,

    invocations_counter: Counter<u64>,
    errors_counter: Counter<u64>,
    timeouts_counter: Counter<u64>,
    invoke_latency: Histogram<f64>,
    registered_tools_gauge: UpDownCounter<i64>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    /// Registry without a per-call deadline
    pub fn new() -> Self {
        let meter = global::meter("contoso.tool_registry");

        let invocations_counter = meter
            .u64_counter("contoso.tool_registry.invocations_total")
            .with_description("Total number of tool invocations")
            .init();

        let errors_counter = meter
            .u64_counter("contoso.tool_registry.errors_total")
            .with_description("Total number of failed tool invocations")
            .init();

        let timeouts_counter = meter
            .u64_counter("contoso.tool_registry.timeouts_total")
            .with_description("Total number of tool invocations that hit the deadline")
            .init();

        let invoke_latency = meter
            .f64_histogram("contoso.tool_registry.invoke_latency_ms")
            .with_description("Tool invocation latency in milliseconds")
            .init();

        let registered_tools_gauge = meter
            .i64_up_down_counter("contoso.tool_registry.registered_tools")
            .with_description("Number of registered tools")
            .init();

        Self {
            tools: Arc::new(DashMap::new()),
            call_timeout: None,
            invocations_counter,
            errors_counter,
            timeouts_counter,
            invoke_latency,
            registered_tools_gauge,
        }
    }

    /// Bound every call by `call_timeout`
    pub fn with_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = Some(call_timeout);
        self
    }

    /// Register a tool; a tool with the same name is replaced
    pub fn register(&self, tool: Arc<dyn Tool>) {
        let name = tool.name();
        info!(target: "tool_registry", tool = %name, "Registering tool");

        if self.tools.insert(name.clone(), tool).is_some() {
            warn!(target: "tool_registry", tool = %name, "Replaced previously registered tool");
        } else {
            self.registered_tools_gauge.add(1, &[]);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).map(|t| t.clone())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Descriptors of all registered tools, sorted by name
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        let mut out: Vec<ToolDescriptor> = self.tools.iter().map(|t| t.descriptor()).collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Call a tool by name
    #[tracing::instrument(skip(self, arguments), fields(tool.name = %name))]
    pub async fn call(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> ToolResult<serde_json::Value> {
        let start_time = Instant::now();

        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        debug!(target: "tool_registry", tool = %name, "Invoking tool");

        let fut = tool.call(arguments);
        let result = match self.call_timeout {
            Some(limit) => match timeout(limit, fut).await {
                Ok(res) => res,
                Err(_) => {
                    warn!(target: "tool_registry", tool = %name, "Tool execution timed out");
                    self.timeouts_counter
                        .add(1, &[KeyValue::new("tool", name.to_string())]);
                    Err(ToolError::Timeout)
                }
            },
            None => fut.await,
        };

        let elapsed_ms = start_time.elapsed().as_secs_f64() * 1000.0;
        self.invoke_latency
            .record(elapsed_ms, &[KeyValue::new("tool", name.to_string())]);

        match &result {
            Ok(_) => {
                debug!(target: "tool_registry", tool = %name, latency_ms = %elapsed_ms, "Tool finished");
                self.invocations_counter.add(
                    1,
                    &[
                        KeyValue::new("tool", name.to_string()),
                        KeyValue::new("status", "success"),
                    ],
                );
            }
            Err(e) => {
                warn!(target: "tool_registry", tool = %name, error = %e, latency_ms = %elapsed_ms, "Tool execution failed");
                self.invocations_counter.add(
                    1,
                    &[
                        KeyValue::new("tool", name.to_string()),
                        KeyValue::new("status", "error"),
                    ],
                );
                self.errors_counter
                    .add(1, &[KeyValue::new("tool", name.to_string())]);
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> String {
            "echo".into()
        }
        fn description(&self) -> String {
            "Echo arguments".into()
        }
        fn parameters(&self) -> Value {
            json!({"type": "object"})
        }
        async fn call(&self, arguments: Value) -> ToolResult<Value> {
            Ok(arguments)
        }
    }

    struct SlowTool;

    #[async_trait]
    impl Tool for SlowTool {
        fn name(&self) -> String {
            "slow".into()
        }
        fn description(&self) -> String {
            "Sleeps".into()
        }
        fn parameters(&self) -> Value {
            json!({"type": "object"})
        }
        async fn call(&self, _arguments: Value) -> ToolResult<Value> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Value::Null)
        }
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let registry = ToolRegistry::new();
        let err = registry.call("missing", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(ref n) if n == "missing"));
    }

    #[tokio::test]
    async fn call_dispatches_to_named_tool() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        let out = registry.call("echo", json!({"a": 1})).await.unwrap();
        assert_eq!(out, json!({"a": 1}));
    }

    #[tokio::test]
    async fn clones_share_registered_tools() {
        let registry = ToolRegistry::new();
        let handle = registry.clone();
        handle.register(Arc::new(EchoTool));
        assert_eq!(registry.len(), 1);
        assert!(registry.call("echo", json!({})).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn optional_timeout_applies() {
        let registry = ToolRegistry::new().with_timeout(Duration::from_secs(5));
        registry.register(Arc::new(SlowTool));
        let err = registry.call("slow", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::Timeout));

        // Without a deadline the same tool runs to completion
        let unbounded = ToolRegistry::new();
        unbounded.register(Arc::new(SlowTool));
        assert_eq!(unbounded.call("slow", json!({})).await.unwrap(), Value::Null);
    }

    #[test]
    fn descriptors_are_sorted_and_deduplicated() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(SlowTool));
        registry.register(Arc::new(EchoTool));
        registry.register(Arc::new(EchoTool));
        let names: Vec<String> = registry.descriptors().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["echo", "slow"]);
        assert_eq!(registry.len(), 2);
    }
}

//! Agent contract: a named asynchronous unit of work.
//!
//! Agents are compute-only. They read an [`AgentInput`], do their work and
//! return a JSON value; the executor alone writes that value into shared
//! state under the node id.

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

use super::state::StateSnapshot;
use crate::core::MAX_SLIDES;

/// Payload for one agent invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentInput {
    /// Node being executed; not part of the wire payload
    #[serde(skip)]
    pub node_id: String,
    pub goal: String,
    /// Shared state as of dispatch
    pub state: StateSnapshot,
    /// Seed input, present only when the node declares one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
}

impl AgentInput {
    pub fn new(node_id: impl Into<String>, goal: impl Into<String>, state: StateSnapshot) -> Self {
        Self {
            node_id: node_id.into(),
            goal: goal.into(),
            state,
            input: None,
        }
    }

    pub fn with_input(mut self, input: Option<Value>) -> Self {
        self.input = input;
        self
    }

    /// Slide count from state, falling back to the maximum
    pub fn num_slides(&self) -> u8 {
        self.state.num_slides().unwrap_or(MAX_SLIDES)
    }

    /// Seed input as text, if it is a non-empty string
    pub fn input_str(&self) -> Option<&str> {
        self.input
            .as_ref()
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Seed input when present, else the first non-empty string among `keys` in state
    pub fn text_from(&self, keys: &[&str]) -> Option<&str> {
        self.input_str().or_else(|| {
            keys.iter()
                .filter_map(|key| self.state.get_str(key))
                .find(|s| !s.trim().is_empty())
        })
    }

    /// The payload as a JSON document, for schema checks and logging
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A named processing unit the executor can invoke
#[async_trait]
pub trait Agent: Send + Sync {
    /// Identifier nodes use to reference this agent
    fn name(&self) -> &str;

    /// Produce this node's result.
    ///
    /// An error aborts the whole run. Agents that can degrade gracefully should
    /// return a placeholder value instead.
    async fn run(&self, input: &AgentInput) -> anyhow::Result<Value>;

    /// Optional: Validate the payload before invocation
    fn validate_input(&self, _input: &AgentInput) -> anyhow::Result<()> {
        Ok(())
    }

    /// Optional: JSON schema the serialized payload must satisfy
    fn input_schema(&self) -> Option<Value> {
        None
    }
}

type AgentFn = dyn Fn(AgentInput) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync;

/// Agent backed by an async closure
#[derive(Clone)]
pub struct FnAgent {
    name: String,
    func: Arc<AgentFn>,
}

impl FnAgent {
    pub fn new<F, Fut>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(AgentInput) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(move |input| -> BoxFuture<'static, anyhow::Result<Value>> {
                Box::pin(func(input))
            }),
        }
    }
}

impl std::fmt::Debug for FnAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnAgent").field("name", &self.name).finish()
    }
}

#[async_trait]
impl Agent for FnAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, input: &AgentInput) -> anyhow::Result<Value> {
        (self.func)(input.clone()).await
    }
}

/// Checks a payload against a JSON schema, collecting every violation
pub fn check_schema(schema: &Value, payload: &Value) -> Result<(), String> {
    let validator = jsonschema::validator_for(schema).map_err(|e| format!("invalid schema: {}", e))?;
    let errors: Vec<String> = validator.iter_errors(payload).map(|e| e.to_string()).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use super::generator::{PromptRequest, TextGenerator};
use crate::executor::{Agent, AgentInput};
use crate::planner::RESEARCH_AGENT;

pub(crate) const DEFAULT_TOPIC: &str = "General topic";

/// Summarizes the goal into slide-sized key points
pub struct ResearchAgent {
    generator: Arc<dyn TextGenerator>,
}

impl ResearchAgent {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Agent for ResearchAgent {
    fn name(&self) -> &str {
        RESEARCH_AGENT
    }

    async fn run(&self, input: &AgentInput) -> anyhow::Result<Value> {
        let topic = match input.goal.trim() {
            "" => DEFAULT_TOPIC,
            goal => goal,
        };

        match self.generator.generate(&PromptRequest::research(topic)).await {
            Ok(text) => Ok(Value::from(text.trim())),
            Err(e) => {
                warn!(node_id = %input.node_id, error = %e, "research generation failed");
                Ok(Value::from(format!("ResearchAgentError: {}", e)))
            }
        }
    }
}

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use super::generator::{PromptRequest, TextGenerator};
use super::research::DEFAULT_TOPIC;
use super::slide::PLACEHOLDER_BULLET;
use crate::executor::{Agent, AgentInput};
use crate::planner::{CONTENT_AGENT, RESEARCH_AGENT};

/// Outline used when generation fails or comes back empty
pub fn placeholder_outline(num_slides: u8) -> String {
    (1..=num_slides)
        .map(|i| format!("{}. Slide {}\n- {}", i, i, PLACEHOLDER_BULLET))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Turns research notes into a numbered slide outline
pub struct ContentAgent {
    generator: Arc<dyn TextGenerator>,
}

impl ContentAgent {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Agent for ContentAgent {
    fn name(&self) -> &str {
        CONTENT_AGENT
    }

    async fn run(&self, input: &AgentInput) -> anyhow::Result<Value> {
        let topic = match input.goal.trim() {
            "" => DEFAULT_TOPIC,
            goal => goal,
        };
        let num_slides = input.num_slides();
        let research = input
            .text_from(&[RESEARCH_AGENT, "research"])
            .unwrap_or("No research data provided");

        let request = PromptRequest::outline(topic, research, num_slides);
        let outline = match self.generator.generate(&request).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                warn!(node_id = %input.node_id, "content generation returned nothing");
                placeholder_outline(num_slides)
            }
            Err(e) => {
                warn!(node_id = %input.node_id, error = %e, "content generation failed");
                placeholder_outline(num_slides)
            }
        };
        Ok(Value::from(outline))
    }
}

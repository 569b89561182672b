use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use super::generator::{ImageSource, PromptRequest, TextGenerator};
use super::slide::parse_outline;
use crate::executor::{Agent, AgentInput};
use crate::planner::{CONTENT_AGENT, IMAGE_AGENT};

/// Finds one image per outline slide: `{slide_1: url | null, ...}`
pub struct ImageAgent {
    generator: Arc<dyn TextGenerator>,
    source: Arc<dyn ImageSource>,
}

impl ImageAgent {
    pub fn new(generator: Arc<dyn TextGenerator>, source: Arc<dyn ImageSource>) -> Self {
        Self { generator, source }
    }

    async fn queries_for(&self, slide_text: &str, goal: &str) -> Vec<String> {
        let request = PromptRequest::image_queries(slide_text, goal);
        let queries: Vec<String> = match self.generator.generate(&request).await {
            Ok(text) => text
                .lines()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) => {
                debug!(error = %e, "query generation failed, using goal");
                Vec::new()
            }
        };
        if queries.is_empty() {
            vec![goal.to_string()]
        } else {
            queries
        }
    }

    async fn first_hit(&self, queries: &[String]) -> Option<String> {
        for query in queries {
            match self.source.find_image(query).await {
                Ok(Some(url)) => return Some(url),
                Ok(None) => {}
                Err(e) => warn!(query = %query, error = %e, "image lookup failed"),
            }
        }
        None
    }
}

#[async_trait]
impl Agent for ImageAgent {
    fn name(&self) -> &str {
        IMAGE_AGENT
    }

    async fn run(&self, input: &AgentInput) -> anyhow::Result<Value> {
        let content = input.state.get_str(CONTENT_AGENT).unwrap_or_default();
        let slides = parse_outline(content);

        let mut results = Map::new();
        for (idx, slide) in slides.iter().take(usize::from(input.num_slides())).enumerate() {
            let queries = self.queries_for(&slide.text(), &input.goal).await;
            let url = self.first_hit(&queries).await;
            results.insert(
                format!("slide_{}", idx + 1),
                url.map(Value::from).unwrap_or(Value::Null),
            );
        }
        Ok(Value::Object(results))
    }
}

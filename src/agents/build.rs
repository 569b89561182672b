use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use crate::executor::{Agent, AgentInput};
use crate::planner::{BUILD_AGENT, SLIDE_AGENT};

/// Bullets kept per rendered slide
pub const MAX_BULLETS: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckSlide {
    pub slide_id: usize,
    pub title: String,
    pub bullets: Vec<String>,
    pub image_url: Option<String>,
}

/// Everything a renderer needs to produce the presentation file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deck {
    pub goal: String,
    pub slides: Vec<DeckSlide>,
}

#[async_trait]
pub trait DeckRenderer: Send + Sync {
    /// Writes the deck and returns where it went
    async fn render(&self, deck: &Deck) -> anyhow::Result<PathBuf>;
}

/// Writes decks as pretty-printed JSON documents
#[derive(Debug, Clone)]
pub struct JsonDeckRenderer {
    output_dir: PathBuf,
}

impl JsonDeckRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[async_trait]
impl DeckRenderer for JsonDeckRenderer {
    async fn render(&self, deck: &Deck) -> anyhow::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self
            .output_dir
            .join(format!("presentation_{}.json", uuid::Uuid::new_v4().simple()));
        let body = serde_json::to_vec_pretty(deck)?;
        tokio::fs::write(&path, body).await?;
        Ok(path)
    }
}

/// Pulls a slide list out of the slide agent's output
fn slide_list(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Object(map) => map.get("slides").and_then(Value::as_array),
        Value::Array(list) => Some(list),
        _ => None,
    }
}

fn to_deck_slide(idx: usize, raw: &Value) -> DeckSlide {
    let title = raw
        .get("title")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Slide {}", idx));
    let bullets = raw
        .get("bullets")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_str)
                .take(MAX_BULLETS)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let image_url = raw
        .get("image_url")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(str::to_string);
    DeckSlide {
        slide_id: idx,
        title,
        bullets,
        image_url,
    }
}

/// Renders the assembled slides into a presentation file
pub struct BuildAgent {
    renderer: Arc<dyn DeckRenderer>,
}

impl BuildAgent {
    pub fn new(renderer: Arc<dyn DeckRenderer>) -> Self {
        Self { renderer }
    }
}

#[async_trait]
impl Agent for BuildAgent {
    fn name(&self) -> &str {
        BUILD_AGENT
    }

    async fn run(&self, input: &AgentInput) -> anyhow::Result<Value> {
        let Some(slides_data) = input.state.get(SLIDE_AGENT) else {
            error!(node_id = %input.node_id, "missing slide output in state");
            return Ok(json!({"error": "missing slide data"}));
        };
        let Some(raw_slides) = slide_list(slides_data) else {
            error!(node_id = %input.node_id, "unexpected slide format");
            return Ok(json!({"error": "invalid slide format"}));
        };

        let slides: Vec<DeckSlide> = raw_slides
            .iter()
            .take(usize::from(input.num_slides()))
            .enumerate()
            .map(|(i, raw)| to_deck_slide(i + 1, raw))
            .collect();
        let deck = Deck {
            goal: input.goal.clone(),
            slides,
        };

        match self.renderer.render(&deck).await {
            Ok(path) => {
                info!(node_id = %input.node_id, path = %path.display(), "deck rendered");
                Ok(json!({
                    "output_file": path.display().to_string(),
                    "slides": deck.slides,
                }))
            }
            Err(e) => {
                error!(node_id = %input.node_id, error = %e, "failed to render deck");
                Ok(json!({"error": e.to_string()}))
            }
        }
    }
}

//! The slide-deck agents: research, content, images, slides, build.

pub mod build;
pub mod content;
pub mod generator;
pub mod image;
pub mod research;
pub mod slide;

use std::path::PathBuf;
use std::sync::Arc;

pub use build::{BuildAgent, Deck, DeckRenderer, DeckSlide, JsonDeckRenderer};
pub use content::ContentAgent;
pub use generator::{ImageSource, NoImages, PromptRequest, PromptTask, TemplateGenerator, TextGenerator};
pub use image::ImageAgent;
pub use research::ResearchAgent;
pub use slide::{parse_outline, SlideAgent, SlideDraft};

use crate::core::errors::Result;
use crate::executor::AgentRegistry;

/// Registry holding the five deck agents wired to the given collaborators
pub fn deck_agents(
    generator: Arc<dyn TextGenerator>,
    images: Arc<dyn ImageSource>,
    renderer: Arc<dyn DeckRenderer>,
) -> Result<AgentRegistry> {
    AgentRegistry::new()
        .with(Arc::new(ResearchAgent::new(generator.clone())))?
        .with(Arc::new(ContentAgent::new(generator.clone())))?
        .with(Arc::new(ImageAgent::new(generator, images)))?
        .with(Arc::new(SlideAgent))?
        .with(Arc::new(BuildAgent::new(renderer)))
}

/// Deck agents that run without network access, writing JSON decks to `output_dir`
pub fn offline_deck_agents(output_dir: impl Into<PathBuf>) -> Result<AgentRegistry> {
    deck_agents(
        Arc::new(TemplateGenerator),
        Arc::new(NoImages),
        Arc::new(JsonDeckRenderer::new(output_dir)),
    )
}

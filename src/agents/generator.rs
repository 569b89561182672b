//! Seams to the outside world: text generation and image lookup.
//!
//! Real deployments plug an LLM client and an image search API in here.
//! The offline implementations keep the pipeline runnable without either.

use async_trait::async_trait;

/// What a deck agent asks a text generator for
#[derive(Debug, Clone, PartialEq)]
pub enum PromptTask {
    /// Key points about a topic
    Research { topic: String },
    /// Numbered slide outline built from research notes
    SlideOutline {
        topic: String,
        research: String,
        num_slides: u8,
    },
    /// Short image search queries for one slide
    ImageQueries { slide_text: String, topic: String },
}

/// A generation request: the task plus sampling limits
#[derive(Debug, Clone, PartialEq)]
pub struct PromptRequest {
    pub task: PromptTask,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl PromptRequest {
    pub fn research(topic: impl Into<String>) -> Self {
        Self {
            task: PromptTask::Research { topic: topic.into() },
            max_tokens: 500,
            temperature: 0.5,
        }
    }

    pub fn outline(topic: impl Into<String>, research: impl Into<String>, num_slides: u8) -> Self {
        Self {
            task: PromptTask::SlideOutline {
                topic: topic.into(),
                research: research.into(),
                num_slides,
            },
            max_tokens: 1000,
            temperature: 0.3,
        }
    }

    pub fn image_queries(slide_text: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            task: PromptTask::ImageQueries {
                slide_text: slide_text.into(),
                topic: topic.into(),
            },
            max_tokens: 80,
            temperature: 0.3,
        }
    }

    /// Prompt text for chat-style model backends
    pub fn prompt(&self) -> String {
        match &self.task {
            PromptTask::Research { topic } => format!(
                "You are a research assistant.\n\
                 Summarize key points about the following topic.\n\n\
                 Topic: {}\n\n\
                 Provide concise bullet points suitable for slides.",
                topic
            ),
            PromptTask::SlideOutline {
                topic,
                research,
                num_slides,
            } => format!(
                "You are a content assistant.\n\
                 Convert the following research points into a structured slide-wise presentation.\n\n\
                 Guidelines:\n\
                 - Number each slide from 1 to {n}.\n\
                 - Each slide must have a clear title and 3-5 concise bullet points.\n\
                 - Format output like this:\n\n\
                 1. Slide Title\n- Bullet 1\n- Bullet 2\n- Bullet 3\n\n\
                 Goal: {topic}\n\
                 Research Points: {research}",
                n = num_slides,
                topic = topic,
                research = research
            ),
            PromptTask::ImageQueries { slide_text, topic } => format!(
                "You are an expert at selecting stock image search keywords.\n\n\
                 Slide content:\n{}\n\n\
                 Overall topic:\n{}\n\n\
                 Generate 3-5 short search queries (2-4 words).\n\
                 Return ONE query per line.\n\
                 No numbering, no explanation.",
                slide_text, topic
            ),
        }
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &PromptRequest) -> anyhow::Result<String>;
}

#[async_trait]
pub trait ImageSource: Send + Sync {
    /// URL of an image matching `query`, if any
    async fn find_image(&self, query: &str) -> anyhow::Result<Option<String>>;
}

/// Deterministic offline generator producing outline-shaped text
#[derive(Debug, Clone, Default)]
pub struct TemplateGenerator;

const ANGLES: [&str; 6] = [
    "Overview",
    "Key concepts",
    "How it works",
    "Real-world applications",
    "Challenges and limitations",
    "Future directions",
];

#[async_trait]
impl TextGenerator for TemplateGenerator {
    async fn generate(&self, request: &PromptRequest) -> anyhow::Result<String> {
        let text = match &request.task {
            PromptTask::Research { topic } => ANGLES
                .iter()
                .map(|angle| format!("- {} of {}", angle, topic))
                .collect::<Vec<_>>()
                .join("\n"),
            PromptTask::SlideOutline {
                topic, num_slides, ..
            } => (1..=usize::from(*num_slides))
                .map(|i| {
                    let angle = ANGLES[(i - 1) % ANGLES.len()];
                    format!(
                        "{}. {}\n- What {} means for {}\n- Core facts\n- One example",
                        i,
                        angle,
                        angle.to_lowercase(),
                        topic
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"),
            PromptTask::ImageQueries { slide_text, topic } => {
                let head: String = slide_text
                    .split_whitespace()
                    .filter(|w| w.chars().any(char::is_alphabetic))
                    .take(3)
                    .collect::<Vec<_>>()
                    .join(" ");
                if head.is_empty() {
                    topic.clone()
                } else {
                    format!("{} {}\n{}", topic, head, topic)
                }
            }
        };
        Ok(text)
    }
}

/// Image source that never finds anything
#[derive(Debug, Clone, Default)]
pub struct NoImages;

#[async_trait]
impl ImageSource for NoImages {
    async fn find_image(&self, _query: &str) -> anyhow::Result<Option<String>> {
        Ok(None)
    }
}

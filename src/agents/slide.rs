use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::OnceLock;

use crate::executor::{Agent, AgentInput};
use crate::planner::{CONTENT_AGENT, IMAGE_AGENT, SLIDE_AGENT};

pub const PLACEHOLDER_BULLET: &str = "Key concept overview";

/// One slide of a numbered outline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideDraft {
    pub title: String,
    pub bullets: Vec<String>,
}

impl SlideDraft {
    /// Title and bullets as one block of text
    pub fn text(&self) -> String {
        std::iter::once(self.title.as_str())
            .chain(self.bullets.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)\.\s*(.*)$").expect("static regex"))
}

fn bullet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[-•*]\s+(.*)$").expect("static regex"))
}

/// Parses `N. Title` lines followed by bullets.
///
/// Lines starting with `-`, `•` or `*` are bullets; any other line under a
/// title counts as a bullet too. Lines before the first title are dropped.
pub fn parse_outline(text: &str) -> Vec<SlideDraft> {
    let mut slides = Vec::new();
    let mut current: Option<SlideDraft> = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(caps) = title_re().captures(line) {
            if let Some(done) = current.take() {
                slides.push(done);
            }
            current = Some(SlideDraft {
                title: caps[2].trim().to_string(),
                bullets: Vec::new(),
            });
            continue;
        }

        let bullet = match bullet_re().captures(line) {
            Some(caps) => caps[1].trim().to_string(),
            None => line.to_string(),
        };
        if let Some(slide) = current.as_mut() {
            slide.bullets.push(bullet);
        }
    }

    if let Some(done) = current {
        slides.push(done);
    }
    slides
}

/// Merges the content outline with per-slide images into `{slides: [...]}`,
/// padded or truncated to the slide count
#[derive(Debug, Clone, Default)]
pub struct SlideAgent;

#[async_trait]
impl Agent for SlideAgent {
    fn name(&self) -> &str {
        SLIDE_AGENT
    }

    async fn run(&self, input: &AgentInput) -> anyhow::Result<Value> {
        let num_slides = usize::from(input.num_slides());
        let content = input.text_from(&[CONTENT_AGENT]).unwrap_or_default();
        let images = input.state.get(IMAGE_AGENT);
        let image_for = |n: usize| -> Value {
            images
                .and_then(|m| m.get(format!("slide_{}", n)))
                .cloned()
                .unwrap_or(Value::Null)
        };

        let mut slides: Vec<Value> = parse_outline(content)
            .into_iter()
            .take(num_slides)
            .enumerate()
            .map(|(i, draft)| {
                let bullets = if draft.bullets.is_empty() {
                    vec![PLACEHOLDER_BULLET.to_string()]
                } else {
                    draft.bullets
                };
                json!({
                    "title": draft.title,
                    "bullets": bullets,
                    "image_url": image_for(i + 1),
                })
            })
            .collect();

        while slides.len() < num_slides {
            let n = slides.len() + 1;
            slides.push(json!({
                "title": format!("Slide {}", n),
                "bullets": [PLACEHOLDER_BULLET],
                "image_url": image_for(n),
            }));
        }

        Ok(json!({ "slides": slides }))
    }
}

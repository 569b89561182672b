//! Planning utilities: turn a goal into a graph specification

use std::collections::BTreeSet;

use crate::core::errors::{DeckError, Result};
use crate::core::{MAX_SLIDES, MIN_SLIDES};
use crate::graph::{GraphSpec, GraphSpecBuilder};

pub const RESEARCH_AGENT: &str = "research_agent";
pub const CONTENT_AGENT: &str = "content_agent";
pub const IMAGE_AGENT: &str = "image_agent";
pub const SLIDE_AGENT: &str = "slide_agent";
pub const BUILD_AGENT: &str = "build_agent";

/// Agents a deck plan may reference
pub const ALLOWED_AGENTS: [&str; 5] = [
    RESEARCH_AGENT,
    CONTENT_AGENT,
    IMAGE_AGENT,
    SLIDE_AGENT,
    BUILD_AGENT,
];

/// Clamp a requested slide count into `MIN_SLIDES..=MAX_SLIDES`, using
/// `default` when nothing was requested
pub fn clamp_slide_count(requested: Option<i64>, default: u8) -> u8 {
    let wanted = requested.unwrap_or(i64::from(default));
    wanted.clamp(i64::from(MIN_SLIDES), i64::from(MAX_SLIDES)) as u8
}

/// Anything that can turn `(goal, slide count)` into a runnable graph
pub trait GraphPlanner: Send + Sync {
    fn plan(&self, goal: &str, num_slides: Option<i64>) -> Result<GraphSpec>;
}

/// Builds the fixed research → content → images → slides → build pipeline
#[derive(Debug, Clone)]
pub struct DeckPlanner {
    default_slides: u8,
    allowed: BTreeSet<String>,
}

impl Default for DeckPlanner {
    fn default() -> Self {
        Self::new(MAX_SLIDES)
    }
}

impl DeckPlanner {
    pub fn new(default_slides: u8) -> Self {
        Self {
            default_slides: default_slides.clamp(MIN_SLIDES, MAX_SLIDES),
            allowed: ALLOWED_AGENTS.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn check_agents(&self, graph: &GraphSpec) -> Result<()> {
        let invalid: BTreeSet<&str> = graph
            .nodes()
            .map(|(_, node)| node.agent.as_str())
            .filter(|agent| !self.allowed.contains(*agent))
            .collect();
        if invalid.is_empty() {
            Ok(())
        } else {
            Err(DeckError::configuration(format!(
                "Invalid agents detected: {:?}",
                invalid
            )))
        }
    }
}

impl GraphPlanner for DeckPlanner {
    fn plan(&self, goal: &str, num_slides: Option<i64>) -> Result<GraphSpec> {
        let goal = goal.trim();
        if goal.is_empty() {
            return Err(DeckError::invalid_graph("User goal cannot be empty"));
        }
        let num_slides = clamp_slide_count(num_slides, self.default_slides);

        // Node ids double as the state keys agents read, so they match the agent names
        let graph = GraphSpecBuilder::new(goal)
            .num_slides(num_slides)
            .seeded_node(RESEARCH_AGENT, RESEARCH_AGENT, goal)
            .node(CONTENT_AGENT, CONTENT_AGENT)
            .node(IMAGE_AGENT, IMAGE_AGENT)
            .node(SLIDE_AGENT, SLIDE_AGENT)
            .node(BUILD_AGENT, BUILD_AGENT)
            .edge(RESEARCH_AGENT, CONTENT_AGENT)
            .edge(CONTENT_AGENT, IMAGE_AGENT)
            .edge(CONTENT_AGENT, SLIDE_AGENT)
            .edge(IMAGE_AGENT, SLIDE_AGENT)
            .edge(SLIDE_AGENT, BUILD_AGENT)
            .entry(RESEARCH_AGENT)
            .build()?;

        self.check_agents(&graph)?;
        Ok(graph)
    }
}

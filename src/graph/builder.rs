use serde_json::Value;
use std::collections::BTreeMap;

use super::spec::{Edge, GraphSpec, NodeSpec};
use crate::core::errors::{DeckError, Result};

/// Fluent builder for graph specifications
#[derive(Debug, Clone)]
pub struct GraphSpecBuilder {
    goal: String,
    num_slides: u8,
    nodes: BTreeMap<String, NodeSpec>,
    edges: Vec<Edge>,
    entry_nodes: Vec<String>,
    duplicate: Option<String>,
}

impl GraphSpecBuilder {
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            num_slides: crate::core::MAX_SLIDES,
            nodes: BTreeMap::new(),
            edges: Vec::new(),
            entry_nodes: Vec::new(),
            duplicate: None,
        }
    }

    pub fn num_slides(mut self, num_slides: u8) -> Self {
        self.num_slides = num_slides;
        self
    }

    /// Add a node that reads its input from shared state
    pub fn node(self, id: impl Into<String>, agent: impl Into<String>) -> Self {
        self.insert(id.into(), NodeSpec::new(agent))
    }

    /// Add a node carrying a seed input
    pub fn seeded_node(
        self,
        id: impl Into<String>,
        agent: impl Into<String>,
        input: impl Into<Value>,
    ) -> Self {
        self.insert(id.into(), NodeSpec::new(agent).with_input(input))
    }

    fn insert(mut self, id: String, node: NodeSpec) -> Self {
        if self.nodes.insert(id.clone(), node).is_some() && self.duplicate.is_none() {
            self.duplicate = Some(id);
        }
        self
    }

    /// `to` waits for `from`
    pub fn edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.push((from.into(), to.into()));
        self
    }

    /// Chain edges through the given nodes in order
    pub fn chain<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        for pair in ids.windows(2) {
            self.edges.push((pair[0].clone(), pair[1].clone()));
        }
        self
    }

    pub fn entry(mut self, id: impl Into<String>) -> Self {
        self.entry_nodes.push(id.into());
        self
    }

    pub fn build(self) -> Result<GraphSpec> {
        if let Some(id) = self.duplicate {
            return Err(DeckError::invalid_node(
                format!("Node '{}' declared more than once", id),
                id,
            ));
        }
        GraphSpec::new(
            self.goal,
            self.num_slides,
            self.nodes,
            self.edges,
            self.entry_nodes,
        )
    }
}

//! Immutable description of an agent graph.
//!
//! A [`GraphSpec`] is validated once, at construction or deserialization, and
//! is read-only afterwards. Acyclicity is deliberately not a construction
//! requirement: [`GraphSpec::diagnostics`] reports cycles and unreachable
//! nodes so callers can decide what to do about them.

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::path::Path;

use crate::core::errors::{DeckError, Result};
use crate::core::{MAX_SLIDES, MIN_SLIDES};
use crate::executor::state::is_reserved_key;

/// A graph vertex: which agent runs, and with what seed input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub agent: String,
    /// Present only on nodes that do not derive their input from shared state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
}

impl NodeSpec {
    pub fn new(agent: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            input: None,
        }
    }

    pub fn with_input(mut self, input: impl Into<Value>) -> Self {
        self.input = Some(input.into());
        self
    }
}

/// `(from, to)`: `to` may not start until `from` has completed
pub type Edge = (String, String);

/// Validated graph specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGraphSpec")]
pub struct GraphSpec {
    goal: String,
    num_slides: u8,
    nodes: BTreeMap<String, NodeSpec>,
    edges: Vec<Edge>,
    entry_nodes: Vec<String>,
}

/// Unvalidated wire shape of a graph
#[derive(Debug, Deserialize)]
struct RawGraphSpec {
    goal: String,
    num_slides: i64,
    nodes: BTreeMap<String, NodeSpec>,
    #[serde(default)]
    edges: Vec<Edge>,
    entry_nodes: Vec<String>,
}

impl TryFrom<RawGraphSpec> for GraphSpec {
    type Error = DeckError;

    fn try_from(raw: RawGraphSpec) -> Result<Self> {
        let num_slides = u8::try_from(raw.num_slides).map_err(|_| {
            DeckError::configuration_field(
                "num_slides out of range",
                "num_slides",
                format!("{}..={}", MIN_SLIDES, MAX_SLIDES),
                raw.num_slides,
            )
        })?;
        GraphSpec::new(raw.goal, num_slides, raw.nodes, raw.edges, raw.entry_nodes)
    }
}

impl GraphSpec {
    /// Builds and validates a graph.
    ///
    /// Rejects edges naming unknown nodes, self-edges, an empty or unknown entry
    /// list, entry nodes with incoming edges, node ids that shadow reserved state
    /// keys, and slide counts outside `MIN_SLIDES..=MAX_SLIDES`.
    pub fn new(
        goal: impl Into<String>,
        num_slides: u8,
        nodes: BTreeMap<String, NodeSpec>,
        edges: Vec<Edge>,
        entry_nodes: Vec<String>,
    ) -> Result<Self> {
        if !(MIN_SLIDES..=MAX_SLIDES).contains(&num_slides) {
            return Err(DeckError::configuration_field(
                "num_slides out of range",
                "num_slides",
                format!("{}..={}", MIN_SLIDES, MAX_SLIDES),
                num_slides,
            ));
        }

        for (id, node) in &nodes {
            if id.is_empty() {
                return Err(DeckError::invalid_graph("Node ID cannot be empty"));
            }
            if is_reserved_key(id) {
                return Err(DeckError::invalid_node(
                    format!("Node ID '{}' collides with a reserved state key", id),
                    id.clone(),
                ));
            }
            if node.agent.is_empty() {
                return Err(DeckError::invalid_node(
                    format!("Node '{}' has no agent", id),
                    id.clone(),
                ));
            }
        }

        for (from, to) in &edges {
            for endpoint in [from, to] {
                if !nodes.contains_key(endpoint) {
                    return Err(DeckError::invalid_node(
                        format!("Edge {} -> {} references unknown node '{}'", from, to, endpoint),
                        endpoint.clone(),
                    ));
                }
            }
            if from == to {
                return Err(DeckError::invalid_node(
                    format!("Self-edge on node '{}'", from),
                    from.clone(),
                ));
            }
        }

        if entry_nodes.is_empty() {
            return Err(DeckError::invalid_graph("Graph has no entry nodes"));
        }
        for entry in &entry_nodes {
            if !nodes.contains_key(entry) {
                return Err(DeckError::invalid_node(
                    format!("Entry node '{}' is not a graph node", entry),
                    entry.clone(),
                ));
            }
            if let Some((from, _)) = edges.iter().find(|(_, to)| to == entry) {
                return Err(DeckError::invalid_node(
                    format!("Entry node '{}' has an incoming edge from '{}'", entry, from),
                    entry.clone(),
                ));
            }
        }

        Ok(Self {
            goal: goal.into(),
            num_slides,
            nodes,
            edges,
            entry_nodes,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads a graph from a `.json`, `.yaml` or `.yml` file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DeckError::io(format!("read graph {}", path.display()), e))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&raw),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&raw),
            other => Err(DeckError::configuration(format!(
                "Unsupported graph file extension: {:?}",
                other
            ))),
        }
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn num_slides(&self) -> u8 {
        self.num_slides
    }

    pub fn node(&self, id: &str) -> Option<&NodeSpec> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&str, &NodeSpec)> {
        self.nodes.iter().map(|(id, node)| (id.as_str(), node))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn entry_nodes(&self) -> &[String] {
        &self.entry_nodes
    }

    /// Direct predecessors and successors of every node, duplicates collapsed
    pub fn adjacency(&self) -> Adjacency<'_> {
        let mut adjacency = Adjacency {
            dependencies: self.nodes.keys().map(|id| (id.as_str(), HashSet::new())).collect(),
            dependents: self.nodes.keys().map(|id| (id.as_str(), Vec::new())).collect(),
        };
        for (from, to) in &self.edges {
            if let Some(deps) = adjacency.dependencies.get_mut(to.as_str()) {
                if deps.insert(from.as_str()) {
                    if let Some(succ) = adjacency.dependents.get_mut(from.as_str()) {
                        succ.push(to.as_str());
                    }
                }
            }
        }
        adjacency
    }

    /// Structural report: cycles, plus which nodes can and cannot ever run
    pub fn diagnostics(&self) -> GraphDiagnostics {
        let mut graph: DiGraph<&str, ()> = DiGraph::new();
        let index: HashMap<&str, NodeIndex> = self
            .nodes
            .keys()
            .map(|id| (id.as_str(), graph.add_node(id.as_str())))
            .collect();
        for (from, to) in &self.edges {
            graph.update_edge(index[from.as_str()], index[to.as_str()], ());
        }

        let mut reachable = BTreeSet::new();
        for entry in &self.entry_nodes {
            let mut bfs = Bfs::new(&graph, index[entry.as_str()]);
            while let Some(ix) = bfs.next(&graph) {
                reachable.insert(graph[ix].to_string());
            }
        }

        // Same readiness rule the executor applies, without running anything
        let adjacency = self.adjacency();
        let mut runnable: BTreeSet<String> = BTreeSet::new();
        let mut queue: VecDeque<&str> = self.entry_nodes.iter().map(String::as_str).collect();
        let mut queued: HashSet<&str> = queue.iter().copied().collect();
        while let Some(id) = queue.pop_front() {
            runnable.insert(id.to_string());
            for &next in adjacency.dependents_of(id) {
                if queued.contains(next) {
                    continue;
                }
                if adjacency
                    .dependencies_of(next)
                    .all(|dep| runnable.contains(dep))
                {
                    queued.insert(next);
                    queue.push_back(next);
                }
            }
        }

        let unreachable = self
            .nodes
            .keys()
            .filter(|id| !runnable.contains(id.as_str()))
            .cloned()
            .collect();

        GraphDiagnostics {
            has_cycle: is_cyclic_directed(&graph),
            reachable,
            runnable,
            unreachable,
        }
    }
}

/// Predecessor/successor lookup derived from a graph's edge list
#[derive(Debug, Clone)]
pub struct Adjacency<'a> {
    dependencies: HashMap<&'a str, HashSet<&'a str>>,
    dependents: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> Adjacency<'a> {
    pub fn dependencies_of(&self, id: &str) -> impl Iterator<Item = &'a str> + '_ {
        self.dependencies.get(id).into_iter().flatten().copied()
    }

    pub fn dependents_of(&self, id: &str) -> &[&'a str] {
        self.dependents.get(id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Result of [`GraphSpec::diagnostics`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphDiagnostics {
    pub has_cycle: bool,
    /// Nodes with a path from some entry node
    pub reachable: BTreeSet<String>,
    /// Nodes whose every dependency can eventually complete
    pub runnable: BTreeSet<String>,
    /// Nodes that will never become ready
    pub unreachable: Vec<String>,
}

impl GraphDiagnostics {
    pub fn is_complete(&self) -> bool {
        !self.has_cycle && self.unreachable.is_empty()
    }
}

//! Caller-side projection of a finished run into a response document

use serde::Serialize;
use serde_json::Value;

use crate::executor::SharedState;
use crate::graph::GraphSpec;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeResult {
    pub node: String,
    pub agent: String,
    pub output: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutorResponse {
    pub results: Vec<NodeResult>,
}

impl ExecutorResponse {
    /// One entry per executed node, in execution order, metadata keys left out
    pub fn from_state(graph: &GraphSpec, state: &SharedState) -> Self {
        let results = state
            .node_outputs()
            .filter_map(|(node, output)| {
                graph.node(node).map(|spec| NodeResult {
                    node: node.to_string(),
                    agent: spec.agent.clone(),
                    output: output.clone(),
                })
            })
            .collect();
        Self { results }
    }

    pub fn output(&self, node: &str) -> Option<&Value> {
        self.results
            .iter()
            .find(|r| r.node == node)
            .map(|r| &r.output)
    }
}

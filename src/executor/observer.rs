//! Observers are notified as a run progresses. They cannot influence
//! scheduling or touch shared state.

use async_trait::async_trait;
use serde_json::Value;

use super::agent::AgentInput;
use super::report::RunReport;

#[async_trait]
pub trait ExecutionObserver: Send + Sync {
    async fn on_run_started(&self, _run_id: &str, _goal: &str) {}

    /// Called right before the agent is invoked, with the exact payload it gets
    async fn on_node_started(&self, _run_id: &str, _node_id: &str, _input: &AgentInput) {}

    /// Called after the result has been written to shared state
    async fn on_node_completed(&self, _run_id: &str, _node_id: &str, _output: &Value) {}

    async fn on_run_completed(&self, _run_id: &str, _report: &RunReport) {}
}

/// Observer that logs through `tracing`
pub struct TracingObserver;

#[async_trait]
impl ExecutionObserver for TracingObserver {
    async fn on_run_started(&self, run_id: &str, goal: &str) {
        tracing::info!(run_id, goal, "run started");
    }

    async fn on_node_started(&self, run_id: &str, node_id: &str, input: &AgentInput) {
        tracing::info!(run_id, node_id, state_keys = input.state.len(), "node started");
    }

    async fn on_node_completed(&self, run_id: &str, node_id: &str, _output: &Value) {
        tracing::info!(run_id, node_id, "node completed");
    }

    async fn on_run_completed(&self, run_id: &str, report: &RunReport) {
        tracing::info!(
            run_id,
            executed = report.executed.len(),
            unreached = report.unreached.len(),
            elapsed_ms = report.elapsed().num_milliseconds(),
            "run completed"
        );
    }
}

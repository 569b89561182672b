//! GraphExecutor - runs a graph specification to completion
//!
//! Scheduling is readiness propagation: the declared entry nodes start out
//! ready, and a node becomes ready once every one of its direct dependencies
//! has completed. The ready set is only ever read and written from the
//! scheduling loop, and shared state is only written there, so parallel mode
//! keeps every write linearized.

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::agent::{check_schema, Agent, AgentInput};
use super::observer::ExecutionObserver;
use super::registry::AgentRegistry;
use super::report::{RunOutcome, RunReport};
use super::state::SharedState;
use crate::core::config::{ExecutionMode, ExecutorConfig, ReadyOrder};
use crate::core::errors::{DeckError, Result};
use crate::graph::{Adjacency, GraphSpec};

/// Nodes whose dependencies are satisfied but which have not been dispatched
struct ReadySet {
    queue: VecDeque<String>,
    rng: Option<fastrand::Rng>,
}

impl ReadySet {
    fn new(order: ReadyOrder) -> Self {
        let rng = match order {
            ReadyOrder::Fifo => None,
            ReadyOrder::Shuffled { seed: Some(seed) } => Some(fastrand::Rng::with_seed(seed)),
            ReadyOrder::Shuffled { seed: None } => Some(fastrand::Rng::new()),
        };
        Self {
            queue: VecDeque::new(),
            rng,
        }
    }

    fn push(&mut self, id: String) {
        self.queue.push_back(id);
    }

    fn pop(&mut self) -> Option<String> {
        match self.rng.as_mut() {
            Some(rng) if !self.queue.is_empty() => {
                let pick = rng.usize(..self.queue.len());
                self.queue.swap_remove_back(pick)
            }
            _ => self.queue.pop_front(),
        }
    }
}

/// Bookkeeping for one run
struct RunTracker<'g> {
    run_id: String,
    adjacency: Adjacency<'g>,
    ready: ReadySet,
    /// Every node ever put in the ready set; guards against double scheduling
    scheduled: HashSet<String>,
    executed: Vec<String>,
}

impl<'g> RunTracker<'g> {
    fn promote(&mut self, node_id: &str, completed: &HashSet<String>) {
        for &next in self.adjacency.dependents_of(node_id) {
            if self.scheduled.contains(next) {
                continue;
            }
            if self
                .adjacency
                .dependencies_of(next)
                .all(|dep| completed.contains(dep))
            {
                debug!(node_id = next, after = node_id, "node ready");
                self.scheduled.insert(next.to_string());
                self.ready.push(next.to_string());
            }
        }
    }
}

type InFlight = FuturesUnordered<BoxFuture<'static, (String, Result<Value>)>>;

/// Dependency-graph scheduler.
///
/// One instance serves any number of sequential runs; `&mut self` on
/// [`run`](Self::run) rules out overlapping ones.
pub struct GraphExecutor {
    agents: AgentRegistry,
    config: ExecutorConfig,
    observers: Vec<Arc<dyn ExecutionObserver>>,
    state: SharedState,
    completed: HashSet<String>,
}

impl GraphExecutor {
    /// Sequential executor with default configuration
    pub fn new(agents: AgentRegistry) -> Self {
        Self {
            agents,
            config: ExecutorConfig::default(),
            observers: Vec::new(),
            state: SharedState::default(),
            completed: HashSet::new(),
        }
    }

    pub fn with_config(agents: AgentRegistry, config: ExecutorConfig) -> Result<Self> {
        config.validate()?;
        let mut executor = Self::new(agents);
        executor.config = config;
        Ok(executor)
    }

    pub fn add_observer(&mut self, observer: Arc<dyn ExecutionObserver>) {
        self.observers.push(observer);
    }

    pub fn agents(&self) -> &AgentRegistry {
        &self.agents
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Runs the graph and returns the final shared state
    pub async fn execute(&mut self, graph: &GraphSpec) -> Result<SharedState> {
        Ok(self.run(graph).await?.state)
    }

    /// Runs the graph and returns the final shared state with a run report.
    ///
    /// Fails before any node executes when a node names an unregistered agent,
    /// or, with `strict_graph`, when some node can never become ready. Otherwise
    /// such nodes are simply absent from the result and listed in the report.
    #[instrument(skip_all, fields(goal = graph.goal(), nodes = graph.node_count()))]
    pub async fn run(&mut self, graph: &GraphSpec) -> Result<RunOutcome> {
        self.preflight(graph)?;

        let started_at = chrono::Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        self.state = SharedState::seeded(graph.goal(), graph.num_slides());
        self.completed.clear();

        let mut tracker = RunTracker {
            run_id: run_id.clone(),
            adjacency: graph.adjacency(),
            ready: ReadySet::new(self.config.ready_order),
            scheduled: HashSet::new(),
            executed: Vec::new(),
        };
        for entry in graph.entry_nodes() {
            if tracker.scheduled.insert(entry.clone()) {
                tracker.ready.push(entry.clone());
            }
        }

        info!(run_id = %run_id, mode = ?self.config.mode, "starting graph run");
        for observer in &self.observers {
            observer.on_run_started(&run_id, graph.goal()).await;
        }

        match self.config.mode {
            ExecutionMode::Sequential => self.drive_sequential(graph, &mut tracker).await?,
            ExecutionMode::Parallel => self.drive_parallel(graph, &mut tracker).await?,
        }

        let unreached: Vec<String> = graph
            .nodes()
            .map(|(id, _)| id)
            .filter(|id| !self.completed.contains(*id))
            .map(str::to_string)
            .collect();
        if !unreached.is_empty() {
            warn!(run_id = %run_id, ?unreached, "run finished with nodes that never became ready");
        }

        let report = RunReport {
            run_id: run_id.clone(),
            started_at,
            finished_at: chrono::Utc::now(),
            executed: tracker.executed,
            unreached,
        };
        for observer in &self.observers {
            observer.on_run_completed(&run_id, &report).await;
        }
        info!(run_id = %run_id, executed = report.executed.len(), "graph run complete");

        Ok(RunOutcome {
            state: std::mem::take(&mut self.state),
            report,
        })
    }

    /// Rejects graphs that cannot be run as configured
    fn preflight(&self, graph: &GraphSpec) -> Result<()> {
        for (id, node) in graph.nodes() {
            if !self.agents.contains(&node.agent) {
                return Err(DeckError::unknown_agent(id, node.agent.clone()));
            }
        }

        let diagnostics = graph.diagnostics();
        if !diagnostics.is_complete() {
            if self.config.strict_graph {
                return Err(DeckError::malformed(
                    format!(
                        "{} node(s) can never run{}",
                        diagnostics.unreachable.len(),
                        if diagnostics.has_cycle { " (graph has a cycle)" } else { "" }
                    ),
                    diagnostics.unreachable,
                ));
            }
            warn!(
                unreachable = ?diagnostics.unreachable,
                has_cycle = diagnostics.has_cycle,
                "graph has nodes that will never run"
            );
        }
        Ok(())
    }

    async fn drive_sequential(&mut self, graph: &GraphSpec, tracker: &mut RunTracker<'_>) -> Result<()> {
        while let Some(node_id) = tracker.ready.pop() {
            let (agent, input) = self.prepare(graph, &node_id)?;
            for observer in &self.observers {
                observer.on_node_started(&tracker.run_id, &node_id, &input).await;
            }
            let output = dispatch(agent, input).await?;
            self.complete(tracker, node_id, output).await?;
        }
        Ok(())
    }

    async fn drive_parallel(&mut self, graph: &GraphSpec, tracker: &mut RunTracker<'_>) -> Result<()> {
        let width = self.config.max_parallel_nodes.max(1);
        let mut in_flight: InFlight = FuturesUnordered::new();

        loop {
            while in_flight.len() < width {
                let Some(node_id) = tracker.ready.pop() else {
                    break;
                };
                let (agent, input) = self.prepare(graph, &node_id)?;
                for observer in &self.observers {
                    observer.on_node_started(&tracker.run_id, &node_id, &input).await;
                }
                in_flight.push(Box::pin(async move {
                    let result = dispatch(agent, input).await;
                    (node_id, result)
                }));
            }

            match in_flight.next().await {
                Some((node_id, result)) => {
                    self.complete(tracker, node_id, result?).await?;
                }
                None => break,
            }
        }
        Ok(())
    }

    /// Builds the payload for a node and checks it at the agent boundary
    fn prepare(&self, graph: &GraphSpec, node_id: &str) -> Result<(Arc<dyn Agent>, AgentInput)> {
        let node = graph
            .node(node_id)
            .ok_or_else(|| DeckError::internal(format!("Node vanished from graph: {}", node_id)))?;
        let agent = self
            .agents
            .get(&node.agent)
            .ok_or_else(|| DeckError::unknown_agent(node_id, node.agent.clone()))?;

        let input = AgentInput::new(node_id, graph.goal(), self.state.snapshot())
            .with_input(node.input.clone());

        agent
            .validate_input(&input)
            .map_err(|e| DeckError::invalid_input(node_id, node.agent.clone(), e.to_string()))?;
        if self.config.validate_schemas {
            if let Some(schema) = agent.input_schema() {
                check_schema(&schema, &input.to_value())
                    .map_err(|msg| DeckError::invalid_input(node_id, node.agent.clone(), msg))?;
            }
        }

        debug!(node_id, agent = %node.agent, "dispatching node");
        Ok((agent, input))
    }

    /// Records a finished node and promotes any dependents it unblocked
    async fn complete(&mut self, tracker: &mut RunTracker<'_>, node_id: String, output: Value) -> Result<()> {
        self.state.insert_once(node_id.clone(), output)?;
        self.completed.insert(node_id.clone());
        tracker.executed.push(node_id.clone());

        if let Some(output) = self.state.get(&node_id) {
            for observer in &self.observers {
                observer.on_node_completed(&tracker.run_id, &node_id, output).await;
            }
        }

        tracker.promote(&node_id, &self.completed);
        Ok(())
    }
}

/// Invokes one agent; any error is fatal for the run
async fn dispatch(agent: Arc<dyn Agent>, input: AgentInput) -> Result<Value> {
    agent
        .run(&input)
        .await
        .map_err(|e| DeckError::agent(input.node_id.clone(), agent.name(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::agent::FnAgent;
    use crate::graph::GraphSpecBuilder;
    use serde_json::json;

    fn echo(name: &str) -> Arc<dyn Agent> {
        let tag = name.to_string();
        Arc::new(FnAgent::new(name, move |input: AgentInput| {
            let tag = tag.clone();
            async move { Ok(json!(format!("{}:{}", tag, input.node_id))) }
        }))
    }

    #[test]
    fn test_ready_set_fifo() {
        let mut ready = ReadySet::new(ReadyOrder::Fifo);
        ready.push("a".into());
        ready.push("b".into());
        assert_eq!(ready.pop().as_deref(), Some("a"));
        assert_eq!(ready.pop().as_deref(), Some("b"));
        assert_eq!(ready.pop(), None);
    }

    #[test]
    fn test_ready_set_shuffled_drains_everything() {
        let mut ready = ReadySet::new(ReadyOrder::Shuffled { seed: Some(42) });
        for id in ["a", "b", "c", "d"] {
            ready.push(id.into());
        }
        let mut seen: Vec<String> = std::iter::from_fn(|| ready.pop()).collect();
        seen.sort();
        assert_eq!(seen, vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_executor_is_reusable() {
        let agents = AgentRegistry::new().with(echo("x")).unwrap();
        let mut executor = GraphExecutor::new(agents);

        let first = GraphSpecBuilder::new("one")
            .num_slides(1)
            .node("a", "x")
            .entry("a")
            .build()
            .unwrap();
        let second = GraphSpecBuilder::new("two")
            .num_slides(2)
            .node("b", "x")
            .entry("b")
            .build()
            .unwrap();

        let s1 = executor.execute(&first).await.unwrap();
        let s2 = executor.execute(&second).await.unwrap();
        assert!(s1.contains_key("a") && !s1.contains_key("b"));
        assert!(s2.contains_key("b") && !s2.contains_key("a"));
        assert_eq!(s2.goal(), Some("two"));
    }

    #[tokio::test]
    async fn test_strict_graph_rejects_unreachable() {
        let agents = AgentRegistry::new().with(echo("x")).unwrap();
        let config = ExecutorConfig {
            strict_graph: true,
            ..Default::default()
        };
        let mut executor = GraphExecutor::with_config(agents, config).unwrap();
        let graph = GraphSpecBuilder::new("g")
            .num_slides(1)
            .node("a", "x")
            .node("lonely", "x")
            .entry("a")
            .build()
            .unwrap();
        let err = executor.run(&graph).await.unwrap_err();
        match err {
            DeckError::MalformedGraph { unreached, .. } => assert_eq!(unreached, vec!["lonely"]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_validate_input_hook_rejects() {
        struct NeedsSeed;

        #[async_trait::async_trait]
        impl Agent for NeedsSeed {
            fn name(&self) -> &str {
                "needs_seed"
            }
            async fn run(&self, _input: &AgentInput) -> anyhow::Result<Value> {
                Ok(json!("ran"))
            }
            fn validate_input(&self, input: &AgentInput) -> anyhow::Result<()> {
                input
                    .input_str()
                    .map(|_| ())
                    .ok_or_else(|| anyhow::anyhow!("seed input required"))
            }
        }

        let agents = AgentRegistry::new().with(Arc::new(NeedsSeed)).unwrap();
        let mut executor = GraphExecutor::new(agents);
        let graph = GraphSpecBuilder::new("g")
            .num_slides(1)
            .node("a", "needs_seed")
            .entry("a")
            .build()
            .unwrap();
        let err = executor.execute(&graph).await.unwrap_err();
        assert_eq!(err.category(), "input");
    }

    #[tokio::test]
    async fn test_schema_checked_at_boundary() {
        struct Schemed;

        #[async_trait::async_trait]
        impl Agent for Schemed {
            fn name(&self) -> &str {
                "schemed"
            }
            async fn run(&self, _input: &AgentInput) -> anyhow::Result<Value> {
                Ok(json!("ran"))
            }
            fn input_schema(&self) -> Option<Value> {
                Some(json!({"type": "object", "required": ["input"]}))
            }
        }

        let graph = GraphSpecBuilder::new("g")
            .num_slides(1)
            .node("a", "schemed")
            .entry("a")
            .build()
            .unwrap();

        let agents = AgentRegistry::new().with(Arc::new(Schemed)).unwrap();
        let mut strict = GraphExecutor::new(agents.clone());
        assert!(strict.execute(&graph).await.is_err());

        let lenient_config = ExecutorConfig {
            validate_schemas: false,
            ..Default::default()
        };
        let mut lenient = GraphExecutor::with_config(agents, lenient_config).unwrap();
        let state = lenient.execute(&graph).await.unwrap();
        assert_eq!(state.get("a"), Some(&json!("ran")));
    }
}

//! Scheduling guarantees of the graph executor

use deckflow::{
    AgentInput, AgentRegistry, DeckError, ExecutionMode, ExecutorConfig, FnAgent, GraphExecutor,
    GraphSpec, GraphSpecBuilder, ReadyOrder,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Payload seen by one agent invocation
#[derive(Debug, Clone)]
struct Invocation {
    node: String,
    state_keys: BTreeSet<String>,
    input: Option<Value>,
}

/// Registers agents that log every call and answer `"<node>-out"`
#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<Mutex<Vec<Invocation>>>,
}

impl Recorder {
    fn agent(&self, name: &str) -> FnAgent {
        self.agent_with_delay(name, false)
    }

    fn agent_with_delay(&self, name: &str, jitter: bool) -> FnAgent {
        let calls = self.calls.clone();
        FnAgent::new(name, move |input: AgentInput| {
            let calls = calls.clone();
            async move {
                calls.lock().unwrap().push(Invocation {
                    node: input.node_id.clone(),
                    state_keys: input.state.as_map().keys().cloned().collect(),
                    input: input.input.clone(),
                });
                if jitter {
                    tokio::time::sleep(Duration::from_millis(fastrand::u64(0..5))).await;
                }
                Ok(json!(format!("{}-out", input.node_id)))
            }
        })
    }

    fn registry(&self, names: &[&str]) -> AgentRegistry {
        let mut registry = AgentRegistry::new();
        for name in names {
            registry.register(Arc::new(self.agent(name))).unwrap();
        }
        registry
    }

    fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    fn call(&self, node: &str) -> Invocation {
        self.calls()
            .into_iter()
            .find(|c| c.node == node)
            .unwrap_or_else(|| panic!("{} was never invoked", node))
    }
}

fn keys(ids: &[&str]) -> BTreeSet<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

fn diamond() -> GraphSpec {
    GraphSpecBuilder::new("diamond")
        .num_slides(4)
        .node("a", "worker")
        .node("b", "worker")
        .node("c", "worker")
        .node("d", "worker")
        .edge("a", "b")
        .edge("a", "c")
        .edge("b", "d")
        .edge("c", "d")
        .entry("a")
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_linear_chain_threads_state() {
    let recorder = Recorder::default();
    let mut executor = GraphExecutor::new(recorder.registry(&["worker"]));
    let graph = GraphSpecBuilder::new("chain")
        .num_slides(2)
        .node("a", "worker")
        .node("b", "worker")
        .node("c", "worker")
        .chain(["a", "b", "c"])
        .entry("a")
        .build()
        .unwrap();

    let state = executor.execute(&graph).await.unwrap();

    assert_eq!(
        state.keys().collect::<Vec<_>>(),
        vec!["goal", "num_slides", "a", "b", "c"]
    );
    assert_eq!(state.get("b"), Some(&json!("b-out")));
    assert_eq!(recorder.call("c").state_keys, keys(&["goal", "num_slides", "a", "b"]));
    assert_eq!(recorder.call("a").state_keys, keys(&["goal", "num_slides"]));
}

#[tokio::test]
async fn test_diamond_runs_each_node_once() {
    for mode in [ExecutionMode::Sequential, ExecutionMode::Parallel] {
        let recorder = Recorder::default();
        let config = ExecutorConfig {
            mode,
            ..Default::default()
        };
        let mut executor = GraphExecutor::with_config(recorder.registry(&["worker"]), config).unwrap();

        let outcome = executor.run(&diamond()).await.unwrap();

        let mut invoked: Vec<String> = recorder.calls().into_iter().map(|c| c.node).collect();
        invoked.sort();
        assert_eq!(invoked, vec!["a", "b", "c", "d"]);
        assert_eq!(outcome.state.len(), 6);
        assert_eq!(outcome.report.executed.len(), 4);
        assert!(outcome.report.is_complete());
    }
}

#[tokio::test]
async fn test_join_waits_for_every_dependency_under_random_order() {
    for seed in 0..200u64 {
        let recorder = Recorder::default();
        let config = ExecutorConfig {
            ready_order: ReadyOrder::Shuffled { seed: Some(seed) },
            ..Default::default()
        };
        let mut executor = GraphExecutor::with_config(recorder.registry(&["worker"]), config).unwrap();
        executor.run(&diamond()).await.unwrap();

        let d = recorder.call("d");
        assert!(
            d.state_keys.contains("b") && d.state_keys.contains("c"),
            "seed {}: d saw {:?}",
            seed,
            d.state_keys
        );
        assert_eq!(recorder.calls().last().map(|c| c.node.clone()).as_deref(), Some("d"));
    }
}

#[tokio::test]
async fn test_parallel_join_with_uneven_agent_latency() {
    for seed in 0..25u64 {
        let recorder = Recorder::default();
        let registry = AgentRegistry::new()
            .with(Arc::new(recorder.agent_with_delay("worker", true)))
            .unwrap();
        let config = ExecutorConfig {
            mode: ExecutionMode::Parallel,
            max_parallel_nodes: 4,
            ready_order: ReadyOrder::Shuffled { seed: Some(seed) },
            ..Default::default()
        };
        let mut executor = GraphExecutor::with_config(registry, config).unwrap();
        let graph = GraphSpecBuilder::new("wide")
            .num_slides(1)
            .node("root", "worker")
            .node("left", "worker")
            .node("mid", "worker")
            .node("right", "worker")
            .node("join", "worker")
            .edge("root", "left")
            .edge("root", "mid")
            .edge("root", "right")
            .edge("left", "join")
            .edge("mid", "join")
            .edge("right", "join")
            .entry("root")
            .build()
            .unwrap();

        let state = executor.execute(&graph).await.unwrap();

        assert_eq!(state.len(), 7);
        assert_eq!(
            recorder.call("join").state_keys,
            keys(&["goal", "num_slides", "root", "left", "mid", "right"])
        );
    }
}

#[tokio::test]
async fn test_unknown_agent_aborts_before_anything_runs() {
    for ghost_at in ["a", "b", "c"] {
        let recorder = Recorder::default();
        let mut executor = GraphExecutor::new(recorder.registry(&["worker"]));
        let agent_for = |id: &str| if id == ghost_at { "ghost" } else { "worker" };
        let graph = GraphSpecBuilder::new("g")
            .num_slides(1)
            .node("a", agent_for("a"))
            .node("b", agent_for("b"))
            .node("c", agent_for("c"))
            .chain(["a", "b", "c"])
            .entry("a")
            .build()
            .unwrap();

        let err = executor.execute(&graph).await.unwrap_err();

        match err {
            DeckError::Configuration { actual, .. } => assert_eq!(actual.as_deref(), Some("ghost")),
            other => panic!("expected configuration error, got {:?}", other),
        }
        assert!(recorder.calls().is_empty(), "ghost at {}: nodes ran", ghost_at);
    }
}

#[tokio::test]
async fn test_unreachable_nodes_are_omitted() {
    let recorder = Recorder::default();
    let mut executor = GraphExecutor::new(recorder.registry(&["worker"]));
    // "stray" has no incoming edge but is not an entry node; "blocked" waits on it
    let graph = GraphSpecBuilder::new("g")
        .num_slides(1)
        .node("a", "worker")
        .node("b", "worker")
        .node("stray", "worker")
        .node("blocked", "worker")
        .edge("a", "b")
        .edge("stray", "blocked")
        .edge("b", "blocked")
        .entry("a")
        .build()
        .unwrap();

    let outcome = executor.run(&graph).await.unwrap();

    assert!(!outcome.state.contains_key("stray"));
    assert!(!outcome.state.contains_key("blocked"));
    assert_eq!(outcome.report.executed, vec!["a", "b"]);
    assert_eq!(outcome.report.unreached, vec!["blocked", "stray"]);
    assert_eq!(outcome.report.executed.len(), graph.diagnostics().runnable.len());
}

#[tokio::test]
async fn test_cycle_members_never_run() {
    let recorder = Recorder::default();
    let mut executor = GraphExecutor::new(recorder.registry(&["worker"]));
    let graph = GraphSpecBuilder::new("g")
        .num_slides(1)
        .node("a", "worker")
        .node("x", "worker")
        .node("y", "worker")
        .edge("a", "x")
        .edge("x", "y")
        .edge("y", "x")
        .entry("a")
        .build()
        .unwrap();
    assert!(graph.diagnostics().has_cycle);

    let state = executor.execute(&graph).await.unwrap();
    assert_eq!(state.node_outputs().map(|(k, _)| k).collect::<Vec<_>>(), vec!["a"]);
}

#[tokio::test]
async fn test_agent_failure_is_fatal() {
    let recorder = Recorder::default();
    let mut registry = recorder.registry(&["worker"]);
    registry
        .register(Arc::new(FnAgent::new("flaky", |_input: AgentInput| async {
            Err::<Value, _>(anyhow::anyhow!("upstream 503"))
        })))
        .unwrap();
    let mut executor = GraphExecutor::new(registry);
    let graph = GraphSpecBuilder::new("g")
        .num_slides(1)
        .node("a", "worker")
        .node("b", "flaky")
        .node("c", "worker")
        .chain(["a", "b", "c"])
        .entry("a")
        .build()
        .unwrap();

    let err = executor.execute(&graph).await.unwrap_err();

    match &err {
        DeckError::Agent { node, agent, source } => {
            assert_eq!(node, "b");
            assert_eq!(agent, "flaky");
            assert_eq!(source.to_string(), "upstream 503");
        }
        other => panic!("expected agent error, got {:?}", other),
    }
    let invoked: Vec<String> = recorder.calls().into_iter().map(|c| c.node).collect();
    assert_eq!(invoked, vec!["a"]);
}

#[tokio::test]
async fn test_seed_input_only_when_declared() {
    let recorder = Recorder::default();
    let mut executor = GraphExecutor::new(recorder.registry(&["worker"]));
    let graph = GraphSpecBuilder::new("g")
        .num_slides(1)
        .seeded_node("a", "worker", json!({"topic": "tides"}))
        .node("b", "worker")
        .edge("a", "b")
        .entry("a")
        .build()
        .unwrap();

    executor.execute(&graph).await.unwrap();

    assert_eq!(recorder.call("a").input, Some(json!({"topic": "tides"})));
    assert_eq!(recorder.call("b").input, None);
}

#[tokio::test]
async fn test_photosynthesis_end_to_end() {
    let research = FnAgent::new("R", |input: AgentInput| async move {
        Ok(json!(format!("facts about {}", input.goal)))
    });
    let content = FnAgent::new("C", |input: AgentInput| async move {
        let research = input.state.get_str("research").unwrap_or("nothing");
        Ok(json!({"outline": format!("outline of [{}]", research), "slides": input.num_slides()}))
    });
    let build = FnAgent::new("B", |input: AgentInput| async move {
        let content = input.state.get("content").cloned().unwrap_or(Value::Null);
        Ok(json!({"built_from": content}))
    });
    let registry = AgentRegistry::new()
        .with(Arc::new(research))
        .unwrap()
        .with(Arc::new(content))
        .unwrap()
        .with(Arc::new(build))
        .unwrap();

    let graph = GraphSpecBuilder::new("Photosynthesis")
        .num_slides(3)
        .node("research", "R")
        .node("content", "C")
        .node("build", "B")
        .edge("research", "content")
        .edge("content", "build")
        .entry("research")
        .build()
        .unwrap();

    let state = GraphExecutor::new(registry).execute(&graph).await.unwrap();

    assert_eq!(
        serde_json::to_value(&state).unwrap(),
        json!({
            "goal": "Photosynthesis",
            "num_slides": 3,
            "research": "facts about Photosynthesis",
            "content": {"outline": "outline of [facts about Photosynthesis]", "slides": 3},
            "build": {"built_from": {"outline": "outline of [facts about Photosynthesis]", "slides": 3}},
        })
    );
}

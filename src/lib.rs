//! deckflow - turn a goal into a slide deck by running a graph of agents.
//!
//! The execution core is [`GraphExecutor`]: it takes a validated
//! [`GraphSpec`] and an [`AgentRegistry`], runs every node once its
//! dependencies have completed, and returns the shared state the nodes wrote.
//! [`DeckPlanner`] and the [`agents`] module supply the slide-deck pipeline
//! built on top of it.

pub mod core;

pub mod agents;
pub mod executor;
pub mod graph;
pub mod planner;
pub mod response;

pub use crate::core::errors::{DeckError, Result};
pub use crate::core::{ExecutionMode, ExecutorConfig, PipelineConfig, ReadyOrder};
pub use executor::{
    Agent, AgentInput, AgentRegistry, ExecutionObserver, FnAgent, GraphExecutor, RunOutcome,
    RunReport, SharedState, StateSnapshot,
};
pub use graph::{GraphSpec, GraphSpecBuilder, NodeSpec};
pub use planner::{clamp_slide_count, DeckPlanner, GraphPlanner};
pub use response::{ExecutorResponse, NodeResult};

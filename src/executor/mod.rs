pub mod agent;
pub mod executor;
pub mod observer;
pub mod registry;
pub mod report;
pub mod state;

pub use agent::{check_schema, Agent, AgentInput, FnAgent};
pub use executor::GraphExecutor;
pub use observer::{ExecutionObserver, TracingObserver};
pub use registry::AgentRegistry;
pub use report::{RunOutcome, RunReport};
pub use state::{is_reserved_key, SharedState, StateSnapshot, GOAL_KEY, NUM_SLIDES_KEY, RESERVED_KEYS};

// Infrastructure shared by the graph model, the executor and the deck agents

pub mod config;
pub mod errors;

pub use config::{ExecutionMode, ExecutorConfig, PipelineConfig, ReadyOrder, MAX_SLIDES, MIN_SLIDES};
pub use errors::{DeckError, Result};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::errors::{DeckError, Result};

/// Smallest slide count a graph may carry
pub const MIN_SLIDES: u8 = 1;
/// Largest slide count a graph may carry
pub const MAX_SLIDES: u8 = 14;

/// How the executor drives ready nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// One ready node at a time
    Sequential,
    /// Independently-ready nodes run concurrently, writes stay linearized
    Parallel,
}

/// Which ready node is taken next when several are runnable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ReadyOrder {
    /// Insertion order
    Fifo,
    /// Uniformly random pick, reproducible when seeded
    Shuffled { seed: Option<u64> },
}

/// Configuration for graph execution behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_mode")]
    pub mode: ExecutionMode,
    /// Upper bound on nodes in flight in parallel mode
    #[serde(default = "default_max_parallel_nodes")]
    pub max_parallel_nodes: usize,
    #[serde(default = "default_ready_order")]
    pub ready_order: ReadyOrder,
    /// Reject graphs with unreachable nodes or cycles before running anything
    #[serde(default)]
    pub strict_graph: bool,
    /// Check payloads against agent-declared JSON schemas before invocation
    #[serde(default = "default_true")]
    pub validate_schemas: bool,
}

fn default_mode() -> ExecutionMode {
    ExecutionMode::Sequential
}

fn default_max_parallel_nodes() -> usize {
    3
}

fn default_ready_order() -> ReadyOrder {
    ReadyOrder::Fifo
}

fn default_true() -> bool {
    true
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            max_parallel_nodes: default_max_parallel_nodes(),
            ready_order: default_ready_order(),
            strict_graph: false,
            validate_schemas: true,
        }
    }
}

impl ExecutorConfig {
    /// Parallel execution with the given width
    pub fn parallel(max_parallel_nodes: usize) -> Self {
        Self {
            mode: ExecutionMode::Parallel,
            max_parallel_nodes,
            ..Default::default()
        }
    }

    /// Validates configuration values
    pub fn validate(&self) -> Result<()> {
        if self.max_parallel_nodes == 0 {
            return Err(DeckError::configuration_field(
                "max_parallel_nodes must be greater than 0",
                "max_parallel_nodes",
                ">= 1",
                self.max_parallel_nodes,
            ));
        }
        if self.max_parallel_nodes > 64 {
            return Err(DeckError::configuration_field(
                "max_parallel_nodes cannot exceed 64",
                "max_parallel_nodes",
                "<= 64",
                self.max_parallel_nodes,
            ));
        }
        Ok(())
    }
}

/// Top-level configuration for the deck pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Slide count used when a request does not name one
    #[serde(default = "default_slides")]
    pub default_slides: u8,
    /// Where rendered decks are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub executor: ExecutorConfig,
}

fn default_slides() -> u8 {
    MAX_SLIDES
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output").join("presentations")
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_slides: default_slides(),
            output_dir: default_output_dir(),
            executor: ExecutorConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DeckError::io(format!("read config {}", path.display()), e))?;
        Self::from_yaml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_SLIDES..=MAX_SLIDES).contains(&self.default_slides) {
            return Err(DeckError::configuration_field(
                "default_slides out of range",
                "default_slides",
                format!("{}..={}", MIN_SLIDES, MAX_SLIDES),
                self.default_slides,
            ));
        }
        self.executor.validate()
    }

    /// Overlays command-line choices; `None` keeps the file value
    pub fn merge(
        mut self,
        default_slides: Option<u8>,
        output_dir: Option<PathBuf>,
        mode: Option<ExecutionMode>,
    ) -> Result<Self> {
        if let Some(slides) = default_slides {
            self.default_slides = slides;
        }
        if let Some(dir) = output_dir {
            self.output_dir = dir;
        }
        if let Some(mode) = mode {
            self.executor.mode = mode;
        }
        self.validate()?;
        Ok(self)
    }
}

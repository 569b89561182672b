use std::collections::HashMap;
use thiserror::Error;

/// Unified error type for the deckflow library
#[derive(Debug, Error)]
pub enum DeckError {
    /// Graph specification rejected at construction time
    #[error("Invalid graph: {message}")]
    InvalidGraph {
        message: String,
        node: Option<String>,
    },

    /// Graph is well-formed but cannot run to completion (cycle or unreachable node)
    #[error("Malformed graph: {message}")]
    MalformedGraph {
        message: String,
        unreached: Vec<String>,
    },

    /// Configuration errors, including nodes bound to unregistered agents
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
        expected: Option<String>,
        actual: Option<String>,
    },

    /// Agent input rejected at the hand-off boundary
    #[error("Input rejected by agent {agent} for node {node}: {message}")]
    InvalidInput {
        node: String,
        agent: String,
        message: String,
    },

    /// Agent invocation returned an error
    #[error("Agent {agent} failed on node {node}")]
    Agent {
        node: String,
        agent: String,
        #[source]
        source: anyhow::Error,
    },

    /// A second write to a shared-state key
    #[error("State key already written: {key}")]
    StateConflict { key: String },

    /// Network/IO errors
    #[error("IO operation failed: {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization errors
    #[error("Serialization failed: {format}")]
    Serialization {
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        context: HashMap<String, String>,
    },
}

impl DeckError {
    /// Create a graph validation error
    pub fn invalid_graph<S: Into<String>>(message: S) -> Self {
        Self::InvalidGraph {
            message: message.into(),
            node: None,
        }
    }

    /// Create a graph validation error pointing at a node
    pub fn invalid_node<S: Into<String>, N: Into<String>>(message: S, node: N) -> Self {
        Self::InvalidGraph {
            message: message.into(),
            node: Some(node.into()),
        }
    }

    pub fn malformed<S: Into<String>>(message: S, unreached: Vec<String>) -> Self {
        Self::MalformedGraph {
            message: message.into(),
            unreached,
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            field: None,
            expected: None,
            actual: None,
        }
    }

    /// Create a configuration error for a field with an out-of-range value
    pub fn configuration_field<S, F, E, A>(message: S, field: F, expected: E, actual: A) -> Self
    where
        S: Into<String>,
        F: Into<String>,
        E: Into<String>,
        A: ToString,
    {
        Self::Configuration {
            message: message.into(),
            field: Some(field.into()),
            expected: Some(expected.into()),
            actual: Some(actual.to_string()),
        }
    }

    /// Create the error raised when a node names an agent missing from the table
    pub fn unknown_agent<N: Into<String>, A: Into<String>>(node: N, agent: A) -> Self {
        let node = node.into();
        let agent = agent.into();
        Self::Configuration {
            message: format!("Unknown agent '{}' referenced by node '{}'", agent, node),
            field: Some("agent".to_string()),
            expected: None,
            actual: Some(agent),
        }
    }

    pub fn invalid_input<N, A, M>(node: N, agent: A, message: M) -> Self
    where
        N: Into<String>,
        A: Into<String>,
        M: Into<String>,
    {
        Self::InvalidInput {
            node: node.into(),
            agent: agent.into(),
            message: message.into(),
        }
    }

    /// Wrap an agent failure
    pub fn agent<N: Into<String>, A: Into<String>>(node: N, agent: A, source: anyhow::Error) -> Self {
        Self::Agent {
            node: node.into(),
            agent: agent.into(),
            source,
        }
    }

    /// Create an IO error
    pub fn io<S: Into<String>>(operation: S, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        format: S,
        source: E,
    ) -> Self {
        Self::Serialization {
            format: format.into(),
            source: Box::new(source),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
            context: HashMap::new(),
        }
    }

    /// Add context to an internal error
    pub fn with_context<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        if let Self::Internal { ref mut context, .. } = self {
            context.insert(key.into(), value.into());
        }
        self
    }

    /// Check if error is recoverable
    ///
    /// Nothing raised by a run is retried by the executor; this only tells callers
    /// whether resubmitting the same request could succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io { .. } | Self::Agent { .. } => true,
            Self::InvalidGraph { .. }
            | Self::MalformedGraph { .. }
            | Self::Configuration { .. }
            | Self::InvalidInput { .. } => false,
            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidGraph { .. } => "validation",
            Self::MalformedGraph { .. } => "graph",
            Self::Configuration { .. } => "configuration",
            Self::InvalidInput { .. } => "input",
            Self::Agent { .. } => "agent",
            Self::StateConflict { .. } => "state",
            Self::Io { .. } => "io",
            Self::Serialization { .. } => "serialization",
            Self::Internal { .. } => "internal",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, DeckError>;

impl From<std::io::Error> for DeckError {
    fn from(err: std::io::Error) -> Self {
        Self::io("io_operation", err)
    }
}

impl From<serde_json::Error> for DeckError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization("json", err)
    }
}

impl From<serde_yaml::Error> for DeckError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::serialization("yaml", err)
    }
}

impl From<anyhow::Error> for DeckError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err.to_string()).with_context("source", "anyhow")
    }
}

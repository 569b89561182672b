//! Agent lookup table handed to the executor.

use std::collections::HashMap;
use std::sync::Arc;

use super::agent::Agent;
use crate::core::errors::{DeckError, Result};

/// Registry mapping agent identifiers to agents
#[derive(Clone, Default)]
pub struct AgentRegistry {
    agents: HashMap<String, Arc<dyn Agent>>,
}

impl AgentRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent under its own name; names are unique
    pub fn register(&mut self, agent: Arc<dyn Agent>) -> Result<()> {
        let name = agent.name().to_string();
        if self.agents.contains_key(&name) {
            return Err(DeckError::configuration(format!(
                "Agent already registered: {}",
                name
            )));
        }
        self.agents.insert(name, agent);
        Ok(())
    }

    /// Chaining form of [`register`](Self::register)
    pub fn with(mut self, agent: Arc<dyn Agent>) -> Result<Self> {
        self.register(agent)?;
        Ok(self)
    }

    /// Get an agent by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Agent>> {
        self.agents.get(name).cloned()
    }

    /// Check if an agent is registered
    pub fn contains(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    /// List all registered agent names, sorted
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.agents.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("agents", &self.list())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::agent::FnAgent;
    use serde_json::json;

    fn agent(name: &str) -> Arc<dyn Agent> {
        Arc::new(FnAgent::new(name, |_| async { Ok(json!(null)) }))
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = AgentRegistry::new()
            .with(agent("research_agent"))
            .unwrap()
            .with(agent("content_agent"))
            .unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("research_agent"));
        assert!(registry.get("image_agent").is_none());
        assert_eq!(registry.list(), vec!["content_agent", "research_agent"]);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = AgentRegistry::new();
        registry.register(agent("a")).unwrap();
        assert!(registry.register(agent("a")).is_err());
    }

    #[test]
    fn test_registries_are_independent() {
        let first = AgentRegistry::new().with(agent("a")).unwrap();
        let second = AgentRegistry::new().with(agent("b")).unwrap();
        assert!(first.contains("a") && !first.contains("b"));
        assert!(second.contains("b") && !second.contains("a"));
    }
}

use crate::types::AgentRegistration;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Central registry of agents and their declared capabilities.
///
/// Harnesses register on start and flip availability off on stop;
/// re-registration overwrites in place.
#[derive(Default)]
pub struct AgentRegistry {
    agents: Arc<RwLock<HashMap<String, AgentRegistration>>>,
}

impl AgentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an agent, overwriting any previous registration.
    pub async fn register(&self, registration: AgentRegistration) {
        info!(
            agent_id = %registration.agent_id,
            capabilities = registration.capabilities.len(),
            "Registered agent"
        );
        let mut agents = self.agents.write().await;
        agents.insert(registration.agent_id.clone(), registration);
    }

    /// Looks an agent up by id.
    pub async fn find_by_id(&self, agent_id: &str) -> Option<AgentRegistration> {
        let agents = self.agents.read().await;
        agents.get(agent_id).cloned()
    }

    /// All available agents declaring the named capability, matched
    /// case-insensitively.
    pub async fn find_by_capability(&self, capability: &str) -> Vec<AgentRegistration> {
        let agents = self.agents.read().await;
        let mut matches: Vec<AgentRegistration> = agents
            .values()
            .filter(|agent| {
                agent.is_available && agent.capabilities.iter().any(|cap| cap.matches(capability))
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.registered_at.cmp(&b.registered_at));
        matches
    }

    /// Flips an agent's availability. Unknown ids are ignored.
    pub async fn set_available(&self, agent_id: &str, available: bool) {
        let mut agents = self.agents.write().await;
        if let Some(agent) = agents.get_mut(agent_id) {
            agent.is_available = available;
        }
    }

    /// All currently available agents.
    pub async fn available_agents(&self) -> Vec<AgentRegistration> {
        let agents = self.agents.read().await;
        agents
            .values()
            .filter(|agent| agent.is_available)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::types::AgentCapability;
    use chrono::Utc;

    fn registration(id: &str, capability: &str) -> AgentRegistration {
        AgentRegistration {
            agent_id: id.to_string(),
            name: id.to_string(),
            agent_type: "worker".to_string(),
            capabilities: vec![AgentCapability::new(capability, "")],
            registered_at: Utc::now(),
            is_available: true,
        }
    }

    #[tokio::test]
    async fn test_register_and_find() {
        let registry = AgentRegistry::new();
        registry.register(registration("writer", "draft")).await;
        let found = registry.find_by_id("writer").await.unwrap();
        assert!(found.is_available);
        assert!(registry.find_by_id("ghost").await.is_none());
    }

    #[tokio::test]
    async fn test_capability_lookup_is_case_insensitive() {
        let registry = AgentRegistry::new();
        registry.register(registration("writer", "Draft")).await;
        let matches = registry.find_by_capability("dRaFt").await;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].agent_id, "writer");
    }

    #[tokio::test]
    async fn test_unavailable_agents_are_excluded() {
        let registry = AgentRegistry::new();
        registry.register(registration("writer", "draft")).await;
        registry.set_available("writer", false).await;
        assert!(registry.find_by_capability("draft").await.is_empty());
        assert!(registry.available_agents().await.is_empty());
    }

    #[tokio::test]
    async fn test_reregistration_overwrites() {
        let registry = AgentRegistry::new();
        registry.register(registration("writer", "draft")).await;
        registry.set_available("writer", false).await;
        registry.register(registration("writer", "draft")).await;
        let found = registry.find_by_id("writer").await.unwrap();
        assert!(found.is_available);
    }
}

use crate::agent::Agent;
use crate::harness::AgentHarness;
use delegor_bus::MessageBus;
use delegor_core::{DelegorError, DelegorResult};
use delegor_ledger::AgentRegistry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

struct RunningAgent {
    harness: Arc<AgentHarness>,
    team_id: Option<String>,
}

/// Owns the set of running harnesses: static boot, dynamic start/stop, and
/// team-scoped grouping.
pub struct AgentRuntime {
    bus: Arc<dyn MessageBus>,
    registry: Arc<AgentRegistry>,
    static_agents: Vec<(Arc<dyn Agent>, Option<String>)>,
    running: RwLock<HashMap<String, RunningAgent>>,
    teams: RwLock<HashMap<String, HashSet<String>>>,
}

impl AgentRuntime {
    /// Creates a runtime with no agents.
    pub fn new(bus: Arc<dyn MessageBus>, registry: Arc<AgentRegistry>) -> Self {
        Self {
            bus,
            registry,
            static_agents: Vec::new(),
            running: RwLock::new(HashMap::new()),
            teams: RwLock::new(HashMap::new()),
        }
    }

    /// Queues an agent for the next [`AgentRuntime::start`].
    pub fn add_static_agent(&mut self, agent: Arc<dyn Agent>, team_id: Option<String>) {
        self.static_agents.push((agent, team_id));
    }

    /// Starts every statically configured agent, sequentially, surfacing
    /// the first failure.
    pub async fn start(&self) -> DelegorResult<()> {
        for (agent, team_id) in &self.static_agents {
            self.start_agent(agent.clone(), team_id.as_deref()).await?;
        }
        info!(agents = self.static_agents.len(), "Agent runtime started");
        Ok(())
    }

    /// Starts one agent, optionally under a team. Fails if the agent id is
    /// already running.
    pub async fn start_agent(&self, agent: Arc<dyn Agent>, team_id: Option<&str>) -> DelegorResult<()> {
        let agent_id = agent.agent_id().to_string();
        let mut running = self.running.write().await;
        if running.contains_key(&agent_id) {
            return Err(DelegorError::Agent(format!(
                "agent '{agent_id}' is already running"
            )));
        }

        let harness = Arc::new(AgentHarness::new(
            agent,
            self.bus.clone(),
            self.registry.clone(),
        ));
        harness.start().await?;

        if let Some(team) = team_id {
            let mut teams = self.teams.write().await;
            teams
                .entry(team.to_string())
                .or_default()
                .insert(agent_id.clone());
        }
        running.insert(
            agent_id,
            RunningAgent {
                harness,
                team_id: team_id.map(ToString::to_string),
            },
        );
        Ok(())
    }

    /// Stops one agent. Unknown ids log and no-op.
    pub async fn stop_agent(&self, agent_id: &str) {
        let removed = self.running.write().await.remove(agent_id);
        let Some(running) = removed else {
            warn!(agent_id, "Stop requested for an agent that is not running");
            return;
        };
        if let Some(team) = &running.team_id {
            let mut teams = self.teams.write().await;
            if let Some(members) = teams.get_mut(team) {
                members.remove(agent_id);
                if members.is_empty() {
                    teams.remove(team);
                }
            }
        }
        running.harness.stop().await;
    }

    /// Stops every currently tracked member of a team, then drops the team.
    pub async fn stop_team(&self, team_id: &str) {
        let members = self.teams.write().await.remove(team_id);
        let Some(members) = members else {
            warn!(team_id, "Stop requested for an unknown team");
            return;
        };
        info!(team_id, members = members.len(), "Stopping team");
        for agent_id in members {
            self.stop_agent(&agent_id).await;
        }
    }

    /// Gracefully drains every running agent.
    pub async fn shutdown(&self) {
        let agent_ids: Vec<String> = self.running.read().await.keys().cloned().collect();
        for agent_id in agent_ids {
            self.stop_agent(&agent_id).await;
        }
        info!("Agent runtime stopped");
    }

    /// Whether the given agent is currently running.
    pub async fn is_running(&self, agent_id: &str) -> bool {
        self.running.read().await.contains_key(agent_id)
    }

    /// Number of currently running agents.
    pub async fn running_count(&self) -> usize {
        self.running.read().await.len()
    }

    /// Ids of the currently tracked members of a team.
    pub async fn team_members(&self, team_id: &str) -> Vec<String> {
        self.teams
            .read()
            .await
            .get(team_id)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }
}

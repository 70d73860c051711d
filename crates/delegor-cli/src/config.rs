use delegor_orchestrator::SkillAgentConfig;
use serde::Deserialize;

/// Top-level TOML configuration for the `delegor` binary.
#[derive(Debug, Deserialize)]
pub struct DelegorConfig {
    /// The orchestrating agent.
    pub orchestrator: SkillAgentConfig,
    /// Demo worker agents started alongside it.
    #[serde(default)]
    pub agents: Vec<WorkerConfig>,
    /// Queue the CLI listens on for the final reply.
    #[serde(default = "default_reply_queue")]
    pub reply_queue: String,
}

/// One configured demo worker.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// Agent id (also the queue suffix).
    pub id: String,
    /// Display name; defaults to the id.
    #[serde(default)]
    pub name: Option<String>,
    /// The single capability this worker advertises.
    pub capability: String,
    /// Capability description shown in `delegor agents`.
    #[serde(default)]
    pub description: String,
    /// Optional team for group stop semantics.
    #[serde(default)]
    pub team: Option<String>,
    /// Prefix stamped on the worker's replies; defaults to the capability.
    #[serde(default)]
    pub reply_prefix: Option<String>,
    /// Declared authority tier for tasks routed to this capability.
    #[serde(default)]
    pub authority: Option<String>,
}

fn default_reply_queue() -> String {
    "cli.reply".to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_parses() {
        let config: DelegorConfig = toml::from_str(
            r#"
            [orchestrator]
            agent_id = "orchestrator"
            name = "Orchestrator"
            escalation_target = "human-operator"

            [[agents]]
            id = "writer"
            capability = "draft"

            [[agents]]
            id = "reviewer"
            capability = "review"
            team = "editorial"
            "#,
        )
        .unwrap();
        assert_eq!(config.agents.len(), 2);
        assert_eq!(config.reply_queue, "cli.reply");
        assert_eq!(config.agents[1].team.as_deref(), Some("editorial"));
    }
}

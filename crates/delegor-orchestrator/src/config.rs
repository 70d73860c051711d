use delegor_core::AuthorityTier;
use delegor_ledger::AgentCapability;
use serde::{Deserialize, Serialize};

/// Configuration for a [`crate::SkillDrivenAgent`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillAgentConfig {
    /// Stable agent identifier (also the queue suffix).
    pub agent_id: String,
    /// Display name.
    pub name: String,
    /// Capabilities the orchestrator itself advertises.
    #[serde(default)]
    pub capabilities: Vec<AgentCapability>,
    /// Decompositions below this confidence escalate instead of routing.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    /// Inbound mandates at or above this tier are gated behind approval.
    #[serde(default = "default_approval_tier")]
    pub approval_tier: AuthorityTier,
    /// Agent id that receives escalations and plan proposals.
    pub escalation_target: String,
    /// Lifetime of issued authority claims, in seconds. `None` means the
    /// claims never expire.
    #[serde(default)]
    pub claim_ttl_secs: Option<u64>,
}

fn default_confidence_threshold() -> f32 {
    0.6
}

fn default_approval_tier() -> AuthorityTier {
    AuthorityTier::MustAskFirst
}

impl SkillAgentConfig {
    /// Creates a config with default threshold, approval tier, and no
    /// claim expiry.
    pub fn new(
        agent_id: impl Into<String>,
        name: impl Into<String>,
        escalation_target: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            name: name.into(),
            capabilities: Vec::new(),
            confidence_threshold: default_confidence_threshold(),
            approval_tier: default_approval_tier(),
            escalation_target: escalation_target.into(),
            claim_ttl_secs: None,
        }
    }

    /// Overrides the confidence threshold.
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Overrides the approval tier.
    pub fn with_approval_tier(mut self, tier: AuthorityTier) -> Self {
        self.approval_tier = tier;
        self
    }
}

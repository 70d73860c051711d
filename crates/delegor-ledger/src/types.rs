use chrono::{DateTime, Utc};
use delegor_core::{DecompositionResult, MessageEnvelope, ReferenceCode};
use serde::{Deserialize, Serialize};

/// A declared skill an agent can be matched on by name (case-insensitive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCapability {
    /// Capability name used for routing matches.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Skill identifiers backing this capability, if any.
    #[serde(default)]
    pub skill_ids: Vec<String>,
}

impl AgentCapability {
    /// Creates a capability with no backing skill ids.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            skill_ids: Vec::new(),
        }
    }

    /// Case-insensitive name match.
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// A registered agent, as seen by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRegistration {
    /// Stable agent identifier (also the queue suffix).
    pub agent_id: String,
    /// Display name.
    pub name: String,
    /// Coarse kind, e.g. `worker` or `orchestrator`.
    pub agent_type: String,
    /// Declared capabilities.
    pub capabilities: Vec<AgentCapability>,
    /// When the harness registered this agent.
    pub registered_at: DateTime<Utc>,
    /// Whether the agent is currently consuming its queue.
    pub is_available: bool,
}

/// Lifecycle of a delegated task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelegationStatus {
    /// Routed to the recipient, not yet picked up.
    Assigned,
    /// The recipient reported starting work.
    InProgress,
    /// Finished by the recipient, awaiting review.
    AwaitingReview,
    /// Accepted as done.
    Complete,
    /// Flagged as stale by the deadline sweep.
    Overdue,
}

/// One delegation: who routed what to whom, and where it stands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationRecord {
    /// Tracking token for this delegation.
    pub reference_code: ReferenceCode,
    /// The delegating agent.
    pub delegated_by: String,
    /// The recipient agent.
    pub delegated_to: String,
    /// What was asked.
    pub description: String,
    /// Current lifecycle status.
    pub status: DelegationStatus,
    /// When the delegation was recorded.
    pub assigned_at: DateTime<Utc>,
}

impl DelegationRecord {
    /// Creates an `Assigned` record stamped now.
    pub fn assigned(
        reference_code: ReferenceCode,
        delegated_by: impl Into<String>,
        delegated_to: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            reference_code,
            delegated_by: delegated_by.into(),
            delegated_to: delegated_to.into(),
            description: description.into(),
            status: DelegationStatus::Assigned,
            assigned_at: Utc::now(),
        }
    }
}

/// One dispatched sub-task within a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtaskDispatch {
    /// The child tracking token.
    pub reference_code: ReferenceCode,
    /// Capability the sub-task was routed on.
    pub capability: String,
    /// What the recipient was asked to do.
    pub description: String,
}

/// Status of a fan-out workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Sub-tasks dispatched, replies pending.
    InProgress,
    /// All replies received and the assembled result published.
    Completed,
}

/// Parent→children bookkeeping for one fan-out.
///
/// The sub-task set is fixed at creation; a workflow is never partially
/// re-dispatched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRecord {
    /// The parent tracking token (the original request's code).
    pub reference_code: ReferenceCode,
    /// The envelope that triggered the fan-out.
    pub original_envelope: MessageEnvelope,
    /// The dispatched sub-tasks, in dispatch order.
    pub subtasks: Vec<SubtaskDispatch>,
    /// The decomposition summary.
    pub summary: String,
    /// Current status.
    pub status: WorkflowStatus,
    /// When the fan-out was recorded.
    pub created_at: DateTime<Utc>,
    /// When the fan-in completed, if it has.
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkflowRecord {
    /// Creates an `InProgress` record stamped now.
    pub fn new(
        reference_code: ReferenceCode,
        original_envelope: MessageEnvelope,
        subtasks: Vec<SubtaskDispatch>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            reference_code,
            original_envelope,
            subtasks,
            summary: summary.into(),
            status: WorkflowStatus::InProgress,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// A plan parked behind the approval gate, consumed exactly once by the
/// matching decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingPlan {
    /// The request the plan was derived from.
    pub original_envelope: MessageEnvelope,
    /// The decomposition awaiting sign-off.
    pub decomposition: DecompositionResult,
    /// When the plan was parked.
    pub stored_at: DateTime<Utc>,
}

impl PendingPlan {
    /// Parks a plan stamped now.
    pub fn new(original_envelope: MessageEnvelope, decomposition: DecompositionResult) -> Self {
        Self {
            original_envelope,
            decomposition,
            stored_at: Utc::now(),
        }
    }
}

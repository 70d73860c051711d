use crate::refcode::ReferenceCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// The payload carried by a [`Message`].
///
/// The payload kind is resolved once per inbound message; consumers dispatch
/// on the variant rather than inspecting content at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessagePayload {
    /// Plain text content.
    Text {
        /// The text body.
        text: String,
    },
    /// A plan awaiting approval before dispatch.
    PlanProposal {
        /// One-line summary of the proposed decomposition.
        summary: String,
        /// Per-task descriptions, in dispatch order.
        task_descriptions: Vec<String>,
        /// The goal of the originating request, when known.
        original_goal: Option<String>,
        /// The tracking token the decision must quote back.
        workflow_code: ReferenceCode,
    },
    /// The decision on a previously proposed plan.
    PlanDecision {
        /// The tracking token from the proposal.
        workflow_code: ReferenceCode,
        /// Whether the plan may be dispatched.
        approved: bool,
        /// Reviewer-supplied reason, usually present on rejection.
        rejection_reason: Option<String>,
    },
}

/// A single message exchanged between agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for this message.
    pub id: Uuid,
    /// The payload, dispatched on by kind.
    pub payload: MessagePayload,
    /// UTC timestamp of when the message was created.
    pub timestamp: DateTime<Utc>,
    /// Arbitrary key-value metadata attached to the message.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Message {
    /// Creates a new message with the given payload.
    pub fn new(payload: MessagePayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload,
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// Creates a plain-text message.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(MessagePayload::Text { text: text.into() })
    }

    /// Creates a plan-proposal message.
    pub fn plan_proposal(
        summary: impl Into<String>,
        task_descriptions: Vec<String>,
        original_goal: Option<String>,
        workflow_code: ReferenceCode,
    ) -> Self {
        Self::new(MessagePayload::PlanProposal {
            summary: summary.into(),
            task_descriptions,
            original_goal,
            workflow_code,
        })
    }

    /// Creates a plan-decision message.
    pub fn plan_decision(
        workflow_code: ReferenceCode,
        approved: bool,
        rejection_reason: Option<String>,
    ) -> Self {
        Self::new(MessagePayload::PlanDecision {
            workflow_code,
            approved,
            rejection_reason,
        })
    }

    /// Renders the payload as display text.
    pub fn content(&self) -> String {
        match &self.payload {
            MessagePayload::Text { text } => text.clone(),
            MessagePayload::PlanProposal {
                summary,
                task_descriptions,
                original_goal,
                workflow_code,
            } => {
                let mut out = format!("Plan {workflow_code}: {summary}");
                if let Some(goal) = original_goal {
                    out.push_str(&format!("\nGoal: {goal}"));
                }
                for (i, desc) in task_descriptions.iter().enumerate() {
                    out.push_str(&format!("\n{}. {desc}", i + 1));
                }
                out
            }
            MessagePayload::PlanDecision {
                workflow_code,
                approved,
                rejection_reason,
            } => {
                let verdict = if *approved { "approved" } else { "rejected" };
                match rejection_reason {
                    Some(reason) => format!("Plan {workflow_code} {verdict}: {reason}"),
                    None => format!("Plan {workflow_code} {verdict}"),
                }
            }
        }
    }
}

use crate::authority::{max_claim_tier, AuthorityClaim, AuthorityTier};
use crate::message::Message;
use crate::refcode::ReferenceCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Routing metadata carried alongside a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageContext {
    /// Queue name a reply should be published to.
    pub reply_to: Option<String>,
    /// Id of the message this one was produced in response to.
    pub parent_message_id: Option<Uuid>,
    /// Id of the agent that sent this envelope.
    pub from_agent_id: Option<String>,
    /// Team the originating conversation belongs to.
    pub team_id: Option<String>,
    /// External channel the originating conversation arrived on.
    pub channel_id: Option<String>,
    /// The goal of the originating request, threaded through delegations.
    pub original_goal: Option<String>,
}

/// The immutable per-hop wrapper around a [`Message`].
///
/// Envelopes are never mutated in place: every hop derives a new envelope
/// with the `with_*` methods, inheriting or rewriting specific fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEnvelope {
    /// The wrapped message.
    pub message: Message,
    /// The tracking token for the logical task this envelope belongs to.
    pub reference_code: ReferenceCode,
    /// Authority claims carried on this hop.
    #[serde(default)]
    pub claims: Vec<AuthorityClaim>,
    /// Routing metadata.
    #[serde(default)]
    pub context: MessageContext,
}

impl MessageEnvelope {
    /// Creates an envelope with no claims and an empty context.
    pub fn new(message: Message, reference_code: ReferenceCode) -> Self {
        Self {
            message,
            reference_code,
            claims: Vec::new(),
            context: MessageContext::default(),
        }
    }

    /// Replaces the tracking token.
    pub fn with_reference_code(mut self, reference_code: ReferenceCode) -> Self {
        self.reference_code = reference_code;
        self
    }

    /// Replaces the claim set.
    pub fn with_claims(mut self, claims: Vec<AuthorityClaim>) -> Self {
        self.claims = claims;
        self
    }

    /// Replaces the routing context.
    pub fn with_context(mut self, context: MessageContext) -> Self {
        self.context = context;
        self
    }

    /// Sets the reply queue.
    pub fn with_reply_to(mut self, queue: impl Into<String>) -> Self {
        self.context.reply_to = Some(queue.into());
        self
    }

    /// Stamps lineage: the parent message id and the sending agent.
    pub fn with_lineage(mut self, parent_message_id: Uuid, from_agent_id: impl Into<String>) -> Self {
        self.context.parent_message_id = Some(parent_message_id);
        self.context.from_agent_id = Some(from_agent_id.into());
        self
    }

    /// The highest tier among this envelope's claims, defaulting to
    /// [`AuthorityTier::Autonomous`] when there are none.
    pub fn max_claim_tier(&self) -> AuthorityTier {
        max_claim_tier(&self.claims)
    }
}

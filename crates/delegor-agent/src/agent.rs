use async_trait::async_trait;
use delegor_core::{DelegorResult, Message, MessageEnvelope};
use delegor_ledger::AgentCapability;
use tokio_util::sync::CancellationToken;

/// The queue an agent consumes, derived from its id.
pub fn agent_queue(agent_id: &str) -> String {
    format!("agent.{agent_id}")
}

/// An addressable unit of work processing.
///
/// Implementations hold their own state; the harness owns the consumer
/// loop, claim validation, and reply routing around them.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Stable identifier; also the suffix of the agent's queue name.
    fn agent_id(&self) -> &str;

    /// Display name.
    fn name(&self) -> &str;

    /// Coarse kind, e.g. `worker` or `orchestrator`.
    fn agent_type(&self) -> &str {
        "worker"
    }

    /// Declared capabilities, used for routing matches.
    fn capabilities(&self) -> Vec<AgentCapability>;

    /// Processes one inbound envelope. Returning `Some(message)` asks the
    /// harness to route a reply via the envelope's `reply_to`; `None` means
    /// the agent handled (or published) everything itself.
    async fn process(
        &self,
        envelope: &MessageEnvelope,
        cancel: &CancellationToken,
    ) -> DelegorResult<Option<Message>>;
}

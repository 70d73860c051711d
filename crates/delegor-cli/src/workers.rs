use crate::config::WorkerConfig;
use async_trait::async_trait;
use delegor_agent::Agent;
use delegor_core::{DelegorResult, Message, MessageEnvelope};
use delegor_ledger::AgentCapability;
use tokio_util::sync::CancellationToken;

/// A demo worker that answers every task with a prefixed rendering of the
/// request. Stands in for real skill execution at the CLI edge.
pub struct TemplateAgent {
    id: String,
    name: String,
    capability: AgentCapability,
    prefix: String,
}

impl TemplateAgent {
    /// Builds a worker from its config section.
    pub fn from_config(config: &WorkerConfig) -> Self {
        Self {
            id: config.id.clone(),
            name: config.name.clone().unwrap_or_else(|| config.id.clone()),
            capability: AgentCapability::new(&config.capability, &config.description),
            prefix: config
                .reply_prefix
                .clone()
                .unwrap_or_else(|| config.capability.clone()),
        }
    }
}

#[async_trait]
impl Agent for TemplateAgent {
    fn agent_id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Vec<AgentCapability> {
        vec![self.capability.clone()]
    }

    async fn process(
        &self,
        envelope: &MessageEnvelope,
        _cancel: &CancellationToken,
    ) -> DelegorResult<Option<Message>> {
        Ok(Some(Message::text(format!(
            "[{}] {}",
            self.prefix,
            envelope.message.content()
        ))))
    }
}

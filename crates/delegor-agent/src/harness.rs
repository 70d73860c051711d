use crate::agent::{agent_queue, Agent};
use async_trait::async_trait;
use chrono::Utc;
use delegor_bus::{ConsumerHandle, MessageBus, MessageHandler};
use delegor_core::{DelegorError, DelegorResult, MessageContext, MessageEnvelope};
use delegor_ledger::{AgentRegistration, AgentRegistry};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

struct HarnessInner {
    agent: Arc<dyn Agent>,
    bus: Arc<dyn MessageBus>,
    cancel: CancellationToken,
}

#[async_trait]
impl MessageHandler for HarnessInner {
    async fn handle(&self, envelope: MessageEnvelope) {
        let agent_id = self.agent.agent_id();
        let now = Utc::now();

        // Fail closed: one bad claim drops the whole message. No response,
        // no requeue.
        for claim in &envelope.claims {
            if claim.is_expired(now) {
                warn!(
                    agent_id,
                    reference_code = %envelope.reference_code,
                    granted_by = %claim.granted_by,
                    "Dropping message carrying an expired authority claim"
                );
                return;
            }
            if !claim.covers(agent_id) {
                warn!(
                    agent_id,
                    reference_code = %envelope.reference_code,
                    granted_to = %claim.granted_to,
                    "Dropping message carrying a misdirected authority claim"
                );
                return;
            }
        }

        let reply = match self.agent.process(&envelope, &self.cancel).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(
                    agent_id,
                    reference_code = %envelope.reference_code,
                    error = %e,
                    "Agent failed to process message"
                );
                return;
            }
        };
        let Some(reply) = reply else { return };

        let Some(reply_to) = envelope.context.reply_to.clone() else {
            warn!(
                agent_id,
                reference_code = %envelope.reference_code,
                "Agent produced a reply but the envelope has no reply queue; dropping"
            );
            return;
        };

        let outbound = MessageEnvelope::new(reply, envelope.reference_code.clone()).with_context(
            MessageContext {
                reply_to: None,
                parent_message_id: Some(envelope.message.id),
                from_agent_id: Some(agent_id.to_string()),
                team_id: envelope.context.team_id.clone(),
                channel_id: envelope.context.channel_id.clone(),
                original_goal: envelope.context.original_goal.clone(),
            },
        );
        if let Err(e) = self.bus.publish(outbound, &reply_to).await {
            error!(
                agent_id,
                reference_code = %envelope.reference_code,
                queue = %reply_to,
                error = %e,
                "Failed to publish reply"
            );
        }
    }
}

/// Binds one agent to the queue `agent.{agent_id}`.
pub struct AgentHarness {
    inner: Arc<HarnessInner>,
    registry: Arc<AgentRegistry>,
    handle: Mutex<Option<ConsumerHandle>>,
}

impl AgentHarness {
    /// Creates a harness; nothing runs until [`AgentHarness::start`].
    pub fn new(agent: Arc<dyn Agent>, bus: Arc<dyn MessageBus>, registry: Arc<AgentRegistry>) -> Self {
        Self {
            inner: Arc::new(HarnessInner {
                agent,
                bus,
                cancel: CancellationToken::new(),
            }),
            registry,
            handle: Mutex::new(None),
        }
    }

    /// The id of the bound agent.
    pub fn agent_id(&self) -> &str {
        self.inner.agent.agent_id()
    }

    /// Registers the agent as available and begins consuming its queue.
    pub async fn start(&self) -> DelegorResult<()> {
        let mut handle = self.handle.lock().await;
        if handle.is_some() {
            return Err(DelegorError::Agent(format!(
                "agent '{}' is already consuming",
                self.agent_id()
            )));
        }
        // Harnesses are one-shot; restarting an agent builds a new harness.
        if self.inner.cancel.is_cancelled() {
            return Err(DelegorError::Agent(format!(
                "harness for agent '{}' was stopped",
                self.agent_id()
            )));
        }

        let agent = &self.inner.agent;
        self.registry
            .register(AgentRegistration {
                agent_id: agent.agent_id().to_string(),
                name: agent.name().to_string(),
                agent_type: agent.agent_type().to_string(),
                capabilities: agent.capabilities(),
                registered_at: Utc::now(),
                is_available: true,
            })
            .await;

        let queue = agent_queue(agent.agent_id());
        let consumer = self
            .inner
            .bus
            .start_consuming(&queue, self.inner.clone())
            .await?;
        info!(agent_id = %agent.agent_id(), queue, "Agent harness started");
        *handle = Some(consumer);
        Ok(())
    }

    /// Stops this agent's consumer (siblings on the bus are unaffected) and
    /// flips its availability off. Idempotent.
    pub async fn stop(&self) {
        self.inner.cancel.cancel();
        let consumer = self.handle.lock().await.take();
        if let Some(consumer) = consumer {
            consumer.stop().await;
        }
        self.registry.set_available(self.agent_id(), false).await;
        info!(agent_id = %self.agent_id(), "Agent harness stopped");
    }
}

//! Harness and runtime behavior over the real in-memory bus: reply routing,
//! fail-closed claim validation, lifecycle isolation, and team stops.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use delegor_agent::{agent_queue, Agent, AgentRuntime};
use delegor_bus::{InMemoryMessageBus, MessageBus, MessageHandler, MessagePublisher};
use delegor_core::{
    AuthorityClaim, AuthorityTier, DelegorResult, Message, MessageEnvelope, ReferenceCode,
};
use delegor_ledger::{AgentCapability, AgentRegistry};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

struct EchoAgent {
    id: String,
}

#[async_trait]
impl Agent for EchoAgent {
    fn agent_id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        "Echo"
    }

    fn capabilities(&self) -> Vec<AgentCapability> {
        vec![AgentCapability::new("echo", "repeats what it hears")]
    }

    async fn process(
        &self,
        envelope: &MessageEnvelope,
        _cancel: &CancellationToken,
    ) -> DelegorResult<Option<Message>> {
        Ok(Some(Message::text(format!(
            "echo: {}",
            envelope.message.content()
        ))))
    }
}

struct ChannelHandler {
    tx: mpsc::UnboundedSender<MessageEnvelope>,
}

#[async_trait]
impl MessageHandler for ChannelHandler {
    async fn handle(&self, envelope: MessageEnvelope) {
        let _ = self.tx.send(envelope);
    }
}

struct Fixture {
    bus: Arc<InMemoryMessageBus>,
    registry: Arc<AgentRegistry>,
    runtime: AgentRuntime,
}

fn fixture() -> Fixture {
    let bus = Arc::new(InMemoryMessageBus::new());
    let registry = Arc::new(AgentRegistry::new());
    let runtime = AgentRuntime::new(bus.clone(), registry.clone());
    Fixture {
        bus,
        registry,
        runtime,
    }
}

async fn probe(bus: &Arc<InMemoryMessageBus>, queue: &str) -> mpsc::UnboundedReceiver<MessageEnvelope> {
    let (tx, rx) = mpsc::unbounded_channel();
    let _ = bus
        .start_consuming(queue, Arc::new(ChannelHandler { tx }))
        .await
        .expect("probe consumer");
    rx
}

async fn expect_reply(rx: &mut mpsc::UnboundedReceiver<MessageEnvelope>) -> MessageEnvelope {
    tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for reply")
        .expect("probe channel closed")
}

async fn expect_silence(rx: &mut mpsc::UnboundedReceiver<MessageEnvelope>) {
    let outcome = tokio::time::timeout(std::time::Duration::from_millis(200), rx.recv()).await;
    assert!(outcome.is_err(), "expected no delivery, got one");
}

fn request(text: &str) -> MessageEnvelope {
    MessageEnvelope::new(Message::text(text), ReferenceCode::new("CTX-2026-0804-001"))
}

#[tokio::test]
async fn reply_is_routed_with_lineage() {
    let f = fixture();
    f.runtime
        .start_agent(Arc::new(EchoAgent { id: "echo".into() }), None)
        .await
        .expect("start echo");
    let mut replies = probe(&f.bus, "probe.reply").await;

    let inbound = request("hello").with_reply_to("probe.reply");
    let inbound_message_id = inbound.message.id;
    f.bus.publish(inbound, &agent_queue("echo")).await.expect("publish");

    let reply = expect_reply(&mut replies).await;
    assert_eq!(reply.message.content(), "echo: hello");
    assert_eq!(reply.reference_code.as_str(), "CTX-2026-0804-001");
    assert_eq!(reply.context.parent_message_id, Some(inbound_message_id));
    assert_eq!(reply.context.from_agent_id.as_deref(), Some("echo"));
}

#[tokio::test]
async fn expired_claim_drops_the_message() {
    let f = fixture();
    f.runtime
        .start_agent(Arc::new(EchoAgent { id: "echo".into() }), None)
        .await
        .expect("start echo");
    let mut replies = probe(&f.bus, "probe.reply").await;

    let claim = AuthorityClaim::new("orchestrator", "echo", AuthorityTier::Autonomous)
        .with_expiry(Utc::now() - Duration::seconds(5));
    let inbound = request("too late")
        .with_reply_to("probe.reply")
        .with_claims(vec![claim]);
    f.bus.publish(inbound, &agent_queue("echo")).await.expect("publish");

    expect_silence(&mut replies).await;
}

#[tokio::test]
async fn misdirected_claim_drops_the_message() {
    let f = fixture();
    f.runtime
        .start_agent(Arc::new(EchoAgent { id: "echo".into() }), None)
        .await
        .expect("start echo");
    let mut replies = probe(&f.bus, "probe.reply").await;

    let claim = AuthorityClaim::new("orchestrator", "someone-else", AuthorityTier::Autonomous);
    let inbound = request("not for you")
        .with_reply_to("probe.reply")
        .with_claims(vec![claim]);
    f.bus.publish(inbound, &agent_queue("echo")).await.expect("publish");

    expect_silence(&mut replies).await;
}

#[tokio::test]
async fn reply_without_reply_queue_is_dropped() {
    let f = fixture();
    f.runtime
        .start_agent(Arc::new(EchoAgent { id: "echo".into() }), None)
        .await
        .expect("start echo");

    // No reply_to anywhere; the harness must warn and drop, not crash.
    f.bus
        .publish(request("shout into the void"), &agent_queue("echo"))
        .await
        .expect("publish");
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert!(f.runtime.is_running("echo").await);
}

#[tokio::test]
async fn duplicate_start_is_rejected() {
    let f = fixture();
    f.runtime
        .start_agent(Arc::new(EchoAgent { id: "echo".into() }), None)
        .await
        .expect("first start");
    let second = f
        .runtime
        .start_agent(Arc::new(EchoAgent { id: "echo".into() }), None)
        .await;
    assert!(second.is_err());
    assert_eq!(f.runtime.running_count().await, 1);
}

#[tokio::test]
async fn stopping_an_unknown_agent_is_tolerated() {
    let f = fixture();
    f.runtime.stop_agent("nobody-home").await;
    assert_eq!(f.runtime.running_count().await, 0);
}

#[tokio::test]
async fn stop_flips_availability_and_leaves_siblings_running() {
    let f = fixture();
    f.runtime
        .start_agent(Arc::new(EchoAgent { id: "alpha".into() }), None)
        .await
        .expect("start alpha");
    f.runtime
        .start_agent(Arc::new(EchoAgent { id: "beta".into() }), None)
        .await
        .expect("start beta");

    f.runtime.stop_agent("alpha").await;

    let alpha = f.registry.find_by_id("alpha").await.expect("alpha registered");
    assert!(!alpha.is_available);
    assert!(f.runtime.is_running("beta").await);

    // Beta still receives messages after alpha stopped.
    let mut replies = probe(&f.bus, "probe.reply").await;
    f.bus
        .publish(request("still alive").with_reply_to("probe.reply"), &agent_queue("beta"))
        .await
        .expect("publish");
    assert_eq!(expect_reply(&mut replies).await.message.content(), "echo: still alive");
}

#[tokio::test]
async fn stop_team_stops_only_its_members() {
    let f = fixture();
    f.runtime
        .start_agent(Arc::new(EchoAgent { id: "blue-1".into() }), Some("blue"))
        .await
        .expect("start blue-1");
    f.runtime
        .start_agent(Arc::new(EchoAgent { id: "blue-2".into() }), Some("blue"))
        .await
        .expect("start blue-2");
    f.runtime
        .start_agent(Arc::new(EchoAgent { id: "red-1".into() }), Some("red"))
        .await
        .expect("start red-1");

    assert_eq!(f.runtime.team_members("blue").await.len(), 2);
    f.runtime.stop_team("blue").await;

    assert!(!f.runtime.is_running("blue-1").await);
    assert!(!f.runtime.is_running("blue-2").await);
    assert!(f.runtime.is_running("red-1").await);
    assert!(f.runtime.team_members("blue").await.is_empty());
}

#[tokio::test]
async fn shutdown_drains_every_agent() {
    let f = fixture();
    f.runtime
        .start_agent(Arc::new(EchoAgent { id: "alpha".into() }), None)
        .await
        .expect("start alpha");
    f.runtime
        .start_agent(Arc::new(EchoAgent { id: "beta".into() }), Some("blue"))
        .await
        .expect("start beta");

    f.runtime.shutdown().await;
    assert_eq!(f.runtime.running_count().await, 0);
    assert!(!f.registry.find_by_id("alpha").await.expect("registered").is_available);
}

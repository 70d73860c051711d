//! The `delegor` binary: boots the runtime from a TOML config and routes a
//! single request end to end.

mod config;
mod pipeline;
mod workers;

use crate::config::DelegorConfig;
use crate::pipeline::KeywordPipeline;
use crate::workers::TemplateAgent;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use delegor_agent::{agent_queue, AgentRuntime};
use delegor_bus::{InMemoryMessageBus, MessageBus, MessageHandler, MessagePublisher};
use delegor_core::{Message, MessageEnvelope, ReferenceCodeGenerator};
use delegor_ledger::AgentRegistry;
use delegor_orchestrator::SkillDrivenAgent;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "delegor", about = "Delegor — multi-agent task orchestration runtime")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "delegor.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Route one request through the runtime and print the assembled reply
    Run {
        /// The request text
        #[arg(short, long)]
        message: String,
        /// Seconds to wait for the reply before giving up
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
    /// List the configured agents
    Agents,
}

struct ReplyHandler {
    tx: mpsc::UnboundedSender<MessageEnvelope>,
}

#[async_trait]
impl MessageHandler for ReplyHandler {
    async fn handle(&self, envelope: MessageEnvelope) {
        let _ = self.tx.send(envelope);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();

    let config_str = tokio::fs::read_to_string(&cli.config).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to read config file '{}': {}",
            cli.config.display(),
            e
        )
    })?;
    let config: DelegorConfig = toml::from_str(&config_str)?;

    match cli.command {
        Commands::Run {
            message,
            timeout_secs,
        } => run(config, message, timeout_secs).await,
        Commands::Agents => {
            if config.agents.is_empty() {
                println!("No worker agents configured.");
                println!("Configure workers in delegor.toml under [[agents]]");
                return Ok(());
            }
            println!("Configured agents:");
            println!(
                "  {} — orchestrator (escalates to '{}')",
                config.orchestrator.agent_id, config.orchestrator.escalation_target
            );
            for agent in &config.agents {
                let team = agent
                    .team
                    .as_deref()
                    .map(|team| format!(" [team: {team}]"))
                    .unwrap_or_default();
                println!("  {} — {}{}", agent.id, agent.capability, team);
            }
            println!("\nTotal: {} worker(s)", config.agents.len());
            Ok(())
        }
    }
}

async fn run(config: DelegorConfig, message: String, timeout_secs: u64) -> anyhow::Result<()> {
    let bus = Arc::new(InMemoryMessageBus::new());
    let registry = Arc::new(AgentRegistry::new());
    let mut runtime = AgentRuntime::new(bus.clone(), registry.clone());

    for worker in &config.agents {
        runtime.add_static_agent(Arc::new(TemplateAgent::from_config(worker)), worker.team.clone());
    }
    let pipeline = Arc::new(KeywordPipeline::from_workers(&config.agents));
    let orchestrator_queue = agent_queue(&config.orchestrator.agent_id);
    let orchestrator = Arc::new(SkillDrivenAgent::new(
        config.orchestrator,
        bus.clone(),
        registry.clone(),
        pipeline,
    ));
    runtime.add_static_agent(orchestrator, None);
    runtime.start().await?;

    let (tx, mut replies) = mpsc::unbounded_channel();
    let probe = bus
        .start_consuming(&config.reply_queue, Arc::new(ReplyHandler { tx }))
        .await?;

    let refcodes = ReferenceCodeGenerator::new();
    let request = MessageEnvelope::new(Message::text(&message), refcodes.generate())
        .with_reply_to(&config.reply_queue);
    info!(reference_code = %request.reference_code, "Submitting request");
    bus.publish(request, &orchestrator_queue).await?;

    let outcome = tokio::time::timeout(Duration::from_secs(timeout_secs), replies.recv()).await;
    match outcome {
        Ok(Some(reply)) => {
            println!("{}", reply.message.content());
        }
        Ok(None) => anyhow::bail!("reply channel closed unexpectedly"),
        Err(_) => anyhow::bail!("no reply within {timeout_secs}s (request may have escalated)"),
    }

    probe.stop().await;
    runtime.shutdown().await;
    bus.shutdown().await;
    Ok(())
}

use crate::config::SkillAgentConfig;
use crate::context::{ContextProvider, ContextQuery, NoContext};
use crate::pipeline::DecompositionPipeline;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use delegor_agent::{agent_queue, Agent};
use delegor_bus::MessagePublisher;
use delegor_core::{
    AuthorityClaim, AuthorityTier, DecompositionResult, DecompositionTask, DelegorResult, Message,
    MessageContext, MessageEnvelope, MessagePayload, ReferenceCode, ReferenceCodeGenerator,
};
use delegor_ledger::{
    AgentCapability, AgentRegistry, CompletedWorkflow, DelegationLedger, DelegationRecord,
    DelegationStatus, InMemoryPlanStore, PendingPlan, PlanStore, SubtaskDispatch, WorkflowLedger,
    WorkflowRecord,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// The orchestrating agent: decomposes inbound requests, routes or fans
/// out to capability-matched peers, gates risky plans behind approval, and
/// reassembles fan-in results.
pub struct SkillDrivenAgent {
    config: SkillAgentConfig,
    publisher: Arc<dyn MessagePublisher>,
    registry: Arc<AgentRegistry>,
    pipeline: Arc<dyn DecompositionPipeline>,
    context_provider: Arc<dyn ContextProvider>,
    plans: Arc<dyn PlanStore>,
    delegations: Arc<DelegationLedger>,
    workflows: Arc<WorkflowLedger>,
    refcodes: Arc<ReferenceCodeGenerator>,
}

impl SkillDrivenAgent {
    /// Creates an orchestrating agent with in-memory ledgers, an in-memory
    /// plan store, and no context provider.
    pub fn new(
        config: SkillAgentConfig,
        publisher: Arc<dyn MessagePublisher>,
        registry: Arc<AgentRegistry>,
        pipeline: Arc<dyn DecompositionPipeline>,
    ) -> Self {
        Self {
            config,
            publisher,
            registry,
            pipeline,
            context_provider: Arc::new(NoContext),
            plans: Arc::new(InMemoryPlanStore::new()),
            delegations: Arc::new(DelegationLedger::new()),
            workflows: Arc::new(WorkflowLedger::new()),
            refcodes: Arc::new(ReferenceCodeGenerator::new()),
        }
    }

    /// Plugs in a context provider.
    pub fn with_context_provider(mut self, provider: Arc<dyn ContextProvider>) -> Self {
        self.context_provider = provider;
        self
    }

    /// Plugs in a plan store.
    pub fn with_plan_store(mut self, plans: Arc<dyn PlanStore>) -> Self {
        self.plans = plans;
        self
    }

    /// Shares a delegation ledger with other components.
    pub fn with_delegation_ledger(mut self, delegations: Arc<DelegationLedger>) -> Self {
        self.delegations = delegations;
        self
    }

    /// Shares a workflow ledger with other components.
    pub fn with_workflow_ledger(mut self, workflows: Arc<WorkflowLedger>) -> Self {
        self.workflows = workflows;
        self
    }

    /// Shares a reference-code generator with other components.
    pub fn with_reference_codes(mut self, refcodes: Arc<ReferenceCodeGenerator>) -> Self {
        self.refcodes = refcodes;
        self
    }

    /// The delegation ledger backing this agent.
    pub fn delegations(&self) -> Arc<DelegationLedger> {
        self.delegations.clone()
    }

    /// The workflow ledger backing this agent.
    pub fn workflows(&self) -> Arc<WorkflowLedger> {
        self.workflows.clone()
    }

    fn own_queue(&self) -> String {
        agent_queue(&self.config.agent_id)
    }

    fn issue_claim(&self, granted_to: &str, tier: AuthorityTier) -> AuthorityClaim {
        let claim = AuthorityClaim::new(&self.config.agent_id, granted_to, tier);
        match self.config.claim_ttl_secs {
            Some(secs) => claim.with_expiry(Utc::now() + Duration::seconds(secs as i64)),
            None => claim,
        }
    }

    /// First available non-self agent declaring the capability; no ranking
    /// beyond registration order.
    async fn first_capable(&self, capability: &str) -> Option<String> {
        self.registry
            .find_by_capability(capability)
            .await
            .into_iter()
            .map(|registration| registration.agent_id)
            .find(|agent_id| agent_id != &self.config.agent_id)
    }

    /// Capabilities of every available agent except this one, as the hint
    /// string handed to the pipeline.
    async fn capability_hint(&self) -> String {
        let mut names: Vec<String> = self
            .registry
            .available_agents()
            .await
            .into_iter()
            .filter(|registration| registration.agent_id != self.config.agent_id)
            .flat_map(|registration| {
                registration
                    .capabilities
                    .into_iter()
                    .map(|capability| capability.name)
            })
            .collect();
        names.sort();
        names.dedup();
        names.join(", ")
    }

    /// Advisory prompt enrichment; failures and empty results leave the
    /// content untouched.
    async fn enrich(&self, content: &str) -> String {
        let keywords: Vec<String> = content
            .split_whitespace()
            .take(8)
            .map(str::to_lowercase)
            .collect();
        let query = ContextQuery {
            keywords,
            max_results: 3,
        };
        match self.context_provider.query(query).await {
            Ok(snippets) if !snippets.is_empty() => {
                let mut enriched = content.to_string();
                enriched.push_str("\n\nBackground:");
                for snippet in snippets {
                    enriched.push_str(&format!("\n- {}", snippet.content));
                }
                enriched
            }
            Ok(_) => content.to_string(),
            Err(e) => {
                warn!(error = %e, "Context provider failed; continuing without enrichment");
                content.to_string()
            }
        }
    }

    async fn handle_request(
        &self,
        envelope: &MessageEnvelope,
        cancel: &CancellationToken,
    ) -> DelegorResult<()> {
        let content = self.enrich(&envelope.message.content()).await;
        let hint = self.capability_hint().await;

        let decomposition = tokio::select! {
            () = cancel.cancelled() => {
                debug!(reference_code = %envelope.reference_code, "Cancelled while awaiting decomposition");
                return Ok(());
            }
            result = self.pipeline.decompose(&content, &hint) => result?,
        };

        let Some(decomposition) = decomposition else {
            return self
                .escalate(envelope, "decomposition produced no result")
                .await;
        };
        if decomposition.confidence < self.config.confidence_threshold {
            let reason = format!(
                "decomposition confidence {:.2} below threshold {:.2}",
                decomposition.confidence, self.config.confidence_threshold
            );
            return self.escalate(envelope, &reason).await;
        }
        if decomposition.tasks.is_empty() {
            return self.escalate(envelope, "decomposition produced no tasks").await;
        }

        let max_inbound = envelope.max_claim_tier();
        if max_inbound >= self.config.approval_tier {
            return self.gate(envelope, &decomposition).await;
        }
        self.dispatch(envelope, &decomposition, max_inbound).await
    }

    async fn dispatch(
        &self,
        original: &MessageEnvelope,
        decomposition: &DecompositionResult,
        max_inbound: AuthorityTier,
    ) -> DelegorResult<()> {
        if let [task] = decomposition.tasks.as_slice() {
            self.single_route(original, task, max_inbound).await
        } else {
            self.fan_out(original, decomposition, max_inbound).await
        }
    }

    async fn single_route(
        &self,
        original: &MessageEnvelope,
        task: &DecompositionTask,
        max_inbound: AuthorityTier,
    ) -> DelegorResult<()> {
        let Some(target) = self.first_capable(&task.capability).await else {
            let reason = format!("no available agent for capability '{}'", task.capability);
            return self.escalate(original, &reason).await;
        };

        let declared =
            AuthorityTier::parse_tier(&task.authority).unwrap_or(AuthorityTier::Autonomous);
        let effective = AuthorityTier::narrow(declared, max_inbound);
        let reference_code = self.refcodes.generate();

        self.delegations
            .record(DelegationRecord::assigned(
                reference_code.clone(),
                &self.config.agent_id,
                &target,
                &task.description,
            ))
            .await;

        let child = MessageEnvelope::new(Message::text(&task.description), reference_code.clone())
            .with_claims(vec![self.issue_claim(&target, effective)])
            .with_context(MessageContext {
                reply_to: original.context.reply_to.clone(),
                parent_message_id: Some(original.message.id),
                from_agent_id: Some(self.config.agent_id.clone()),
                team_id: original.context.team_id.clone(),
                channel_id: original.context.channel_id.clone(),
                original_goal: original.context.original_goal.clone(),
            });

        info!(
            reference_code = %reference_code,
            target = %target,
            capability = %task.capability,
            tier = %effective,
            "Routing task"
        );
        self.publisher.publish(child, &agent_queue(&target)).await
    }

    async fn fan_out(
        &self,
        original: &MessageEnvelope,
        decomposition: &DecompositionResult,
        max_inbound: AuthorityTier,
    ) -> DelegorResult<()> {
        // All-or-nothing: resolve a target for every task before anything
        // is recorded or published.
        let mut targets = Vec::with_capacity(decomposition.tasks.len());
        for task in &decomposition.tasks {
            match self.first_capable(&task.capability).await {
                Some(target) => targets.push(target),
                None => {
                    let reason =
                        format!("capability gap: no available agent for '{}'", task.capability);
                    return self.escalate(original, &reason).await;
                }
            }
        }

        let mut subtasks = Vec::with_capacity(decomposition.tasks.len());
        let mut children = Vec::with_capacity(decomposition.tasks.len());
        for (task, target) in decomposition.tasks.iter().zip(&targets) {
            let declared =
                AuthorityTier::parse_tier(&task.authority).unwrap_or(AuthorityTier::Autonomous);
            let effective = AuthorityTier::narrow(declared, max_inbound);
            let reference_code = self.refcodes.generate();

            self.delegations
                .record(DelegationRecord::assigned(
                    reference_code.clone(),
                    &self.config.agent_id,
                    target,
                    &task.description,
                ))
                .await;
            subtasks.push(SubtaskDispatch {
                reference_code: reference_code.clone(),
                capability: task.capability.clone(),
                description: task.description.clone(),
            });

            let child =
                MessageEnvelope::new(Message::text(&task.description), reference_code)
                    .with_claims(vec![self.issue_claim(target, effective)])
                    .with_context(MessageContext {
                        reply_to: Some(self.own_queue()),
                        parent_message_id: Some(original.message.id),
                        from_agent_id: Some(self.config.agent_id.clone()),
                        team_id: original.context.team_id.clone(),
                        channel_id: original.context.channel_id.clone(),
                        original_goal: Some(decomposition.summary.clone()),
                    });
            children.push((child, agent_queue(target)));
        }

        // The fixed subtask set must be visible in the ledger before any
        // child is on the bus, or a fast reply is misread as a fresh request.
        self.workflows
            .create(WorkflowRecord::new(
                original.reference_code.clone(),
                original.clone(),
                subtasks,
                &decomposition.summary,
            ))
            .await;

        info!(
            reference_code = %original.reference_code,
            subtasks = children.len(),
            "Fanning out workflow"
        );
        for (child, queue) in children {
            self.publisher.publish(child, &queue).await?;
        }
        Ok(())
    }

    async fn gate(
        &self,
        original: &MessageEnvelope,
        decomposition: &DecompositionResult,
    ) -> DelegorResult<()> {
        let workflow_code = self.refcodes.generate();
        self.plans
            .put(
                workflow_code.clone(),
                PendingPlan::new(original.clone(), decomposition.clone()),
            )
            .await?;

        let proposal = Message::plan_proposal(
            &decomposition.summary,
            decomposition
                .tasks
                .iter()
                .map(|task| task.description.clone())
                .collect(),
            original
                .context
                .original_goal
                .clone()
                .or_else(|| Some(original.message.content())),
            workflow_code.clone(),
        );
        let out = MessageEnvelope::new(proposal, workflow_code.clone()).with_context(
            MessageContext {
                reply_to: Some(self.own_queue()),
                parent_message_id: Some(original.message.id),
                from_agent_id: Some(self.config.agent_id.clone()),
                team_id: original.context.team_id.clone(),
                channel_id: original.context.channel_id.clone(),
                original_goal: original.context.original_goal.clone(),
            },
        );

        info!(
            workflow_code = %workflow_code,
            tasks = decomposition.tasks.len(),
            "Plan gated for approval"
        );
        self.publisher
            .publish(out, &agent_queue(&self.config.escalation_target))
            .await
    }

    async fn handle_plan_decision(
        &self,
        envelope: &MessageEnvelope,
        workflow_code: &ReferenceCode,
        approved: bool,
        rejection_reason: Option<String>,
    ) -> DelegorResult<()> {
        let Some(plan) = self.plans.take(workflow_code).await? else {
            warn!(
                workflow_code = %workflow_code,
                "Decision for an unknown or already-settled plan; dropping"
            );
            return Ok(());
        };

        if !approved {
            let reason = rejection_reason.unwrap_or_else(|| "no reason given".to_string());
            info!(workflow_code = %workflow_code, reason = %reason, "Plan rejected");
            if let Some(reply_to) = plan.original_envelope.context.reply_to.clone() {
                let notice = Message::text(format!("Request was not approved: {reason}"));
                let out = MessageEnvelope::new(
                    notice,
                    plan.original_envelope.reference_code.clone(),
                )
                .with_context(MessageContext {
                    reply_to: None,
                    parent_message_id: Some(envelope.message.id),
                    from_agent_id: Some(self.config.agent_id.clone()),
                    team_id: plan.original_envelope.context.team_id.clone(),
                    channel_id: plan.original_envelope.context.channel_id.clone(),
                    original_goal: plan.original_envelope.context.original_goal.clone(),
                });
                self.publisher.publish(out, &reply_to).await?;
            }
            return Ok(());
        }

        info!(workflow_code = %workflow_code, "Plan approved, dispatching");
        let max_inbound = plan.original_envelope.max_claim_tier();
        self.dispatch(&plan.original_envelope, &plan.decomposition, max_inbound)
            .await
    }

    async fn handle_subtask_reply(
        &self,
        parent: &ReferenceCode,
        envelope: &MessageEnvelope,
    ) -> DelegorResult<()> {
        debug!(
            reference_code = %envelope.reference_code,
            parent = %parent,
            "Sub-task reply received"
        );
        self.workflows
            .store_subtask_result(&envelope.reference_code, envelope.message.clone())
            .await;
        self.delegations
            .update_status(&envelope.reference_code, DelegationStatus::Complete)
            .await;

        let Some(completed) = self.workflows.complete_if_ready(parent).await else {
            return Ok(());
        };

        let document = assemble_document(&completed);
        let Some(reply_to) = completed.original_envelope.context.reply_to.clone() else {
            warn!(
                reference_code = %completed.reference_code,
                "Workflow complete but the original request named no reply queue"
            );
            return Ok(());
        };

        let out = MessageEnvelope::new(Message::text(document), completed.reference_code.clone())
            .with_context(MessageContext {
                reply_to: None,
                parent_message_id: Some(completed.original_envelope.message.id),
                from_agent_id: Some(self.config.agent_id.clone()),
                team_id: completed.original_envelope.context.team_id.clone(),
                channel_id: completed.original_envelope.context.channel_id.clone(),
                original_goal: completed.original_envelope.context.original_goal.clone(),
            });
        info!(
            reference_code = %completed.reference_code,
            sections = completed.results.len(),
            "Workflow complete, publishing assembled result"
        );
        self.publisher.publish(out, &reply_to).await
    }

    /// Routes a request (or failure) to the fixed escalation target under a
    /// fresh reference code.
    async fn escalate(&self, original: &MessageEnvelope, reason: &str) -> DelegorResult<()> {
        let reference_code = self.refcodes.generate();
        self.delegations
            .record(DelegationRecord::assigned(
                reference_code.clone(),
                &self.config.agent_id,
                &self.config.escalation_target,
                reason,
            ))
            .await;

        // Inbound claims name this agent and would be dropped fail-closed
        // by the escalation target's harness; strip them.
        let out = original
            .clone()
            .with_reference_code(reference_code.clone())
            .with_claims(Vec::new())
            .with_lineage(original.message.id, &self.config.agent_id);

        warn!(
            reference_code = %reference_code,
            original_code = %original.reference_code,
            reason,
            "Escalating request"
        );
        self.publisher
            .publish(out, &agent_queue(&self.config.escalation_target))
            .await
    }
}

#[async_trait]
impl Agent for SkillDrivenAgent {
    fn agent_id(&self) -> &str {
        &self.config.agent_id
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn agent_type(&self) -> &str {
        "orchestrator"
    }

    fn capabilities(&self) -> Vec<AgentCapability> {
        self.config.capabilities.clone()
    }

    async fn process(
        &self,
        envelope: &MessageEnvelope,
        cancel: &CancellationToken,
    ) -> DelegorResult<Option<Message>> {
        // Resolve the message kind once, then dispatch.
        if let MessagePayload::PlanDecision {
            workflow_code,
            approved,
            rejection_reason,
        } = &envelope.message.payload
        {
            self.handle_plan_decision(envelope, workflow_code, *approved, rejection_reason.clone())
                .await?;
            return Ok(None);
        }

        if let Some(parent) = self.workflows.find_by_subtask(&envelope.reference_code).await {
            self.handle_subtask_reply(&parent, envelope).await?;
            return Ok(None);
        }

        self.handle_request(envelope, cancel).await?;
        Ok(None)
    }
}

/// Renders one document from fan-in results, walking sub-tasks in dispatch
/// order regardless of reply arrival order.
fn assemble_document(completed: &CompletedWorkflow) -> String {
    let mut document = format!("# {}\n", completed.summary);
    for (subtask, result) in &completed.results {
        document.push_str(&format!("\n## {}\n\n{}\n", subtask.capability, result.content()));
    }
    document
}

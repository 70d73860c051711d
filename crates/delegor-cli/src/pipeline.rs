use crate::config::WorkerConfig;
use async_trait::async_trait;
use delegor_core::{DecompositionResult, DecompositionTask, DelegorResult};
use delegor_orchestrator::DecompositionPipeline;

/// Local rules-based decomposition: a configured capability whose name
/// appears in the request text becomes one task, in configuration order.
pub struct KeywordPipeline {
    capabilities: Vec<(String, String)>,
}

impl KeywordPipeline {
    /// Builds the rule set from the configured workers.
    pub fn from_workers(workers: &[WorkerConfig]) -> Self {
        Self {
            capabilities: workers
                .iter()
                .map(|worker| {
                    (
                        worker.capability.clone(),
                        worker.authority.clone().unwrap_or_default(),
                    )
                })
                .collect(),
        }
    }
}

#[async_trait]
impl DecompositionPipeline for KeywordPipeline {
    async fn decompose(
        &self,
        content: &str,
        _capability_hint: &str,
    ) -> DelegorResult<Option<DecompositionResult>> {
        let lowered = content.to_lowercase();
        let tasks: Vec<DecompositionTask> = self
            .capabilities
            .iter()
            .filter(|(capability, _)| lowered.contains(&capability.to_lowercase()))
            .map(|(capability, authority)| DecompositionTask {
                capability: capability.clone(),
                description: format!("{capability}: {content}"),
                authority: authority.clone(),
            })
            .collect();

        if tasks.is_empty() {
            return Ok(None);
        }
        let matched: Vec<&str> = tasks.iter().map(|task| task.capability.as_str()).collect();
        Ok(Some(DecompositionResult {
            summary: format!("Route request across: {}", matched.join(", ")),
            confidence: 0.9,
            tasks,
        }))
    }
}

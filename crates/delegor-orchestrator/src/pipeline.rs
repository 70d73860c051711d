use async_trait::async_trait;
use delegor_core::{DecompositionResult, DelegorResult};

/// The external seam that turns a request into a decomposition.
///
/// Implementations may call an LLM, an API, or run local rules; the
/// orchestrator treats the call as opaque and slow. `Ok(None)` means the
/// pipeline could not produce a decomposition at all, which the caller
/// treats as an ordinary escalation path.
#[async_trait]
pub trait DecompositionPipeline: Send + Sync {
    /// Decomposes `content` into tasks, given a hint listing the
    /// capabilities currently known to be routable.
    async fn decompose(
        &self,
        content: &str,
        capability_hint: &str,
    ) -> DelegorResult<Option<DecompositionResult>>;
}

use crate::types::PendingPlan;
use async_trait::async_trait;
use delegor_core::{DelegorResult, ReferenceCode};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Storage for approval-gated plans awaiting a decision.
///
/// Implementations can be in-memory, database-backed, or anything else; the
/// orchestrator only needs `put` and single-use `take`.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Parks a plan under its workflow reference code.
    async fn put(&self, reference_code: ReferenceCode, plan: PendingPlan) -> DelegorResult<()>;

    /// Removes and returns the plan, exactly once. A second take for the
    /// same code returns `None`.
    async fn take(&self, reference_code: &ReferenceCode) -> DelegorResult<Option<PendingPlan>>;
}

/// The default in-process plan store.
#[derive(Default)]
pub struct InMemoryPlanStore {
    plans: Arc<RwLock<HashMap<ReferenceCode, PendingPlan>>>,
}

impl InMemoryPlanStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlanStore for InMemoryPlanStore {
    async fn put(&self, reference_code: ReferenceCode, plan: PendingPlan) -> DelegorResult<()> {
        let mut plans = self.plans.write().await;
        plans.insert(reference_code, plan);
        Ok(())
    }

    async fn take(&self, reference_code: &ReferenceCode) -> DelegorResult<Option<PendingPlan>> {
        let mut plans = self.plans.write().await;
        Ok(plans.remove(reference_code))
    }
}

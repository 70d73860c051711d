use crate::types::{DelegationRecord, DelegationStatus};
use chrono::{DateTime, Utc};
use delegor_core::ReferenceCode;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Tracks every delegation (including escalations) by reference code.
#[derive(Default)]
pub struct DelegationLedger {
    records: Arc<RwLock<HashMap<ReferenceCode, DelegationRecord>>>,
}

impl DelegationLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a delegation.
    pub async fn record(&self, record: DelegationRecord) {
        debug!(
            reference_code = %record.reference_code,
            delegated_to = %record.delegated_to,
            "Recorded delegation"
        );
        let mut records = self.records.write().await;
        records.insert(record.reference_code.clone(), record);
    }

    /// Transitions a delegation's status. Unknown codes are ignored and
    /// reported as `false`.
    pub async fn update_status(&self, reference_code: &ReferenceCode, status: DelegationStatus) -> bool {
        let mut records = self.records.write().await;
        match records.get_mut(reference_code) {
            Some(record) => {
                record.status = status;
                true
            }
            None => false,
        }
    }

    /// Looks a delegation up by reference code.
    pub async fn get(&self, reference_code: &ReferenceCode) -> Option<DelegationRecord> {
        let records = self.records.read().await;
        records.get(reference_code).cloned()
    }

    /// All delegations, in assignment order.
    pub async fn all(&self) -> Vec<DelegationRecord> {
        let records = self.records.read().await;
        let mut all: Vec<DelegationRecord> = records.values().cloned().collect();
        all.sort_by(|a, b| a.assigned_at.cmp(&b.assigned_at));
        all
    }

    /// Deadline sweep: flips `Assigned`/`InProgress` records assigned before
    /// `cutoff` to `Overdue`, returning the affected codes. Terminal and
    /// reviewing records are untouched. Nothing schedules this; callers
    /// decide if and when stale work matters.
    pub async fn mark_overdue(&self, cutoff: DateTime<Utc>) -> Vec<ReferenceCode> {
        let mut records = self.records.write().await;
        let mut flipped = Vec::new();
        for record in records.values_mut() {
            let stale = matches!(
                record.status,
                DelegationStatus::Assigned | DelegationStatus::InProgress
            ) && record.assigned_at < cutoff;
            if stale {
                record.status = DelegationStatus::Overdue;
                flipped.push(record.reference_code.clone());
            }
        }
        flipped
    }
}

use crate::types::{SubtaskDispatch, WorkflowRecord, WorkflowStatus};
use chrono::Utc;
use delegor_core::{Message, MessageEnvelope, ReferenceCode};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

struct WorkflowEntry {
    record: WorkflowRecord,
    results: HashMap<ReferenceCode, Message>,
}

#[derive(Default)]
struct LedgerState {
    entries: HashMap<ReferenceCode, WorkflowEntry>,
    subtask_index: HashMap<ReferenceCode, ReferenceCode>,
}

/// Everything the fan-in winner needs to assemble and publish the result.
#[derive(Debug, Clone)]
pub struct CompletedWorkflow {
    /// The parent tracking token.
    pub reference_code: ReferenceCode,
    /// The envelope that triggered the fan-out.
    pub original_envelope: MessageEnvelope,
    /// The decomposition summary.
    pub summary: String,
    /// Sub-task results in dispatch order, independent of arrival order.
    pub results: Vec<(SubtaskDispatch, Message)>,
}

/// Parent→children fan-out bookkeeping and the fan-in join.
///
/// A single lock covers the records and the subtask index, so the
/// completion transition below is atomic with respect to result storage.
#[derive(Default)]
pub struct WorkflowLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl WorkflowLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Persists a workflow and indexes its fixed sub-task set.
    pub async fn create(&self, record: WorkflowRecord) {
        debug!(
            reference_code = %record.reference_code,
            subtasks = record.subtasks.len(),
            "Created workflow"
        );
        let mut state = self.state.write().await;
        for subtask in &record.subtasks {
            state
                .subtask_index
                .insert(subtask.reference_code.clone(), record.reference_code.clone());
        }
        state.entries.insert(
            record.reference_code.clone(),
            WorkflowEntry {
                record,
                results: HashMap::new(),
            },
        );
    }

    /// Resolves a sub-task code to its parent workflow, if any.
    pub async fn find_by_subtask(&self, subtask_code: &ReferenceCode) -> Option<ReferenceCode> {
        let state = self.state.read().await;
        state.subtask_index.get(subtask_code).cloned()
    }

    /// Stores a sub-task reply. Idempotent: a repeat reply for the same
    /// sub-task overwrites rather than duplicating. Returns `false` for
    /// codes belonging to no workflow.
    pub async fn store_subtask_result(&self, subtask_code: &ReferenceCode, result: Message) -> bool {
        let mut state = self.state.write().await;
        let Some(parent) = state.subtask_index.get(subtask_code).cloned() else {
            return false;
        };
        let Some(entry) = state.entries.get_mut(&parent) else {
            return false;
        };
        entry.results.insert(subtask_code.clone(), result);
        true
    }

    /// Whether every sub-task of the workflow has a stored result.
    pub async fn all_subtasks_complete(&self, reference_code: &ReferenceCode) -> bool {
        let state = self.state.read().await;
        state.entries.get(reference_code).is_some_and(|entry| {
            entry
                .record
                .subtasks
                .iter()
                .all(|subtask| entry.results.contains_key(&subtask.reference_code))
        })
    }

    /// The workflow record, if known.
    pub async fn get(&self, reference_code: &ReferenceCode) -> Option<WorkflowRecord> {
        let state = self.state.read().await;
        state.entries.get(reference_code).map(|entry| entry.record.clone())
    }

    /// Stored results in dispatch order (sub-tasks without a result are
    /// skipped).
    pub async fn get_completed_results(
        &self,
        reference_code: &ReferenceCode,
    ) -> Vec<(SubtaskDispatch, Message)> {
        let state = self.state.read().await;
        let Some(entry) = state.entries.get(reference_code) else {
            return Vec::new();
        };
        entry
            .record
            .subtasks
            .iter()
            .filter_map(|subtask| {
                entry
                    .results
                    .get(&subtask.reference_code)
                    .map(|result| (subtask.clone(), result.clone()))
            })
            .collect()
    }

    /// The fan-in transition: under one write lock, checks that the
    /// workflow is still `InProgress` and every sub-task has a result, and
    /// if so flips it to `Completed` and hands back the ordered results.
    ///
    /// Exactly one caller wins even when the last two replies race; every
    /// other caller sees `None`.
    pub async fn complete_if_ready(&self, reference_code: &ReferenceCode) -> Option<CompletedWorkflow> {
        let mut state = self.state.write().await;
        let entry = state.entries.get_mut(reference_code)?;
        if entry.record.status != WorkflowStatus::InProgress {
            return None;
        }
        let all_done = entry
            .record
            .subtasks
            .iter()
            .all(|subtask| entry.results.contains_key(&subtask.reference_code));
        if !all_done {
            return None;
        }
        entry.record.status = WorkflowStatus::Completed;
        entry.record.completed_at = Some(Utc::now());

        let results = entry
            .record
            .subtasks
            .iter()
            .filter_map(|subtask| {
                entry
                    .results
                    .get(&subtask.reference_code)
                    .map(|result| (subtask.clone(), result.clone()))
            })
            .collect();
        Some(CompletedWorkflow {
            reference_code: entry.record.reference_code.clone(),
            original_envelope: entry.record.original_envelope.clone(),
            summary: entry.record.summary.clone(),
            results,
        })
    }
}

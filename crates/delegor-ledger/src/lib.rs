//! Shared bookkeeping stores backing the orchestration state machine.
//!
//! All stores are concurrently mutated by every agent harness: single-key
//! operations are atomic under each store's lock, and the fan-in completion
//! transition is a compare-and-swap inside [`WorkflowLedger`].
//!
//! # Main types
//!
//! - [`AgentRegistry`] — Capability lookup over registered agents.
//! - [`DelegationLedger`] — Who delegated what, and its status.
//! - [`WorkflowLedger`] — Parent→children fan-out bookkeeping and fan-in join.
//! - [`PlanStore`] / [`InMemoryPlanStore`] — Approval-gated plans awaiting a decision.

/// The delegation ledger.
pub mod delegation;
/// Pending-plan storage.
pub mod plans;
/// The agent registry.
pub mod registry;
/// Record types shared by the stores.
pub mod types;
/// The workflow ledger.
pub mod workflow;

pub use delegation::DelegationLedger;
pub use plans::{InMemoryPlanStore, PlanStore};
pub use registry::AgentRegistry;
pub use types::{
    AgentCapability, AgentRegistration, DelegationRecord, DelegationStatus, PendingPlan,
    SubtaskDispatch, WorkflowRecord, WorkflowStatus,
};
pub use workflow::{CompletedWorkflow, WorkflowLedger};

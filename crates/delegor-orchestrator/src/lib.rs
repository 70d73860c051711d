//! The decomposition/routing/fan-in state machine behind an orchestrating
//! agent.
//!
//! A [`SkillDrivenAgent`] turns an inbound message into capability-tagged
//! tasks via a pluggable decomposition pipeline, single-routes or fans out
//! to capability-matched peers, gates risky plans behind approval, and
//! reassembles fan-in results into a single answer.
//!
//! # Main types
//!
//! - [`SkillDrivenAgent`] — The orchestrating agent itself.
//! - [`SkillAgentConfig`] — Thresholds, approval tier, escalation target.
//! - [`DecompositionPipeline`] — The external seam producing decompositions.
//! - [`ContextProvider`] / [`NoContext`] — Optional advisory enrichment.

/// Configuration for the orchestrating agent.
pub mod config;
/// Optional context enrichment seam.
pub mod context;
/// The decomposition pipeline seam.
pub mod pipeline;
/// The orchestrating agent state machine.
pub mod skill_agent;

pub use config::SkillAgentConfig;
pub use context::{ContextProvider, ContextQuery, ContextSnippet, NoContext};
pub use pipeline::DecompositionPipeline;
pub use skill_agent::SkillDrivenAgent;

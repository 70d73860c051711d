use serde::{Deserialize, Serialize};

/// One capability-tagged unit of work produced by decomposing a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecompositionTask {
    /// Name of the capability the task should be routed on.
    pub capability: String,
    /// What the recipient is being asked to do.
    pub description: String,
    /// Declared oversight level, free-form; parsed at routing time and
    /// defaulting to the least-restrictive tier when unparseable.
    #[serde(default)]
    pub authority: String,
}

/// The outcome of running the decomposition pipeline over one request.
///
/// A single task is equivalent to 1:1 routing; more than one triggers
/// fan-out. Consumed once per inbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecompositionResult {
    /// The sub-tasks, in dispatch order.
    pub tasks: Vec<DecompositionTask>,
    /// One-line summary of the plan.
    pub summary: String,
    /// Pipeline confidence in the decomposition, in `[0, 1]`.
    pub confidence: f32,
}

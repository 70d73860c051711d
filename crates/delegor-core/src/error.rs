/// Top-level error type for the Delegor runtime.
///
/// Each variant corresponds to a subsystem that can produce errors.
#[derive(Debug, thiserror::Error)]
pub enum DelegorError {
    /// An error from the message bus transport.
    #[error("Bus error: {0}")]
    Bus(String),

    /// An error originating from an agent's processing function.
    #[error("Agent error: {0}")]
    Agent(String),

    /// An error from the agent registry.
    #[error("Registry error: {0}")]
    Registry(String),

    /// An error from the delegation or workflow ledgers.
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// An error from the orchestration state machine.
    #[error("Orchestrator error: {0}")]
    Orchestrator(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`DelegorError`].
pub type DelegorResult<T> = Result<T, DelegorError>;

//! Error kinds of a factory deployment run.

pub type Result<T, E = DeployError> = core::result::Result<T, E>;

/// Every failure aborts the run; the kind tells the operator which stage broke.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Missing or inconsistent configuration (no accounts, bad RPC URL, wrong chain).
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The construction or configuration transaction failed, reverted or timed out.
    #[error("deployment error: {0}")]
    Deployment(String),
    /// The RPC endpoint is unreachable or returned an error to a read.
    #[error("network error: {0}")]
    Network(String),
    /// Artifact or bytecode is missing or malformed.
    #[error("input error: {0}")]
    Input(String),
    /// Post-deployment state does not match what was asked for.
    #[error("invariant violation: {what}: expected {expected}, found {found}")]
    InvariantViolation {
        what: &'static str,
        expected: String,
        found: String,
    },
}

impl DeployError {
    /// Short name of the error kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Deployment(_) => "deployment",
            Self::Network(_) => "network",
            Self::Input(_) => "input",
            Self::InvariantViolation { .. } => "invariant-violation",
        }
    }

    /// Wraps an [`anyhow::Error`] chain as a network failure.
    pub(crate) fn network(err: anyhow::Error) -> Self {
        Self::Network(format!("{err:#}"))
    }

    pub(crate) fn configuration(err: anyhow::Error) -> Self {
        Self::Configuration(format!("{err:#}"))
    }

    /// Wraps an [`anyhow::Error`] chain as an input failure.
    pub(crate) fn input(err: anyhow::Error) -> Self {
        Self::Input(format!("{err:#}"))
    }
}

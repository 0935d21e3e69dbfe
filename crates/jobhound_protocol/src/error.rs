//! Pipeline-aborting error taxonomy.
//!
//! Only the four variants here terminate a run; everything else is caught at
//! the stage or item boundary and recorded as a non-fatal `AgentError`.

use thiserror::Error;

/// Failures that abort the pipeline.
#[derive(Debug, Error)]
pub enum AgentFailure {
    /// Accumulated cost crossed the hard limit. Terminal status: partial.
    #[error("Run cost ${current:.4} exceeds limit ${limit:.2}")]
    CostLimitExceeded { current: f64, limit: f64 },

    /// A stage could not produce any useful output. Terminal status: failed.
    #[error("Fatal error in stage '{stage}': {message}")]
    Fatal { stage: String, message: String },

    /// A stage overran its timeout. Terminal status: failed.
    #[error("Stage '{stage}' timed out after {timeout_secs}s")]
    Timeout { stage: String, timeout_secs: u64 },

    /// Checkpoint save/load failed. Terminal status: failed.
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),
}

impl AgentFailure {
    pub fn fatal(stage: &str, message: impl Into<String>) -> Self {
        Self::Fatal {
            stage: stage.to_string(),
            message: message.into(),
        }
    }

    pub fn checkpoint(message: impl Into<String>) -> Self {
        Self::Checkpoint(message.into())
    }
}

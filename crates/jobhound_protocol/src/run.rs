//! Run configuration, result summaries, and the checkpoint record.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ============================================================================
// Run configuration
// ============================================================================

/// Configuration for a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Unique run identifier; checkpoint files are keyed by it.
    pub run_id: String,
    /// Path to the resume file.
    pub resume_path: PathBuf,
    /// Freeform job preferences text.
    pub preferences_text: String,
    /// Skip notification, generate files only.
    #[serde(default)]
    pub dry_run: bool,
    /// Cap number of companies per discovery iteration.
    #[serde(default)]
    pub company_limit: Option<usize>,
}

impl RunConfig {
    pub fn new(resume_path: impl Into<PathBuf>, preferences_text: impl Into<String>) -> Self {
        Self {
            run_id: format!("run_{}", Utc::now().format("%Y%m%d_%H%M%S")),
            resume_path: resume_path.into(),
            preferences_text: preferences_text.into(),
            dry_run: false,
            company_limit: None,
        }
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }
}

// ============================================================================
// Errors accumulated during a run
// ============================================================================

/// Record of a non-fatal (or fatal) error hit by a stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentError {
    /// Stage that errored.
    pub stage: String,
    /// Error kind label (short, stable).
    pub error_type: String,
    pub error_message: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub job_id: Option<Uuid>,
    #[serde(default)]
    pub is_fatal: bool,
    pub timestamp: DateTime<Utc>,
}

impl AgentError {
    pub fn new(stage: &str, error_type: &str, message: impl Into<String>) -> Self {
        Self {
            stage: stage.to_string(),
            error_type: error_type.to_string(),
            error_message: message.into(),
            company_name: None,
            job_id: None,
            is_fatal: false,
            timestamp: Utc::now(),
        }
    }

    pub fn for_company(mut self, company_name: impl Into<String>) -> Self {
        self.company_name = Some(company_name.into());
        self
    }

    pub fn for_job(mut self, job_id: Uuid) -> Self {
        self.job_id = Some(job_id);
        self
    }

    pub fn fatal(mut self) -> Self {
        self.is_fatal = true;
        self
    }
}

// ============================================================================
// Run result
// ============================================================================

/// Terminal status of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// All stages clean.
    Success,
    /// Cost limit hit, or the final scored list came out empty.
    Partial,
    /// Fatal stage error, timeout, or checkpoint corruption.
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Partial => "partial",
            RunStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Summary of a completed pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: String,
    pub status: RunStatus,
    pub companies_attempted: usize,
    pub companies_succeeded: usize,
    pub jobs_scraped: usize,
    pub jobs_scored: usize,
    pub jobs_in_output: usize,
    pub output_files: Vec<PathBuf>,
    pub email_sent: bool,
    pub errors: Vec<AgentError>,
    pub total_tokens_used: u64,
    pub estimated_cost_usd: f64,
    pub duration_seconds: f64,
    pub completed_at: DateTime<Utc>,
}

// ============================================================================
// Checkpoint
// ============================================================================

/// Serializable checkpoint for crash recovery.
///
/// `state_snapshot` is the self-describing JSON form of the full pipeline
/// state; the pipeline crate owns the conversion in both directions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineCheckpoint {
    pub run_id: String,
    /// Name of the last completed stage.
    pub completed_step: String,
    pub state_snapshot: Value,
    pub saved_at: DateTime<Utc>,
}

impl PipelineCheckpoint {
    pub fn new(run_id: impl Into<String>, completed_step: &str, state_snapshot: Value) -> Self {
        Self {
            run_id: run_id.into(),
            completed_step: completed_step.to_string(),
            state_snapshot,
            saved_at: Utc::now(),
        }
    }
}

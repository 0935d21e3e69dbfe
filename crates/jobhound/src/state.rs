//! Pipeline state: the single owned record threaded through every stage.

use std::collections::{BTreeSet, HashSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use jobhound_protocol::{
    AgentError, AgentFailure, CandidateProfile, Company, NormalizedJob, PipelineCheckpoint,
    RawJob, RunConfig, RunResult, RunStatus, ScoredJob, SearchPreferences,
};

/// Mutable state passed through the pipeline. Fully serializable so a
/// checkpoint snapshot restores to an equivalent state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    pub config: RunConfig,

    // Stage outputs
    #[serde(default)]
    pub profile: Option<CandidateProfile>,
    #[serde(default)]
    pub preferences: Option<SearchPreferences>,
    #[serde(default)]
    pub companies: Vec<Company>,
    #[serde(default)]
    pub raw_jobs: Vec<RawJob>,
    #[serde(default)]
    pub normalized_jobs: Vec<NormalizedJob>,
    #[serde(default)]
    pub scored_jobs: Vec<ScoredJob>,

    // Cross-cutting
    #[serde(default)]
    pub errors: Vec<AgentError>,
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default)]
    pub total_cost_usd: f64,
    /// Company names already tried, carried across adaptive iterations.
    /// BTreeSet so snapshots and exclusion prompts are deterministic.
    #[serde(default)]
    pub attempted_company_names: BTreeSet<String>,
    #[serde(default)]
    pub discovery_iteration: usize,
    #[serde(default)]
    pub run_result: Option<RunResult>,
}

impl PipelineState {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            profile: None,
            preferences: None,
            companies: Vec::new(),
            raw_jobs: Vec::new(),
            normalized_jobs: Vec::new(),
            scored_jobs: Vec::new(),
            errors: Vec::new(),
            total_tokens: 0,
            total_cost_usd: 0.0,
            attempted_company_names: BTreeSet::new(),
            discovery_iteration: 0,
            run_result: None,
        }
    }

    /// Completed steps, inferred from populated fields rather than stored.
    pub fn completed_steps(&self) -> Vec<&'static str> {
        let mut steps = Vec::new();
        if self.profile.is_some() {
            steps.push(crate::pipeline::PARSE_RESUME);
        }
        if self.preferences.is_some() {
            steps.push(crate::pipeline::PARSE_PREFS);
        }
        if !self.companies.is_empty() {
            steps.push(crate::pipeline::FIND_COMPANIES);
        }
        if !self.raw_jobs.is_empty() {
            steps.push(crate::pipeline::SCRAPE_JOBS);
        }
        if !self.normalized_jobs.is_empty() {
            steps.push(crate::pipeline::PROCESS_JOBS);
        }
        if !self.scored_jobs.is_empty() {
            steps.push(crate::pipeline::SCORE_JOBS);
        }
        if self.run_result.is_some() {
            steps.push(crate::pipeline::AGGREGATE);
        }
        if self.run_result.as_ref().is_some_and(|r| r.email_sent) {
            steps.push(crate::pipeline::NOTIFY);
        }
        steps
    }

    pub fn is_step_completed(&self, step: &str) -> bool {
        self.completed_steps().iter().any(|s| *s == step)
    }

    /// Serialize current state for crash recovery.
    pub fn to_checkpoint(&self, step_name: &str) -> Result<PipelineCheckpoint, AgentFailure> {
        let snapshot = serde_json::to_value(self)
            .map_err(|e| AgentFailure::checkpoint(format!("Failed to serialize state: {e}")))?;
        Ok(PipelineCheckpoint::new(
            self.config.run_id.clone(),
            step_name,
            snapshot,
        ))
    }

    /// Restore state from a checkpoint.
    pub fn from_checkpoint(checkpoint: PipelineCheckpoint) -> Result<Self, AgentFailure> {
        serde_json::from_value(checkpoint.state_snapshot)
            .map_err(|e| AgentFailure::checkpoint(format!("Invalid checkpoint snapshot: {e}")))
    }

    /// Build a RunResult from current state.
    pub fn build_result(
        &self,
        status: RunStatus,
        duration_seconds: f64,
        output_files: Vec<std::path::PathBuf>,
        email_sent: bool,
    ) -> RunResult {
        let companies_succeeded = self
            .raw_jobs
            .iter()
            .map(|j| j.company_id)
            .collect::<HashSet<_>>()
            .len();
        RunResult {
            run_id: self.config.run_id.clone(),
            status,
            companies_attempted: self.companies.len(),
            companies_succeeded,
            jobs_scraped: self.raw_jobs.len(),
            jobs_scored: self.scored_jobs.len(),
            jobs_in_output: self.scored_jobs.len(),
            output_files,
            email_sent,
            errors: self.errors.clone(),
            total_tokens_used: self.total_tokens,
            estimated_cost_usd: self.total_cost_usd,
            duration_seconds,
            completed_at: Utc::now(),
        }
    }

    /// Record a non-fatal error against a stage.
    pub fn record_error(&mut self, error: AgentError) {
        tracing::error!(
            stage = %error.stage,
            error_type = %error.error_type,
            error = %error.error_message,
            is_fatal = error.is_fatal,
            "stage error"
        );
        self.errors.push(error);
    }
}

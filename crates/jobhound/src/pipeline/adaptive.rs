//! Adaptive pipeline: loops the discovery steps until enough jobs score
//! above threshold or the iteration budget runs out.

use std::collections::HashSet;
use std::time::Instant;

use tracing::info;

use jobhound_protocol::{AgentFailure, RunConfig, RunResult, RunStatus, ScoredJob};

use crate::report::log_run_summary;
use crate::stages::jobs_scorer::rank_and_filter;
use crate::state::PipelineState;

use super::{Pipeline, StepOutcome, DISCOVERY_STEPS, OUTPUT_STEPS, SETUP_STEPS};

/// Pipeline variant that reruns discovery with expanding exclusions until
/// `min_recommended_jobs` is met.
pub struct AdaptivePipeline {
    inner: Pipeline,
}

impl AdaptivePipeline {
    pub fn new(inner: Pipeline) -> Self {
        Self { inner }
    }

    /// Execute setup once, loop discovery, then run output steps.
    pub async fn run(&self, config: RunConfig) -> Result<RunResult, AgentFailure> {
        let start = Instant::now();
        let mut state = self.inner.load_or_create_state(config).await?;
        info!(run_id = %state.config.run_id, "adaptive pipeline start");

        for step_name in SETUP_STEPS {
            if state.is_step_completed(step_name) {
                continue;
            }
            match self.inner.run_step(step_name, &mut state, start).await? {
                StepOutcome::Continue => {}
                StepOutcome::Terminal(result) => return Ok(result),
            }
        }

        if let Some(result) = self.discovery_loop(&mut state, start).await? {
            return Ok(result);
        }

        for step_name in OUTPUT_STEPS {
            if state.is_step_completed(step_name) {
                continue;
            }
            match self.inner.run_step(step_name, &mut state, start).await? {
                StepOutcome::Continue => {}
                StepOutcome::Terminal(result) => return Ok(result),
            }
        }

        let duration = start.elapsed().as_secs_f64();
        log_run_summary(&state, duration);

        if let Some(mut result) = state.run_result.clone() {
            result.duration_seconds = duration;
            return Ok(result);
        }
        Ok(state.build_result(RunStatus::Success, duration, Vec::new(), false))
    }

    /// Run the discovery steps in a loop until the job target is met.
    ///
    /// Returns `Some(result)` when an iteration hit a terminal condition.
    async fn discovery_loop(
        &self,
        state: &mut PipelineState,
        pipeline_start: Instant,
    ) -> Result<Option<RunResult>, AgentFailure> {
        let settings = self.inner.settings();
        let min_jobs = settings.min_recommended_jobs;
        let max_iters = settings.max_discovery_iterations;
        let min_score = settings.min_score_threshold;

        for iteration in 0..max_iters {
            state.discovery_iteration = iteration;

            // Snapshot what previous iterations already scored.
            let prev_scored: Vec<ScoredJob> = state.scored_jobs.clone();
            let prev_hashes: HashSet<String> = prev_scored
                .iter()
                .map(|sj| sj.job.content_hash.clone())
                .collect();

            // Clear per-iteration working data; attempted company names and
            // scored jobs are cumulative and survive. The scorer overwrites
            // scored_jobs with this iteration's results.
            state.companies.clear();
            state.raw_jobs.clear();
            state.normalized_jobs.clear();

            info!(
                iteration,
                scored_so_far = prev_scored.len(),
                target = min_jobs,
                "discovery iteration start"
            );

            for step_name in DISCOVERY_STEPS {
                match self.inner.run_step(step_name, state, pipeline_start).await? {
                    StepOutcome::Continue => {}
                    StepOutcome::Terminal(result) => {
                        // Keep what earlier iterations earned.
                        state.scored_jobs = prev_scored;
                        return Ok(Some(result));
                    }
                }
            }

            // Merge: previous jobs plus only fingerprint-new ones, re-ranked.
            let new_scored: Vec<ScoredJob> = state
                .scored_jobs
                .drain(..)
                .filter(|sj| !prev_hashes.contains(&sj.job.content_hash))
                .collect();
            let new_count = new_scored.len();
            let mut merged = prev_scored;
            merged.extend(new_scored);
            state.scored_jobs = rank_and_filter(merged, min_score);

            state
                .attempted_company_names
                .extend(state.companies.iter().map(|c| c.name.clone()));

            info!(
                iteration,
                new_jobs = new_count,
                total_scored = state.scored_jobs.len(),
                "discovery iteration end"
            );

            if state.scored_jobs.len() >= min_jobs {
                info!(
                    scored = state.scored_jobs.len(),
                    target = min_jobs,
                    "discovery target met"
                );
                break;
            }
        }

        Ok(None)
    }
}

//! Aggregation stage: write the ranked results file and build the run
//! result.

use std::path::PathBuf;
use std::time::Instant;

use async_trait::async_trait;
use tracing::info;

use jobhound_protocol::{AgentFailure, RunStatus, Settings};

use crate::state::PipelineState;

use super::{log_stage_end, log_stage_start, Stage};

/// Write scored jobs to a CSV results file.
pub struct Aggregator {
    settings: Settings,
}

impl Aggregator {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    fn write_csv(&self, state: &PipelineState, path: &PathBuf) -> anyhow::Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record([
            "Rank",
            "Score",
            "Recommendation",
            "Company",
            "Title",
            "Location",
            "Remote Type",
            "Posted Date",
            "Salary Range",
            "Skill Match",
            "Skill Gaps",
            "Fit Summary",
            "Apply URL",
        ])?;

        for scored in &state.scored_jobs {
            let job = &scored.job;
            let report = &scored.fit_report;
            let salary = match (job.salary_min, job.salary_max) {
                (Some(min), Some(max)) => format!("{min}-{max}"),
                (Some(min), None) => format!("{min}+"),
                _ => String::new(),
            };
            writer.write_record([
                scored.rank.map(|r| r.to_string()).unwrap_or_default(),
                report.score.to_string(),
                report.recommendation.to_string(),
                job.company_name.clone(),
                job.title.clone(),
                job.location.clone().unwrap_or_default(),
                job.remote_type.to_string(),
                job.posted_date.map(|d| d.to_string()).unwrap_or_default(),
                salary,
                report.skill_overlap.join(", "),
                report.skill_gaps.join(", "),
                report.summary.clone(),
                job.apply_url.clone(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[async_trait]
impl Stage for Aggregator {
    fn name(&self) -> &'static str {
        crate::pipeline::AGGREGATE
    }

    async fn run(&self, state: &mut PipelineState) -> Result<(), AgentFailure> {
        log_stage_start(self.name());
        let started = Instant::now();

        tokio::fs::create_dir_all(&self.settings.output_dir)
            .await
            .map_err(|e| {
                AgentFailure::fatal(self.name(), format!("Failed to create output dir: {e}"))
            })?;

        let mut output_files: Vec<PathBuf> = Vec::new();
        let csv_path = self
            .settings
            .output_dir
            .join(format!("{}_results.csv", state.config.run_id));
        self.write_csv(state, &csv_path)
            .map_err(|e| AgentFailure::fatal(self.name(), format!("CSV write failed: {e}")))?;
        info!(path = %csv_path.display(), rows = state.scored_jobs.len(), "results written");
        output_files.push(csv_path);

        // An empty final list is a partial run, not a success.
        let status = if state.scored_jobs.is_empty() {
            RunStatus::Partial
        } else {
            RunStatus::Success
        };
        state.run_result =
            Some(state.build_result(status, started.elapsed().as_secs_f64(), output_files, false));

        log_stage_end(self.name(), started);
        Ok(())
    }
}

//! End-of-run summary.

use tracing::info;

use jobhound_protocol::RunResult;

use crate::state::PipelineState;

/// Log the structured cost and performance summary for a run.
pub fn log_run_summary(state: &PipelineState, duration_seconds: f64) {
    info!(
        total_tokens = state.total_tokens,
        total_cost_usd = format!("{:.4}", state.total_cost_usd),
        duration_seconds = format!("{:.2}", duration_seconds),
        jobs_scored = state.scored_jobs.len(),
        errors = state.errors.len(),
        "pipeline summary"
    );
}

/// Human-readable rendering for the CLI.
pub fn render_result(result: &RunResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("Run {} finished: {}\n", result.run_id, result.status));
    out.push_str(&format!(
        "  companies: {} attempted, {} succeeded\n",
        result.companies_attempted, result.companies_succeeded
    ));
    out.push_str(&format!(
        "  jobs: {} scraped, {} scored, {} in output\n",
        result.jobs_scraped, result.jobs_scored, result.jobs_in_output
    ));
    out.push_str(&format!(
        "  cost: {} tokens, ${:.4} estimated\n",
        result.total_tokens_used, result.estimated_cost_usd
    ));
    for file in &result.output_files {
        out.push_str(&format!("  output: {}\n", file.display()));
    }
    if !result.errors.is_empty() {
        out.push_str(&format!("  errors: {}\n", result.errors.len()));
    }
    out
}

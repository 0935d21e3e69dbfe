//! The eight pipeline stages.
//!
//! Each stage is a handler over `&mut PipelineState`: it reads what earlier
//! stages produced, appends its own output, and records non-fatal errors
//! without stopping. Only `AgentFailure` values escape a stage, and the
//! pipeline maps those to terminal statuses.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use jobhound_llm::{ChatMessage, CompletionClient, LlmError};
use jobhound_protocol::AgentFailure;

use crate::cost::CostTracker;
use crate::state::PipelineState;
use crate::trace::SpanHook;

pub mod aggregator;
pub mod company_finder;
pub mod job_processor;
pub mod jobs_scorer;
pub mod jobs_scraper;
pub mod notifier;
pub mod prefs_parser;
pub mod resume_parser;

pub use aggregator::Aggregator;
pub use company_finder::CompanyFinder;
pub use job_processor::JobProcessor;
pub use jobs_scorer::JobsScorer;
pub use jobs_scraper::JobsScraper;
pub use notifier::{LogNotifier, Notifier, NotifierStage};
pub use prefs_parser::PrefsParser;
pub use resume_parser::{PlainTextExtractor, ResumeExtractor, ResumeParser};

/// One pipeline stage.
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    /// Execute against the state. Non-fatal problems go into `state.errors`;
    /// an `Err` terminates the pipeline.
    async fn run(&self, state: &mut PipelineState) -> Result<(), AgentFailure>;
}

/// Outcome of one structured LLM call from within a stage.
pub(crate) enum LlmCallError {
    /// Must propagate (cost guardrail).
    Abort(AgentFailure),
    /// The stage decides: skip the item, or give up entirely.
    Llm(LlmError),
}

/// Shared structured-completion path: span, call, cost accounting.
///
/// Usage is recorded against state before the guardrail check, so the run
/// can overshoot the limit by at most this one call.
pub(crate) async fn call_structured(
    llm: &dyn CompletionClient,
    cost: &CostTracker,
    spans: &dyn SpanHook,
    state: &mut PipelineState,
    stage: &'static str,
    messages: Vec<ChatMessage>,
    model: &str,
    schema: Value,
) -> Result<Value, LlmCallError> {
    let span = spans.start_span(&format!("llm.{stage}"));
    spans.set_attr(span, "llm.model", model);

    let result = llm.complete(&messages, model, &schema).await;
    let completion = match result {
        Ok(completion) => completion,
        Err(err) => {
            spans.set_attr(span, "llm.status", "error");
            spans.end_span(span);
            return Err(LlmCallError::Llm(err));
        }
    };

    spans.set_attr(span, "llm.input_tokens", &completion.usage.input_tokens.to_string());
    spans.set_attr(span, "llm.output_tokens", &completion.usage.output_tokens.to_string());
    spans.end_span(span);

    debug!(
        stage,
        model,
        input_tokens = completion.usage.input_tokens,
        output_tokens = completion.usage.output_tokens,
        "llm call complete"
    );

    cost.record(state, model, completion.usage)
        .map_err(LlmCallError::Abort)?;
    Ok(completion.content)
}

pub(crate) fn log_stage_start(stage: &str) {
    info!(stage, "stage start");
}

pub(crate) fn log_stage_end(stage: &str, started: std::time::Instant) {
    info!(
        stage,
        duration_seconds = format!("{:.2}", started.elapsed().as_secs_f64()),
        "stage end"
    );
}

/// Comma-join with a fallback for empty lists; prompts read better than
/// an empty slot.
pub(crate) fn join_or(items: &[String], fallback: &str) -> String {
    if items.is_empty() {
        fallback.to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_or_falls_back_when_empty() {
        assert_eq!(join_or(&[], "None"), "None");
        let items = vec!["a".to_string(), "b".to_string()];
        assert_eq!(join_or(&items, "None"), "a, b");
    }
}

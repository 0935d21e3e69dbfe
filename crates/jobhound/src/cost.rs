//! Cost accounting with hard/soft guardrails.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

use jobhound_llm::{calculate_cost, TokenUsage};
use jobhound_protocol::AgentFailure;

use crate::state::PipelineState;

/// Accumulates token usage into state and enforces the cost guardrails.
///
/// Mutations happen from the single pipeline task; fan-out tasks marshal
/// their usage back to the owning stage before recording.
pub struct CostTracker {
    max_cost_usd: f64,
    warn_threshold_usd: f64,
    warned: AtomicBool,
}

impl CostTracker {
    pub fn new(max_cost_usd: f64, warn_threshold_usd: f64) -> Self {
        Self {
            max_cost_usd,
            warn_threshold_usd,
            warned: AtomicBool::new(false),
        }
    }

    /// Record one LLM call. The usage is added to state *before* the limit
    /// check, so a run overshoots by at most the over-budget call.
    pub fn record(
        &self,
        state: &mut PipelineState,
        model: &str,
        usage: TokenUsage,
    ) -> Result<(), AgentFailure> {
        state.total_tokens += usage.total();
        state.total_cost_usd += calculate_cost(model, usage.input_tokens, usage.output_tokens);

        if state.total_cost_usd > self.max_cost_usd {
            return Err(AgentFailure::CostLimitExceeded {
                current: state.total_cost_usd,
                limit: self.max_cost_usd,
            });
        }

        if state.total_cost_usd > self.warn_threshold_usd
            && !self.warned.swap(true, Ordering::Relaxed)
        {
            warn!(
                current_cost = format!("{:.4}", state.total_cost_usd),
                threshold = self.warn_threshold_usd,
                limit = self.max_cost_usd,
                "cost warning threshold crossed"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobhound_protocol::RunConfig;

    fn state() -> PipelineState {
        PipelineState::new(RunConfig::new("/tmp/r.txt", "prefs"))
    }

    fn usage(input: u64, output: u64) -> TokenUsage {
        TokenUsage {
            input_tokens: input,
            output_tokens: output,
        }
    }

    #[test]
    fn accumulates_tokens_and_cost() {
        let tracker = CostTracker::new(5.0, 2.0);
        let mut state = state();
        tracker
            .record(&mut state, "claude-haiku-4-5-20251001", usage(1000, 500))
            .unwrap();
        assert_eq!(state.total_tokens, 1500);
        let expected = (1000.0 * 0.80 + 500.0 * 4.00) / 1_000_000.0;
        assert!((state.total_cost_usd - expected).abs() < 1e-12);
    }

    #[test]
    fn unknown_model_costs_nothing() {
        let tracker = CostTracker::new(5.0, 2.0);
        let mut state = state();
        tracker
            .record(&mut state, "mystery", usage(1_000_000, 1_000_000))
            .unwrap();
        assert_eq!(state.total_tokens, 2_000_000);
        assert_eq!(state.total_cost_usd, 0.0);
    }

    #[test]
    fn hard_limit_trips_after_accumulation() {
        let tracker = CostTracker::new(0.001, 0.0005);
        let mut state = state();
        // One sonnet call well past the limit.
        let err = tracker
            .record(&mut state, "claude-sonnet-4-5-20250514", usage(100_000, 100_000))
            .unwrap_err();
        assert!(matches!(err, AgentFailure::CostLimitExceeded { .. }));
        // The over-budget call is still reflected in state.
        assert!(state.total_cost_usd > 0.001);
        assert_eq!(state.total_tokens, 200_000);
    }

    #[test]
    fn cost_is_monotone_across_calls() {
        let tracker = CostTracker::new(100.0, 50.0);
        let mut state = state();
        let mut last = 0.0;
        for _ in 0..5 {
            tracker
                .record(&mut state, "claude-haiku-4-5-20251001", usage(10_000, 2_000))
                .unwrap();
            assert!(state.total_cost_usd >= last);
            last = state.total_cost_usd;
        }
    }
}

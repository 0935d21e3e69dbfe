//! Preferences parsing stage: freeform text in, structured criteria out.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use jobhound_llm::{ChatMessage, CompletionClient};
use jobhound_protocol::{AgentFailure, SearchPreferences, Settings};

use crate::cost::CostTracker;
use crate::prompts;
use crate::state::PipelineState;
use crate::trace::SpanHook;

use super::{call_structured, log_stage_end, log_stage_start, LlmCallError, Stage};

fn preferences_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "preferred_locations": {"type": "array", "items": {"type": "string"}},
            "remote_preference": {"type": "string", "enum": ["onsite", "hybrid", "remote", "any"]},
            "target_titles": {"type": "array", "items": {"type": "string"}},
            "target_seniority": {"type": "array", "items": {"type": "string"}},
            "excluded_titles": {"type": "array", "items": {"type": "string"}},
            "org_types": {"type": "array", "items": {"type": "string"}},
            "company_sizes": {"type": "array", "items": {"type": "string"}},
            "preferred_industries": {"type": "array", "items": {"type": "string"}},
            "excluded_companies": {"type": "array", "items": {"type": "string"}},
            "preferred_companies": {"type": "array", "items": {"type": "string"}},
            "min_salary": {"type": ["integer", "null"], "minimum": 0},
            "max_salary": {"type": ["integer", "null"], "minimum": 0},
            "currency": {"type": "string"}
        },
        "required": ["remote_preference", "currency"]
    })
}

/// Parse freeform preferences text into `SearchPreferences`.
pub struct PrefsParser {
    settings: Settings,
    llm: Arc<dyn CompletionClient>,
    cost: Arc<CostTracker>,
    spans: Arc<dyn SpanHook>,
}

impl PrefsParser {
    pub fn new(
        settings: Settings,
        llm: Arc<dyn CompletionClient>,
        cost: Arc<CostTracker>,
        spans: Arc<dyn SpanHook>,
    ) -> Self {
        Self {
            settings,
            llm,
            cost,
            spans,
        }
    }
}

#[async_trait]
impl Stage for PrefsParser {
    fn name(&self) -> &'static str {
        crate::pipeline::PARSE_PREFS
    }

    async fn run(&self, state: &mut PipelineState) -> Result<(), AgentFailure> {
        log_stage_start(self.name());
        let started = Instant::now();

        let preferences_text = state.config.preferences_text.clone();
        let messages = vec![
            ChatMessage::system(prompts::PREFS_PARSER_SYSTEM),
            ChatMessage::user(prompts::prefs_parser_user(&preferences_text)),
        ];
        let content = call_structured(
            self.llm.as_ref(),
            &self.cost,
            self.spans.as_ref(),
            state,
            crate::pipeline::PARSE_PREFS,
            messages,
            &self.settings.fast_model,
            preferences_schema(),
        )
        .await
        .map_err(|e| match e {
            LlmCallError::Abort(failure) => failure,
            LlmCallError::Llm(err) => {
                AgentFailure::fatal(crate::pipeline::PARSE_PREFS, err.to_string())
            }
        })?;

        let mut prefs: SearchPreferences = serde_json::from_value(content).map_err(|e| {
            AgentFailure::fatal(self.name(), format!("Unusable preferences from LLM: {e}"))
        })?;
        prefs
            .validate()
            .map_err(|e| AgentFailure::fatal(self.name(), e))?;
        prefs.raw_text = preferences_text;

        info!(
            target_titles = ?prefs.target_titles,
            locations = ?prefs.preferred_locations,
            "preferences parsed"
        );
        state.preferences = Some(prefs);
        log_stage_end(self.name(), started);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_requires_remote_preference_and_currency() {
        let schema = preferences_schema();
        let required = schema["required"].as_array().unwrap();
        assert!(required.iter().any(|v| v == "remote_preference"));
        assert!(required.iter().any(|v| v == "currency"));
    }
}

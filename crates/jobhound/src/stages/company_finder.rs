//! Company discovery stage.
//!
//! Generates candidate companies (LLM, or directly from preferred
//! companies), validates that each has a reachable career page, and detects
//! the ATS family so the scraper knows which strategy to use.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use jobhound_llm::{ChatMessage, CompletionClient};
use jobhound_protocol::{
    AgentError, AgentFailure, CareerPage, Company, CompanyTier, Settings,
};
use jobhound_tools::{detect_ats, CareerPageFinder};

use crate::cost::CostTracker;
use crate::prompts;
use crate::state::PipelineState;
use crate::trace::SpanHook;

use super::{call_structured, join_or, log_stage_end, log_stage_start, LlmCallError, Stage};

#[derive(Debug, Clone, Deserialize)]
struct CompanyCandidate {
    name: String,
    domain: String,
    #[serde(default)]
    industry: Option<String>,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    tier: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateList {
    companies: Vec<CompanyCandidate>,
}

fn candidates_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "companies": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "domain": {"type": "string"},
                        "industry": {"type": ["string", "null"]},
                        "size": {"type": ["string", "null"]},
                        "tier": {
                            "type": ["string", "null"],
                            "enum": ["tier_1", "tier_2", "tier_3", "startup", null]
                        },
                        "description": {"type": ["string", "null"]}
                    },
                    "required": ["name", "domain"]
                }
            }
        },
        "required": ["companies"]
    })
}

/// Discover target companies matching the candidate.
pub struct CompanyFinder {
    settings: Settings,
    llm: Arc<dyn CompletionClient>,
    cost: Arc<CostTracker>,
    spans: Arc<dyn SpanHook>,
    finder: Arc<CareerPageFinder>,
}

impl CompanyFinder {
    pub fn new(
        settings: Settings,
        llm: Arc<dyn CompletionClient>,
        cost: Arc<CostTracker>,
        spans: Arc<dyn SpanHook>,
        finder: Arc<CareerPageFinder>,
    ) -> Self {
        Self {
            settings,
            llm,
            cost,
            spans,
            finder,
        }
    }

    async fn generate_candidates(
        &self,
        state: &mut PipelineState,
    ) -> Result<Vec<CompanyCandidate>, AgentFailure> {
        let prefs = state
            .preferences
            .clone()
            .ok_or_else(|| AgentFailure::fatal(self.name(), "Preferences not parsed"))?;

        // Explicitly preferred companies bypass candidate generation.
        if !prefs.preferred_companies.is_empty() {
            return Ok(prefs
                .preferred_companies
                .iter()
                .map(|name| CompanyCandidate {
                    name: name.clone(),
                    domain: format!("{}.com", name.to_lowercase().replace(' ', "")),
                    industry: None,
                    size: None,
                    tier: None,
                    description: None,
                })
                .collect());
        }

        let profile = state
            .profile
            .clone()
            .ok_or_else(|| AgentFailure::fatal(self.name(), "Profile not parsed"))?;

        // Union of user exclusions and companies already attempted in
        // earlier discovery iterations.
        let mut all_excluded: Vec<String> = prefs
            .excluded_companies
            .iter()
            .cloned()
            .chain(state.attempted_company_names.iter().cloned())
            .collect();
        all_excluded.sort();
        all_excluded.dedup();

        let skills: Vec<String> = profile.skills.iter().map(|s| s.name.clone()).collect();
        let user_prompt = prompts::company_finder_user(
            &profile.name,
            profile.current_title.as_deref().unwrap_or("Not specified"),
            profile.years_of_experience,
            &join_or(&skills, "Not specified"),
            &join_or(&profile.industries, "Not specified"),
            &join_or(&profile.tech_stack, "Not specified"),
            &join_or(&prefs.target_titles, "Any"),
            &join_or(&prefs.target_seniority, "Any"),
            &join_or(&prefs.preferred_locations, "Any"),
            prefs.remote_preference.as_str(),
            &join_or(&prefs.preferred_industries, "Any"),
            &join_or(&prefs.org_types, "any"),
            &join_or(&prefs.company_sizes, "Any"),
            &join_or(&all_excluded, "None"),
            "None",
            &prefs.currency,
        );

        let messages = vec![
            ChatMessage::system(prompts::COMPANY_FINDER_SYSTEM),
            ChatMessage::user(user_prompt),
        ];
        let content = call_structured(
            self.llm.as_ref(),
            &self.cost,
            self.spans.as_ref(),
            state,
            crate::pipeline::FIND_COMPANIES,
            messages,
            &self.settings.quality_model,
            candidates_schema(),
        )
        .await
        .map_err(|e| match e {
            LlmCallError::Abort(failure) => failure,
            LlmCallError::Llm(err) => {
                AgentFailure::fatal(crate::pipeline::FIND_COMPANIES, err.to_string())
            }
        })?;

        let list: CandidateList = serde_json::from_value(content).map_err(|e| {
            AgentFailure::fatal(self.name(), format!("Unusable candidate list from LLM: {e}"))
        })?;
        Ok(list.companies)
    }

    /// Validate the career page exists and build the company record.
    async fn validate_and_build(
        &self,
        candidate: &CompanyCandidate,
    ) -> anyhow::Result<Option<Company>> {
        let Some(career_url) = self.finder.find_career_page(&candidate.name).await? else {
            warn!(company = %candidate.name, "career page not found");
            return Ok(None);
        };

        let (ats_type, strategy) = detect_ats(&career_url);
        let mut company = Company::new(
            candidate.name.clone(),
            candidate.domain.clone(),
            CareerPage {
                url: career_url,
                ats_type,
                scrape_strategy: strategy,
            },
        );
        company.industry = candidate.industry.clone();
        company.size = candidate.size.clone();
        company.tier = candidate
            .tier
            .as_deref()
            .map(CompanyTier::from_llm)
            .unwrap_or_default();
        company.description = candidate.description.clone();
        Ok(Some(company))
    }
}

#[async_trait]
impl Stage for CompanyFinder {
    fn name(&self) -> &'static str {
        crate::pipeline::FIND_COMPANIES
    }

    async fn run(&self, state: &mut PipelineState) -> Result<(), AgentFailure> {
        log_stage_start(self.name());
        let started = Instant::now();

        if state.profile.is_none() || state.preferences.is_none() {
            return Err(AgentFailure::fatal(
                self.name(),
                "Profile and preferences must be parsed before finding companies",
            ));
        }

        let candidates = self.generate_candidates(state).await?;

        let mut companies: Vec<Company> = Vec::new();
        for candidate in &candidates {
            match self.validate_and_build(candidate).await {
                Ok(Some(company)) => companies.push(company),
                Ok(None) => {
                    state.record_error(
                        AgentError::new(self.name(), "CareerPageNotFound", "No career page URL found")
                            .for_company(&candidate.name),
                    );
                }
                Err(e) => {
                    state.record_error(
                        AgentError::new(self.name(), "ValidationError", e.to_string())
                            .for_company(&candidate.name),
                    );
                }
            }
        }

        if companies.is_empty() {
            return Err(AgentFailure::fatal(
                self.name(),
                "No companies found with valid career pages",
            ));
        }

        if let Some(limit) = state.config.company_limit {
            companies.truncate(limit);
        }

        info!(companies_found = companies.len(), "companies validated");
        state.companies = companies;
        log_stage_end(self.name(), started);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_list_parses_minimal_entries() {
        let list: CandidateList = serde_json::from_value(json!({
            "companies": [
                {"name": "Acme", "domain": "acme.com"},
                {"name": "Globex", "domain": "globex.com", "tier": "tier_2"}
            ]
        }))
        .unwrap();
        assert_eq!(list.companies.len(), 2);
        assert_eq!(list.companies[1].tier.as_deref(), Some("tier_2"));
    }
}

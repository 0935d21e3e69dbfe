//! Candidate profile and search preferences.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Seniority
// ============================================================================

/// Seniority ladder inferred from a resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeniorityLevel {
    Intern,
    Junior,
    Mid,
    Senior,
    Staff,
    Principal,
    Director,
    Vp,
    #[serde(rename = "c-level")]
    CLevel,
}

impl SeniorityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeniorityLevel::Intern => "intern",
            SeniorityLevel::Junior => "junior",
            SeniorityLevel::Mid => "mid",
            SeniorityLevel::Senior => "senior",
            SeniorityLevel::Staff => "staff",
            SeniorityLevel::Principal => "principal",
            SeniorityLevel::Director => "director",
            SeniorityLevel::Vp => "vp",
            SeniorityLevel::CLevel => "c-level",
        }
    }
}

impl fmt::Display for SeniorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SeniorityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "intern" => Ok(SeniorityLevel::Intern),
            "junior" => Ok(SeniorityLevel::Junior),
            "mid" => Ok(SeniorityLevel::Mid),
            "senior" => Ok(SeniorityLevel::Senior),
            "staff" => Ok(SeniorityLevel::Staff),
            "principal" => Ok(SeniorityLevel::Principal),
            "director" => Ok(SeniorityLevel::Director),
            "vp" => Ok(SeniorityLevel::Vp),
            "c-level" | "clevel" => Ok(SeniorityLevel::CLevel),
            _ => Err(format!("Invalid seniority level: '{s}'")),
        }
    }
}

// ============================================================================
// Candidate profile
// ============================================================================

/// A single skill with optional proficiency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    /// Proficiency label (beginner/intermediate/advanced/expert) when known.
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub years: Option<f64>,
}

impl Skill {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: None,
            years: None,
        }
    }
}

/// Structured representation of a candidate's resume.
///
/// Built once by the resume-parsing stage and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub current_title: Option<String>,
    pub years_of_experience: f64,
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub industries: Vec<String>,
    #[serde(default)]
    pub seniority_level: Option<SeniorityLevel>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    /// Raw extracted resume text.
    pub raw_text: String,
    pub parsed_at: DateTime<Utc>,
    /// SHA-256 of `raw_text`, used for cache invalidation.
    pub content_hash: String,
}

// ============================================================================
// Search preferences
// ============================================================================

/// Remote-work preference expressed by the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RemotePreference {
    Onsite,
    Hybrid,
    Remote,
    #[default]
    Any,
}

impl RemotePreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemotePreference::Onsite => "onsite",
            RemotePreference::Hybrid => "hybrid",
            RemotePreference::Remote => "remote",
            RemotePreference::Any => "any",
        }
    }
}

impl fmt::Display for RemotePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured job-search criteria parsed from freeform text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPreferences {
    #[serde(default)]
    pub preferred_locations: Vec<String>,
    #[serde(default)]
    pub remote_preference: RemotePreference,
    #[serde(default)]
    pub target_titles: Vec<String>,
    #[serde(default)]
    pub target_seniority: Vec<String>,
    #[serde(default)]
    pub excluded_titles: Vec<String>,
    #[serde(default = "default_org_types")]
    pub org_types: Vec<String>,
    #[serde(default)]
    pub company_sizes: Vec<String>,
    #[serde(default)]
    pub preferred_industries: Vec<String>,
    #[serde(default)]
    pub excluded_companies: Vec<String>,
    #[serde(default)]
    pub preferred_companies: Vec<String>,
    #[serde(default)]
    pub min_salary: Option<u64>,
    #[serde(default)]
    pub max_salary: Option<u64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub raw_text: String,
}

fn default_org_types() -> Vec<String> {
    vec!["any".to_string()]
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Default for SearchPreferences {
    fn default() -> Self {
        Self {
            preferred_locations: Vec::new(),
            remote_preference: RemotePreference::Any,
            target_titles: Vec::new(),
            target_seniority: Vec::new(),
            excluded_titles: Vec::new(),
            org_types: default_org_types(),
            company_sizes: Vec::new(),
            preferred_industries: Vec::new(),
            excluded_companies: Vec::new(),
            preferred_companies: Vec::new(),
            min_salary: None,
            max_salary: None,
            currency: default_currency(),
            raw_text: String::new(),
        }
    }
}

impl SearchPreferences {
    /// min/max salary must form a valid range when both are present.
    pub fn validate(&self) -> Result<(), String> {
        if let (Some(min), Some(max)) = (self.min_salary, self.max_salary) {
            if min > max {
                return Err(format!(
                    "min_salary ({min}) cannot exceed max_salary ({max})"
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seniority_round_trips_through_str() {
        for level in [
            SeniorityLevel::Intern,
            SeniorityLevel::Staff,
            SeniorityLevel::CLevel,
        ] {
            assert_eq!(level.as_str().parse::<SeniorityLevel>().unwrap(), level);
        }
    }

    #[test]
    fn seniority_serde_uses_lowercase() {
        let json = serde_json::to_string(&SeniorityLevel::CLevel).unwrap();
        assert_eq!(json, "\"c-level\"");
    }

    #[test]
    fn salary_range_validation() {
        let mut prefs = SearchPreferences {
            min_salary: Some(100_000),
            max_salary: Some(150_000),
            ..Default::default()
        };
        assert!(prefs.validate().is_ok());

        prefs.min_salary = Some(200_000);
        assert!(prefs.validate().is_err());
    }

    #[test]
    fn preferences_deserialize_with_defaults() {
        let prefs: SearchPreferences = serde_json::from_str("{}").unwrap();
        assert_eq!(prefs.currency, "USD");
        assert_eq!(prefs.org_types, vec!["any".to_string()]);
        assert_eq!(prefs.remote_preference, RemotePreference::Any);
    }
}

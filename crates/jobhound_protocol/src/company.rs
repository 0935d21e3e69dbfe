//! Discovery targets: companies and their career pages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Classification enums
// ============================================================================

/// Coarse company-size classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompanyTier {
    /// Big tech, >10k employees
    #[serde(rename = "tier_1")]
    Tier1,
    /// Established mid-to-large, 1k-10k employees
    #[serde(rename = "tier_2")]
    Tier2,
    /// Growing companies, 200-1000 employees
    #[serde(rename = "tier_3")]
    Tier3,
    /// Early-to-growth stage, <200 employees
    Startup,
    #[default]
    Unknown,
}

impl CompanyTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyTier::Tier1 => "tier_1",
            CompanyTier::Tier2 => "tier_2",
            CompanyTier::Tier3 => "tier_3",
            CompanyTier::Startup => "startup",
            CompanyTier::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CompanyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CompanyTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tier_1" => Ok(CompanyTier::Tier1),
            "tier_2" => Ok(CompanyTier::Tier2),
            "tier_3" => Ok(CompanyTier::Tier3),
            "startup" => Ok(CompanyTier::Startup),
            "unknown" => Ok(CompanyTier::Unknown),
            _ => Err(format!("Invalid company tier: '{s}'")),
        }
    }
}

impl CompanyTier {
    /// Lenient mapping for LLM-provided tier strings; anything unrecognized
    /// collapses to `Unknown`.
    pub fn from_llm(raw: &str) -> Self {
        raw.parse().unwrap_or(CompanyTier::Unknown)
    }
}

/// Applicant Tracking System families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AtsType {
    Greenhouse,
    Lever,
    Workday,
    Ashby,
    Icims,
    Taleo,
    Custom,
    #[default]
    Unknown,
}

impl AtsType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AtsType::Greenhouse => "greenhouse",
            AtsType::Lever => "lever",
            AtsType::Workday => "workday",
            AtsType::Ashby => "ashby",
            AtsType::Icims => "icims",
            AtsType::Taleo => "taleo",
            AtsType::Custom => "custom",
            AtsType::Unknown => "unknown",
        }
    }

    /// Whether this family has a public jobs API we can call directly.
    pub fn has_api(&self) -> bool {
        matches!(
            self,
            AtsType::Greenhouse | AtsType::Lever | AtsType::Ashby | AtsType::Workday
        )
    }
}

impl fmt::Display for AtsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a career page gets scraped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeStrategy {
    /// Direct ATS API call
    Api,
    /// Generic page fetch
    #[default]
    Crawler,
}

impl ScrapeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrapeStrategy::Api => "api",
            ScrapeStrategy::Crawler => "crawler",
        }
    }
}

impl fmt::Display for ScrapeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Company
// ============================================================================

/// Career page metadata for a company.
///
/// Invariant: `strategy == Api` implies `ats_type.has_api()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CareerPage {
    pub url: String,
    #[serde(default)]
    pub ats_type: AtsType,
    #[serde(default)]
    pub scrape_strategy: ScrapeStrategy,
}

/// A discovery target. The set of companies is rebuilt every adaptive
/// iteration; the id ties raw jobs back to their origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub domain: String,
    pub career_page: CareerPage,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub tier: CompanyTier,
    #[serde(default)]
    pub description: Option<String>,
}

impl Company {
    pub fn new(name: impl Into<String>, domain: impl Into<String>, career_page: CareerPage) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            domain: domain.into(),
            career_page,
            industry: None,
            size: None,
            tier: CompanyTier::Unknown,
            description: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_from_llm_is_lenient() {
        assert_eq!(CompanyTier::from_llm("Tier_1"), CompanyTier::Tier1);
        assert_eq!(CompanyTier::from_llm("startup"), CompanyTier::Startup);
        assert_eq!(CompanyTier::from_llm("mega-corp"), CompanyTier::Unknown);
    }

    #[test]
    fn api_families() {
        assert!(AtsType::Greenhouse.has_api());
        assert!(AtsType::Workday.has_api());
        assert!(!AtsType::Icims.has_api());
        assert!(!AtsType::Unknown.has_api());
    }

    #[test]
    fn company_serde_round_trip() {
        let company = Company::new(
            "Acme",
            "acme.com",
            CareerPage {
                url: "https://boards.greenhouse.io/acme".to_string(),
                ats_type: AtsType::Greenhouse,
                scrape_strategy: ScrapeStrategy::Api,
            },
        );
        let json = serde_json::to_string(&company).unwrap();
        let back: Company = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, company.id);
        assert_eq!(back.career_page.ats_type, AtsType::Greenhouse);
        assert_eq!(back.career_page.scrape_strategy, ScrapeStrategy::Api);
    }
}

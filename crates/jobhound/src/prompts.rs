//! Prompt templates for the LLM-backed stages.
//!
//! Version tags bump whenever a template changes in a way that affects
//! output shape or calibration.

pub const RESUME_PARSER_PROMPT_VERSION: &str = "v1";
pub const PREFS_PARSER_PROMPT_VERSION: &str = "v1";
pub const COMPANY_FINDER_PROMPT_VERSION: &str = "v2";
pub const JOB_PROCESSOR_PROMPT_VERSION: &str = "v1";
pub const JOB_SCORER_PROMPT_VERSION: &str = "v1";

pub const RESUME_PARSER_SYSTEM: &str = "\
You are an expert resume parser. Extract structured information from resumes accurately.

<rules>
- NEVER hallucinate skills or experience not explicitly mentioned in the resume
- If a field is ambiguous, prefer conservative interpretation
- Extract ALL technical skills mentioned, including frameworks and tools
- Infer seniority_level from years of experience and titles if not stated
- For years_of_experience, calculate from earliest work date to present
- Content hash will be computed separately - do not include it
</rules>";

pub fn resume_parser_user(resume_text: &str) -> String {
    format!(
        "<resume_text>\n{resume_text}\n</resume_text>\n\n\
         Parse the above resume and extract all structured information. Return the \
         candidate profile with all available fields populated. If a field cannot be \
         determined from the resume, omit it or use null."
    )
}

pub const PREFS_PARSER_SYSTEM: &str = "\
You are a preference parser for job search. Extract structured search preferences \
from freeform natural language text.

<rules>
- If remote preference is not mentioned, default to \"any\"
- If salary is not mentioned, leave min_salary and max_salary as null
- Parse both explicit (\"I want\") and implicit (\"not interested in\") preferences
- \"Big tech\" reads as an excluded_companies pattern, not a company size
- Detect the currency from context. \"LPA\" or \"lakhs\" means INR; convert LPA to \
annual (1 LPA = 100,000 INR). Set the currency field accordingly (USD, INR, EUR, GBP, ...)
</rules>";

pub fn prefs_parser_user(preferences_text: &str) -> String {
    format!(
        "<preferences_text>\n{preferences_text}\n</preferences_text>\n\n\
         Parse the above free-form job search preferences into structured fields."
    )
}

pub const COMPANY_FINDER_SYSTEM: &str = "\
You are a company research assistant. Given a candidate profile and their job \
search preferences, generate a list of real companies that would be good targets.

<rules>
- Only suggest REAL companies that currently exist and are actively hiring
- Match company suggestions to the candidate's industry experience and preferences
- Consider company size, location, and org type preferences
- Provide the company's primary domain (e.g., stripe.com, not www.stripe.com)
- Do NOT suggest companies the candidate listed in excluded_companies
</rules>

<ats_requirement>
Prefer companies that use Greenhouse, Lever, or Ashby as their applicant tracking \
system; their public APIs enable reliable job data extraction. Companies with custom \
career portals should be a minority of results.
</ats_requirement>

<tier_classification>
- tier_1: Large tech companies, >10k employees
- tier_2: Established mid-to-large companies, 1k-10k employees
- tier_3: Growing companies, 200-1000 employees
- startup: Early-to-growth stage, <200 employees
</tier_classification>";

#[allow(clippy::too_many_arguments)]
pub fn company_finder_user(
    name: &str,
    current_title: &str,
    years_of_experience: f64,
    skills: &str,
    industries: &str,
    tech_stack: &str,
    target_titles: &str,
    target_seniority: &str,
    preferred_locations: &str,
    remote_preference: &str,
    preferred_industries: &str,
    org_types: &str,
    company_sizes: &str,
    excluded_companies: &str,
    preferred_companies: &str,
    salary_currency: &str,
) -> String {
    format!(
        "<candidate_profile>\n\
         Name: {name}\n\
         Current Title: {current_title}\n\
         Years of Experience: {years_of_experience}\n\
         Skills: {skills}\n\
         Industries: {industries}\n\
         Tech Stack: {tech_stack}\n\
         </candidate_profile>\n\n\
         <search_preferences>\n\
         Target Titles: {target_titles}\n\
         Target Seniority: {target_seniority}\n\
         Preferred Locations: {preferred_locations}\n\
         Remote Preference: {remote_preference}\n\
         Preferred Industries: {preferred_industries}\n\
         Organization Types: {org_types}\n\
         Company Sizes: {company_sizes}\n\
         Excluded Companies: {excluded_companies}\n\
         Preferred Companies: {preferred_companies}\n\
         Salary Currency: {salary_currency}\n\
         </search_preferences>\n\n\
         Generate 20-30 target companies. For each, provide name, domain, industry, \
         size, tier (tier_1, tier_2, tier_3, startup), and a brief description."
    )
}

pub const JOB_PROCESSOR_SYSTEM: &str = "\
You are a job listing parser. Extract structured job information from raw HTML or \
text content of job postings.

<rules>
- Extract the exact job title as written
- Parse salary ranges if mentioned (convert to integers, keep original currency)
- Identify remote_type from location and description: \"remote\", \"hybrid\", \"onsite\", \"unknown\"
- Extract required vs preferred skills separately
- Extract posted_date as YYYY-MM-DD if stated or inferable; null if truly unknown
- Extract the direct application/apply URL if present in the content; null if not found
- If salary is in a non-USD currency, note the currency code (INR, EUR, GBP, etc.)
- Set is_valid_posting=false if the content is a career landing page, company overview, \
or lists many jobs without specific details for one position. A valid posting has ONE \
specific job title, a description of responsibilities, and requirements for that role.
</rules>";

pub fn job_processor_user(company_name: &str, source_url: &str, raw_content: &str) -> String {
    format!(
        "<company_name>{company_name}</company_name>\n\
         <source_url>{source_url}</source_url>\n\n\
         <raw_content>\n{raw_content}\n</raw_content>\n\n\
         Parse this job posting and extract all structured fields."
    )
}

pub const JOB_SCORER_SYSTEM: &str = "\
You are a job-candidate fit evaluator. Score how well each job matches the candidate.

<scoring_dimensions>
- skill_match (30%): Overlap between candidate skills and job requirements
- seniority (20%): Match between candidate level and job level
- location (15%): Geographic/remote compatibility
- org_type (15%): Organization type preference match
- growth_stage (10%): Company stage alignment
- compensation_fit (10%): Salary range alignment (if known)
</scoring_dimensions>

<calibration>
- A score of 85+ should be RARE, reserved for near-perfect alignment
- 70-84 is a good match; most strong candidates land here
- 60-69 has some mismatches but is overall viable
- Below 60 has significant gaps
- Be honest about gaps. Do not inflate scores to be encouraging.
</calibration>";

#[allow(clippy::too_many_arguments)]
pub fn job_scorer_user(
    name: &str,
    current_title: &str,
    years_of_experience: f64,
    seniority_level: &str,
    skills: &str,
    industries: &str,
    location: &str,
    remote_preference: &str,
    org_types: &str,
    salary_range: &str,
    jobs_block: &str,
) -> String {
    format!(
        "<candidate>\n\
         Name: {name}\n\
         Title: {current_title}\n\
         Years of Experience: {years_of_experience}\n\
         Seniority: {seniority_level}\n\
         Skills: {skills}\n\
         Industries: {industries}\n\
         Location: {location}\n\
         Remote Preference: {remote_preference}\n\
         Preferred Org Types: {org_types}\n\
         Salary Range: {salary_range}\n\
         </candidate>\n\n\
         <jobs>\n{jobs_block}\n</jobs>\n\n\
         For each job, provide a score entry with job_index, score (0-100), \
         skill_overlap, skill_gaps, seniority_match, location_match, org_type_match, \
         a 2-3 sentence summary, a recommendation \
         (strong_match, good_match, stretch, or mismatch), and confidence (0.0-1.0)."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_prompts_embed_their_inputs() {
        assert!(resume_parser_user("RESUME BODY").contains("RESUME BODY"));
        assert!(prefs_parser_user("remote only").contains("remote only"));
        let prompt = job_processor_user("Acme", "https://acme.com/j/1", "<html>");
        assert!(prompt.contains("Acme"));
        assert!(prompt.contains("https://acme.com/j/1"));
    }

    #[test]
    fn company_finder_prompt_carries_exclusions() {
        let prompt = company_finder_user(
            "Jane", "Engineer", 5.0, "Rust", "fintech", "tokio", "Backend Engineer",
            "senior", "Remote", "remote", "fintech", "any", "Any", "Acme, Globex",
            "None", "USD",
        );
        assert!(prompt.contains("Excluded Companies: Acme, Globex"));
    }
}

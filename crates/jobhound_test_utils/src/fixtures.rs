//! Canned LLM replies and model builders shared across test suites.

use serde_json::{json, Value};

/// Structured reply for the resume-parsing stage.
pub fn profile_reply() -> Value {
    json!({
        "name": "Jane Doe",
        "email": "jane@example.com",
        "location": "Remote",
        "current_title": "ML Engineer",
        "years_of_experience": 5.0,
        "skills": [{"name": "Python"}, {"name": "ML"}],
        "industries": ["fintech"],
        "seniority_level": "senior",
        "tech_stack": ["pytorch"]
    })
}

/// Structured reply for the preferences-parsing stage.
pub fn prefs_reply() -> Value {
    json!({
        "preferred_locations": ["Remote"],
        "remote_preference": "remote",
        "target_titles": ["ML Engineer"],
        "target_seniority": ["senior"],
        "excluded_titles": [],
        "org_types": ["any"],
        "company_sizes": [],
        "preferred_industries": [],
        "excluded_companies": [],
        "preferred_companies": [],
        "min_salary": null,
        "max_salary": null,
        "currency": "USD"
    })
}

/// Preferences reply that targets specific companies, bypassing LLM
/// candidate generation in discovery.
pub fn prefs_reply_with_preferred(companies: &[&str]) -> Value {
    let mut reply = prefs_reply();
    reply["preferred_companies"] = json!(companies);
    reply
}

/// Company-finder reply listing candidates by name.
pub fn candidates_reply(names: &[&str]) -> Value {
    let companies: Vec<Value> = names
        .iter()
        .map(|name| {
            json!({
                "name": name,
                "domain": format!("{}.com", name.to_lowercase()),
                "industry": "software",
                "size": "mid",
                "tier": "tier_2",
                "description": "A software company"
            })
        })
        .collect();
    json!({"companies": companies})
}

/// Batch-scorer reply: one entry per (index, score) pair.
pub fn batch_score_reply(scores: &[(usize, u8)]) -> Value {
    let entries: Vec<Value> = scores
        .iter()
        .map(|(index, score)| {
            json!({
                "job_index": index,
                "score": score,
                "skill_overlap": ["Python"],
                "skill_gaps": [],
                "seniority_match": true,
                "location_match": true,
                "org_type_match": true,
                "summary": "Solid fit for the role.",
                "recommendation": if *score >= 85 { "strong_match" }
                                  else if *score >= 70 { "good_match" }
                                  else if *score >= 60 { "stretch" }
                                  else { "mismatch" },
                "confidence": 0.9
            })
        })
        .collect();
    json!({"scores": entries})
}

/// Extraction reply for the HTML processing path.
pub fn extracted_job_reply(title: &str, jd_text: &str) -> Value {
    json!({
        "title": title,
        "jd_text": jd_text,
        "is_valid_posting": true,
        "location": "Remote",
        "remote_type": "remote",
        "salary_min": null,
        "salary_max": null,
        "currency": null,
        "posted_date": "2025-01-15",
        "apply_url": null,
        "required_skills": ["Python"],
        "preferred_skills": [],
        "required_experience_years": 3.0,
        "seniority_level": "senior",
        "department": null
    })
}

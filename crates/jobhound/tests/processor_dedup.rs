//! Deduplication across the JSON and HTML normalization paths.

use std::sync::Arc;

use jobhound::cost::CostTracker;
use jobhound::stages::{JobProcessor, Stage};
use jobhound::trace::NoopSpans;
use jobhound::PipelineState;
use jobhound_protocol::{RawJob, RunConfig, Settings};
use jobhound_test_utils::{fixtures, MockCompletion};
use serde_json::json;
use uuid::Uuid;

fn processor(llm: Arc<MockCompletion>) -> JobProcessor {
    let settings = Settings::default();
    JobProcessor::new(
        settings.clone(),
        llm,
        Arc::new(CostTracker::new(
            settings.max_cost_per_run_usd,
            settings.warn_cost_threshold_usd,
        )),
        Arc::new(NoopSpans::new()),
    )
}

#[tokio::test]
async fn json_and_html_paths_collide_on_fingerprint() {
    let llm = Arc::new(MockCompletion::new());
    // The HTML path extracts the same title and description the JSON path
    // already produced, so the fingerprints collide.
    llm.enqueue(fixtures::extracted_job_reply("ML Engineer", "Build models"));

    let mut state = PipelineState::new(RunConfig::new("/tmp/resume.txt", "prefs"));
    let company_id = Uuid::new_v4();
    state.raw_jobs.push(RawJob::from_api(
        company_id,
        "Acme",
        json!({
            "title": "ML Engineer",
            "content": "Build models",
            "absolute_url": "https://boards.greenhouse.io/acme/1"
        }),
        "https://boards.greenhouse.io/acme",
    ));
    state.raw_jobs.push(RawJob::from_crawl(
        company_id,
        "Acme",
        format!("<html><body>{}</body></html>", "ML Engineer opening. ".repeat(20)),
        "https://acme.com/careers/ml-engineer",
    ));

    processor(llm).run(&mut state).await.unwrap();

    assert_eq!(state.normalized_jobs.len(), 1);
    assert_eq!(state.normalized_jobs[0].title, "ML Engineer");
    assert!(state.errors.is_empty());
}

#[tokio::test]
async fn identical_json_records_collapse_to_one() {
    let llm = Arc::new(MockCompletion::new());
    let mut state = PipelineState::new(RunConfig::new("/tmp/resume.txt", "prefs"));
    let company_id = Uuid::new_v4();
    for _ in 0..2 {
        state.raw_jobs.push(RawJob::from_api(
            company_id,
            "Acme",
            json!({
                "title": "SRE",
                "content": "Keep it running",
                "absolute_url": "https://boards.greenhouse.io/acme/7"
            }),
            "https://boards.greenhouse.io/acme",
        ));
    }

    processor(llm).run(&mut state).await.unwrap();
    assert_eq!(state.normalized_jobs.len(), 1);
}

#[tokio::test]
async fn landing_pages_are_skipped() {
    let llm = Arc::new(MockCompletion::new());
    let mut reply = fixtures::extracted_job_reply("Careers at Acme", "We have many jobs");
    reply["is_valid_posting"] = json!(false);
    llm.enqueue(reply);

    let mut state = PipelineState::new(RunConfig::new("/tmp/resume.txt", "prefs"));
    state.raw_jobs.push(RawJob::from_crawl(
        Uuid::new_v4(),
        "Acme",
        "Open roles across every team. ".repeat(10),
        "https://acme.com/careers",
    ));

    processor(llm).run(&mut state).await.unwrap();
    assert!(state.normalized_jobs.is_empty());
    assert!(state.errors.is_empty());
}

#[tokio::test]
async fn tiny_crawled_pages_skip_the_llm() {
    let llm = Arc::new(MockCompletion::new());
    let mut state = PipelineState::new(RunConfig::new("/tmp/resume.txt", "prefs"));
    state.raw_jobs.push(RawJob::from_crawl(
        Uuid::new_v4(),
        "Acme",
        "too short".to_string(),
        "https://acme.com/careers",
    ));

    processor(llm.clone()).run(&mut state).await.unwrap();
    assert!(state.normalized_jobs.is_empty());
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn extraction_failure_is_recorded_and_skipped() {
    let llm = Arc::new(MockCompletion::new());
    llm.enqueue_error("model kept returning prose");

    let mut state = PipelineState::new(RunConfig::new("/tmp/resume.txt", "prefs"));
    state.raw_jobs.push(RawJob::from_crawl(
        Uuid::new_v4(),
        "Acme",
        "A plausible job posting body with plenty of content. ".repeat(5),
        "https://acme.com/careers/role",
    ));

    processor(llm).run(&mut state).await.unwrap();
    assert!(state.normalized_jobs.is_empty());
    assert_eq!(state.errors.len(), 1);
    assert_eq!(state.errors[0].stage, "process_jobs");
}

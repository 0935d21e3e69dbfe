//! Adaptive discovery loop behavior.

mod common;

use common::TestEnv;
use jobhound::{AdaptivePipeline, PipelineState};
use jobhound_protocol::RunStatus;
use jobhound_test_utils::{fixtures, greenhouse_job, MockCompletion};

fn board_job(slug: &str, n: u32, title: &str) -> serde_json::Value {
    greenhouse_job(
        title,
        &format!("Work on {title} at {slug}"),
        &format!("https://boards.greenhouse.io/{slug}/jobs/{n}"),
    )
}

#[tokio::test]
async fn discovery_refills_until_target_with_exclusions() {
    let mut env = TestEnv::with_llm(MockCompletion::new());
    env.settings.min_recommended_jobs = 4;
    env.settings.max_discovery_iterations = 3;
    env.settings.checkpoint_enabled = true;

    // Iteration 0: FirstCo yields 2 jobs above threshold.
    env.llm.enqueue(fixtures::profile_reply());
    env.llm.enqueue(fixtures::prefs_reply());
    env.llm.enqueue(fixtures::candidates_reply(&["FirstCo"]));
    env.llm.enqueue(fixtures::batch_score_reply(&[(0, 90), (1, 80)]));
    // Iteration 1: SecondCo yields 3 more.
    env.llm.enqueue(fixtures::candidates_reply(&["SecondCo"]));
    env.llm
        .enqueue(fixtures::batch_score_reply(&[(0, 88), (1, 77), (2, 66)]));

    env.search
        .insert("FirstCo", "https://boards.greenhouse.io/firstco");
    env.search
        .insert("SecondCo", "https://boards.greenhouse.io/secondco");
    env.ats.insert(
        "FirstCo",
        vec![
            board_job("firstco", 1, "Backend Engineer"),
            board_job("firstco", 2, "Data Engineer"),
        ],
    );
    env.ats.insert(
        "SecondCo",
        vec![
            board_job("secondco", 1, "ML Engineer"),
            board_job("secondco", 2, "Platform Engineer"),
            board_job("secondco", 3, "SRE"),
        ],
    );

    let pipeline = AdaptivePipeline::new(env.pipeline());
    let result = pipeline.run(env.config("run_d")).await.unwrap();

    assert_eq!(result.status, RunStatus::Success);
    assert!(result.jobs_in_output >= 4, "expected >= 4, got {}", result.jobs_in_output);

    // The second candidate-generation prompt must exclude FirstCo.
    let second_candidates_prompt = env.llm.call_text(4);
    assert!(second_candidates_prompt.contains("<candidate_profile>"));
    assert!(second_candidates_prompt.contains("FirstCo"));

    // Restore the final snapshot: both iterations' companies are remembered
    // and the loop stopped on the second iteration.
    let checkpoint = jobhound::checkpoint::load_latest_checkpoint(
        "run_d",
        &env.settings.checkpoint_dir,
    )
    .await
    .unwrap()
    .unwrap();
    let state = PipelineState::from_checkpoint(checkpoint).unwrap();
    assert!(state.attempted_company_names.contains("FirstCo"));
    assert!(state.attempted_company_names.contains("SecondCo"));
    assert_eq!(state.discovery_iteration, 1);

    // Ranks stay a clean 1..N permutation after the merge.
    let ranks: Vec<u32> = state.scored_jobs.iter().filter_map(|s| s.rank).collect();
    let expected: Vec<u32> = (1..=state.scored_jobs.len() as u32).collect();
    assert_eq!(ranks, expected);
    let scores: Vec<u8> = state.scored_jobs.iter().map(|s| s.fit_report.score).collect();
    let mut sorted = scores.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(scores, sorted);

    // No duplicate fingerprints in the merged output.
    let mut hashes: Vec<&str> = state
        .scored_jobs
        .iter()
        .map(|s| s.job.content_hash.as_str())
        .collect();
    hashes.sort_unstable();
    let before = hashes.len();
    hashes.dedup();
    assert_eq!(hashes.len(), before);
}

#[tokio::test]
async fn quota_met_in_first_iteration_stops_the_loop() {
    let mut env = TestEnv::with_llm(MockCompletion::new());
    env.settings.min_recommended_jobs = 2;
    env.settings.max_discovery_iterations = 3;

    env.llm.enqueue(fixtures::profile_reply());
    env.llm
        .enqueue(fixtures::prefs_reply_with_preferred(&["OnlyCo"]));
    env.llm.enqueue(fixtures::batch_score_reply(&[(0, 90), (1, 85)]));

    env.search
        .insert("OnlyCo", "https://boards.greenhouse.io/onlyco");
    env.ats.insert(
        "OnlyCo",
        vec![
            board_job("onlyco", 1, "Engineer"),
            board_job("onlyco", 2, "Senior Engineer"),
        ],
    );

    let pipeline = AdaptivePipeline::new(env.pipeline());
    let result = pipeline.run(env.config("run_quota")).await.unwrap();

    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(result.jobs_in_output, 2);
    // One candidate bypass + one scoring call; no second iteration.
    assert_eq!(env.llm.call_count(), 3);
}

#[tokio::test]
async fn iteration_budget_caps_the_loop() {
    let mut env = TestEnv::with_llm(MockCompletion::new());
    env.settings.min_recommended_jobs = 10;
    env.settings.max_discovery_iterations = 2;

    env.llm.enqueue(fixtures::profile_reply());
    env.llm.enqueue(fixtures::prefs_reply());
    // Two iterations, one job each; target never met.
    env.llm.enqueue(fixtures::candidates_reply(&["IterOne"]));
    env.llm.enqueue(fixtures::batch_score_reply(&[(0, 70)]));
    env.llm.enqueue(fixtures::candidates_reply(&["IterTwo"]));
    env.llm.enqueue(fixtures::batch_score_reply(&[(0, 65)]));

    env.search
        .insert("IterOne", "https://boards.greenhouse.io/iterone");
    env.search
        .insert("IterTwo", "https://boards.greenhouse.io/itertwo");
    env.ats
        .insert("IterOne", vec![board_job("iterone", 1, "Engineer A")]);
    env.ats
        .insert("IterTwo", vec![board_job("itertwo", 1, "Engineer B")]);

    let pipeline = AdaptivePipeline::new(env.pipeline());
    let result = pipeline.run(env.config("run_budget")).await.unwrap();

    // Loop ran out of budget; the accumulated pair still ships.
    assert_eq!(result.jobs_in_output, 2);
    assert_eq!(env.llm.call_count(), 6);
}
